//! 团队贪心构建骨架，所有策略共用

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use teamform_domain::{
    Candidate, SkillRequest, Team, TeamFormationError, TeamFormationResult, TeamMember,
};
use tracing::debug;

use crate::scoring::{self, PoolStats, ScoringContext};
use crate::strategies::ScoringPolicy;

/// 已选中的候选人：池中下标加上入选时满足的技能
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub added_for_skill: String,
}

/// 构建过程的进度与取消检查点
///
/// `checkpoint` 返回错误（通常是 `Cancelled`）时构建立即停止
pub trait BuildControl: Send + Sync {
    fn checkpoint(&self, completed_fraction: f64) -> TeamFormationResult<()>;

    /// 只检查是否需要停止，不上报进度；用于没有新成员加入的长循环
    fn ensure_active(&self) -> TeamFormationResult<()> {
        Ok(())
    }
}

/// 不上报进度、也不会取消
pub struct NoopControl;

impl BuildControl for NoopControl {
    fn checkpoint(&self, _completed_fraction: f64) -> TeamFormationResult<()> {
        Ok(())
    }
}

/// 组建中的团队
#[derive(Default)]
struct TeamDraft {
    selections: Vec<Selection>,
    covered: BTreeSet<String>,
    elapsed: Duration,
}

pub struct TeamBuilder<'a> {
    policy: &'a dyn ScoringPolicy,
    reference_year: i32,
}

impl<'a> TeamBuilder<'a> {
    pub fn new(policy: &'a dyn ScoringPolicy, reference_year: i32) -> Self {
        Self {
            policy,
            reference_year,
        }
    }

    /// 组建最多 `num_teams` 个团队，候选人不会出现在两个团队中。
    ///
    /// 第一轮每个团队只接收能补充新技能的候选人；所有团队都开始组建后，
    /// 第二轮才用剩余候选人填充空位，此时他们已无法为任何团队补充新技能。
    pub fn build_teams(
        &self,
        candidates: &[Candidate],
        request: &SkillRequest,
        control: &dyn BuildControl,
    ) -> TeamFormationResult<Vec<Team>> {
        let requested = &request.skills;
        if !candidates
            .iter()
            .any(|c| requested.iter().any(|s| c.has_skill(s)))
        {
            return Err(TeamFormationError::no_candidates(requested));
        }

        let stats = PoolStats::from_candidates(candidates);
        let skill_order = self.policy.skill_order(request);
        let total_slots = (request.num_teams * request.team_size).max(1) as f64;
        let mut available = vec![true; candidates.len()];
        let mut drafts: Vec<TeamDraft> = Vec::with_capacity(request.num_teams);
        let mut filled = 0usize;

        for team_index in 0..request.num_teams {
            control.checkpoint(filled as f64 / total_slots)?;

            let has_match = candidates
                .iter()
                .enumerate()
                .any(|(i, c)| available[i] && requested.iter().any(|s| c.has_skill(s)));
            if !has_match {
                debug!(
                    "{} 候选人已用尽，停止于第 {} 个团队",
                    self.policy.name(),
                    team_index + 1
                );
                break;
            }

            let started = Instant::now();
            let mut draft = TeamDraft::default();
            while draft.selections.len() < request.team_size && draft.covered.len() < requested.len()
            {
                let open: Vec<String> = skill_order
                    .iter()
                    .filter(|s| !draft.covered.contains(*s))
                    .cloned()
                    .collect();
                let Some(selection) = self.pick_for_open_skills(
                    candidates,
                    &available,
                    &draft.selections,
                    &stats,
                    &open,
                ) else {
                    break;
                };

                self.accept(&mut draft, selection, candidates, &mut available, requested, team_index);
                filled += 1;
                control.checkpoint(filled as f64 / total_slots)?;
            }
            draft.elapsed += started.elapsed();
            drafts.push(draft);
        }

        for (team_index, draft) in drafts.iter_mut().enumerate() {
            let started = Instant::now();
            while draft.selections.len() < request.team_size {
                // 重复覆盖已有技能
                let Some(selection) = self.pick_best(
                    candidates,
                    &available,
                    &draft.selections,
                    &stats,
                    &skill_order,
                ) else {
                    break;
                };
                self.accept(draft, selection, candidates, &mut available, requested, team_index);
                filled += 1;
                control.checkpoint(filled as f64 / total_slots)?;
            }

            self.policy.refine(
                &mut draft.selections,
                candidates,
                &mut available,
                requested,
                control,
            )?;
            draft.elapsed += started.elapsed();
        }

        let teams = drafts
            .into_iter()
            .enumerate()
            .map(|(team_index, draft)| {
                let members = draft
                    .selections
                    .iter()
                    .map(|s| {
                        TeamMember::from_candidate(&candidates[s.index], s.added_for_skill.clone())
                    })
                    .collect();
                Team::new(team_index + 1, members, requested).with_formation_time(draft.elapsed)
            })
            .collect();
        Ok(teams)
    }

    fn accept(
        &self,
        draft: &mut TeamDraft,
        selection: Selection,
        candidates: &[Candidate],
        available: &mut [bool],
        requested: &[String],
        team_index: usize,
    ) {
        let candidate = &candidates[selection.index];
        available[selection.index] = false;
        draft.covered.extend(
            requested
                .iter()
                .filter(|s| candidate.has_skill(s))
                .cloned(),
        );
        debug!(
            "{} 团队 {} 加入候选人 {} (技能: {})",
            self.policy.name(),
            team_index + 1,
            candidate.id,
            selection.added_for_skill
        );
        draft.selections.push(selection);
    }

    fn pick_for_open_skills(
        &self,
        candidates: &[Candidate],
        available: &[bool],
        selections: &[Selection],
        stats: &PoolStats,
        open: &[String],
    ) -> Option<Selection> {
        if self.policy.sequential_fill() {
            open.iter().find_map(|skill| {
                self.pick_best(
                    candidates,
                    available,
                    selections,
                    stats,
                    std::slice::from_ref(skill),
                )
            })
        } else {
            self.pick_best(candidates, available, selections, stats, open)
        }
    }

    /// 在具备 `skills` 中某项技能的可用候选人里选出排名最高者。
    ///
    /// 团队已有成员时先按策略的准入条件筛选，无人通过且策略允许时
    /// 退而考虑与现有成员同机构的候选人。
    fn pick_best(
        &self,
        candidates: &[Candidate],
        available: &[bool],
        selections: &[Selection],
        stats: &PoolStats,
        skills: &[String],
    ) -> Option<Selection> {
        let teammates: Vec<&Candidate> = selections.iter().map(|s| &candidates[s.index]).collect();
        let ctx = ScoringContext {
            stats,
            weights: self.policy.weights(),
            reference_year: self.reference_year,
            half_life_years: self.policy.half_life_years(),
            teammates: &teammates,
        };

        if teammates.is_empty() {
            return Self::pick_ranked(candidates, available, skills, &ctx, |_| true);
        }

        Self::pick_ranked(candidates, available, skills, &ctx, |c| {
            self.policy.admits(c, &teammates, self.reference_year)
        })
        .or_else(|| {
            if !self.policy.organization_fallback() {
                return None;
            }
            let picked = Self::pick_ranked(candidates, available, skills, &ctx, |c| {
                teammates.iter().any(|mate| c.shares_organization_with(mate))
            });
            if let Some(selection) = &picked {
                debug!(
                    "{} 通过机构关系找到候选人 {}",
                    self.policy.name(),
                    candidates[selection.index].id
                );
            }
            picked
        })
    }

    fn pick_ranked(
        candidates: &[Candidate],
        available: &[bool],
        skills: &[String],
        ctx: &ScoringContext<'_>,
        eligible: impl Fn(&Candidate) -> bool,
    ) -> Option<Selection> {
        let no_cover = BTreeSet::new();

        let mut best: Option<(usize, String, f64)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            if !available[index] || !eligible(candidate) {
                continue;
            }
            let scored = scoring::score(candidate, &no_cover, skills, ctx);
            let Some(skill) = scored.matched_skill else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((best_index, _, best_quality)) => {
                    scoring::rank(
                        scored.quality,
                        candidate,
                        *best_quality,
                        &candidates[*best_index],
                    ) == std::cmp::Ordering::Less
                }
            };
            if better {
                best = Some((index, skill, scored.quality));
            }
        }

        best.map(|(index, added_for_skill, _)| Selection {
            index,
            added_for_skill,
        })
    }
}
