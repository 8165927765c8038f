//! COT 的交换式局部搜索

use std::collections::BTreeSet;

use teamform_domain::{Candidate, TeamFormationResult};
use tracing::debug;

use crate::builder::{BuildControl, Selection};
use crate::scoring::pair_weight;

const GAIN_EPSILON: f64 = 1e-12;

/// 团队内两两合作强度的平均值，少于两人时为 0
pub fn average_pairwise_weight(members: &[&Candidate]) -> f64 {
    if members.len() < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            total += pair_weight(a, b);
            pairs += 1;
        }
    }
    total / pairs as f64
}

fn covered_skills(members: &[&Candidate], requested: &[String]) -> BTreeSet<String> {
    requested
        .iter()
        .filter(|skill| members.iter().any(|m| m.has_skill(skill)))
        .cloned()
        .collect()
}

/// 反复执行收益最大的一次交换，直到没有正收益或达到轮数上限。
///
/// 交换必须保持已覆盖技能不减少，替换者需具备被替换成员的 `added_for_skill`
/// 并继承它。每轮开始前检查 `control`，返回实际执行的交换次数。
pub fn improve_cohesion(
    selections: &mut [Selection],
    candidates: &[Candidate],
    available: &mut [bool],
    requested: &[String],
    max_rounds: usize,
    control: &dyn BuildControl,
) -> TeamFormationResult<usize> {
    if selections.len() < 2 {
        return Ok(0);
    }

    let mut pool_order: Vec<usize> = (0..candidates.len()).collect();
    pool_order.sort_by_key(|&i| candidates[i].id);

    let mut swaps = 0;
    for _ in 0..max_rounds {
        control.ensure_active()?;
        let members: Vec<&Candidate> = selections.iter().map(|s| &candidates[s.index]).collect();
        let current = average_pairwise_weight(&members);
        let covered = covered_skills(&members, requested);

        let mut best: Option<(f64, usize, usize)> = None;
        for (position, selection) in selections.iter().enumerate() {
            for &replacement in &pool_order {
                if !available[replacement] {
                    continue;
                }
                let incoming = &candidates[replacement];
                if !incoming.has_skill(&selection.added_for_skill) {
                    continue;
                }

                let mut trial = members.clone();
                trial[position] = incoming;
                if !covered_skills(&trial, requested).is_superset(&covered) {
                    continue;
                }

                let gain = average_pairwise_weight(&trial) - current;
                let improves = match best {
                    None => gain > GAIN_EPSILON,
                    Some((best_gain, _, _)) => gain > best_gain + GAIN_EPSILON,
                };
                if improves {
                    best = Some((gain, position, replacement));
                }
            }
        }

        let Some((gain, position, replacement)) = best else {
            break;
        };

        let outgoing = selections[position].index;
        debug!(
            "COT 交换: {} -> {} (平均合作强度提升 {:.4})",
            candidates[outgoing].id, candidates[replacement].id, gain
        );
        available[outgoing] = true;
        available[replacement] = false;
        selections[position].index = replacement;
        swaps += 1;
    }

    Ok(swaps)
}
