//! Test data builders for creating candidates and requests

use teamform_domain::{Candidate, CollaborationEdge, RequestLimits, SkillRequest};

/// Builder for creating test Candidate entities
pub struct CandidateBuilder {
    candidate: Candidate,
}

impl CandidateBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            candidate: Candidate::new(id, format!("Researcher {id}")),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.candidate.name = name.to_string();
        self
    }

    pub fn with_skills(mut self, skills: &[&str]) -> Self {
        self.candidate
            .skills
            .extend(skills.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_papers(mut self, paper_count: u32) -> Self {
        self.candidate.paper_count = paper_count;
        self
    }

    pub fn with_citations(mut self, citation_count: u64) -> Self {
        self.candidate.citation_count = citation_count;
        self
    }

    pub fn with_organizations(mut self, organizations: &[&str]) -> Self {
        self.candidate
            .organizations
            .extend(organizations.iter().map(|s| s.to_string()));
        self
    }

    pub fn collaborates_with(self, peer_id: u64, weight: f64) -> Self {
        self.collaborated_in(peer_id, weight, None)
    }

    pub fn collaborated_in(mut self, peer_id: u64, weight: f64, year: Option<i32>) -> Self {
        self.candidate.collaborations.push(CollaborationEdge {
            peer_id,
            weight,
            last_year: year,
        });
        self
    }

    pub fn active_in(mut self, year: i32) -> Self {
        self.candidate.last_active_year = Some(year);
        self
    }

    pub fn with_affinity(mut self, skill: &str, affinity: f64) -> Self {
        self.candidate
            .skill_affinity
            .insert(skill.to_string(), affinity);
        self
    }

    pub fn build(self) -> Candidate {
        self.candidate.normalized()
    }
}

/// Build a validated request with default limits
pub fn skill_request(skills: &[&str], team_size: usize, num_teams: usize) -> SkillRequest {
    prioritized_request(skills, team_size, num_teams, &[])
}

pub fn prioritized_request(
    skills: &[&str],
    team_size: usize,
    num_teams: usize,
    priorities: &[&str],
) -> SkillRequest {
    let keywords: Vec<String> = skills.iter().map(|s| s.to_string()).collect();
    let priorities: Vec<String> = priorities.iter().map(|s| s.to_string()).collect();
    match SkillRequest::new(
        &keywords,
        team_size,
        num_teams,
        &priorities,
        &RequestLimits::default(),
    ) {
        Ok(request) => request,
        Err(e) => panic!("invalid test request: {e}"),
    }
}

/// Ready-made candidate pools
pub struct CandidatePools;

impl CandidatePools {
    /// 两个 ml、一个 nlp，没有 optimization
    pub fn partial_coverage() -> Vec<Candidate> {
        vec![
            CandidateBuilder::new(1)
                .with_name("Alice")
                .with_skills(&["ml"])
                .with_papers(12)
                .with_citations(300)
                .collaborates_with(2, 2.0)
                .build(),
            CandidateBuilder::new(2)
                .with_name("Bob")
                .with_skills(&["nlp"])
                .with_papers(8)
                .with_citations(120)
                .collaborates_with(1, 2.0)
                .build(),
            CandidateBuilder::new(3)
                .with_name("Carol")
                .with_skills(&["ml"])
                .with_papers(5)
                .with_citations(40)
                .build(),
        ]
    }

    /// 带合作关系、机构和活跃年份的中等规模候选池
    pub fn research_group() -> Vec<Candidate> {
        vec![
            CandidateBuilder::new(10)
                .with_skills(&["ml", "optimization"])
                .with_papers(40)
                .with_citations(2000)
                .with_organizations(&["MIT"])
                .collaborated_in(11, 5.0, Some(2023))
                .collaborated_in(12, 1.0, Some(2015))
                .active_in(2024)
                .build(),
            CandidateBuilder::new(11)
                .with_skills(&["nlp"])
                .with_papers(25)
                .with_citations(800)
                .with_organizations(&["MIT"])
                .collaborated_in(10, 5.0, Some(2023))
                .active_in(2023)
                .build(),
            CandidateBuilder::new(12)
                .with_skills(&["databases"])
                .with_papers(60)
                .with_citations(3500)
                .with_organizations(&["CMU"])
                .collaborated_in(10, 1.0, Some(2015))
                .active_in(2012)
                .build(),
            CandidateBuilder::new(13)
                .with_skills(&["ml"])
                .with_papers(15)
                .with_citations(150)
                .with_organizations(&["Stanford"])
                .collaborated_in(14, 3.0, Some(2022))
                .active_in(2022)
                .build(),
            CandidateBuilder::new(14)
                .with_skills(&["nlp", "databases"])
                .with_papers(18)
                .with_citations(400)
                .with_organizations(&["Stanford"])
                .collaborated_in(13, 3.0, Some(2022))
                .collaborated_in(15, 2.0, Some(2020))
                .active_in(2024)
                .build(),
            CandidateBuilder::new(15)
                .with_skills(&["optimization"])
                .with_papers(9)
                .with_citations(90)
                .with_organizations(&["Stanford", "CMU"])
                .collaborated_in(14, 2.0, Some(2020))
                .active_in(2021)
                .build(),
            CandidateBuilder::new(16)
                .with_skills(&["ml", "nlp"])
                .with_papers(3)
                .with_citations(10)
                .active_in(2024)
                .build(),
            CandidateBuilder::new(17)
                .with_skills(&["vision"])
                .with_papers(30)
                .with_citations(1000)
                .build(),
        ]
    }

    /// 生成 `count` 个具备给定技能的候选人，id 从 `start_id` 开始连续编号
    pub fn uniform(start_id: u64, count: usize, skills: &[&str]) -> Vec<Candidate> {
        (0..count as u64)
            .map(|offset| {
                CandidateBuilder::new(start_id + offset)
                    .with_skills(skills)
                    .with_papers((offset % 7) as u32)
                    .with_citations(offset * 3)
                    .build()
            })
            .collect()
    }
}
