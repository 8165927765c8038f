use teamform_domain::{Algorithm, Summary, SummaryWarning, Team};

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// 汇总团队组建结果
pub fn aggregate(
    teams: &[Team],
    requested: &[String],
    algorithm: Algorithm,
    teams_requested: usize,
) -> Summary {
    let total_teams = teams.len();
    let complete_teams = teams.iter().filter(|t| t.is_complete()).count();
    let total_members: usize = teams.iter().map(|t| t.members.len()).sum();
    let total_completeness: f64 = teams.iter().map(|t| t.completeness).sum();

    let (average_team_size, average_completeness) = if total_teams == 0 {
        (0.0, 0.0)
    } else {
        (
            round_to(total_members as f64 / total_teams as f64, 2),
            round_to(total_completeness / total_teams as f64, 2),
        )
    };
    let success_rate = if teams_requested == 0 {
        0.0
    } else {
        round_to(complete_teams as f64 / teams_requested as f64 * 100.0, 1)
    };

    let mut warnings: Vec<SummaryWarning> = teams
        .iter()
        .filter(|t| !t.is_complete())
        .map(|t| SummaryWarning::InsufficientCoverage {
            team_number: t.team_number,
            missing_skills: t.missing_skills(),
        })
        .collect();
    if total_teams < teams_requested {
        warnings.push(SummaryWarning::FewerTeamsThanRequested {
            requested: teams_requested,
            formed: total_teams,
        });
    }

    Summary {
        requested_skills: requested.to_vec(),
        algorithm,
        algorithm_name: algorithm.name().to_string(),
        total_teams,
        complete_teams,
        incomplete_teams: total_teams - complete_teams,
        total_members,
        average_team_size,
        average_completeness,
        success_rate,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamform_domain::{Candidate, TeamMember};

    fn member(id: u64, skills: &[&str]) -> TeamMember {
        let mut c = Candidate::new(id, format!("c{id}"));
        c.skills = skills.iter().map(|s| s.to_string()).collect();
        TeamMember::from_candidate(&c, skills[0])
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aggregate_mixed_teams() {
        let requested = strings(&["ml", "nlp"]);
        let teams = vec![
            Team::new(1, vec![member(1, &["ml"]), member(2, &["nlp"])], &requested),
            Team::new(2, vec![member(3, &["ml"])], &requested),
        ];

        let summary = aggregate(&teams, &requested, Algorithm::Cat, 3);

        assert_eq!(summary.total_teams, 2);
        assert_eq!(summary.complete_teams, 1);
        assert_eq!(summary.incomplete_teams, 1);
        assert_eq!(summary.total_members, 3);
        assert_eq!(summary.average_team_size, 1.5);
        assert_eq!(summary.average_completeness, 0.75);
        assert_eq!(summary.success_rate, 33.3);
        assert_eq!(summary.algorithm_name, Algorithm::Cat.name());
        assert_eq!(
            summary.warnings,
            vec![
                SummaryWarning::InsufficientCoverage {
                    team_number: 2,
                    missing_skills: strings(&["nlp"]),
                },
                SummaryWarning::FewerTeamsThanRequested {
                    requested: 3,
                    formed: 2,
                },
            ]
        );
    }

    #[test]
    fn test_aggregate_empty() {
        let requested = strings(&["ml"]);
        let summary = aggregate(&[], &requested, Algorithm::Acet, 1);
        assert_eq!(summary.total_teams, 0);
        assert_eq!(summary.average_team_size, 0.0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.warnings.len(), 1);
    }
}
