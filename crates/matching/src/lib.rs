pub mod aggregator;
pub mod builder;
pub mod cohesion;
pub mod scoring;
pub mod strategies;

pub use aggregator::aggregate;
pub use builder::{BuildControl, NoopControl, Selection, TeamBuilder};
pub use scoring::{CandidateScore, PoolStats, ScoringContext, ScoringWeights};
pub use strategies::{
    CohesionPolicy, PrioritizedPolicy, RecencyWindow, ScoringPolicy, StrategySet, WeightedPolicy,
};
