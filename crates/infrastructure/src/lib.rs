pub mod candidate_repository;
pub mod timeout_handler;

pub use candidate_repository::{InMemoryCandidateRepository, JsonFileCandidateRepository};
pub use timeout_handler::{TimeoutCandidateRepository, TimeoutConfig, TimeoutHandler};
