pub mod cleanup_service;
pub mod orchestrator;
pub mod poller;
pub mod progress;
pub mod runner;
pub mod task_store;
pub mod worker_pool;

pub use cleanup_service::{CleanupService, CleanupStats};
pub use orchestrator::{OrchestratorSettings, TaskOrchestrator};
pub use poller::{PollOutcome, PollerConfig, TaskPoller, TaskStatusSource};
pub use progress::ProgressTracker;
pub use runner::TaskRunner;
pub use task_store::TaskStore;
pub use worker_pool::WorkerPool;
