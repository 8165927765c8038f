pub mod api_observability;
pub mod app_config;
pub mod orchestrator;
pub mod strategies;

pub use api_observability::*;
pub use app_config::*;
pub use orchestrator::*;
pub use strategies::*;
