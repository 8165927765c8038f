pub mod app;
pub mod client;
pub mod shutdown;
