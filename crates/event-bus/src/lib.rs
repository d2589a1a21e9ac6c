//! Event Bus (component I): internal pub/sub of orchestrator domain
//! events over `tokio::sync::broadcast`.

pub mod bus;
pub mod event;

pub use bus::EventBus;
pub use event::OrchestratorEvent;
