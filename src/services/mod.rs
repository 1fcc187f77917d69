pub mod container;
pub mod engine;

pub use container::{Container, Inject};
pub use engine::{AuthEngine, EngineError, EngineHandle, InMemoryEngine};
