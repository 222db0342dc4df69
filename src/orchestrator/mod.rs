pub mod confirm;
pub mod mutation;
pub mod service;
pub mod store;

pub use confirm::{ConfirmPayload, Confirmation, SimulatedServer};
pub use mutation::{FailurePolicy, Mutation, MutationPhase, Outcome};
pub use service::CartOrchestrator;
pub use store::{CartStore, DEFAULT_STORE_KEY, FileStore, MemoryStore};
