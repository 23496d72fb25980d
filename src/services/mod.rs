pub mod risk_engine;
pub mod delegation_manager;
pub mod local_store;

pub use risk_engine::RiskEngine;
pub use delegation_manager::DelegationManager;
pub use local_store::LocalDelegationStore;
