pub mod health;
pub mod risk;
pub mod delegations;

pub use health::health_check;
pub use risk::create_risk_routes;
pub use delegations::create_delegation_routes;
