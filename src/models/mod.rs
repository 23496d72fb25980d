pub mod wallet;
pub mod risk;
pub mod delegation;

pub use wallet::*;
pub use risk::*;
pub use delegation::*;
