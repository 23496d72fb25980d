pub mod traits;
pub mod ethereum_client;
pub mod indexer_client;
pub mod guard_contract;

pub use traits::{ChainReader, DelegationStore, IndexerReader};
pub use ethereum_client::EthereumClient;
pub use indexer_client::IndexerClient;
pub use guard_contract::GuardContract;
