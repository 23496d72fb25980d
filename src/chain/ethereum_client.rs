use alloy::{
    primitives::{Address, Bytes, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use tokio::time::Duration;

use crate::chain::traits::ChainReader;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct EthereumClient {
    provider: RootProvider<Http<Client>>,
    rpc_url: String,
    read_retries: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum EthereumError {
    #[error("RPC connection failed: {0}")]
    RpcError(String),

    #[error("Max retries exceeded: {0}")]
    MaxRetriesExceeded(u32),
}

impl From<EthereumError> for AppError {
    fn from(err: EthereumError) -> Self {
        AppError::NetworkError(err.to_string())
    }
}

impl EthereumClient {
    /// Create a new client against the given RPC URL.
    pub fn new(rpc_url: &str, read_retries: u32) -> Result<Self, EthereumError> {
        let provider = ProviderBuilder::new().on_http(rpc_url.parse().map_err(|e| {
            EthereumError::RpcError(format!("Invalid RPC URL: {}", e))
        })?);

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
            read_retries: read_retries.max(1),
        })
    }

    /// Test the RPC connection by getting the latest block number.
    pub async fn test_connection(&self) -> Result<(), EthereumError> {
        match self.provider.get_block_number().await {
            Ok(block_number) => {
                tracing::info!(
                    rpc_url = %self.rpc_url,
                    block_number = %block_number,
                    "RPC connection established"
                );
                Ok(())
            }
            Err(e) => Err(EthereumError::RpcError(format!(
                "Failed to connect to RPC: {}",
                e
            ))),
        }
    }

    /// Run a read call with bounded retries and linear backoff. Writes never
    /// go through this path.
    async fn read_with_retry<F, Fut, T>(&self, op: &'static str, call_fn: F) -> Result<T, AppError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, alloy::transports::TransportError>>,
        T: Send,
    {
        let max_retries = self.read_retries;
        for attempt in 1..=max_retries {
            tracing::debug!(op, attempt, max_retries, "Attempting RPC read");

            match call_fn().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(op, attempt, max_retries, error = %e, "RPC read failed");

                    if attempt < max_retries {
                        let delay = Duration::from_millis(100 * attempt as u64);
                        tokio::time::sleep(delay).await;
                    } else {
                        return Err(AppError::NetworkError(format!(
                            "{} failed after {} attempts: {}",
                            op, max_retries, e
                        )));
                    }
                }
            }
        }

        Err(EthereumError::MaxRetriesExceeded(max_retries).into())
    }
}

#[async_trait]
impl ChainReader for EthereumClient {
    async fn get_balance(&self, address: Address) -> Result<U256, AppError> {
        self.read_with_retry("get_balance", || async {
            self.provider.get_balance(address).await
        })
        .await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<u64, AppError> {
        self.read_with_retry("get_transaction_count", || async {
            self.provider.get_transaction_count(address).await
        })
        .await
    }

    async fn get_code(&self, address: Address) -> Result<Bytes, AppError> {
        self.read_with_retry("get_code", || async {
            self.provider.get_code_at(address).await
        })
        .await
    }

    async fn get_block_number(&self) -> Result<u64, AppError> {
        self.read_with_retry("get_block_number", || async {
            self.provider.get_block_number().await
        })
        .await
    }

    async fn get_gas_price(&self) -> Result<u128, AppError> {
        self.read_with_retry("get_gas_price", || async {
            self.provider.get_gas_price().await
        })
        .await
    }
}
