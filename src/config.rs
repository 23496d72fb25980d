use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub blockchain: BlockchainSettings,
    pub delegation: DelegationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

impl ApiSettings {
    /// Socket address the server binds, built from the configured host/port.
    pub fn bind_addr(&self) -> Result<SocketAddr, config::ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            config::ConfigError::Message(format!("API_HOST is not a valid IP address: {}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainSettings {
    pub rpc_url: String,
    pub indexer_url: String,
    /// Address of the deployed SmartGuard delegation contract.
    pub guard_contract_address: String,
    /// Private key used to sign delegation writes. Read-only mode when absent.
    pub operator_private_key: Option<String>,
    pub rpc_timeout_seconds: u64,
    pub read_retry_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationSettings {
    /// Shortest delegation window accepted, in seconds.
    pub min_duration_seconds: u64,
    /// Longest delegation window accepted, in seconds.
    pub max_duration_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings::default(),
            blockchain: BlockchainSettings::default(),
            delegation: DelegationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for BlockchainSettings {
    fn default() -> Self {
        BlockchainSettings {
            rpc_url: "http://localhost:8545".to_string(),
            indexer_url: "http://localhost:8545".to_string(),
            guard_contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            operator_private_key: None,
            rpc_timeout_seconds: 10,
            read_retry_attempts: 3,
        }
    }
}

impl Default for DelegationSettings {
    fn default() -> Self {
        DelegationSettings {
            min_duration_seconds: 3_600,          // 1 hour
            max_duration_seconds: 30 * 86_400,    // 30 days
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let _settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        Ok(Settings {
            api: ApiSettings {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            blockchain: BlockchainSettings {
                rpc_url: env::var("RPC_URL")
                    .unwrap_or_else(|_| "http://localhost:8545".to_string()),
                indexer_url: env::var("INDEXER_URL")
                    .unwrap_or_else(|_| "http://localhost:8545".to_string()),
                guard_contract_address: env::var("GUARD_CONTRACT_ADDRESS")
                    .unwrap_or_else(|_| "0x0000000000000000000000000000000000000000".to_string()),
                operator_private_key: env::var("OPERATOR_PRIVATE_KEY").ok(),
                rpc_timeout_seconds: env::var("RPC_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                read_retry_attempts: env::var("READ_RETRY_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
            },
            delegation: DelegationSettings {
                min_duration_seconds: env::var("DELEGATION_MIN_DURATION_SECONDS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3_600),
                max_duration_seconds: env::var("DELEGATION_MAX_DURATION_SECONDS")
                    .unwrap_or_else(|_| "2592000".to_string())
                    .parse()
                    .unwrap_or(30 * 86_400),
            },
            logging: LoggingSettings {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
