// Contract existence queries
//
// The salt scans need to know whether a contract already lives at a
// predicted address. The chain's REST gateway answers that through the
// contract-info endpoint.

mod mock;

pub use mock::MockOracle;

use std::time::Duration;

use async_trait::async_trait;
use common::{Address, OracleError};
use log::debug;
use reqwest::{Client, StatusCode};

/// Default timeout for a single contract-info request
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers "does a contract exist at this address"
#[async_trait]
pub trait ExistenceOracle: Send + Sync {
    async fn exists(&self, address: &Address) -> Result<bool, OracleError>;
}

/// Oracle backed by the cosmwasm REST contract-info endpoint
pub struct HttpExistenceOracle {
    rest_url: String,
    client: Client,
}

impl HttpExistenceOracle {
    /// Create a new oracle against a REST gateway
    pub fn new(rest_url: &str) -> Result<Self, OracleError> {
        Self::with_timeout(rest_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(rest_url: &str, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            rest_url: rest_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// URL of the contract-info query for an address
    pub fn contract_info_url(&self, address: &Address) -> String {
        format!("{}/cosmwasm/wasm/v1/contract/{}", self.rest_url, address)
    }
}

#[async_trait]
impl ExistenceOracle for HttpExistenceOracle {
    async fn exists(&self, address: &Address) -> Result<bool, OracleError> {
        let url = self.contract_info_url(address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(format!("{url}: {e}")))?;

        let status = response.status();
        debug!("contract-info {} -> {}", address, status);

        // Anything but 200 means "not there", including 404 and 500 for unknown contracts
        Ok(status == StatusCode::OK)
    }
}
