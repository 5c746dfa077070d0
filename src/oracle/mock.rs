use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use common::{Address, OracleError};

use super::ExistenceOracle;

/// In-memory oracle for tests and offline planning
///
/// Records every probed address so callers can assert on the probe order.
#[derive(Default)]
pub struct MockOracle {
    existing: HashSet<Address>,
    unavailable: bool,
    probes: Mutex<Vec<Address>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle reporting the given addresses as deployed
    pub fn with_existing<I: IntoIterator<Item = Address>>(addresses: I) -> Self {
        Self {
            existing: addresses.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Oracle failing every query, as an unreachable endpoint would
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn insert(&mut self, address: Address) {
        self.existing.insert(address);
    }

    /// Addresses queried so far, in order
    pub fn probes(&self) -> Vec<Address> {
        self.probes.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ExistenceOracle for MockOracle {
    async fn exists(&self, address: &Address) -> Result<bool, OracleError> {
        if let Ok(mut probes) = self.probes.lock() {
            probes.push(address.clone());
        }
        if self.unavailable {
            return Err(OracleError::Unavailable("mock oracle offline".to_string()));
        }
        Ok(self.existing.contains(address))
    }
}
