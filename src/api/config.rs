// Configuration for deployment planning
//
// Every chain-specific constant the planner relies on lives here so it can be
// loaded from a JSON file rather than compiled in.

use std::fs;
use std::path::Path;

use anyhow::Result;
use common::{Address, Checksum, Coin, DeployError, Salt};
use serde::{Deserialize, Serialize};

use crate::planner::ContractKind;

/// Network endpoints and address format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bech32 prefix of account and contract addresses
    pub address_prefix: String,

    /// REST gateway used for contract-info queries
    pub rest_url: String,

    /// Fee denomination
    pub denom: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address_prefix: "xion".to_string(),
            rest_url: "https://api.xion-testnet-2.burnt.com".to_string(),
            denom: "uxion".to_string(),
        }
    }
}

/// Uploaded code for one contract kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInfo {
    pub code_id: u64,

    /// Hex SHA-256 of the wasm blob
    pub checksum: String,
}

/// Uploaded code per contract kind, absent until configured
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractCodes {
    pub user_map: Option<CodeInfo>,
    pub treasury: Option<CodeInfo>,
    pub rum: Option<CodeInfo>,
}

/// Salt conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltConfig {
    /// Salt of the primary contract in a single deployment
    pub single_salt: String,

    /// Base salt of contracts sharing a treasury
    pub base_salt: String,

    /// Well-known salt of the shared treasury
    pub treasury_salt: String,

    /// Upper bound on oracle queries per allocation
    pub max_probes: Option<u32>,
}

impl Default for SaltConfig {
    fn default() -> Self {
        Self {
            single_salt: "xion-rocks".to_string(),
            base_salt: "rum-contract".to_string(),
            treasury_salt: "shared-treasury".to_string(),
            max_probes: None,
        }
    }
}

/// Ceilings for shared treasuries and the grants they hand out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Contracts a shared treasury may cover
    pub max_contracts: u32,

    /// Extra slots pre-authorized for future contracts
    pub future_slots: u32,

    /// Call counter attached to each contract grant
    pub grant_max_calls: Option<u64>,

    /// Funds cap attached to each contract grant
    pub grant_max_amount: Option<Coin>,

    /// Fee allowance a treasury grants to its users
    pub fee_allowance: Option<Coin>,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_contracts: 15,
            future_slots: 5,
            grant_max_calls: None,
            grant_max_amount: None,
            fee_allowance: Some(Coin::new(1_000_000, "uxion")),
        }
    }
}

/// Display parameters of a treasury
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasuryConfig {
    /// Where wallets send users back after granting
    pub redirect_url: String,

    pub icon_url: String,

    pub metadata: String,

    /// Description shown for the execution grant
    pub grant_description: String,

    /// Description shown for the fee allowance
    pub fee_description: String,
}

impl Default for TreasuryConfig {
    fn default() -> Self {
        Self {
            redirect_url: "https://xion.burnt.com".to_string(),
            icon_url: String::new(),
            metadata: "{}".to_string(),
            grant_description: "Allow execution of deployed contracts".to_string(),
            fee_description: "Gas allowance for contract execution".to_string(),
        }
    }
}

/// Complete planner configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub network: NetworkConfig,
    pub contracts: ContractCodes,
    pub salts: SaltConfig,
    pub limits: LimitConfig,
    pub treasury: TreasuryConfig,

    /// Contract that funds new treasuries
    pub faucet_address: Option<String>,
}

impl DeployConfig {
    /// Code id and checksum for a contract kind
    pub fn code(&self, kind: ContractKind) -> Result<(u64, Checksum), DeployError> {
        let info = match kind {
            ContractKind::UserMap => self.contracts.user_map.as_ref(),
            ContractKind::Treasury => self.contracts.treasury.as_ref(),
            ContractKind::Rum => self.contracts.rum.as_ref(),
        }
        .ok_or_else(|| DeployError::ConfigurationMissing(format!("{} code", kind.name())))?;

        let checksum = Checksum::from_hex(&info.checksum)?;
        Ok((info.code_id, checksum))
    }

    pub fn faucet(&self) -> Result<Address, DeployError> {
        let raw = self
            .faucet_address
            .as_deref()
            .ok_or_else(|| DeployError::ConfigurationMissing("faucet_address".to_string()))?;
        let faucet = Address::parse(raw)
            .and_then(|address| {
                address.ensure_prefix(&self.network.address_prefix)?;
                Ok(address)
            })
            .map_err(|e| DeployError::ConfigurationMissing(format!("faucet_address ({e})")))?;
        Ok(faucet)
    }

    pub fn fee_allowance(&self) -> Result<&Coin, DeployError> {
        self.limits
            .fee_allowance
            .as_ref()
            .ok_or_else(|| DeployError::ConfigurationMissing("fee_allowance".to_string()))
    }

    pub fn single_salt(&self) -> Result<Salt, DeployError> {
        Ok(Salt::new(self.salts.single_salt.as_str())?)
    }

    pub fn treasury_salt(&self) -> Result<Salt, DeployError> {
        Ok(Salt::new(self.salts.treasury_salt.as_str())?)
    }
}

/// Configuration manager for deployment planning
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<DeployConfig> {
        let config_str = fs::read_to_string(path)?;
        let config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(config: &DeployConfig, path: P) -> Result<()> {
        let config_str = serde_json::to_string_pretty(config)?;
        fs::write(path, config_str)?;
        Ok(())
    }

    /// Create a builder for configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for creating configurations
#[derive(Default)]
pub struct ConfigBuilder {
    config: DeployConfig,
}

impl ConfigBuilder {
    pub fn address_prefix(mut self, value: &str) -> Self {
        self.config.network.address_prefix = value.to_string();
        self
    }

    pub fn rest_url(mut self, value: &str) -> Self {
        self.config.network.rest_url = value.to_string();
        self
    }

    /// Register uploaded code for a contract kind
    pub fn code(mut self, kind: ContractKind, code_id: u64, checksum: &str) -> Self {
        let info = Some(CodeInfo {
            code_id,
            checksum: checksum.to_string(),
        });
        match kind {
            ContractKind::UserMap => self.config.contracts.user_map = info,
            ContractKind::Treasury => self.config.contracts.treasury = info,
            ContractKind::Rum => self.config.contracts.rum = info,
        }
        self
    }

    pub fn single_salt(mut self, value: &str) -> Self {
        self.config.salts.single_salt = value.to_string();
        self
    }

    pub fn base_salt(mut self, value: &str) -> Self {
        self.config.salts.base_salt = value.to_string();
        self
    }

    pub fn treasury_salt(mut self, value: &str) -> Self {
        self.config.salts.treasury_salt = value.to_string();
        self
    }

    pub fn max_probes(mut self, value: u32) -> Self {
        self.config.salts.max_probes = Some(value);
        self
    }

    pub fn max_contracts(mut self, value: u32) -> Self {
        self.config.limits.max_contracts = value;
        self
    }

    pub fn future_slots(mut self, value: u32) -> Self {
        self.config.limits.future_slots = value;
        self
    }

    pub fn grant_max_calls(mut self, value: Option<u64>) -> Self {
        self.config.limits.grant_max_calls = value;
        self
    }

    pub fn grant_max_amount(mut self, value: Option<Coin>) -> Self {
        self.config.limits.grant_max_amount = value;
        self
    }

    pub fn fee_allowance(mut self, value: Option<Coin>) -> Self {
        self.config.limits.fee_allowance = value;
        self
    }

    pub fn faucet_address(mut self, value: &str) -> Self {
        self.config.faucet_address = Some(value.to_string());
        self
    }

    pub fn redirect_url(mut self, value: &str) -> Self {
        self.config.treasury.redirect_url = value.to_string();
        self
    }

    /// Build the configuration
    pub fn build(self) -> DeployConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CHECKSUM: &str = "13a1fc994cc6d1c81b746ee0c0ff6f90043875e0bf1d9be6b7d779fc978dc2a5";

    #[test]
    fn test_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.network.address_prefix, "xion");
        assert_eq!(config.limits.max_contracts, 15);
        assert_eq!(config.limits.future_slots, 5);
        assert_eq!(config.salts.single_salt, "xion-rocks");
        assert!(config.faucet_address.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigManager::builder()
            .code(ContractKind::Treasury, 7, CHECKSUM)
            .max_contracts(10)
            .future_slots(2)
            .build();

        assert_eq!(config.limits.max_contracts, 10);
        assert_eq!(config.limits.future_slots, 2);
        let (code_id, checksum) = config.code(ContractKind::Treasury).unwrap();
        assert_eq!(code_id, 7);
        assert_eq!(checksum.to_hex(), CHECKSUM);
    }

    #[test]
    fn test_missing_values_are_reported() {
        let config = DeployConfig::default();
        assert_eq!(
            config.code(ContractKind::Rum),
            Err(DeployError::ConfigurationMissing("rum code".to_string()))
        );
        assert_eq!(
            config.faucet(),
            Err(DeployError::ConfigurationMissing("faucet_address".to_string()))
        );

        let bad = ConfigManager::builder()
            .code(ContractKind::UserMap, 1, "abcd")
            .build();
        assert!(matches!(
            bad.code(ContractKind::UserMap),
            Err(DeployError::InvalidChecksum(_))
        ));
    }

    #[test]
    fn test_faucet_must_match_network_prefix() {
        let config = ConfigManager::builder()
            .faucet_address("osmo1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5helwsw")
            .build();
        assert!(matches!(
            config.faucet(),
            Err(DeployError::ConfigurationMissing(msg)) if msg.contains("expected prefix `xion`")
        ));

        let config = ConfigManager::builder()
            .faucet_address("xion1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5atkush")
            .build();
        assert_eq!(config.faucet().unwrap().prefix(), "xion");
    }

    #[test]
    fn test_config_save_load() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("deploy.json");

        let config = ConfigManager::builder()
            .code(ContractKind::Rum, 3, CHECKSUM)
            .faucet_address("xion1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5atkush")
            .grant_max_calls(Some(100))
            .build();

        ConfigManager::save_to_file(&config, &file_path)?;
        let loaded_config = ConfigManager::load_from_file(&file_path)?;

        assert_eq!(loaded_config, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("partial.json");
        fs::write(&file_path, r#"{"network": {"address_prefix": "purple"}}"#)?;

        let config = ConfigManager::load_from_file(&file_path)?;
        assert_eq!(config.network.address_prefix, "purple");
        assert_eq!(config.network.denom, "uxion");
        assert_eq!(config.limits.max_contracts, 15);
        Ok(())
    }
}
