use thiserror::Error;

use crate::types::ContractRole;

/// Failures of the pure address computations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid creator address: {0}")]
    InvalidCreator(String),
    #[error("salt must be 1 to 64 bytes, got {0}")]
    InvalidSaltLength(usize),
    #[error("invalid code checksum: {0}")]
    InvalidChecksum(String),
}

/// Failures reaching the chain while probing for contracts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("existence oracle unavailable: {0}")]
    Unavailable(String),
}

/// Error taxonomy surfaced to callers of the deployment core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("invalid creator address: {0}")]
    InvalidCreatorAddress(String),
    #[error("salt must be 1 to 64 bytes, got {0}")]
    InvalidSaltLength(usize),
    #[error("invalid code checksum: {0}")]
    InvalidChecksum(String),
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),
    #[error("missing configuration value: {0}")]
    ConfigurationMissing(String),
    #[error("no free salt for base `{base}` after probing {probed} indices")]
    NoFreeSaltFound { base: String, probed: u32 },
    #[error("contract init message could not be serialized: {0}")]
    InvalidInitPayload(String),
    #[error("salt `{salt}` does not follow the index convention for base `{base}`")]
    AmbiguousSaltFormat { salt: String, base: String },
}

impl From<AddressError> for DeployError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::InvalidCreator(addr) => DeployError::InvalidCreatorAddress(addr),
            AddressError::InvalidSaltLength(len) => DeployError::InvalidSaltLength(len),
            AddressError::InvalidChecksum(msg) => DeployError::InvalidChecksum(msg),
        }
    }
}

impl From<OracleError> for DeployError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Unavailable(msg) => DeployError::OracleUnavailable(msg),
        }
    }
}

/// A planning failure tagged with the contract role being processed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("while planning {role}: {source}")]
pub struct PlanError {
    pub role: ContractRole,
    #[source]
    pub source: DeployError,
}

impl PlanError {
    pub fn new(role: ContractRole, source: impl Into<DeployError>) -> Self {
        Self {
            role,
            source: source.into(),
        }
    }
}
