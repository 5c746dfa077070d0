//! Deterministic contract deployment planning for wasmd chains
//!
//! Contract addresses are predicted with the instantiate2 rule before the
//! contracts exist, which lets a single transaction instantiate contracts,
//! a treasury authorizing them, and the request funding that treasury.

pub mod address;
pub mod api;
pub mod authz;
pub mod oracle;
pub mod planner;
pub mod salt;

pub use address::AddressPredictor;
pub use api::{ConfigManager, DeployConfig};
pub use common::{
    Address, AddressError, Checksum, Coin, ContractRole, DeployError, OracleError, PlanError,
    Salt,
};
pub use oracle::{ExistenceOracle, HttpExistenceOracle, MockOracle};
pub use planner::{DeploymentPlan, DeploymentPlanner, MultiDeploymentPlan};
pub use salt::{format_salt, parse_index, DeploymentRecord, SaltReservations, SaltScan};
