pub mod error;
pub mod types;

pub use error::{AddressError, DeployError, OracleError, PlanError};
pub use types::{Address, Checksum, Coin, ContractRole, Salt, MAX_SALT_LEN};
