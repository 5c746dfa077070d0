// Transaction messages and contract init payloads
//
// Each contract kind has its own typed init message. The planner turns them
// into JSON bytes through `build_init_payload` and wraps them in
// instantiate2 / execute messages that an external signer can broadcast.

use common::Coin;
use serde::{Deserialize, Serialize};

use crate::authz::EncodedAny;

pub const MSG_INSTANTIATE_CONTRACT2_TYPE_URL: &str = "/cosmwasm.wasm.v1.MsgInstantiateContract2";
pub const MSG_EXECUTE_CONTRACT_TYPE_URL: &str = "/cosmwasm.wasm.v1.MsgExecuteContract";

/// Kinds of contracts the planner knows how to deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    UserMap,
    Treasury,
    Rum,
}

impl ContractKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::UserMap => "user_map",
            ContractKind::Treasury => "treasury",
            ContractKind::Rum => "rum",
        }
    }
}

/// User map contract, instantiated with an empty message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMapInit {}

/// Reclaim verifier contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RumInit {
    /// Claim field the contract extracts from proofs
    pub claim_key: String,

    /// Reclaim verification contract the proofs are checked against
    pub verification_addr: String,
}

/// One authorization a treasury offers to its users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantConfig {
    pub description: String,
    pub authorization: EncodedAny,
    pub optional: bool,
}

/// Fee allowance a treasury offers to its users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    pub description: String,
    pub allowance: Option<EncodedAny>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryParams {
    pub redirect_url: String,
    pub icon_url: String,
    pub metadata: String,
}

/// Treasury contract init message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryInit {
    pub admin: Option<String>,
    /// Type URLs of `grant_configs`, in the same order
    pub type_urls: Vec<String>,
    pub grant_configs: Vec<GrantConfig>,
    pub fee_config: FeeConfig,
    pub params: TreasuryParams,
}

/// Init configuration tagged by contract kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractInit {
    UserMap(UserMapInit),
    Treasury(TreasuryInit),
    Rum(RumInit),
}

impl ContractInit {
    pub fn kind(&self) -> ContractKind {
        match self {
            ContractInit::UserMap(_) => ContractKind::UserMap,
            ContractInit::Treasury(_) => ContractKind::Treasury,
            ContractInit::Rum(_) => ContractKind::Rum,
        }
    }
}

/// JSON bytes of a contract's init message
pub fn build_init_payload(init: &ContractInit) -> Result<Vec<u8>, serde_json::Error> {
    match init {
        ContractInit::UserMap(msg) => serde_json::to_vec(msg),
        ContractInit::Treasury(msg) => serde_json::to_vec(msg),
        ContractInit::Rum(msg) => serde_json::to_vec(msg),
    }
}

/// Execute message asking the faucet to fund an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaucetExecuteMsg {
    Faucet { receiver: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgInstantiateContract2 {
    pub sender: String,
    pub admin: String,
    pub code_id: u64,
    pub label: String,
    #[serde(with = "base64_bytes")]
    pub msg: Vec<u8>,
    pub funds: Vec<Coin>,
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    pub fix_msg: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MsgExecuteContract {
    pub sender: String,
    pub contract: String,
    #[serde(with = "base64_bytes")]
    pub msg: Vec<u8>,
    pub funds: Vec<Coin>,
}

/// A message of the deployment transaction, `{typeUrl, value}` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "typeUrl", content = "value")]
pub enum DeployMessage {
    #[serde(rename = "/cosmwasm.wasm.v1.MsgInstantiateContract2")]
    Instantiate2(MsgInstantiateContract2),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgExecuteContract")]
    Execute(MsgExecuteContract),
}

impl DeployMessage {
    pub fn type_url(&self) -> &'static str {
        match self {
            DeployMessage::Instantiate2(_) => MSG_INSTANTIATE_CONTRACT2_TYPE_URL,
            DeployMessage::Execute(_) => MSG_EXECUTE_CONTRACT_TYPE_URL,
        }
    }

    pub fn as_instantiate(&self) -> Option<&MsgInstantiateContract2> {
        match self {
            DeployMessage::Instantiate2(msg) => Some(msg),
            DeployMessage::Execute(_) => None,
        }
    }

    pub fn as_execute(&self) -> Option<&MsgExecuteContract> {
        match self {
            DeployMessage::Execute(msg) => Some(msg),
            DeployMessage::Instantiate2(_) => None,
        }
    }

    /// Inner contract message parsed back to JSON
    pub fn msg_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let bytes = match self {
            DeployMessage::Instantiate2(msg) => &msg.msg,
            DeployMessage::Execute(msg) => &msg.msg,
        };
        serde_json::from_slice(bytes)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }
}
