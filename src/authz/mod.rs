// Authorization grants for treasury contracts
//
// A treasury pre-authorizes a set of contracts to be executed on behalf of
// its users. The grant is a `ContractExecutionAuthorization` with one
// `ContractGrant` per contract, each carrying at most one limit record and an
// allow-all-messages filter.

pub mod proto;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{Address, Coin};
use prost::Message;
use prost_types::Any;
use serde::{Deserialize, Serialize};

use proto::{
    AllowAllMessagesFilter, BasicAllowance, CombinedLimit, ContractExecutionAuthorization,
    ContractGrant, MaxCallsLimit, MaxFundsLimit, ProtoCoin,
};

pub const CONTRACT_EXECUTION_AUTHORIZATION_TYPE_URL: &str =
    "/cosmwasm.wasm.v1.ContractExecutionAuthorization";
pub const MAX_CALLS_LIMIT_TYPE_URL: &str = "/cosmwasm.wasm.v1.MaxCallsLimit";
pub const MAX_FUNDS_LIMIT_TYPE_URL: &str = "/cosmwasm.wasm.v1.MaxFundsLimit";
pub const COMBINED_LIMIT_TYPE_URL: &str = "/cosmwasm.wasm.v1.CombinedLimit";
pub const ALLOW_ALL_MESSAGES_FILTER_TYPE_URL: &str = "/cosmwasm.wasm.v1.AllowAllMessagesFilter";
pub const BASIC_ALLOWANCE_TYPE_URL: &str = "/cosmos.feegrant.v1beta1.BasicAllowance";

/// The single limit attached to each contract grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantLimit {
    MaxCalls(u64),
    MaxFunds(Vec<Coin>),
    Combined { calls: u64, amounts: Vec<Coin> },
}

impl GrantLimit {
    /// Pick the wire limit for the requested caps, `None` if unrestricted
    pub fn from_caps(max_calls: Option<u64>, max_amount: Option<&Coin>) -> Option<Self> {
        match (max_calls, max_amount) {
            (Some(calls), Some(amount)) => Some(GrantLimit::Combined {
                calls,
                amounts: vec![amount.clone()],
            }),
            (Some(calls), None) => Some(GrantLimit::MaxCalls(calls)),
            (None, Some(amount)) => Some(GrantLimit::MaxFunds(vec![amount.clone()])),
            (None, None) => None,
        }
    }

    pub fn type_url(&self) -> &'static str {
        match self {
            GrantLimit::MaxCalls(_) => MAX_CALLS_LIMIT_TYPE_URL,
            GrantLimit::MaxFunds(_) => MAX_FUNDS_LIMIT_TYPE_URL,
            GrantLimit::Combined { .. } => COMBINED_LIMIT_TYPE_URL,
        }
    }

    fn to_any(&self) -> Any {
        let value = match self {
            GrantLimit::MaxCalls(remaining) => MaxCallsLimit {
                remaining: *remaining,
            }
            .encode_to_vec(),
            GrantLimit::MaxFunds(amounts) => MaxFundsLimit {
                amounts: to_proto_coins(amounts),
            }
            .encode_to_vec(),
            GrantLimit::Combined { calls, amounts } => CombinedLimit {
                calls_remaining: *calls,
                amounts: to_proto_coins(amounts),
            }
            .encode_to_vec(),
        };
        Any {
            type_url: self.type_url().to_string(),
            value,
        }
    }
}

/// Execution permission for an ordered set of contracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    contracts: Vec<Address>,
    limit: Option<GrantLimit>,
}

impl AuthorizationGrant {
    /// Duplicate addresses are dropped, keeping the first occurrence
    pub fn new<I>(contracts: I, max_calls: Option<u64>, max_amount: Option<&Coin>) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        let mut unique: Vec<Address> = Vec::new();
        for address in contracts {
            if !unique.contains(&address) {
                unique.push(address);
            }
        }
        Self {
            contracts: unique,
            limit: GrantLimit::from_caps(max_calls, max_amount),
        }
    }

    pub fn contracts(&self) -> &[Address] {
        &self.contracts
    }

    pub fn limit(&self) -> Option<&GrantLimit> {
        self.limit.as_ref()
    }

    pub fn to_proto(&self) -> ContractExecutionAuthorization {
        let limit = self.limit.as_ref().map(GrantLimit::to_any);
        let filter = Any {
            type_url: ALLOW_ALL_MESSAGES_FILTER_TYPE_URL.to_string(),
            value: AllowAllMessagesFilter {}.encode_to_vec(),
        };

        ContractExecutionAuthorization {
            grants: self
                .contracts
                .iter()
                .map(|contract| ContractGrant {
                    contract: contract.to_string(),
                    limit: limit.clone(),
                    filter: Some(filter.clone()),
                })
                .collect(),
        }
    }

    /// Binary protobuf encoding
    pub fn encode(&self) -> Vec<u8> {
        self.to_proto().encode_to_vec()
    }

    /// Type URL and base64 value, as embedded in JSON init messages
    pub fn to_encoded_any(&self) -> EncodedAny {
        EncodedAny::new(CONTRACT_EXECUTION_AUTHORIZATION_TYPE_URL, &self.encode())
    }
}

/// `google.protobuf.Any` in the JSON shape contracts accept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAny {
    pub type_url: String,
    /// Base64 of the binary message
    pub value: String,
}

impl EncodedAny {
    pub fn new(type_url: &str, value: &[u8]) -> Self {
        Self {
            type_url: type_url.to_string(),
            value: STANDARD.encode(value),
        }
    }

    pub fn decode_value(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.value)
    }
}

/// Encode an execution grant over `contract_addresses`
pub fn encode(
    contract_addresses: &[Address],
    max_calls: Option<u64>,
    max_amount: Option<&Coin>,
) -> Vec<u8> {
    AuthorizationGrant::new(contract_addresses.iter().cloned(), max_calls, max_amount).encode()
}

/// Encode a fee allowance capped at `spend_limit`, with no expiration
pub fn encode_basic_allowance(spend_limit: &[Coin]) -> Vec<u8> {
    BasicAllowance {
        spend_limit: to_proto_coins(spend_limit),
        expiration: None,
    }
    .encode_to_vec()
}

/// Decode a previously encoded execution grant
pub fn decode_authorization(
    bytes: &[u8],
) -> Result<ContractExecutionAuthorization, prost::DecodeError> {
    ContractExecutionAuthorization::decode(bytes)
}

fn to_proto_coins(coins: &[Coin]) -> Vec<ProtoCoin> {
    coins
        .iter()
        .map(|coin| ProtoCoin {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        })
        .collect()
}
