// Protobuf messages of the cosmwasm authz and feegrant modules
//
// Only the fields the treasury grants use are declared. Field tags follow
// cosmwasm/wasm/v1/authz.proto and cosmos/feegrant/v1beta1/feegrant.proto.

use prost_types::{Any, Timestamp};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCoin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContractExecutionAuthorization {
    #[prost(message, repeated, tag = "1")]
    pub grants: Vec<ContractGrant>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContractGrant {
    #[prost(string, tag = "1")]
    pub contract: String,
    #[prost(message, optional, tag = "2")]
    pub limit: Option<Any>,
    #[prost(message, optional, tag = "3")]
    pub filter: Option<Any>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaxCallsLimit {
    #[prost(uint64, tag = "1")]
    pub remaining: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MaxFundsLimit {
    #[prost(message, repeated, tag = "1")]
    pub amounts: Vec<ProtoCoin>,
}

/// Call counter and funds cap in one record, the only way to carry both
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CombinedLimit {
    #[prost(uint64, tag = "1")]
    pub calls_remaining: u64,
    #[prost(message, repeated, tag = "2")]
    pub amounts: Vec<ProtoCoin>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AllowAllMessagesFilter {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BasicAllowance {
    #[prost(message, repeated, tag = "1")]
    pub spend_limit: Vec<ProtoCoin>,
    #[prost(message, optional, tag = "2")]
    pub expiration: Option<Timestamp>,
}
