// Deployment planning
//
// Builds the ordered message list of a deployment transaction. All contract
// addresses are predicted up front, so a treasury can authorize contracts
// that are instantiated in the same transaction, or later.

mod messages;

pub use messages::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{Address, ContractRole, DeployError, PlanError, Salt};
use log::{info, warn};
use serde::Serialize;

use crate::address::AddressPredictor;
use crate::api::DeployConfig;
use crate::authz::{
    encode_basic_allowance, AuthorizationGrant, EncodedAny, BASIC_ALLOWANCE_TYPE_URL,
    CONTRACT_EXECUTION_AUTHORIZATION_TYPE_URL,
};
use crate::oracle::ExistenceOracle;
use crate::salt::{Allocation, DeploymentRecord, SaltReservations, SaltScan};

/// Label of the primary contract in a single deployment
const USER_MAP_LABEL: &str = "user-map";

/// Label of treasury contracts
const TREASURY_LABEL: &str = "treasury";

/// Messages of one deployment transaction and the addresses they create
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    /// When the plan was assembled
    pub created_at: DateTime<Utc>,

    /// Account that signs the transaction
    pub sender: Address,

    /// Messages in execution order
    pub messages: Vec<DeployMessage>,

    /// Predicted address per contract role
    pub addresses: BTreeMap<ContractRole, Address>,
}

impl DeploymentPlan {
    fn new(sender: &Address) -> Self {
        Self {
            created_at: Utc::now(),
            sender: sender.clone(),
            messages: Vec::new(),
            addresses: BTreeMap::new(),
        }
    }

    pub fn address(&self, role: ContractRole) -> Option<&Address> {
        self.addresses.get(&role)
    }
}

/// A new contract of a shared-treasury batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedContract {
    pub address: Address,
    pub config: RumInit,
    pub salt: Salt,
    pub index: u32,
}

/// Result of planning a shared-treasury batch
#[derive(Debug, Clone, Serialize)]
pub struct MultiDeploymentPlan {
    pub plan: DeploymentPlan,

    /// New contracts with their salts, for caller bookkeeping
    pub contracts: Vec<PlannedContract>,

    /// Whether this transaction creates the shared treasury
    pub treasury_created: bool,

    /// Contracts already on chain when the treasury was planned
    pub existing: Vec<DeploymentRecord>,

    /// Slots pre-authorized for contracts deployed later
    pub future: Vec<Allocation>,
}

/// Composes deployment transactions from configuration
pub struct DeploymentPlanner<'a> {
    config: &'a DeployConfig,
    predictor: AddressPredictor,
}

impl<'a> DeploymentPlanner<'a> {
    pub fn new(config: &'a DeployConfig) -> Self {
        Self {
            config,
            predictor: AddressPredictor::new(config.network.address_prefix.as_str()),
        }
    }

    pub fn predictor(&self) -> &AddressPredictor {
        &self.predictor
    }

    /// Plan a primary contract funded by its own treasury
    ///
    /// Messages: primary init, treasury init, faucet request. The treasury
    /// salt is the primary's predicted address, so no probing is needed.
    pub fn plan_single(&self, sender: &Address) -> Result<DeploymentPlan, PlanError> {
        let primary = ContractRole::Primary;
        let treasury = ContractRole::Treasury;

        self.check_sender(sender)
            .map_err(|e| PlanError::new(primary, e))?;
        let (primary_code_id, primary_checksum) = self
            .config
            .code(ContractKind::UserMap)
            .map_err(|e| PlanError::new(primary, e))?;
        let primary_salt = self
            .config
            .single_salt()
            .map_err(|e| PlanError::new(primary, e))?;
        let primary_address = self
            .predictor
            .predict(sender, &primary_checksum, &primary_salt)
            .map_err(|e| PlanError::new(primary, e))?;

        let (treasury_code_id, treasury_checksum) = self
            .config
            .code(ContractKind::Treasury)
            .map_err(|e| PlanError::new(treasury, e))?;
        let treasury_salt =
            Salt::new(primary_address.as_str()).map_err(|e| PlanError::new(treasury, e))?;
        let treasury_address = self
            .predictor
            .predict(sender, &treasury_checksum, &treasury_salt)
            .map_err(|e| PlanError::new(treasury, e))?;
        let faucet = self.config.faucet().map_err(|e| PlanError::new(treasury, e))?;

        let grant = self.contract_grant(std::iter::once(primary_address.clone()));
        let treasury_init = self
            .treasury_init(sender, &grant)
            .map_err(|e| PlanError::new(treasury, e))?;

        let primary_msg = self
            .instantiate(
                sender,
                primary_code_id,
                USER_MAP_LABEL,
                &ContractInit::UserMap(UserMapInit {}),
                &primary_salt,
            )
            .map_err(|e| PlanError::new(primary, e))?;
        let treasury_msg = self
            .instantiate(
                sender,
                treasury_code_id,
                TREASURY_LABEL,
                &ContractInit::Treasury(treasury_init),
                &treasury_salt,
            )
            .map_err(|e| PlanError::new(treasury, e))?;
        let faucet_msg = self
            .faucet_request(sender, &faucet, &treasury_address)
            .map_err(|e| PlanError::new(treasury, e))?;

        info!(
            "planned single deployment for {}: primary {}, treasury {}",
            sender, primary_address, treasury_address
        );

        let mut plan = DeploymentPlan::new(sender);
        plan.messages = vec![primary_msg, treasury_msg, faucet_msg];
        plan.addresses.insert(primary, primary_address);
        plan.addresses.insert(treasury, treasury_address);
        Ok(plan)
    }

    /// Plan `contracts.len()` contracts sharing one treasury
    ///
    /// The treasury is created only if it does not exist yet. In that case
    /// its grant covers existing contracts, the new ones, and a few future
    /// slots, since the grant cannot be widened after instantiation.
    pub async fn plan_multi<O: ExistenceOracle + ?Sized>(
        &self,
        sender: &Address,
        contracts: &[RumInit],
        oracle: &O,
    ) -> Result<MultiDeploymentPlan, PlanError> {
        let treasury = ContractRole::Treasury;

        self.check_sender(sender)
            .map_err(|e| PlanError::new(treasury, e))?;
        let (treasury_code_id, treasury_checksum) = self
            .config
            .code(ContractKind::Treasury)
            .map_err(|e| PlanError::new(treasury, e))?;
        let treasury_salt = self
            .config
            .treasury_salt()
            .map_err(|e| PlanError::new(treasury, e))?;
        let treasury_address = self
            .predictor
            .predict(sender, &treasury_checksum, &treasury_salt)
            .map_err(|e| PlanError::new(treasury, e))?;

        let first_role = ContractRole::Contract(0);
        let (code_id, checksum) = self
            .config
            .code(ContractKind::Rum)
            .map_err(|e| PlanError::new(first_role, e))?;

        let treasury_exists = oracle
            .exists(&treasury_address)
            .await
            .map_err(|e| PlanError::new(treasury, e))?;
        info!(
            "shared treasury {} {}",
            treasury_address,
            if treasury_exists { "exists" } else { "will be created" }
        );

        let base = self.config.salts.base_salt.as_str();
        let scan = SaltScan::new(&self.predictor, sender, &checksum, base);
        let mut reservations = SaltReservations::new();

        let mut planned = Vec::with_capacity(contracts.len());
        for (i, config) in contracts.iter().enumerate() {
            let allocation = scan
                .allocate_next(oracle, &mut reservations, self.config.salts.max_probes)
                .await
                .map_err(|e| PlanError::new(ContractRole::Contract(i), e))?;
            planned.push(PlannedContract {
                address: allocation.address,
                config: config.clone(),
                salt: allocation.salt,
                index: allocation.index,
            });
        }

        let mut treasury_msg = None;
        let mut existing = Vec::new();
        let mut future = Vec::new();
        if !treasury_exists {
            let max_contracts = self.config.limits.max_contracts;
            existing = scan
                .enumerate_existing(oracle, max_contracts)
                .await
                .map_err(|e| PlanError::new(treasury, e))?;

            let future_count = future_slot_count(
                max_contracts,
                self.config.limits.future_slots,
                existing.len(),
                planned.len(),
            );
            if existing.len() + planned.len() > max_contracts as usize {
                warn!(
                    "{} existing and {} new contracts exceed the shared treasury ceiling of {}",
                    existing.len(),
                    planned.len(),
                    max_contracts
                );
            }
            future = scan
                .reserve_future(oracle, &mut reservations, existing.len() as u32, future_count)
                .await
                .map_err(|e| PlanError::new(treasury, e))?;

            let grantees = existing
                .iter()
                .map(|r| r.address.clone())
                .chain(planned.iter().map(|c| c.address.clone()))
                .chain(future.iter().map(|a| a.address.clone()));
            let grant = self.contract_grant(grantees);
            info!(
                "treasury grant covers {} existing, {} new and {} future contracts",
                existing.len(),
                planned.len(),
                future.len()
            );

            let init = self
                .treasury_init(sender, &grant)
                .map_err(|e| PlanError::new(treasury, e))?;
            treasury_msg = Some(
                self.instantiate(
                    sender,
                    treasury_code_id,
                    TREASURY_LABEL,
                    &ContractInit::Treasury(init),
                    &treasury_salt,
                )
                .map_err(|e| PlanError::new(treasury, e))?,
            );
        }

        let faucet_msg = if treasury_msg.is_some() {
            let faucet = self.config.faucet().map_err(|e| PlanError::new(treasury, e))?;
            Some(
                self.faucet_request(sender, &faucet, &treasury_address)
                    .map_err(|e| PlanError::new(treasury, e))?,
            )
        } else {
            None
        };

        let mut plan = DeploymentPlan::new(sender);
        plan.messages.extend(treasury_msg);
        for (i, contract) in planned.iter().enumerate() {
            let msg = self
                .instantiate(
                    sender,
                    code_id,
                    contract.salt.as_str(),
                    &ContractInit::Rum(contract.config.clone()),
                    &contract.salt,
                )
                .map_err(|e| PlanError::new(ContractRole::Contract(i), e))?;
            plan.messages.push(msg);
            plan.addresses
                .insert(ContractRole::Contract(i), contract.address.clone());
        }
        plan.messages.extend(faucet_msg);
        plan.addresses.insert(treasury, treasury_address);

        info!(
            "planned {} contracts for {} with {} messages",
            planned.len(),
            sender,
            plan.messages.len()
        );
        Ok(MultiDeploymentPlan {
            treasury_created: !treasury_exists,
            plan,
            contracts: planned,
            existing,
            future,
        })
    }

    fn check_sender(&self, sender: &Address) -> Result<(), DeployError> {
        Ok(sender.ensure_prefix(&self.config.network.address_prefix)?)
    }

    fn contract_grant<I: IntoIterator<Item = Address>>(&self, contracts: I) -> AuthorizationGrant {
        let limits = &self.config.limits;
        AuthorizationGrant::new(
            contracts,
            limits.grant_max_calls,
            limits.grant_max_amount.as_ref(),
        )
    }

    fn treasury_init(
        &self,
        admin: &Address,
        grant: &AuthorizationGrant,
    ) -> Result<TreasuryInit, DeployError> {
        let allowance = self.config.fee_allowance()?;
        let params = &self.config.treasury;

        Ok(TreasuryInit {
            admin: Some(admin.to_string()),
            type_urls: vec![CONTRACT_EXECUTION_AUTHORIZATION_TYPE_URL.to_string()],
            grant_configs: vec![GrantConfig {
                description: params.grant_description.clone(),
                authorization: grant.to_encoded_any(),
                optional: false,
            }],
            fee_config: FeeConfig {
                description: params.fee_description.clone(),
                allowance: Some(EncodedAny::new(
                    BASIC_ALLOWANCE_TYPE_URL,
                    &encode_basic_allowance(std::slice::from_ref(allowance)),
                )),
            },
            params: TreasuryParams {
                redirect_url: params.redirect_url.clone(),
                icon_url: params.icon_url.clone(),
                metadata: params.metadata.clone(),
            },
        })
    }

    fn instantiate(
        &self,
        sender: &Address,
        code_id: u64,
        label: &str,
        init: &ContractInit,
        salt: &Salt,
    ) -> Result<DeployMessage, DeployError> {
        let msg = build_init_payload(init)
            .map_err(|e| DeployError::InvalidInitPayload(e.to_string()))?;
        Ok(DeployMessage::Instantiate2(MsgInstantiateContract2 {
            sender: sender.to_string(),
            admin: sender.to_string(),
            code_id,
            label: label.to_string(),
            msg,
            funds: Vec::new(),
            salt: salt.as_bytes().to_vec(),
            fix_msg: false,
        }))
    }

    fn faucet_request(
        &self,
        sender: &Address,
        faucet: &Address,
        receiver: &Address,
    ) -> Result<DeployMessage, DeployError> {
        let msg = serde_json::to_vec(&FaucetExecuteMsg::Faucet {
            receiver: receiver.to_string(),
        })
        .map_err(|e| DeployError::InvalidInitPayload(e.to_string()))?;
        Ok(DeployMessage::Execute(MsgExecuteContract {
            sender: sender.to_string(),
            contract: faucet.to_string(),
            msg,
            funds: Vec::new(),
        }))
    }
}

/// Future slots left under the ceiling, never negative
pub fn future_slot_count(
    max_contracts: u32,
    future_slots: u32,
    existing: usize,
    new: usize,
) -> usize {
    let remaining = (max_contracts as usize).saturating_sub(existing.saturating_add(new));
    remaining.min(future_slots as usize)
}
