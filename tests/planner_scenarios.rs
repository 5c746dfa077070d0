use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use xion_deploy::api::{ConfigManager, DeployConfig, PlanFormatter, PlanReport};
use xion_deploy::authz::{decode_authorization, COMBINED_LIMIT_TYPE_URL};
use xion_deploy::planner::{ContractKind, DeployMessage, DeploymentPlanner, RumInit};
use xion_deploy::salt::SaltScan;
use xion_deploy::{
    Address, AddressPredictor, Checksum, Coin, ContractRole, DeployError, MockOracle,
};

const SENDER: &str = "xion1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5atkush";
const FAUCET: &str = "xion1pyysjzgfpyysjzgfpyysjzgfpyysjzgfljwdcj";
const USER_MAP_CHECKSUM: &str = "1298ea1732944f270f7cc9ee6e054ebb948e15ecc1de8e038e478ed57a311b94";
const TREASURY_CHECKSUM: &str = "66fa9f9d3186b9c13a66b004fc8bb5f3359c4deb17197266895fb8d3c67c3b17";
const RUM_CHECKSUM: &str = "4242424242424242424242424242424242424242424242424242424242424242";

const PRIMARY: &str = "xion1e5tkh47kcv9nthmjdccshfq88nt59qqqxnj3fqcefp44vv4nzq8sxqyeg7";
const SINGLE_TREASURY: &str = "xion1k7ntxgft6hddwy6c3xe47nydd52yrsyu2jklrdd44ccnf0qrhgfse7xge8";

fn config() -> DeployConfig {
    ConfigManager::builder()
        .code(ContractKind::UserMap, 1, USER_MAP_CHECKSUM)
        .code(ContractKind::Treasury, 2, TREASURY_CHECKSUM)
        .code(ContractKind::Rum, 3, RUM_CHECKSUM)
        .faucet_address(FAUCET)
        .redirect_url("https://example.com/callback")
        .build()
}

fn sender() -> Address {
    Address::parse(SENDER).unwrap()
}

fn rum_inits(n: usize) -> Vec<RumInit> {
    (0..n)
        .map(|i| RumInit {
            claim_key: format!("claim-{i}"),
            verification_addr: FAUCET.to_string(),
        })
        .collect()
}

/// Addresses of the rum salt slots of the test sender
fn rum_slots(indices: impl IntoIterator<Item = u32>) -> Vec<Address> {
    let predictor = AddressPredictor::new("xion");
    let sender = sender();
    let checksum = Checksum::from_hex(RUM_CHECKSUM).unwrap();
    let scan = SaltScan::new(&predictor, &sender, &checksum, "rum-contract");
    indices.into_iter().map(|i| scan.slot(i).unwrap().1).collect()
}

fn shared_treasury(config: &DeployConfig) -> Address {
    AddressPredictor::new("xion")
        .predict(
            &sender(),
            &Checksum::from_hex(TREASURY_CHECKSUM).unwrap(),
            &config.treasury_salt().unwrap(),
        )
        .unwrap()
}

/// Contracts named by the execution grant inside a treasury init message
fn granted_contracts(message: &DeployMessage) -> Vec<String> {
    let init = message.msg_json().unwrap();
    let encoded = init["grant_configs"][0]["authorization"]["value"]
        .as_str()
        .unwrap();
    let bytes = STANDARD.decode(encoded).unwrap();
    decode_authorization(&bytes)
        .unwrap()
        .grants
        .into_iter()
        .map(|g| g.contract)
        .collect()
}

#[test]
fn test_single_scenario_end_to_end() {
    let config = config();
    let plan = DeploymentPlanner::new(&config)
        .plan_single(&sender())
        .unwrap();

    assert_eq!(plan.messages.len(), 3);
    let primary_msg = plan.messages[0].as_instantiate().unwrap();
    let treasury_msg = plan.messages[1].as_instantiate().unwrap();
    let faucet_msg = plan.messages[2].as_execute().unwrap();

    assert_eq!(primary_msg.code_id, 1);
    assert_eq!(primary_msg.salt, b"xion-rocks");
    assert_eq!(treasury_msg.code_id, 2);
    assert_eq!(treasury_msg.salt, PRIMARY.as_bytes());

    // The treasury authorizes exactly the independently computed primary address
    let primary = AddressPredictor::new("xion")
        .predict_str(SENDER, USER_MAP_CHECKSUM, "xion-rocks")
        .unwrap();
    assert_eq!(primary.as_str(), PRIMARY);
    assert_eq!(granted_contracts(&plan.messages[1]), vec![PRIMARY.to_string()]);

    assert_eq!(plan.address(ContractRole::Primary).unwrap().as_str(), PRIMARY);
    assert_eq!(
        plan.address(ContractRole::Treasury).unwrap().as_str(),
        SINGLE_TREASURY
    );

    assert_eq!(faucet_msg.contract, FAUCET);
    let faucet: Value = serde_json::from_slice(&faucet_msg.msg).unwrap();
    assert_eq!(faucet["faucet"]["receiver"], SINGLE_TREASURY);
}

#[test]
fn test_single_treasury_params() {
    let config = config();
    let plan = DeploymentPlanner::new(&config)
        .plan_single(&sender())
        .unwrap();

    let init = plan.messages[1].msg_json().unwrap();
    assert_eq!(init["admin"], SENDER);
    assert_eq!(init["params"]["redirect_url"], "https://example.com/callback");
    assert_eq!(
        init["type_urls"][0],
        "/cosmwasm.wasm.v1.ContractExecutionAuthorization"
    );
    assert_eq!(
        init["fee_config"]["allowance"]["type_url"],
        "/cosmos.feegrant.v1beta1.BasicAllowance"
    );
}

#[test]
fn test_grant_limits_are_combined() {
    let mut config = config();
    config.limits.grant_max_calls = Some(50);
    config.limits.grant_max_amount = Some(Coin::new(2_000, "uxion"));

    let plan = DeploymentPlanner::new(&config)
        .plan_single(&sender())
        .unwrap();
    let init = plan.messages[1].msg_json().unwrap();
    let bytes = STANDARD
        .decode(init["grant_configs"][0]["authorization"]["value"].as_str().unwrap())
        .unwrap();
    let auth = decode_authorization(&bytes).unwrap();

    assert_eq!(auth.grants.len(), 1);
    assert_eq!(
        auth.grants[0].limit.as_ref().unwrap().type_url,
        COMBINED_LIMIT_TYPE_URL
    );
}

#[tokio::test]
async fn test_multi_creates_treasury_on_fresh_chain() {
    let config = config();
    let oracle = MockOracle::new();
    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(2), &oracle)
        .await
        .unwrap();

    assert!(multi.treasury_created);
    assert!(multi.existing.is_empty());
    let indices: Vec<u32> = multi.contracts.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1]);
    let future: Vec<u32> = multi.future.iter().map(|a| a.index).collect();
    assert_eq!(future, vec![2, 3, 4, 5, 6]);

    let messages = &multi.plan.messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].as_instantiate().unwrap().code_id, 2);
    assert_eq!(messages[1].as_instantiate().unwrap().label, "rum-contract");
    assert_eq!(messages[2].as_instantiate().unwrap().label, "rum-contract-0001");
    assert!(messages[3].as_execute().is_some());

    let expected: Vec<String> = rum_slots(0..7).iter().map(|a| a.to_string()).collect();
    assert_eq!(granted_contracts(&messages[0]), expected);

    let init = messages[1].msg_json().unwrap();
    assert_eq!(init["claim_key"], "claim-0");

    let treasury = shared_treasury(&config);
    assert_eq!(multi.plan.address(ContractRole::Treasury), Some(&treasury));
    assert_eq!(
        multi.plan.address(ContractRole::Contract(1)),
        Some(&multi.contracts[1].address)
    );
}

#[tokio::test]
async fn test_multi_future_slots_capped_by_ceiling() {
    let config = config();
    let oracle = MockOracle::with_existing(rum_slots(0..12));
    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(2), &oracle)
        .await
        .unwrap();

    assert_eq!(multi.existing.len(), 12);
    let indices: Vec<u32> = multi.contracts.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![12, 13]);
    assert_eq!(multi.future.len(), 1);
    assert_eq!(multi.future[0].index, 14);

    let granted = granted_contracts(&multi.plan.messages[0]);
    assert_eq!(granted.len(), 15);
    let expected: Vec<String> = rum_slots(0..15).iter().map(|a| a.to_string()).collect();
    assert_eq!(granted, expected);
}

#[tokio::test]
async fn test_multi_over_ceiling_still_plans() {
    let config = config();
    let oracle = MockOracle::with_existing(rum_slots(0..14));
    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(3), &oracle)
        .await
        .unwrap();

    assert!(multi.future.is_empty());
    assert_eq!(multi.contracts.len(), 3);
    // treasury + 3 contracts + faucet
    assert_eq!(multi.plan.messages.len(), 5);
    assert_eq!(granted_contracts(&multi.plan.messages[0]).len(), 17);
}

#[tokio::test]
async fn test_multi_reuses_existing_treasury() {
    let config = config();
    let mut oracle = MockOracle::with_existing(rum_slots(0..3));
    oracle.insert(shared_treasury(&config));

    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(2), &oracle)
        .await
        .unwrap();

    assert!(!multi.treasury_created);
    assert!(multi.existing.is_empty());
    assert!(multi.future.is_empty());
    assert_eq!(multi.plan.messages.len(), 2);
    assert!(multi
        .plan
        .messages
        .iter()
        .all(|m| m.as_instantiate().map(|i| i.code_id) == Some(3)));
    let indices: Vec<u32> = multi.contracts.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![3, 4]);
}

#[tokio::test]
async fn test_multi_batch_never_reuses_an_index() {
    let config = config();
    let oracle = MockOracle::with_existing(rum_slots([0, 2]));
    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(3), &oracle)
        .await
        .unwrap();

    let indices: Vec<u32> = multi.contracts.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 3, 4]);
    // Enumeration stops at the gap at index 1
    assert_eq!(multi.existing.len(), 1);
    let future: Vec<u32> = multi.future.iter().map(|a| a.index).collect();
    assert_eq!(future, vec![5, 6, 7, 8, 9]);
}

#[tokio::test]
async fn test_multi_future_slots_skip_contracts_past_a_gap() {
    let config = config();
    let oracle = MockOracle::with_existing(rum_slots([0, 1, 2, 5]));
    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(1), &oracle)
        .await
        .unwrap();

    assert_eq!(multi.existing.len(), 3);
    assert_eq!(multi.contracts[0].index, 3);
    let future: Vec<u32> = multi.future.iter().map(|a| a.index).collect();
    assert_eq!(future, vec![4, 6, 7, 8, 9]);

    let expected: Vec<String> = rum_slots([0, 1, 2, 3, 4, 6, 7, 8, 9])
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(granted_contracts(&multi.plan.messages[0]), expected);
}

#[tokio::test]
async fn test_multi_aborts_when_oracle_is_down() {
    let config = config();
    let oracle = MockOracle::unavailable();
    let err = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(1), &oracle)
        .await
        .unwrap_err();

    assert_eq!(err.role, ContractRole::Treasury);
    assert!(matches!(err.source, DeployError::OracleUnavailable(_)));
}

#[tokio::test]
async fn test_multi_reports_failing_contract() {
    let mut config = config();
    config.salts.max_probes = Some(2);
    let oracle = MockOracle::with_existing(rum_slots(0..3));
    let err = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(1), &oracle)
        .await
        .unwrap_err();

    assert_eq!(err.role, ContractRole::Contract(0));
    assert!(matches!(err.source, DeployError::NoFreeSaltFound { .. }));
}

#[tokio::test]
async fn test_reports_render() {
    let config = config();
    let single = DeploymentPlanner::new(&config)
        .plan_single(&sender())
        .unwrap();
    let text = PlanFormatter::to_text(&PlanReport::from(single.clone()));
    assert!(text.contains(PRIMARY));
    assert!(text.contains("Messages: 3"));

    let messages: Value =
        serde_json::from_str(&PlanFormatter::messages_json(&single).unwrap()).unwrap();
    assert_eq!(
        messages[0]["typeUrl"],
        "/cosmwasm.wasm.v1.MsgInstantiateContract2"
    );
    assert_eq!(messages[2]["typeUrl"], "/cosmwasm.wasm.v1.MsgExecuteContract");

    let multi = DeploymentPlanner::new(&config)
        .plan_multi(&sender(), &rum_inits(1), &MockOracle::new())
        .await
        .unwrap();
    let json: Value =
        serde_json::from_str(&PlanFormatter::to_json(&PlanReport::from(multi)).unwrap()).unwrap();
    assert_eq!(json["scenario"], "shared_treasury");
    assert_eq!(json["treasury_created"], true);
    assert_eq!(json["future_slots"].as_array().unwrap().len(), 5);
    assert!(json["plan"]["addresses"]["contract-0"].is_string());
}
