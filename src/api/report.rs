// Plan reports
//
// Renders deployment plans as JSON for signers and tooling, or as text for
// people reviewing what a transaction will do.

use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::planner::{DeployMessage, DeploymentPlan, MultiDeploymentPlan, PlannedContract};
use crate::salt::Allocation;

/// Which planner produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Single,
    SharedTreasury,
}

/// A plan together with the bookkeeping callers need after broadcasting
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub scenario: Scenario,
    pub plan: DeploymentPlan,
    pub contracts: Vec<PlannedContract>,
    pub treasury_created: bool,
    pub existing_contracts: usize,
    pub future_slots: Vec<Allocation>,
}

impl From<DeploymentPlan> for PlanReport {
    fn from(plan: DeploymentPlan) -> Self {
        Self {
            scenario: Scenario::Single,
            plan,
            contracts: Vec::new(),
            treasury_created: true,
            existing_contracts: 0,
            future_slots: Vec::new(),
        }
    }
}

impl From<MultiDeploymentPlan> for PlanReport {
    fn from(multi: MultiDeploymentPlan) -> Self {
        Self {
            scenario: Scenario::SharedTreasury,
            plan: multi.plan,
            contracts: multi.contracts,
            treasury_created: multi.treasury_created,
            existing_contracts: multi.existing.len(),
            future_slots: multi.future,
        }
    }
}

/// Output formats for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
}

/// Report formatter for deployment plans
pub struct PlanFormatter;

impl PlanFormatter {
    /// Format a report as JSON
    pub fn to_json(report: &PlanReport) -> Result<String> {
        let json = serde_json::to_string_pretty(report)?;
        Ok(json)
    }

    /// Only the transaction messages, in the shape signers expect
    pub fn messages_json(plan: &DeploymentPlan) -> Result<String> {
        let json = serde_json::to_string_pretty(&plan.messages)?;
        Ok(json)
    }

    /// Format a report as plain text
    pub fn to_text(report: &PlanReport) -> String {
        let mut output = String::new();
        let plan = &report.plan;

        output.push_str("Deployment Plan\n");
        output.push_str("===============\n\n");
        output.push_str(&format!("Created: {}\n", plan.created_at));
        output.push_str(&format!("Scenario: {:?}\n", report.scenario));
        output.push_str(&format!("Sender: {}\n", plan.sender));
        if report.scenario == Scenario::SharedTreasury {
            output.push_str(&format!("Treasury Created: {}\n", report.treasury_created));
            output.push_str(&format!("Existing Contracts: {}\n", report.existing_contracts));
        }

        output.push_str("\nAddresses\n");
        output.push_str("---------\n");
        for (role, address) in &plan.addresses {
            output.push_str(&format!("{role}: {address}\n"));
        }

        output.push_str(&format!("\nMessages: {}\n", plan.messages.len()));
        output.push_str("--------\n");
        for (i, message) in plan.messages.iter().enumerate() {
            Self::format_message(&mut output, i + 1, message);
        }

        if !report.contracts.is_empty() {
            output.push_str("\nNew Contracts\n");
            output.push_str("-------------\n");
            for contract in &report.contracts {
                output.push_str(&format!(
                    "{} salt={} index={}\n",
                    contract.address, contract.salt, contract.index
                ));
            }
        }

        if !report.future_slots.is_empty() {
            output.push_str("\nPre-authorized Future Slots\n");
            output.push_str("---------------------------\n");
            for slot in &report.future_slots {
                output.push_str(&format!("{} salt={}\n", slot.address, slot.salt));
            }
        }

        output
    }

    fn format_message(output: &mut String, n: usize, message: &DeployMessage) {
        match message {
            DeployMessage::Instantiate2(msg) => {
                output.push_str(&format!("{n}. instantiate2 `{}`\n", msg.label));
                output.push_str(&format!("   Code ID: {}\n", msg.code_id));
                output.push_str(&format!(
                    "   Salt: {}\n",
                    String::from_utf8_lossy(&msg.salt)
                ));
            }
            DeployMessage::Execute(msg) => {
                output.push_str(&format!("{n}. execute {}\n", msg.contract));
                output.push_str(&format!(
                    "   Msg: {}\n",
                    String::from_utf8_lossy(&msg.msg)
                ));
            }
        }
    }

    /// Save a report to a file
    pub fn save_to_file<P: AsRef<Path>>(
        report: &PlanReport,
        path: P,
        format: ReportFormat,
    ) -> Result<()> {
        let content = match format {
            ReportFormat::Json => Self::to_json(report)?,
            ReportFormat::Text => Self::to_text(report),
        };

        fs::write(path, content)?;
        Ok(())
    }
}
