// xion-deploy CLI
//
// Predicts contract addresses, inspects salt slots on chain and prints
// deployment plans for an external signer.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use xion_deploy::api::{ConfigManager, DeployConfig, PlanFormatter, PlanReport, ReportFormat};
use xion_deploy::planner::{ContractKind, DeploymentPlanner, RumInit};
use xion_deploy::salt::{SaltReservations, SaltScan};
use xion_deploy::{Address, AddressPredictor, Checksum, HttpExistenceOracle, MockOracle, Salt};

/// xion-deploy - plan contract deployments with predictable addresses
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    UserMap,
    Treasury,
    Rum,
}

impl From<KindArg> for ContractKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::UserMap => ContractKind::UserMap,
            KindArg::Treasury => ContractKind::Treasury,
            KindArg::Rum => ContractKind::Rum,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Predict an instantiate2 address
    Predict {
        /// Creator address
        #[clap(long)]
        creator: String,

        /// Hex code checksum
        #[clap(long)]
        checksum: String,

        /// Salt string
        #[clap(long)]
        salt: String,

        /// Init message bytes hashed into the address (fix_msg)
        #[clap(long)]
        msg: Option<String>,
    },

    /// Find the next free salt slot for a contract kind
    NextSalt {
        #[clap(long)]
        creator: String,

        #[clap(long, value_enum, default_value = "rum")]
        kind: KindArg,
    },

    /// List contracts already deployed under the base salt
    List {
        #[clap(long)]
        creator: String,

        #[clap(long, value_enum, default_value = "rum")]
        kind: KindArg,

        /// Highest number of slots to probe
        #[clap(long)]
        max: Option<u32>,
    },

    /// Plan a primary contract with its own treasury
    PlanSingle {
        #[clap(long)]
        sender: String,

        /// Output format (json, text, messages)
        #[clap(short, long, default_value = "text")]
        format: String,

        /// Output file path
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Plan contracts sharing one treasury
    PlanMulti {
        #[clap(long)]
        sender: String,

        /// JSON file with an array of contract init configs
        #[clap(long)]
        contracts: PathBuf,

        /// Assume an empty chain instead of querying the REST endpoint
        #[clap(long)]
        offline: bool,

        /// Output format (json, text, messages)
        #[clap(short, long, default_value = "text")]
        format: String,

        /// Output file path
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a default configuration file
    Config {
        /// Output file path
        #[clap(short, long)]
        output: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<DeployConfig> {
    match path {
        Some(path) => ConfigManager::load_from_file(path).context("Failed to load configuration"),
        None => Ok(DeployConfig::default()),
    }
}

fn emit(report: PlanReport, format: &str, output: Option<PathBuf>) -> Result<()> {
    let content = match format.to_lowercase().as_str() {
        "json" => PlanFormatter::to_json(&report)?,
        "messages" => PlanFormatter::messages_json(&report.plan)?,
        _ => PlanFormatter::to_text(&report),
    };

    if let Some(output_path) = output {
        let report_format = if format.eq_ignore_ascii_case("text") {
            ReportFormat::Text
        } else {
            ReportFormat::Json
        };
        if format.eq_ignore_ascii_case("messages") {
            fs::write(&output_path, content).context("Failed to save plan")?;
        } else {
            PlanFormatter::save_to_file(&report, &output_path, report_format)
                .context("Failed to save plan")?;
        }
        println!("Plan saved to {:?}", output_path);
    } else {
        println!("{}", content);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let predictor = AddressPredictor::new(config.network.address_prefix.as_str());

    match cli.command {
        Commands::Predict {
            creator,
            checksum,
            salt,
            msg,
        } => {
            let creator = Address::parse(&creator).context("Invalid creator address")?;
            let checksum = Checksum::from_hex(&checksum).context("Invalid checksum")?;
            let salt = Salt::new(salt).context("Invalid salt")?;
            let address = match msg {
                Some(msg) => predictor.predict_with_msg(&creator, &checksum, &salt, msg.as_bytes()),
                None => predictor.predict(&creator, &checksum, &salt),
            }
            .context("Failed to predict address")?;
            println!("{}", address);
            Ok(())
        }
        Commands::NextSalt { creator, kind } => {
            let creator = Address::parse(&creator).context("Invalid creator address")?;
            let (_, checksum) = config.code(kind.into())?;
            let oracle = HttpExistenceOracle::new(&config.network.rest_url)?;
            let scan = SaltScan::new(&predictor, &creator, &checksum, &config.salts.base_salt);
            let mut reservations = SaltReservations::new();
            let allocation = scan
                .allocate_next(&oracle, &mut reservations, config.salts.max_probes)
                .await?;
            println!("{} {} {}", allocation.index, allocation.salt, allocation.address);
            Ok(())
        }
        Commands::List { creator, kind, max } => {
            let creator = Address::parse(&creator).context("Invalid creator address")?;
            let (_, checksum) = config.code(kind.into())?;
            let oracle = HttpExistenceOracle::new(&config.network.rest_url)?;
            let scan = SaltScan::new(&predictor, &creator, &checksum, &config.salts.base_salt);
            let max = max.unwrap_or(config.limits.max_contracts);
            let records = scan.enumerate_existing(&oracle, max).await?;
            for record in &records {
                println!("{} {} {}", record.index, record.salt, record.address);
            }
            info!("{} deployments found", records.len());
            Ok(())
        }
        Commands::PlanSingle {
            sender,
            format,
            output,
        } => {
            let sender = Address::parse(&sender).context("Invalid sender address")?;
            let plan = DeploymentPlanner::new(&config).plan_single(&sender)?;
            emit(plan.into(), &format, output)
        }
        Commands::PlanMulti {
            sender,
            contracts,
            offline,
            format,
            output,
        } => {
            let sender = Address::parse(&sender).context("Invalid sender address")?;
            let contracts_str =
                fs::read_to_string(&contracts).context("Failed to read contracts file")?;
            let inits: Vec<RumInit> =
                serde_json::from_str(&contracts_str).context("Failed to parse contracts file")?;

            let planner = DeploymentPlanner::new(&config);
            let plan = if offline {
                planner.plan_multi(&sender, &inits, &MockOracle::new()).await?
            } else {
                let oracle = HttpExistenceOracle::new(&config.network.rest_url)?;
                planner.plan_multi(&sender, &inits, &oracle).await?
            };
            emit(plan.into(), &format, output)
        }
        Commands::Config { output } => {
            let config = DeployConfig::default();
            ConfigManager::save_to_file(&config, &output)
                .context("Failed to save configuration")?;
            println!("Default configuration saved to {:?}", output);
            Ok(())
        }
    }
}
