use alloy_primitives::{Address, TxHash, address};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, miette};
use nexuspay::application::attestation::{AttestationClient, PollPolicy};
use nexuspay::application::engine::PaymentEngine;
use nexuspay::application::fee::FeeModel;
use nexuspay::application::finalizer::Finalizer;
use nexuspay::config::{DeploymentConfig, FinalizerKind, OperatorKey, PollProfile};
use nexuspay::domain::amount::Amount;
use nexuspay::domain::chain::{ChainId, Domain};
use nexuspay::domain::payment::{AmountMode, OrderId, PaymentRequest, Referral};
use nexuspay::domain::ports::TransactionSenderRef;
use nexuspay::domain::state::{LoggingObserver, StatusObserver};
use nexuspay::infrastructure::in_memory::{SimulatedNetwork, SimulatedOperator, SimulatedWallet};
use nexuspay::infrastructure::iris::IrisAttestationService;
use nexuspay::interfaces::csv::payment_reader::PaymentReader;
use nexuspay::interfaces::csv::settlement_writer::SettlementWriter;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Account that pays in simulated runs.
const SIMULATED_PAYER: Address = address!("0x00000000000000000000000000000000000000Aa");

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Deployment TOML file. Defaults to the built-in Circle sandbox deployment.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one payment against the in-memory simulated network
    Pay {
        #[arg(long)]
        merchant: Address,
        #[arg(long)]
        order_id: String,
        /// Amount in USDC, e.g. 5.00
        #[arg(long)]
        amount: Amount,
        /// Lower bound for a variable-amount payment
        #[arg(long)]
        min: Option<Amount>,
        /// Upper bound for a variable-amount payment
        #[arg(long)]
        max: Option<Amount>,
        /// Chain id the payer's wallet is connected to
        #[arg(long)]
        chain: u64,
        #[arg(long)]
        campaign_id: Option<u64>,
        #[arg(long)]
        referrer: Option<Address>,
        /// Pending attestation replies before the simulated service completes
        #[arg(long, default_value_t = 0)]
        attestation_delay: u32,
    },
    /// Execute every payment of a CSV file and write the outcomes as CSV to stdout
    Batch {
        /// Input payments CSV (merchant,order_id,amount,chain,campaign_id,referrer)
        input: PathBuf,
    },
    /// Poll the attestation API for a lock transaction
    Attestation {
        /// Source CCTP domain
        #[arg(long)]
        domain: u32,
        /// Lock transaction hash
        #[arg(long)]
        tx: TxHash,
        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Short,
    Long,
}

impl From<ProfileArg> for PollProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Short => PollProfile::Short,
            ProfileArg::Long => PollProfile::Long,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Pay {
            merchant,
            order_id,
            amount,
            min,
            max,
            chain,
            campaign_id,
            referrer,
            attestation_delay,
        } => {
            let request = PaymentRequest::new(merchant, OrderId::new(order_id)?, amount)
                .with_mode(AmountMode::Variable { min, max })
                .with_referral(Referral {
                    campaign_id,
                    referrer,
                });
            let network = SimulatedNetwork::new(config.clone()).with_attestation_delay(attestation_delay);
            let engine = simulated_engine(config, &network)?;

            let result = pay_simulated(&engine, &network, ChainId(chain), &request).await?;
            println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
        }
        Command::Batch { input } => {
            let network = SimulatedNetwork::new(config.clone());
            let engine = simulated_engine(config, &network)?;

            let file = File::open(input).into_diagnostic()?;
            let reader = PaymentReader::new(file);
            let stdout = io::stdout();
            let mut writer = SettlementWriter::new(stdout.lock());

            for payment in reader.payments() {
                match payment {
                    Ok(payment) => {
                        let outcome =
                            pay_simulated(&engine, &network, payment.chain_id, &payment.request)
                                .await;
                        if let Err(e) = &outcome {
                            eprintln!("Error executing payment {}: {}", payment.request.order_id, e);
                        }
                        writer.write_outcome(&payment.request.order_id, &outcome)?;
                    }
                    Err(e) => {
                        eprintln!("Error reading payment: {}", e);
                    }
                }
            }
            writer.flush()?;
        }
        Command::Attestation {
            domain,
            tx,
            profile,
        } => {
            let service = IrisAttestationService::new(config.attestation.api_url.clone())
                .into_diagnostic()?;
            let profile = profile.map(PollProfile::from).unwrap_or(config.attestation.poll);
            let client = AttestationClient::new(Arc::new(service), PollPolicy::from(profile));

            let record = client.await_attestation(Domain(domain), tx).await?;
            println!("message: 0x{}", hex::encode(record.message()));
            println!("attestation: 0x{}", hex::encode(record.attestation()));
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<DeploymentConfig> {
    match path {
        Some(path) => Ok(DeploymentConfig::from_file(path)?),
        None => Ok(DeploymentConfig::testnet()),
    }
}

fn simulated_engine(config: DeploymentConfig, network: &SimulatedNetwork) -> Result<PaymentEngine> {
    let operator = match config.finalizer {
        FinalizerKind::UserSigned => None,
        FinalizerKind::OperatorRelayed => {
            let key = OperatorKey::from_env()?.ok_or_else(|| {
                miette!("operator_relayed finalizer needs NEXUSPAY_OPERATOR_KEY to be set")
            })?;
            let signer: TransactionSenderRef = Arc::new(SimulatedOperator::new(network.clone(), &key));
            Some((signer, key))
        }
    };
    let finalizer = Finalizer::from_kind(config.finalizer, operator)?;
    Ok(PaymentEngine::new(config, Arc::new(network.clone()), finalizer)?)
}

/// Funds the simulated payer with what the route will pull, then runs the payment.
async fn pay_simulated(
    engine: &PaymentEngine,
    network: &SimulatedNetwork,
    chain_id: ChainId,
    request: &PaymentRequest,
) -> nexuspay::error::Result<nexuspay::domain::payment::SettlementResult> {
    let fee = if chain_id == engine.config().settlement_chain {
        0
    } else {
        FeeModel::new(engine.config().fee).fee()
    };
    network
        .mint(chain_id, SIMULATED_PAYER, request.amount.units().saturating_add(fee))
        .await;

    let wallet = SimulatedWallet::connected(network.clone(), SIMULATED_PAYER, chain_id);
    let observers: Vec<Arc<dyn StatusObserver>> = vec![Arc::new(LoggingObserver)];
    engine.execute_payment(&wallet, request, observers).await
}
