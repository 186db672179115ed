use anyhow::{bail, Context, Result};
use armctl::azure::auth::ArmCredentials;
use armctl::azure::http::format_arm_error;
use armctl::azure::ArmClient;
use armctl::config::Config;
use armctl::resource::{
    AppService, AppServiceId, AppServicePlan, AppServiceSlot, AppServiceSlotId, IdShape,
    PlanCatalog, PlanCategory, PurviewAccount, ResourceId, ServiceBusNamespace,
    ServiceBusSubscription, ServiceBusTopic,
};
use armctl::services::{appservice, policy, purview, servicebus};
use armctl::state::{ResourceData, StateFile};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Azure Resource Manager toolbox
#[derive(Parser, Debug)]
#[command(name = "armctl", version = armctl::VERSION, about, long_about = None)]
struct Args {
    /// Azure subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// State file (defaults to the armctl config directory)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Block all write operations
    #[arg(long, global = true)]
    readonly: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resource ID tools
    #[command(subcommand)]
    Id(IdCommand),
    /// App Service plan SKU tools
    #[command(subcommand)]
    Sku(SkuCommand),
    /// App Service plan lookups
    #[command(subcommand)]
    Appservice(AppServiceCommand),
    /// Service Bus data sources
    #[command(subcommand)]
    Servicebus(ServiceBusCommand),
    /// Purview accounts
    #[command(subcommand)]
    Purview(PurviewCommand),
    /// Policy enumerations
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Persistent settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Save the default subscription
    SetSubscription { subscription_id: String },
}

#[derive(Subcommand, Debug)]
enum IdCommand {
    /// Parse an ID and print its components
    Parse {
        #[arg(long, value_enum)]
        shape: Shape,
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shape {
    ServicebusNamespace,
    ServicebusTopic,
    ServicebusSubscription,
    PurviewAccount,
    AppServicePlan,
    AppService,
    AppServiceSlot,
}

#[derive(Subcommand, Debug)]
enum SkuCommand {
    /// Classify a plan code
    Classify { code: String },
    /// List known plan codes
    List {
        /// Only codes in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// Fail unless the plan code is known
    Validate { code: String },
}

#[derive(Subcommand, Debug)]
enum AppServiceCommand {
    /// OS type and SKU of the plan hosting an app or slot
    PlanInfo {
        /// App Service or deployment slot ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ServiceBusCommand {
    /// Read a topic subscription
    Subscription(SubscriptionArgs),
}

#[derive(ClapArgs, Debug)]
struct SubscriptionArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    topic_id: Option<String>,
    /// Deprecated, use --topic-id
    #[arg(long)]
    topic_name: Option<String>,
    /// Deprecated, use --topic-id
    #[arg(long)]
    namespace_name: Option<String>,
    /// Deprecated, use --topic-id
    #[arg(long)]
    resource_group_name: Option<String>,
}

#[derive(Subcommand, Debug)]
enum PurviewCommand {
    /// Create or update an account
    Apply(PurviewApplyArgs),
    /// Refresh and print an account from state
    Show {
        #[arg(long)]
        address: String,
    },
    /// Delete an account and drop it from state
    Delete {
        #[arg(long)]
        address: String,
    },
    /// Adopt an existing account into state
    Import {
        #[arg(long)]
        address: String,
        id: String,
    },
}

#[derive(ClapArgs, Debug)]
struct PurviewApplyArgs {
    /// Key of the record in the state file
    #[arg(long)]
    address: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    resource_group_name: String,
    #[arg(long)]
    location: String,
    #[arg(long, default_value = "Standard_4")]
    sku_name: String,
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    public_network_enabled: bool,
    /// Tag as key=value, repeatable
    #[arg(long = "tag", value_parser = parse_tag)]
    tags: Vec<(String, String)>,
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Possible values of an enumeration
    Values {
        /// enforcement-mode, parameter-type, resource-identity-type or type
        name: String,
    },
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match std::env::var("ARMCTL_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(level.as_directive()?),
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armctl {} started with log level: {:?}", armctl::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armctl").join("armctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armctl").join("armctl.log");
    }
    PathBuf::from("armctl.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        eprintln!("Error: {}", format_arm_error(&err));
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();

    if args.readonly && is_write(&args.command) {
        bail!("refusing to modify resources in read-only mode");
    }

    match &args.command {
        Command::Id(IdCommand::Parse { shape, id }) => {
            let parsed = match shape {
                Shape::ServicebusNamespace => describe::<ServiceBusNamespace>(id)?,
                Shape::ServicebusTopic => describe::<ServiceBusTopic>(id)?,
                Shape::ServicebusSubscription => describe::<ServiceBusSubscription>(id)?,
                Shape::PurviewAccount => describe::<PurviewAccount>(id)?,
                Shape::AppServicePlan => describe::<AppServicePlan>(id)?,
                Shape::AppService => describe::<AppService>(id)?,
                Shape::AppServiceSlot => describe::<AppServiceSlot>(id)?,
            };
            print_output(args.output, &parsed)
        }
        Command::Sku(command) => run_sku(args.output, command),
        Command::Policy(PolicyCommand::Values { name }) => {
            let Some(values) = policy::possible_values(name) else {
                bail!("unknown policy enumeration {:?}", name);
            };
            print_output(args.output, &values)
        }
        Command::Appservice(AppServiceCommand::PlanInfo { id }) => {
            let client = build_client(&args, &config)?;
            let info = if let Ok(slot) = AppServiceSlotId::parse(id) {
                appservice::service_plan_info_for_app_slot(&client, &slot).await?
            } else {
                let app = AppServiceId::parse(id)?;
                appservice::service_plan_info_for_app(&client, &app).await?
            };
            print_output(args.output, &info)
        }
        Command::Servicebus(ServiceBusCommand::Subscription(input)) => {
            let client = build_client(&args, &config)?;
            let mut data = ResourceData::default();
            data.set("name", &input.name)?;
            data.set("topic_id", &input.topic_id)?;
            data.set("topic_name", &input.topic_name)?;
            data.set("namespace_name", &input.namespace_name)?;
            data.set("resource_group_name", &input.resource_group_name)?;

            servicebus::read_subscription(&client, &mut data, !config.five_point_oh).await?;
            print_output(args.output, &data)
        }
        Command::Purview(command) => run_purview(&args, &config, command).await,
        Command::Config(ConfigCommand::SetSubscription { subscription_id }) => {
            config.set_subscription(subscription_id)?;
            tracing::info!("Default subscription set to {}", subscription_id);
            print_output(args.output, &config)
        }
    }
}

fn is_write(command: &Command) -> bool {
    matches!(
        command,
        Command::Purview(PurviewCommand::Apply(_))
            | Command::Purview(PurviewCommand::Delete { .. })
            | Command::Purview(PurviewCommand::Import { .. })
    )
}

fn run_sku(output: OutputFormat, command: &SkuCommand) -> Result<()> {
    let catalog = PlanCatalog::builtin();
    match command {
        SkuCommand::Classify { code } => print_output(output, &catalog.capabilities(code)),
        SkuCommand::List { category: None } => print_output(output, &catalog.all_known_skus()),
        SkuCommand::List {
            category: Some(name),
        } => {
            let category = PlanCategory::LISTING_ORDER
                .iter()
                .copied()
                .find(|c| c.as_str().eq_ignore_ascii_case(name))
                .with_context(|| format!("unknown plan category {:?}", name))?;
            print_output(output, &catalog.skus_for(category))
        }
        SkuCommand::Validate { code } => {
            appservice::validate_plan_sku(catalog, code)?;
            print_output(output, &catalog.capabilities(code))
        }
    }
}

async fn run_purview(args: &Args, config: &Config, command: &PurviewCommand) -> Result<()> {
    let state_path = args.state.clone().unwrap_or_else(StateFile::default_path);
    let mut state = StateFile::load(&state_path)?;
    let client = build_client(args, config)?;

    match command {
        PurviewCommand::Apply(input) => {
            let mut data = match state.get(&input.address) {
                Some(existing) if !existing.id().is_empty() => existing.clone(),
                _ => ResourceData::new_resource(),
            };
            purview::check_location_unchanged(&data, &input.location)?;
            data.set("name", &input.name)?;
            data.set("resource_group_name", &input.resource_group_name)?;
            data.set("location", &input.location)?;
            data.set("sku_name", &input.sku_name)?;
            data.set("public_network_enabled", input.public_network_enabled)?;
            let tags: serde_json::Map<String, Value> = input
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            data.set("tags", tags)?;

            purview::create_update(&client, &mut data).await?;
            state.put(&input.address, data.clone());
            state.save(&state_path)?;
            print_output(args.output, &data)
        }
        PurviewCommand::Show { address } => {
            let mut data = stored(&state, address)?;
            purview::read(&client, &mut data).await?;
            if data.id().is_empty() {
                tracing::warn!("{} no longer exists remotely", address);
            }
            state.put(address, data.clone());
            state.save(&state_path)?;
            print_output(args.output, &data)
        }
        PurviewCommand::Delete { address } => {
            let data = stored(&state, address)?;
            purview::delete(&client, &data).await?;
            state.remove(address);
            state.save(&state_path)?;
            print_output(args.output, &json!({ "deleted": data.id() }))
        }
        PurviewCommand::Import { address, id } => {
            if state.get(address).is_some() {
                bail!("{} is already managed", address);
            }
            let mut data = purview::import(id)?;
            purview::read(&client, &mut data).await?;
            if data.id().is_empty() {
                bail!("cannot import non-existent account {}", id);
            }
            state.put(address, data.clone());
            state.save(&state_path)?;
            print_output(args.output, &data)
        }
    }
}

fn stored(state: &StateFile, address: &str) -> Result<ResourceData> {
    state
        .get(address)
        .cloned()
        .with_context(|| format!("no resource at {} in state", address))
}

fn build_client(args: &Args, config: &Config) -> Result<ArmClient> {
    let subscription = config.effective_subscription(args.subscription.as_deref())?;
    let endpoint = config.effective_endpoint();
    let credentials = ArmCredentials::from_env(
        config.tenant_id.as_deref(),
        config.client_id.as_deref(),
        &config.effective_authority_host(),
        &endpoint,
    );
    tracing::info!("Using subscription: {}, endpoint: {}", subscription, endpoint);

    let client = ArmClient::new(&subscription, &endpoint, credentials)?
        .with_poll_interval(config.poll_interval());
    Ok(client)
}

fn describe<S: IdShape>(raw: &str) -> Result<Value> {
    let id = ResourceId::<S>::parse(raw)?;
    Ok(json!({
        "type": S::DESCRIPTION,
        "id": id.id(),
        "subscription_id": id.subscription_id(),
        "resource_group_name": id.resource_group_name(),
        "names": id.names(),
    }))
}

fn print_output<T: Serialize + ?Sized>(format: OutputFormat, value: &T) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
