mod app;
mod config_commands;
mod console;
mod doctor_commands;

use std::{path::PathBuf, sync::Arc};

use {
    answerline_channels::{AckTracker, PendingAck},
    answerline_common::types::InboundMessage,
    answerline_config::AnswerlineConfig,
    answerline_gateway::GatewayState,
    answerline_whatsapp::TwilioOutbound,
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "answerline", about = "Answerline, a WhatsApp question-answering gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./answerline.toml and ~/.config/answerline/).
    #[arg(long, global = true, env = "ANSWERLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Gateway,
    /// Run one message through the pipeline and print what would be sent.
    Ask {
        /// Sender id the conversation is stored under.
        #[arg(long, default_value = "console:local")]
        from: String,
        #[arg(short, long)]
        message: String,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Config validation and environment audit.
    Doctor,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "answerline starting");

    let (mut config, source) = app::load_config(cli.config.as_deref())?;

    // CLI args override config values
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command {
        // Default: start gateway when no subcommand is provided
        None | Some(Commands::Gateway) => run_gateway(config).await,
        Some(Commands::Ask { from, message }) => run_ask(&config, from, message).await,
        Some(Commands::Config { action }) => {
            let port = config.server.port;
            config_commands::handle_config(action, &config, source.as_deref(), port)
        },
        Some(Commands::Doctor) => doctor_commands::handle_doctor(&config, source.as_deref()).await,
    }
}

async fn run_gateway(config: AnswerlineConfig) -> anyhow::Result<()> {
    let outbound = Arc::new(TwilioOutbound::from_config(&config.whatsapp)?);
    let pipeline = app::build_pipeline(&config, outbound).await?;
    let state = GatewayState::new(Arc::new(pipeline));
    answerline_gateway::start_gateway(&config.server, state).await
}

async fn run_ask(config: &AnswerlineConfig, from: String, message: String) -> anyhow::Result<()> {
    let pipeline = app::build_pipeline(config, Arc::new(console::ConsoleOutbound)).await?;
    let inbound = InboundMessage::new(from, message)?;

    let mut ack = AckTracker::new(PendingAck::new());
    pipeline.handle(inbound, &mut ack).await;
    match ack.outcome() {
        Some(outcome) => println!("acknowledged: {outcome}"),
        None => println!("not acknowledged"),
    }

    let in_flight = pipeline.tasks().len();
    if in_flight > 0 {
        eprintln!("waiting for {in_flight} background task(s)...");
    }
    pipeline.tasks().shutdown().await;
    Ok(())
}
