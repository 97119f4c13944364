//! Call simulator entry point
//!
//! Usage: `call-agent-sim [--config <file>] <script>`
//!
//! Without `--config`, settings load from `config/default.yaml`, then
//! `config/{CALL_AGENT_ENV}.yaml`, then `CALL_AGENT__*` variables.

use anyhow::{bail, Context};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use call_agent_agent::{
    CallDeps, CallRegistry, ChannelActionSink, CollectingSummarySink, FanoutSummarySink,
    KeywordClassifier, SessionAction, TracingSummarySink,
};
use call_agent_config::{load_settings, load_settings_file, Settings};
use call_agent_core::{Action, SummarySink};
use call_agent_simulator::{run_script, Script};

struct Args {
    config: Option<PathBuf>,
    script: PathBuf,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut config = None;
        let mut script = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a file path")?;
                    config = Some(PathBuf::from(path));
                },
                _ if script.is_none() => script = Some(PathBuf::from(arg)),
                _ => bail!("Unexpected argument: {}", arg),
            }
        }

        let script = script.context("Usage: call-agent-sim [--config <file>] <script>")?;
        Ok(Self { config, script })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    let env = std::env::var("CALL_AGENT_ENV").ok();
    let settings = match &args.config {
        Some(path) => load_settings_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match load_settings(env.as_deref()) {
            Ok(settings) => settings,
            Err(e) => {
                // Tracing not yet initialized
                eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
                Settings::default()
            },
        },
    };

    init_tracing(&settings);

    tracing::info!("Starting call simulator v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?settings.environment,
        restaurant = settings.knowledge_base.name.as_deref().unwrap_or("unnamed"),
        topics = ?settings.knowledge_base.configured_topics(),
        "Configuration loaded"
    );

    let script = Script::load(&args.script)?;
    tracing::info!(calls = script.calls.len(), script = %args.script.display(), "Script loaded");

    let (action_sink, actions) = ChannelActionSink::channel(256);
    let printer = tokio::spawn(print_actions(actions));

    let collected = Arc::new(CollectingSummarySink::new());
    let sinks: Vec<Arc<dyn SummarySink>> = vec![Arc::new(TracingSummarySink), collected.clone()];
    let summaries = FanoutSummarySink::new(sinks);

    let deps = CallDeps::from_settings(
        &settings,
        Arc::new(KeywordClassifier::new()),
        Arc::new(action_sink),
        Arc::new(summaries),
    );
    let registry = Arc::new(CallRegistry::new(deps));

    let results = run_script(Arc::clone(&registry), script).await;

    // Closes the action channel so the printer drains and exits
    drop(registry);
    printer.await.context("Action printer failed")?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    tracing::info!(
        calls = results.len(),
        escalated = results.iter().filter(|s| s.escalated).count(),
        delivered = collected.len(),
        "Simulation finished"
    );

    Ok(())
}

async fn print_actions(mut actions: mpsc::Receiver<SessionAction>) {
    while let Some(SessionAction { session_id, action }) = actions.recv().await {
        match action {
            Action::Speak { text } => println!("[{}] Agent: {}", session_id, text),
            Action::TransferToHuman { reason } => {
                println!("[{}] -> transfer to staff ({})", session_id, reason)
            },
            Action::EndCall => println!("[{}] -> end call", session_id),
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("call_agent={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
