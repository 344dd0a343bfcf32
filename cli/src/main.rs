//! CLI entrypoint for superai
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use superai_application::{
    Aggregator, AskProviderUseCase, HistoryReader, HistoryWriter, NoHistory,
    RunTurnInput, RunTurnUseCase, SynthesizeUseCase,
};
use superai_domain::{ProviderId, Question};
use superai_infrastructure::{
    ConfigLoader, FileConfig, JsonlHistoryStore, ProviderFactory, Severity,
};
use superai_presentation::{
    ApiServer, ApiState, Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Use cases and stores built from one loaded configuration
struct Services {
    run_turn: Arc<RunTurnUseCase>,
    ask: Arc<AskProviderUseCase>,
    synthesize: Arc<SynthesizeUseCase>,
    history: Arc<dyn HistoryReader>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    info!("Starting superai");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };
    check_config(&config)?;

    let Some(command) = cli.command else {
        bail!("No command given. Try `superai ask \"...\"` or `superai serve`.");
    };

    // === Dependency Injection ===
    let services = build_services(&config)?;

    match command {
        Command::Serve { bind } => {
            let addr: SocketAddr = bind
                .as_deref()
                .unwrap_or(&config.server.bind)
                .parse()
                .context("invalid bind address")?;
            let state = ApiState::new(
                services.run_turn,
                services.ask,
                services.synthesize,
                services.history,
            );
            let server =
                ApiServer::new(state, addr).with_permissive_cors(config.server.permissive_cors);
            if !cli.quiet {
                println!("{} http://{}", "Listening on".green().bold(), addr);
            }
            server.run(shutdown_signal()).await?;
        }

        Command::Ask {
            question,
            providers,
            output,
            user,
        } => {
            let mut input = RunTurnInput::new(Question::new(question)?).with_providers(
                providers
                    .iter()
                    .map(|p| ProviderId::from(p.as_str()))
                    .collect(),
            );
            if let Some(user) = user {
                input = input.with_user(user);
            }

            let show_progress = !cli.quiet && output != OutputFormat::Json;
            let outcome = if show_progress {
                let progress = ProgressReporter::new();
                services
                    .run_turn
                    .execute_with_progress(input, &progress, CancellationToken::new())
                    .await?
            } else {
                services.run_turn.execute(input).await?
            };

            if let Some(error) = &outcome.persist_error {
                eprintln!("{} turn was not saved: {}", "warning:".yellow().bold(), error);
            }

            let text = match output {
                OutputFormat::Full => ConsoleFormatter::format(&outcome.turn),
                OutputFormat::Answer => ConsoleFormatter::format_answer_only(&outcome.turn),
                OutputFormat::Json => ConsoleFormatter::format_json(&outcome),
            };
            println!("{}", text);
        }

        Command::History {
            user,
            conversation,
            limit,
        } => {
            let mut turns = services
                .history
                .list_turns(&user, conversation.as_deref())
                .await?;
            turns.truncate(limit);
            print!("{}", ConsoleFormatter::format_history(&turns));
        }
    }

    Ok(())
}

/// Console logging from `-v`, plus daily log files when a directory is given
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "superai.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Print configuration warnings; refuse to start on errors
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => {
                eprintln!("{} {}", "config warning:".yellow().bold(), issue.message)
            }
            Severity::Error => eprintln!("{} {}", "config error:".red().bold(), issue.message),
        }
    }
    if FileConfig::has_errors(&issues) {
        let errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        bail!("configuration has {} error(s)", errors);
    }
    Ok(())
}

fn build_services(config: &FileConfig) -> Result<Services> {
    let factory = ProviderFactory::new()?;
    let registry = factory.registry(config);
    if registry.is_empty() {
        warn!("No providers enabled; turns will be rejected");
    }

    let aggregator = Aggregator::new(
        factory.synthesis_adapter(config),
        config.synthesis.to_options(),
    );

    let (writer, reader): (Arc<dyn HistoryWriter>, Arc<dyn HistoryReader>) =
        match config.history.enabled.then(|| config.history.resolved_path()).flatten() {
            Some(path) => {
                let store = Arc::new(JsonlHistoryStore::open(&path)?);
                info!("Recording history to {}", path.display());
                (store.clone(), store)
            }
            None => (Arc::new(NoHistory), Arc::new(NoHistory)),
        };

    let params = config.turn_params()?;
    let provider_timeout = params.provider_timeout;
    let run_turn = Arc::new(RunTurnUseCase::new(
        registry.clone(),
        aggregator.clone(),
        writer,
        params,
    ));
    let ask = Arc::new(AskProviderUseCase::new(registry, provider_timeout));
    let synthesize = Arc::new(SynthesizeUseCase::new(aggregator));

    Ok(Services {
        run_turn,
        ask,
        synthesize,
        history: reader,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
