//! CLI entrypoint for docuforge
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use docuforge_application::{
    ActivityObserver, AgentConfigStore, ConversationLogger, DocumentOrchestrator,
    OrchestrationRequest, ProviderRouter,
};
use docuforge_domain::{OutputFormat, SessionId};
use docuforge_infrastructure::{
    BroadcastNotifier, ConfigLoader, FileConfig, JsonFileStore, JsonlConversationLogger,
    build_registry,
};
use docuforge_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
    cancel_on_ctrl_c, print_stream,
};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(cli.log_level(), config.logging.dir.as_deref());

    if !config.output.color {
        colored::control::set_override(false);
    }

    info!("Starting docuforge");

    let orchestrator = Arc::new(build_orchestrator(&config)?);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        config.output.format
    };

    if !cli.quiet && config.output.show_progress && format == OutputFormat::Text {
        let observer: Arc<dyn ActivityObserver> = if std::io::stderr().is_terminal() {
            Arc::new(ProgressReporter::new())
        } else {
            Arc::new(SimpleProgress)
        };
        orchestrator.register_observer(observer);
    }

    let session = SessionId::new(cli.session.clone());

    // Chat mode
    if cli.chat {
        ChatRepl::new(Arc::clone(&orchestrator), session)
            .with_format(format)
            .with_stream(cli.stream)
            .with_history_turns(config.pipeline.history_window)
            .run()
            .await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Single request mode - message is required
    let Some(message) = cli.message.clone() else {
        bail!("A message is required. Use --chat for interactive mode.");
    };

    let (token, watcher) = cancel_on_ctrl_c();
    let request = OrchestrationRequest::new(session.clone(), message).with_cancellation(token);

    let success = if cli.stream {
        let handle = orchestrator.stream_response(request);
        let reply = print_stream(handle, &mut std::io::stdout()).await;
        !reply.starts_with("Error:")
    } else {
        let result = orchestrator.process_user_request(request).await;
        println!("{}", ConsoleFormatter.render(&result, format));
        result.success
    };
    watcher.abort();

    if cli.show_state {
        let state = orchestrator.current_state(&session);
        match format {
            OutputFormat::Text => println!("{}", ConsoleFormatter::format_state(&state)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        }
    }

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Console logging filtered by `-v` (overridable with `RUST_LOG`), plus a
/// daily-rolling file when a log directory is configured.
fn init_tracing(level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "docuforge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}

/// Wire providers, storage, notifications and logging into an orchestrator.
fn build_orchestrator(config: &FileConfig) -> Result<DocumentOrchestrator> {
    let registry = build_registry(&config.providers, config.pipeline.stream_pacing());
    if registry.len() == 1 {
        info!("No provider credentials found, every request will use the mock provider");
    }

    let logger: Option<Arc<dyn ConversationLogger>> = config
        .logging
        .conversation_log
        .as_ref()
        .and_then(JsonlConversationLogger::new)
        .map(|logger| Arc::new(logger) as Arc<dyn ConversationLogger>);

    let mut router = ProviderRouter::new(Arc::new(registry), Arc::new(config.agents.clone()));
    if let Some(logger) = &logger {
        router = router.with_logger(Arc::clone(logger));
    }

    let configs = Arc::new(
        AgentConfigStore::new(config.agents.clone()).context("Invalid [agents] configuration")?,
    );

    let mut orchestrator = DocumentOrchestrator::new(router, configs)
        .with_store(Arc::new(JsonFileStore::new(&config.storage.documents_dir)))
        .with_notifier(Arc::new(BroadcastNotifier::default()))
        .with_params(config.pipeline.to_params());
    if let Some(logger) = logger {
        orchestrator = orchestrator.with_logger(logger);
    }
    Ok(orchestrator)
}
