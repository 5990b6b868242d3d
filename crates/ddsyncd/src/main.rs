// # ddsyncd - ddsync Daemon
//
// This is a THIN integration layer. Reconciliation, caching and failure
// classification all live in ddsync-core; nothing here decides whether a
// record gets written.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables (see `config.rs`)
// 2. Initializing tracing and the runtime
// 3. Registering backends and building the engine's collaborators
// 4. Running the engine until SIGTERM/SIGINT, or for one pass in run-once mode
//
// ## Example
//
// ```bash
// export DDSYNC_DOMAINS="example.com:@,www"
// export DDSYNC_PROVIDER_API_TOKEN=your_token
// export DDSYNC_INTERVAL=300
//
// ddsyncd
// ```

mod config;

use anyhow::{Context, Result};
use config::Config;
use ddsync_core::{
    Collaborators, EngineEvent, NotificationManager, ProviderRegistry, SyncEngine, WebhookExecutor,
};
use ddsync_notify::{HttpWebhook, SlackNotifier, TelegramNotifier};
use ddsync_resolver::HickoryResolver;
use std::future::Future;
use std::process::ExitCode;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown, or a successful run-once pass
/// - 1: Configuration or startup error
/// - 2: Runtime error, including a failed run-once pass
#[derive(Debug, Clone, Copy)]
enum DdsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdsyncExitCode> for ExitCode {
    fn from(code: DdsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdsyncExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdsyncExitCode::ConfigError.into();
    }

    info!("Starting ddsyncd daemon");
    info!(
        "Configuration loaded: {} domain(s), run once: {}",
        config.domains.len(),
        config.run_once
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdsyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Build the engine and run it to completion
async fn run_daemon(config: Config) -> DdsyncExitCode {
    let (mut engine, events) = match build_engine(&config).await {
        Ok(built) => built,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdsyncExitCode::ConfigError;
        }
    };

    tokio::spawn(log_events(events));

    let shutdown = match shutdown_signal() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdsyncExitCode::RuntimeError;
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let signal = shutdown.await;
        info!("Received shutdown signal: {}", signal);
        let _ = shutdown_tx.send(());
    });

    match engine.run_with_shutdown(shutdown_rx).await {
        Ok(()) => {
            info!("ddsyncd stopped");
            DdsyncExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DdsyncExitCode::RuntimeError
        }
    }
}

/// Register backends and assemble the engine's collaborators
async fn build_engine(config: &Config) -> Result<(SyncEngine, mpsc::Receiver<EngineEvent>)> {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        ddsync_provider_cloudflare::register(&mut registry);
    }

    #[cfg(feature = "http")]
    {
        info!("Registering HTTP IP detector");
        ddsync_ip_http::register(&mut registry);
    }

    let settings = config.settings();

    let ip_detector = registry
        .create_ip_detector("http", &config.ip_urls, settings.ip_type)
        .context("Failed to create IP detector")?;

    let provider = registry
        .create_provider(&config.provider_config())
        .context("Failed to create DNS provider")?;

    let resolver = HickoryResolver::new(settings.resolver.as_deref())
        .await
        .context("Failed to create DNS resolver")?;

    let webhook = if settings.webhook.enabled {
        let webhook = HttpWebhook::new(&settings.webhook).context("Failed to create webhook")?;
        Some(Box::new(webhook) as Box<dyn WebhookExecutor>)
    } else {
        None
    };

    let mut notifications = NotificationManager::new();
    if let Some(url) = &config.slack_webhook_url {
        notifications = notifications.with_notifier(Box::new(SlackNotifier::new(url.clone())?));
    }
    if let (Some(token), Some(chat_id)) = (&config.telegram_bot_token, &config.telegram_chat_id) {
        notifications =
            notifications.with_notifier(Box::new(TelegramNotifier::new(token.clone(), chat_id.clone())?));
    }

    info!(
        "Using provider {}, detector {}, {} notification channel(s)",
        provider.provider_name(),
        ip_detector.detector_name(),
        notifications.len()
    );

    let collaborators = Collaborators {
        ip_detector,
        resolver: Box::new(resolver),
        provider,
        webhook,
        notifications,
    };

    Ok(SyncEngine::new(collaborators, settings)?)
}

/// Drain engine events into the log
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::PassFailed { error } => warn!("Pass failed: {}", error),
            EngineEvent::DomainUpdated {
                domain_name,
                sub_domains,
                ip,
            } => info!("Updated [ {} ] of {} to {}", sub_domains.join(", "), domain_name, ip),
            other => debug!("Engine event: {:?}", other),
        }
    }
}

/// Future resolving on the first SIGTERM or SIGINT
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Future resolving on Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}
