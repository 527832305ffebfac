// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve`: wires storage, the model, tools, Telegram, and the
//! admin server, then runs until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use courier_agent::{
    AdminService, ConversationRegistry, InboundGateway, Pipeline, PipelineSettings, TaskScheduler,
    install_signal_handler, load_system_prompt,
};
use courier_config::CourierConfig;
use courier_core::{ChatChannel, CourierError, PluginAdapter};
use courier_gateway::{GatewayState, ServerConfig, start_server};
use courier_openai::OpenAiModel;
use courier_skill::{FalImageClient, ToolRegistry, builtin};
use courier_storage::SqliteStore;
use courier_telegram::TelegramChannel;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How often idle conversation locks are dropped from the registry.
const PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Crates whose log level follows `agent.log_level`.
const LOG_TARGETS: &[&str] = &[
    "courier",
    "courier_agent",
    "courier_config",
    "courier_gateway",
    "courier_openai",
    "courier_skill",
    "courier_storage",
    "courier_telegram",
];

/// Runs the relay until a shutdown signal arrives.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.agent.log_level);
    info!("starting courier serve");

    let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
    info!(path = %config.storage.database_path, "storage ready");

    let registry = Arc::new(ConversationRegistry::new());

    let model = OpenAiModel::new(&config.model).map_err(|e| {
        error!(error = %e, "failed to initialize model client");
        eprintln!("error: model API key required. Set model.api_key or OPENAI_API_KEY");
        e
    })?;
    info!(model = config.model.model.as_str(), "model client ready");

    let mut tools = ToolRegistry::new();
    builtin::register_builtins(&mut tools);
    info!("tool registry initialized with {} built-in tools", tools.len());

    let settings = pipeline_settings(&config).await?;
    let mut pipeline = Pipeline::new(
        store.clone(),
        Arc::clone(&registry),
        Arc::new(model),
        Arc::new(tools),
        settings,
    );
    if config.image.enabled {
        let images = FalImageClient::new(&config.image)?;
        pipeline = pipeline.with_image_generator(Arc::new(images));
        info!(model = config.image.model.as_str(), "image generation enabled");
    } else {
        debug!("image generation disabled by configuration");
    }
    let scheduler = if config.scheduler.enabled {
        let scheduler = Arc::new(TaskScheduler::new(
            store.clone(),
            config.scheduler.max_pending_per_conversation,
        ));
        pipeline = pipeline.with_scheduler(Arc::clone(&scheduler));
        Some(scheduler)
    } else {
        debug!("task scheduling disabled by configuration");
        None
    };
    let pipeline = Arc::new(pipeline);

    let channel: Option<Arc<dyn ChatChannel>> = if config.telegram.bot_token.is_some() {
        let mut telegram = TelegramChannel::new(config.telegram.clone())?;
        telegram.connect().await?;
        Some(Arc::new(telegram))
    } else {
        info!("telegram channel skipped (no bot_token configured)");
        None
    };

    let mut admin = AdminService::new(Arc::clone(&pipeline), config.admin.page_size);
    if let Some(channel) = &channel {
        admin = admin.with_channel(Arc::clone(channel));
    }

    if channel.is_none() && !config.admin.enabled {
        warn!("neither Telegram nor the admin server is enabled, nothing to serve");
        return Ok(());
    }

    let cancel = install_signal_handler();
    spawn_lock_pruner(Arc::clone(&registry), cancel.clone());

    let admin_task = {
        let cancel = cancel.clone();
        let admin = admin.clone();
        let enabled = config.admin.enabled;
        let server_config = ServerConfig {
            host: config.admin.host.clone(),
            port: config.admin.port,
        };
        async move {
            if !enabled {
                debug!("admin server disabled by configuration");
                return Ok(());
            }
            let result = start_server(&server_config, GatewayState::new(admin), cancel.clone()).await;
            if result.is_err() {
                cancel.cancel();
            }
            result
        }
    };

    let scheduler_task = {
        let cancel = cancel.clone();
        let channel = channel.clone();
        let pipeline = Arc::clone(&pipeline);
        async move {
            match scheduler {
                Some(scheduler) => scheduler.run(pipeline, channel, cancel).await,
                None => Ok(()),
            }
        }
    };

    let inbound_task = {
        let cancel = cancel.clone();
        let channel = channel.clone();
        async move {
            match channel {
                Some(channel) => {
                    Arc::new(InboundGateway::new(channel, pipeline, admin))
                        .run(cancel)
                        .await
                }
                None => Ok(()),
            }
        }
    };

    let (admin_result, inbound_result, scheduler_result) =
        tokio::join!(admin_task, inbound_task, scheduler_task);

    if let Some(channel) = &channel
        && let Err(e) = channel.shutdown().await
    {
        warn!(error = %e, "channel shutdown failed");
    }

    admin_result?;
    inbound_result?;
    scheduler_result?;
    info!("courier serve shutdown complete");
    Ok(())
}

/// Pipeline settings with the default system prompt resolved from the
/// agent config.
async fn pipeline_settings(config: &CourierConfig) -> Result<PipelineSettings, CourierError> {
    let system_prompt = load_system_prompt(&config.agent).await?;
    Ok(PipelineSettings::from_config(&config.pipeline, system_prompt))
}

/// Periodically drops registry entries for conversations nobody holds.
fn spawn_lock_pruner(registry: Arc<ConversationRegistry>, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let pruned = registry.prune_idle();
                    if pruned > 0 {
                        debug!(pruned, "pruned idle conversation locks");
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
    });
}

fn log_directives(log_level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the config level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
