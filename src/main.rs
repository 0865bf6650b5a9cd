use clap::Parser;
use predmirror::api::start_api_server;
use predmirror::cli::Cli;
use predmirror::config::AppConfig;
use predmirror::engine::build_environments;
use predmirror::error::{MirrorError, Result};
use predmirror::signing::Identity;
use predmirror::supervisor::{RestartPolicy, Scheduler};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config_dir, &cli.environment)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    main_runtime::init_logging(&config.logging);
    info!("predmirror starting (selector={})", cli.environment);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("config: {}", e);
        }
        return Err(MirrorError::InvalidConfig(errors.join("; ")));
    }

    let identity = Identity::from_env().map_err(|e| {
        error!("failed to load signing identity: {}", e);
        e
    })?;
    info!("identity: {}", identity.address());

    let environments = Arc::new(build_environments(&config, &identity)?);

    let mut schedulers = Vec::new();
    for ctx in environments.iter() {
        ctx.fetcher().start(RestartPolicy::from(&config.scheduler));
        schedulers.push(Scheduler::new(Arc::clone(ctx), config.scheduler.clone()).spawn());
    }

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => warn!("failed to listen for ctrl-c: {}", e),
        }
    };

    let served = start_api_server(
        Arc::clone(&environments),
        &config.server.bind_address,
        config.server.port,
        shutdown,
    )
    .await;

    for handle in schedulers {
        handle.abort();
    }
    for ctx in environments.iter() {
        ctx.fetcher().stop();
    }

    if let Err(e) = &served {
        error!("API server failed: {}", e);
    }
    info!("predmirror stopped");
    served
}
