use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{EnvironmentContext, Environments};
use crate::adapters::{AccountFetcher, AnchorDecoder, ProgramHandle, SolanaRpcClient};
use crate::config::AppConfig;
use crate::domain::{Address, Cluster};
use crate::error::{MirrorError, Result};
use crate::signing::Identity;

/// Build the connection, program handle and fetcher for one cluster.
pub fn build_environment(
    cluster: Cluster,
    config: &AppConfig,
    identity: &Identity,
) -> Result<Arc<EnvironmentContext>> {
    let cluster_cfg = config.cluster(cluster);
    let program_id: Address = cluster_cfg.program_id.parse().map_err(|e| {
        MirrorError::InvalidConfig(format!("{cluster}.program_id: {e}"))
    })?;

    let rpc = Arc::new(SolanaRpcClient::new(
        &cluster_cfg.endpoint,
        Duration::from_secs(config.fetcher.request_timeout_secs),
    )?);
    let decoder = Arc::new(AnchorDecoder::new(&config.decoder));
    let program = Arc::new(ProgramHandle::new(
        program_id,
        identity.address(),
        rpc.clone(),
        decoder,
    ));
    let fetcher = Arc::new(AccountFetcher::new(rpc, config.fetcher.clone()));

    info!(
        "{cluster}: program {program_id} via {} ({})",
        cluster_cfg.endpoint,
        cluster.moniker()
    );
    Ok(Arc::new(EnvironmentContext::new(cluster, program, fetcher)))
}

/// Build every configured environment
pub fn build_environments(config: &AppConfig, identity: &Identity) -> Result<Environments> {
    let mut environments = Environments::new();
    for cluster in Cluster::ALL {
        environments.insert(build_environment(cluster, config, identity)?);
    }
    Ok(environments)
}
