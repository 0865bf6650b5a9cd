use std::sync::Arc;

use super::EnvironmentContext;
use crate::adapters::fake::FakeSource;
use crate::adapters::{AccountFetcher, AnchorDecoder, ProgramHandle};
use crate::config::FetcherConfig;
use crate::domain::{Address, Cluster};

/// Environment backed by an in-memory source
pub(crate) fn context(cluster: Cluster) -> (Arc<FakeSource>, Arc<EnvironmentContext>) {
    let source = Arc::new(FakeSource::default());
    let program = Arc::new(ProgramHandle::new(
        Address::new([200u8; 32]),
        Address::new([201u8; 32]),
        source.clone(),
        Arc::new(AnchorDecoder::default()),
    ));
    let fetcher = Arc::new(AccountFetcher::new(source.clone(), FetcherConfig::default()));
    (source, Arc::new(EnvironmentContext::new(cluster, program, fetcher)))
}
