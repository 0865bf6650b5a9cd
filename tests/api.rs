use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use predmirror::{
    adapters::{
        anchor_discriminator, AccountFetcher, AccountSource, AnchorDecoder, ProgramHandle,
        RawAccount,
    },
    api::{create_router, AppState},
    config::{DecoderConfig, FetcherConfig},
    domain::{AccountKind, Address, Category, Cluster},
    engine::{discover_category, discover_dependents, run_tick, EnvironmentContext, Environments},
    error::Result,
};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

#[derive(Default)]
struct MemorySource {
    accounts: Mutex<BTreeMap<Address, RawAccount>>,
}

impl MemorySource {
    fn insert(&self, address: Address, account: RawAccount) {
        self.accounts.lock().unwrap().insert(address, account);
    }

    fn remove(&self, address: &Address) {
        self.accounts.lock().unwrap().remove(address);
    }
}

#[async_trait]
impl AccountSource for MemorySource {
    async fn get_multiple_accounts(&self, addresses: &[Address]) -> Result<Vec<Option<RawAccount>>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(addresses.iter().map(|a| accounts.get(a).cloned()).collect())
    }

    async fn get_program_accounts(
        &self,
        _program: &Address,
        discriminator: &[u8],
    ) -> Result<Vec<(Address, RawAccount)>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .filter(|(_, account)| account.data.starts_with(discriminator))
            .map(|(address, account)| (*address, account.clone()))
            .collect())
    }
}

fn account(kind: AccountKind, fill: u8) -> RawAccount {
    let mut data = vec![fill; 48];
    data[..8].copy_from_slice(&anchor_discriminator(kind.account_name()));
    RawAccount {
        lamports: 1_000,
        owner: Address::new([0u8; 32]),
        data,
    }
}

fn game(round_history: Address, user_prediction_history: Address) -> RawAccount {
    let cfg = DecoderConfig::default();
    let mut data = vec![0u8; 200];
    data[..8].copy_from_slice(&anchor_discriminator("Game"));
    let rh = cfg.game_round_history_offset;
    let uph = cfg.game_user_prediction_history_offset;
    data[rh..rh + 32].copy_from_slice(round_history.as_bytes());
    data[uph..uph + 32].copy_from_slice(user_prediction_history.as_bytes());
    RawAccount {
        lamports: 1_000,
        owner: Address::new([0u8; 32]),
        data,
    }
}

struct Harness {
    source: Arc<MemorySource>,
    ctx: Arc<EnvironmentContext>,
    app: Router,
}

fn harness() -> Harness {
    let source = Arc::new(MemorySource::default());
    let program = Arc::new(ProgramHandle::new(
        Address::new([200u8; 32]),
        Address::new([201u8; 32]),
        source.clone(),
        Arc::new(AnchorDecoder::default()),
    ));
    let fetcher = Arc::new(AccountFetcher::new(source.clone(), FetcherConfig::default()));
    let ctx = Arc::new(EnvironmentContext::new(Cluster::Devnet, program, fetcher));

    let mut environments = Environments::new();
    environments.insert(Arc::clone(&ctx));
    let app = create_router(AppState::new(Arc::new(environments)));

    Harness { source, ctx, app }
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

#[tokio::test]
async fn unknown_environment_is_not_found() {
    let h = harness();

    let (status, body) = get_json(&h.app, "/foo/game").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains("foo"));

    // Configured name but not registered in this process
    let (status, _) = get_json(&h.app, "/mainnet/vault").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_environment_serves_empty_collections() {
    let h = harness();

    for uri in ["/devnet/vault", "/devnet/round", "/devnet/game"] {
        let (status, body) = get_json(&h.app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, Value::Array(vec![]), "{uri}");
    }
    let (status, body) = get_json(&h.app, "/devnet/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Object(Default::default()));
}

#[tokio::test]
async fn evicted_vault_disappears_from_listing() {
    let h = harness();
    let v1 = Address::new([1u8; 32]);
    let v2 = Address::new([2u8; 32]);
    h.source.insert(v1, account(AccountKind::Vault, 7));
    h.source.insert(v2, account(AccountKind::Vault, 8));

    discover_category(&h.ctx, Category::Vault).await.unwrap();
    let (_, body) = get_json(&h.app, "/devnet/vault").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    h.source.remove(&v1);
    h.ctx.fetcher().poll_once().await;

    let (status, body) = get_json(&h.app, "/devnet/vault").await;
    assert_eq!(status, StatusCode::OK);
    let vaults = body.as_array().unwrap();
    assert_eq!(vaults.len(), 1);
    assert_eq!(vaults[0]["address"], v2.to_string());
    assert!(!h.ctx.is_member(Category::Vault, &v1));
}

#[tokio::test]
async fn history_merges_dependents_per_game() {
    let h = harness();
    let g1 = Address::new([10u8; 32]);
    let g1_rh = Address::new([11u8; 32]);
    let g1_uph = Address::new([12u8; 32]);
    let g2 = Address::new([20u8; 32]);
    let g2_rh = Address::new([21u8; 32]);
    let g2_uph = Address::new([22u8; 32]);

    h.source.insert(g1, game(g1_rh, g1_uph));
    h.source.insert(g2, game(g2_rh, g2_uph));
    h.source.insert(g1_rh, account(AccountKind::RoundHistory, 3));
    h.source.insert(g1_uph, account(AccountKind::UserPredictionHistory, 4));
    h.source.insert(g2_rh, account(AccountKind::RoundHistory, 5));

    discover_category(&h.ctx, Category::Game).await.unwrap();
    let report = discover_dependents(&h.ctx);
    assert_eq!(report.games, 2);
    h.ctx.fetcher().poll_once().await;

    let (status, body) = get_json(&h.app, "/devnet/history").await;
    assert_eq!(status, StatusCode::OK);

    let first = &body[g1.to_string()];
    assert_eq!(first["roundHistory"]["address"], g1_rh.to_string());
    assert_eq!(first["userPredictionHistory"]["address"], g1_uph.to_string());

    // G2's prediction history account is missing; the round history half still shows
    let second = &body[g2.to_string()];
    assert_eq!(second["roundHistory"]["address"], g2_rh.to_string());
    assert!(second["userPredictionHistory"].is_null());

    let (_, games) = get_json(&h.app, "/devnet/game").await;
    assert_eq!(games.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_reports_after_first_tick() {
    let h = harness();

    let (status, _) = get_json(&h.app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&h.app, "/health").await;
    assert_eq!(body["status"], "starting");

    h.source.insert(Address::new([1u8; 32]), account(AccountKind::Round, 9));
    run_tick(&h.ctx).await;

    let (status, body) = get_json(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environments"][0]["rounds"], 1);
}
