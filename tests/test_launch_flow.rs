//! End-to-end launch conversations against scripted collaborators.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};

use burst_agent::config::{Config, ConfirmationGate, PinningConfig};
use burst_agent::launch::aggregator::{Aggregator, TurnOutcome};
use burst_agent::launch::builder::{select_curve_index, TransactionBuilder};
use burst_agent::launch::completeness::{can_request_confirmation, missing_required};
use burst_agent::launch::dex::{BurstDex, DexAllocation};
use burst_agent::launch::draft::{DraftRecord, PartialDraft};
use burst_agent::launch::fields::FieldName;
use burst_agent::launch::status::render_outcome;
use burst_agent::ledger::scripted::{curve, ScriptedLedger};
use burst_agent::ledger::{LedgerClient, Network};
use burst_agent::llm::providers::dummy::DummyProvider;
use burst_agent::llm::LlmProvider;
use burst_agent::nlu::Nlu;
use burst_agent::pinning::{self, PinningService};
use burst_agent::store::file::FileDraftStore;
use burst_agent::store::memory::MemoryDraftStore;
use burst_agent::store::DraftStore;

const CREATOR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

const HAPPY_EXTRACTION: &str = r#"{
    "name": "Test", "symbol": "TST", "totalSupply": 1000000000, "description": "d",
    "burstAmount": 300, "dexAllocations": [{"dex": "APEX", "allocation": 10000}],
    "rewardDex": "APEX", "creatorAddress": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
}"#;

const HAPPY_MESSAGE: &str = "create a token: name Test, symbol TST, 1B supply, description d, \
    burst at 300 AVAX, 100% APEX with APEX as reward DEX, \
    creator 0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

fn happy_draft() -> DraftRecord {
    DraftRecord {
        name: Some("Test".into()),
        symbol: Some("TST".into()),
        total_supply: Some(1_000_000_000),
        description: Some("d".into()),
        burst_amount: Some(300.0),
        dex_allocations: Some(vec![DexAllocation::new(BurstDex::Apex, 10_000)]),
        reward_dex: Some(BurstDex::Apex),
        creator_address: Some(CREATOR.into()),
        ..Default::default()
    }
}

struct Agent {
    aggregator: Aggregator,
    llm: DummyProvider,
    ledger: ScriptedLedger,
}

fn agent_with(store: Arc<dyn DraftStore>, pinning: PinningService) -> Agent {
    let cfg = Config::test_default(std::path::Path::new("/tmp"));
    let llm = DummyProvider::new();
    let ledger = ScriptedLedger::demo();
    let builder = TransactionBuilder::new(
        LedgerClient::Scripted(ledger.clone()),
        pinning,
        &cfg.chain,
        &cfg.pinning,
    );
    let aggregator = Aggregator::new(
        "agent",
        store,
        Nlu::new(LlmProvider::Dummy(llm.clone())),
        builder,
        ConfirmationGate::Ready,
        cfg.drafts.ttl,
    );
    Agent { aggregator, llm, ledger }
}

fn agent() -> Agent {
    agent_with(Arc::new(MemoryDraftStore::new()), PinningService::Disabled)
}

// ── Properties ───────────────────────────────────────────────────────────────

#[test]
fn test_merge_overwrites_present_and_keeps_absent() {
    let bases = [DraftRecord::default(), happy_draft()];
    let updates = [
        PartialDraft::default(),
        PartialDraft { name: Some("Other".into()), ..Default::default() },
        PartialDraft {
            dex_allocations: Some(vec![
                DexAllocation::new(BurstDex::Joe, 4000),
                DexAllocation::new(BurstDex::Pharaoh, 6000),
            ]),
            trading_fee: Some(0),
            ..Default::default()
        },
    ];

    for base in &bases {
        for update in &updates {
            let mut merged = base.clone();
            merged.merge(update);

            assert_eq!(merged.name, update.name.clone().or(base.name.clone()));
            assert_eq!(merged.symbol, base.symbol);
            assert_eq!(
                merged.dex_allocations,
                update.dex_allocations.clone().or(base.dex_allocations.clone())
            );
            assert_eq!(merged.trading_fee, update.trading_fee.or(base.trading_fee));
            assert_eq!(merged.received_token_request, base.received_token_request);
        }
    }
}

#[test]
fn test_allocation_sum_must_be_full() {
    for weights in [vec![9999], vec![5000, 5001], vec![6000, 3000], vec![0]] {
        let venues = [BurstDex::Apex, BurstDex::Joe];
        let allocations = weights
            .iter()
            .zip(venues)
            .map(|(w, d)| DexAllocation::new(d, *w))
            .collect();
        let d = DraftRecord { dex_allocations: Some(allocations), ..happy_draft() };
        assert!(!can_request_confirmation(&d), "weights {weights:?}");
    }
}

#[test]
fn test_reward_dex_must_be_allocated() {
    let d = DraftRecord {
        dex_allocations: Some(vec![DexAllocation::new(BurstDex::Joe, 10_000)]),
        reward_dex: Some(BurstDex::Apex),
        ..happy_draft()
    };
    assert!(missing_required(&d).is_empty());
    assert!(!can_request_confirmation(&d));
}

#[test]
fn test_missing_required_is_idempotent() {
    let d = DraftRecord { symbol: Some("TST".into()), description: Some(String::new()), ..Default::default() };
    let first = missing_required(&d);
    let second = missing_required(&d);
    assert_eq!(first, second);
    assert!(first.contains(&FieldName::Description));
    assert!(!first.contains(&FieldName::Symbol));
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry() {
    let store = MemoryDraftStore::new();
    let ttl = Duration::from_secs(7 * 24 * 60 * 60);
    store.set("agent", "u", &happy_draft(), ttl).unwrap();

    tokio::time::advance(ttl - Duration::from_secs(1)).await;
    assert_eq!(store.get("agent", "u"), happy_draft());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(store.get("agent", "u").is_untouched());
}

#[test]
fn test_curve_selection_rounding() {
    let curves = vec![curve(1, 2, 50), curve(2, 2, 55), curve(3, 2, 60)];
    assert_eq!(select_curve_index(52.0, &curves, 2, 37), 1);
    assert_eq!(select_curve_index(1000.0, &curves, 2, 37), 37);
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_happy_path() {
    let a = agent();
    assert!(can_request_confirmation(&happy_draft()));

    a.llm.push(HAPPY_EXTRACTION);
    let outcome = a.aggregator.handle_turn("u", HAPPY_MESSAGE).await;
    match outcome {
        TurnOutcome::AwaitingConfirmation { draft, .. } => assert_eq!(draft.name.as_deref(), Some("Test")),
        other => panic!("expected confirmation request, got {other:?}"),
    }

    a.llm.push(r#"{"isConfirmed": true}"#);
    match a.aggregator.handle_turn("u", "yes, let's launch").await {
        TurnOutcome::Launched { result, .. } => {
            assert_ne!(result.token, Address::ZERO);
            assert_ne!(result.tx, B256::ZERO);
        }
        other => panic!("expected launch, got {other:?}"),
    }

    assert!(a.aggregator.draft("u").is_untouched());
    let calls = a.ledger.submitted();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].curve_index, 38);
    assert_eq!(calls[0].creator, CREATOR.parse::<Address>().unwrap());
    assert!(calls[0].allocations[0].isReward);
}

#[tokio::test]
async fn test_invalid_allocation_sum_blocks_confirmation() {
    let a = agent();
    a.llm.push(
        r#"{"name": "Test", "symbol": "TST", "totalSupply": 1000000000, "description": "d",
            "burstAmount": 300, "rewardDex": "APEX",
            "dexAllocations": [{"dex": "APEX", "allocation": 6000}, {"dex": "JOE", "allocation": 3000}],
            "creatorAddress": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"}"#,
    );
    match a.aggregator.handle_turn("u", HAPPY_MESSAGE).await {
        TurnOutcome::Collecting { draft, .. } => {
            assert!(missing_required(&draft).is_empty());
            assert!(!can_request_confirmation(&draft));
        }
        other => panic!("expected collecting, got {other:?}"),
    }
    assert!(!a.aggregator.draft("u").has_requested_confirmation);
}

#[tokio::test]
async fn test_cancellation_mid_collection() {
    let a = agent();
    a.llm.push(r#"{"symbol": "TST"}"#);
    a.llm.push(r#"{"totalSupply": 1000}"#);
    a.aggregator.handle_turn("u", "I want to create a token, symbol TST").await;
    a.aggregator.handle_turn("u", "supply 1000").await;
    assert_eq!(a.aggregator.draft("u").total_supply, Some(1000));

    assert!(matches!(
        a.aggregator.handle_turn("u", "cancel").await,
        TurnOutcome::Cancelled { existed: true }
    ));
    assert!(a.aggregator.draft("u").is_untouched());
}

#[tokio::test]
async fn test_reward_venue_not_in_allocations() {
    let a = agent();
    a.llm.push(
        r#"{"name": "Test", "symbol": "TST", "totalSupply": 1000000000, "description": "d",
            "burstAmount": 300, "rewardDex": "APEX",
            "dexAllocations": [{"dex": "JOE", "allocation": 10000}],
            "creatorAddress": "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"}"#,
    );
    let outcome = a.aggregator.handle_turn("u", HAPPY_MESSAGE).await;
    assert!(matches!(outcome, TurnOutcome::Collecting { .. }));
    assert!(!can_request_confirmation(&a.aggregator.draft("u")));
}

#[tokio::test]
async fn test_pinning_outage_uses_fallback_uri() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let cfg = PinningConfig {
        enabled: true,
        api_base_url: format!("http://127.0.0.1:{port}"),
        timeout_seconds: 2,
        fallback_metadata_uri: "ipfs://fallback-metadata".into(),
    };
    let service = pinning::build(&cfg, Some("jwt".into())).unwrap();

    let base = Config::test_default(std::path::Path::new("/tmp"));
    let ledger = ScriptedLedger::demo();
    let builder = TransactionBuilder::new(LedgerClient::Scripted(ledger.clone()), service, &base.chain, &cfg);

    let result = builder.launch(&happy_draft()).await.unwrap();
    assert!(result.token_known());
    assert_eq!(ledger.submitted()[0].metadata_uri, "ipfs://fallback-metadata");
}

#[tokio::test]
async fn test_invalid_edit_holds_launch_until_corrected() {
    let a = agent();
    a.llm.push(HAPPY_EXTRACTION);
    a.aggregator.handle_turn("u", HAPPY_MESSAGE).await;

    a.llm.push("{}");
    a.llm.push(r#"{"symbol": "TOOLONGSYMBOL"}"#);
    a.aggregator.handle_turn("u", "change the symbol to TOOLONGSYMBOL").await;

    a.llm.push(r#"{"isConfirmed": true}"#);
    match a.aggregator.handle_turn("u", "yes").await {
        TurnOutcome::AwaitingConfirmation { draft, .. } => {
            assert!(!can_request_confirmation(&draft));
            let reply = render_outcome(
                &TurnOutcome::AwaitingConfirmation { draft, changed: vec![] },
                Network::Testnet,
            )
            .unwrap();
            assert!(reply.contains("Needs fixing:\n- symbol must be 1 to 10 characters"));
        }
        other => panic!("expected the launch to be held, got {other:?}"),
    }
    assert_eq!(a.aggregator.draft("u").symbol.as_deref(), Some("TOOLONGSYMBOL"));
    assert!(a.ledger.submitted().is_empty());

    a.llm.push("{}");
    a.llm.push(r#"{"symbol": "TST"}"#);
    a.aggregator.handle_turn("u", "fine, symbol TST").await;
    a.llm.push(r#"{"isConfirmed": true}"#);
    assert!(matches!(a.aggregator.handle_turn("u", "yes").await, TurnOutcome::Launched { .. }));
    assert_eq!(a.ledger.submitted()[0].symbol, "TST");
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drafts.json");

    let first = agent_with(Arc::new(FileDraftStore::open(path.clone()).unwrap()), PinningService::Disabled);
    first.llm.push(r#"{"symbol": "TST"}"#);
    first.aggregator.handle_turn("u", "create a token with symbol TST").await;

    let second = agent_with(Arc::new(FileDraftStore::open(path).unwrap()), PinningService::Disabled);
    let draft = second.aggregator.draft("u");
    assert_eq!(draft.symbol.as_deref(), Some("TST"));
    assert!(draft.received_token_request);
}
