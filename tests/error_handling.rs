//! Degraded backends and malformed input.

use sheet_sync::{
    Backends, ManualClock, MemoryBroadcast, MemorySharedStore, MemorySource, RefreshOutcome,
    SheetManager, SyncConfig, SyncError, Timestamp, TypedValue, UpdateSource, WriteBack,
};
use std::sync::Arc;
use std::time::Duration;

const DOC: &str = "\"Name\",\"Type\",\"Value\"\n\"Health\",\"number\",\"100\"";

struct Setup {
    source: Arc<MemorySource>,
    store: Arc<MemorySharedStore>,
    bus: Arc<MemoryBroadcast>,
    clock: ManualClock,
}

impl Setup {
    fn new() -> Self {
        let clock = ManualClock::new(Timestamp(20_000));
        Self {
            source: Arc::new(MemorySource::new(DOC)),
            store: Arc::new(MemorySharedStore::new()),
            bus: Arc::new(MemoryBroadcast::with_clock(Arc::new(clock.clone()))),
            clock,
        }
    }

    fn manager(&self) -> SheetManager {
        let config = SyncConfig::new("sheet-err")
            .with_refresh_interval(Duration::from_secs(30))
            .with_scheduler(false);
        let backends = Backends::new(self.source.clone(), self.store.clone(), self.bus.clone())
            .with_clock(Arc::new(self.clock.clone()));
        SheetManager::new(config, backends).unwrap()
    }
}

// --- Remote Source ---

#[test]
fn test_unreachable_remote_still_constructs() {
    let setup = Setup::new();
    setup.source.set_failing(true);

    let manager = setup.manager();

    assert!(manager.is_alive());
    assert!(manager.values().is_empty());
    assert_eq!(manager.last_updated_at(), Timestamp::ZERO);
    assert_eq!(manager.last_source(), None);
    assert_eq!(manager.stats().remote_failures, 1);
    assert!(setup.store.get(&manager.key()).is_none());
    assert!(setup.bus.published().is_empty());
}

#[test]
fn test_http_error_status_is_a_failure() {
    let setup = Setup::new();
    setup.source.set_status(500);
    let manager = setup.manager();

    let outcome = manager.refresh_now();

    assert_eq!(outcome, RefreshOutcome::Failed(SyncError::HttpStatus(500)));
    assert!(!outcome.is_success());
    assert!(manager.value("Health").is_none());
    assert_eq!(manager.stats().remote_failures, 2);
    assert_eq!(manager.stats().remote_fetches, 0);
}

#[test]
fn test_recovers_after_remote_failure() {
    let setup = Setup::new();
    setup.source.set_failing(true);
    let manager = setup.manager();

    setup.source.set_failing(false);
    let outcome = manager.refresh_now();

    assert_eq!(
        outcome,
        RefreshOutcome::FromRemote {
            changed: true,
            write_back: WriteBack::Stored,
            published: true,
        }
    );
    assert_eq!(manager.value("Health"), Some(TypedValue::Number(100.0)));
    assert_eq!(setup.source.fetch_count(), 2);
}

#[test]
fn test_failure_keeps_previous_values() {
    let setup = Setup::new();
    let manager = setup.manager();

    setup.clock.advance(30);
    setup.source.set_failing(true);
    let outcome = manager.refresh_now();

    assert!(matches!(outcome, RefreshOutcome::Failed(SyncError::Transport(_))));
    assert_eq!(manager.value("Health"), Some(TypedValue::Number(100.0)));
    assert_eq!(manager.last_updated_at(), Timestamp(20_000));
}

// --- Shared Store ---

#[test]
fn test_unreachable_store_falls_back_to_remote() {
    let setup = Setup::new();
    setup.store.set_failing(true);

    let manager = setup.manager();

    assert_eq!(manager.value("Health"), Some(TypedValue::Number(100.0)));
    assert_eq!(manager.last_source(), Some(UpdateSource::RemoteApi));
    // One failed read, one failed write-back.
    assert_eq!(manager.stats().store_failures, 2);

    setup.clock.advance(30);
    let outcome = manager.refresh_now();
    assert_eq!(
        outcome,
        RefreshOutcome::FromRemote {
            changed: false,
            write_back: WriteBack::Failed,
            published: true,
        }
    );
}

// --- Broadcast ---

#[test]
fn test_unreachable_broadcast_falls_back_to_polling() {
    let setup = Setup::new();
    setup.bus.set_failing(true);

    let manager = setup.manager();

    assert!(!manager.is_listening());
    assert_eq!(manager.value("Health"), Some(TypedValue::Number(100.0)));
    assert_eq!(manager.stats().broadcast_failures, 1);

    setup.clock.advance(30);
    setup
        .source
        .set_body("\"Name\",\"Type\",\"Value\"\n\"Health\",\"number\",\"80\"");
    let outcome = manager.refresh_now();

    assert_eq!(
        outcome,
        RefreshOutcome::FromRemote {
            changed: true,
            write_back: WriteBack::Stored,
            published: false,
        }
    );
    assert_eq!(manager.value("Health"), Some(TypedValue::Number(80.0)));
}

// --- Malformed Input ---

#[test]
fn test_malformed_rows_are_skipped() {
    let setup = Setup::new();
    setup.source.set_body(
        [
            "\"Name\",\"Type\",\"Value\"",
            "\"Good\",\"number\",\"1\"",
            "not a row",
            "\"TooFew\",\"number\"",
            "\"Too\",\"many\",\"fields\",\"here\"",
            "",
            "\"AlsoGood\",\"string\",\"ok\"",
        ]
        .join("\n"),
    );

    let manager = setup.manager();

    let values = manager.values();
    assert_eq!(values.len(), 2);
    assert_eq!(values["Good"], TypedValue::Number(1.0));
    assert_eq!(values["AlsoGood"], TypedValue::String("ok".into()));
}

#[test]
fn test_unparseable_number_becomes_zero() {
    let setup = Setup::new();
    setup
        .source
        .set_body("\"Name\",\"Type\",\"Value\"\n\"Speed\",\"number\",\"fast\"");

    let manager = setup.manager();

    assert_eq!(manager.value("Speed"), Some(TypedValue::Number(0.0)));
}

#[test]
fn test_get_returns_default_for_missing_name() {
    let setup = Setup::new();
    let manager = setup.manager();

    assert_eq!(
        manager.get("Missing", TypedValue::String("fallback".into())),
        TypedValue::String("fallback".into())
    );
}

#[test]
fn test_invalid_config_from_json() {
    let result = SyncConfig::from_json(r#"{"document_id": "", "refresh_interval_secs": 60}"#);
    assert!(matches!(result, Err(SyncError::InvalidConfig(_))));

    let result = SyncConfig::from_json("{not json");
    assert!(matches!(result, Err(SyncError::Deserialization(_))));
}
