//! Integration tests: several managers sharing one store and one topic.

use parking_lot::Mutex;
use sheet_sync::{
    Backends, DocumentSource, FetchResponse, ManualClock, MemoryBroadcast, MemorySharedStore,
    MemorySource, RefreshOutcome, SharedStoreRecord, SheetManager, SyncConfig, Timestamp,
    TypedValue, UpdateSource, ValueEvent, WriteBack,
};
use std::sync::Arc;
use std::time::Duration;

const HEADER: &str = "\"Name\",\"Type\",\"Value\"";

fn doc(rows: &[&str]) -> String {
    let mut lines = vec![HEADER];
    lines.extend_from_slice(rows);
    lines.join("\n")
}

/// Services shared by every simulated server process.
struct Cluster {
    source: Arc<MemorySource>,
    store: Arc<MemorySharedStore>,
    bus: Arc<MemoryBroadcast>,
    clock: ManualClock,
}

impl Cluster {
    fn new(body: &str) -> Self {
        let _ = tracing_subscriber::fmt::try_init();
        let clock = ManualClock::new(Timestamp(10_000));
        Self {
            source: Arc::new(MemorySource::new(body)),
            store: Arc::new(MemorySharedStore::new()),
            bus: Arc::new(MemoryBroadcast::with_clock(Arc::new(clock.clone()))),
            clock,
        }
    }

    fn backends(&self) -> Backends {
        Backends::new(self.source.clone(), self.store.clone(), self.bus.clone())
            .with_clock(Arc::new(self.clock.clone()))
    }

    /// A manager driven manually, as a server process would be between ticks.
    fn process(&self) -> SheetManager {
        SheetManager::new(config(), self.backends()).unwrap()
    }
}

fn config() -> SyncConfig {
    SyncConfig::new("sheet-1")
        .with_sub_document("Balance")
        .with_refresh_interval(Duration::from_secs(60))
        .with_scheduler(false)
}

// --- Single Process ---

#[test]
fn test_first_process_fetches_writes_back_and_broadcasts() {
    let body = doc(&[r#""Health","number","100""#]);
    let cluster = Cluster::new(&body);

    let manager = cluster.process();

    assert_eq!(manager.get("Health", TypedValue::Number(0.0)), TypedValue::Number(100.0));
    assert_eq!(manager.last_source(), Some(UpdateSource::RemoteApi));
    assert_eq!(
        cluster.store.get(&manager.key()),
        Some(SharedStoreRecord::new(Timestamp(10_000), body.clone()))
    );
    assert_eq!(cluster.bus.published(), vec![(manager.key(), body)]);
}

#[test]
fn test_all_value_types() {
    let cluster = Cluster::new(&doc(&[
        r#""A","number","42""#,
        r#""B","array","X,Y,Z""#,
        r#""C","dictionary","k1=v1,k2=v2""#,
        r#""D","unknowntype","raw""#,
        r#""E","Boolean","TRUE""#,
        r#""F","vector3","1,2,3""#,
    ]));

    let manager = cluster.process();

    assert_eq!(manager.value("A"), Some(TypedValue::Number(42.0)));
    assert_eq!(
        manager.value("B"),
        Some(TypedValue::Array(vec!["X".into(), "Y".into(), "Z".into()]))
    );
    let c = manager.value("C").unwrap();
    let map = c.as_dictionary().unwrap();
    assert_eq!(map.get("k1").map(String::as_str), Some("v1"));
    assert_eq!(map.get("k2").map(String::as_str), Some("v2"));
    assert_eq!(manager.value("D"), Some(TypedValue::String("raw".into())));
    assert_eq!(manager.value("E"), Some(TypedValue::Boolean(true)));
    assert_eq!(
        manager.value("F"),
        Some(TypedValue::Vector3(sheet_sync::Vector3 { x: 1.0, y: 2.0, z: 3.0 }))
    );
}

// --- Multiple Processes ---

#[test]
fn test_second_process_reads_shared_store() {
    let cluster = Cluster::new(&doc(&[r#""Health","number","100""#]));

    let first = cluster.process();
    cluster.clock.advance(5);
    let second = cluster.process();

    assert_eq!(cluster.source.fetch_count(), 1);
    assert_eq!(second.value("Health"), Some(TypedValue::Number(100.0)));
    assert_eq!(second.last_source(), Some(UpdateSource::SharedStore));
    assert_eq!(second.last_updated_at(), first.last_updated_at());
}

#[test]
fn test_broadcast_reaches_peers() {
    let cluster = Cluster::new(&doc(&[r#""Health","number","100""#]));
    let a = cluster.process();
    let b = cluster.process();
    let b_health = b.subscribe("Health");

    cluster.clock.advance(61);
    cluster.source.set_body(doc(&[r#""Health","number","150""#]));

    let outcome = a.refresh_now();
    assert_eq!(
        outcome,
        RefreshOutcome::FromRemote {
            changed: true,
            write_back: WriteBack::Stored,
            published: true,
        }
    );

    assert_eq!(b.value("Health"), Some(TypedValue::Number(150.0)));
    assert_eq!(b.last_source(), Some(UpdateSource::Broadcast));
    assert_eq!(b.last_updated_at(), Timestamp(10_061));
    assert_eq!(
        b_health.try_recv().unwrap(),
        ValueEvent::Changed {
            name: "Health".into(),
            new: TypedValue::Number(150.0),
            old: Some(TypedValue::Number(100.0)),
        }
    );

    // B is now fresh and does no I/O.
    assert_eq!(b.refresh_now(), RefreshOutcome::Fresh);
    assert_eq!(cluster.source.fetch_count(), 2);
    assert_eq!(b.stats().broadcasts_applied, 1);
}

#[test]
fn test_remote_fetches_once_per_interval_across_processes() {
    let cluster = Cluster::new(&doc(&[r#""Health","number","100""#]));
    let processes: Vec<SheetManager> = (0..5).map(|_| cluster.process()).collect();
    assert_eq!(cluster.source.fetch_count(), 1);

    for _ in 0..3 {
        cluster.clock.advance(60);
        for p in &processes {
            p.refresh_now();
        }
    }

    // One fetch per interval; everyone else got it by broadcast or store.
    assert_eq!(cluster.source.fetch_count(), 4);
    for p in &processes {
        assert_eq!(p.last_updated_at(), Timestamp(10_180));
    }
}

#[test]
fn test_stale_broadcast_is_discarded() {
    let cluster = Cluster::new(&doc(&[r#""Health","number","100""#]));
    let manager = cluster.process();
    let any = manager.subscribe_any();

    cluster
        .bus
        .deliver(&manager.key(), &doc(&[r#""Health","number","1""#]), 9_999.5);

    assert_eq!(manager.value("Health"), Some(TypedValue::Number(100.0)));
    assert!(any.try_recv().is_err());
    assert_eq!(manager.stats().broadcasts_discarded, 2);
}

/// Source that runs a hook (another process's refresh) mid-fetch.
struct HookSource {
    body: String,
    hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl DocumentSource for HookSource {
    fn fetch(&self, _: &str, _: Option<&str>) -> sheet_sync::Result<FetchResponse> {
        if let Some(hook) = self.hook.lock().take() {
            hook();
        }
        Ok(FetchResponse::ok(self.body.clone()))
    }
}

#[test]
fn test_write_back_race_adopts_peer_record() {
    let store = Arc::new(MemorySharedStore::new());
    let bus = Arc::new(MemoryBroadcast::with_clock(Arc::new(ManualClock::new(Timestamp(
        10_001,
    )))));
    let peer_body = doc(&[r#""Health","number","300""#]);

    // Peer with a clock one second ahead; its first fetch fails so it starts empty.
    let peer_clock = ManualClock::new(Timestamp(10_001));
    let peer_source = Arc::new(MemorySource::new(peer_body.clone()));
    peer_source.set_failing(true);
    let peer = Arc::new(
        SheetManager::new(
            config(),
            Backends::new(peer_source.clone(), store.clone(), bus.clone())
                .with_clock(Arc::new(peer_clock)),
        )
        .unwrap(),
    );
    peer_source.set_failing(false);

    let racing_peer = Arc::clone(&peer);
    let source = Arc::new(HookSource {
        body: doc(&[r#""Health","number","100""#]),
        hook: Mutex::new(Some(Box::new(move || {
            racing_peer.refresh_now();
        }))),
    });
    let manager = SheetManager::new(
        config().with_broadcasts(false),
        Backends::new(source, store.clone(), bus.clone())
            .with_clock(Arc::new(ManualClock::new(Timestamp(10_000)))),
    )
    .unwrap();

    assert_eq!(manager.value("Health"), Some(TypedValue::Number(300.0)));
    assert_eq!(manager.last_source(), Some(UpdateSource::SharedStoreOverride));
    assert_eq!(manager.last_updated_at(), Timestamp(10_001));
    assert_eq!(
        store.get(&manager.key()),
        Some(SharedStoreRecord::new(Timestamp(10_001), peer_body))
    );
    assert_eq!(manager.stats().overrides, 1);
}

// --- Subscriptions ---

#[test]
fn test_subscribe_any_fires_once_per_apply() {
    let cluster = Cluster::new(&doc(&[r#""A","number","1""#, r#""B","number","2""#]));
    let manager = cluster.process();
    let any = manager.subscribe_any();

    cluster.clock.advance(60);
    cluster
        .source
        .set_body(doc(&[r#""A","number","10""#, r#""B","number","20""#]));
    manager.refresh_now();

    let events: Vec<ValueEvent> = any.try_iter().collect();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ValueEvent::AllChanged { values } => {
            assert_eq!(values["A"], TypedValue::Number(10.0));
            assert_eq!(values["B"], TypedValue::Number(20.0));
        }
        other => panic!("Expected AllChanged, got {:?}", other),
    }
}

#[test]
fn test_unchanged_refetch_notifies_nothing() {
    let cluster = Cluster::new(&doc(&[r#""A","number","1""#]));
    let manager = cluster.process();
    let a = manager.subscribe("A");
    let any = manager.subscribe_any();

    cluster.clock.advance(60);
    let outcome = manager.refresh_now();

    assert!(matches!(outcome, RefreshOutcome::FromRemote { changed: false, .. }));
    assert!(a.try_recv().is_err());
    assert!(any.try_recv().is_err());
    assert_eq!(manager.last_updated_at(), Timestamp(10_060));
}

#[test]
fn test_unsubscribe() {
    let cluster = Cluster::new(&doc(&[r#""A","number","1""#]));
    let manager = cluster.process();
    let a = manager.subscribe("A");

    assert!(manager.unsubscribe(a.id));
    cluster.clock.advance(60);
    cluster.source.set_body(doc(&[r#""A","number","2""#]));
    manager.refresh_now();

    let events: Vec<ValueEvent> = a.try_iter().collect();
    assert!(events
        .iter()
        .all(|e| !matches!(e, ValueEvent::Changed { .. })));
}

// --- Scheduler ---

#[test]
fn test_scheduler_refreshes_in_background() {
    let cluster = Cluster::new(&doc(&[r#""A","number","1""#]));
    let manager = SheetManager::new(
        config()
            .with_refresh_interval(Duration::from_secs(1))
            .with_scheduler(true),
        cluster.backends(),
    )
    .unwrap();
    let a = manager.subscribe("A");

    cluster.clock.advance(5);
    cluster.source.set_body(doc(&[r#""A","number","2""#]));

    let event = a.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        event,
        ValueEvent::Changed {
            name: "A".into(),
            new: TypedValue::Number(2.0),
            old: Some(TypedValue::Number(1.0)),
        }
    );

    manager.destroy();
    let fetched = cluster.source.fetch_count();
    cluster.clock.advance(5);
    std::thread::sleep(Duration::from_millis(1_500));
    assert_eq!(cluster.source.fetch_count(), fetched);
}
