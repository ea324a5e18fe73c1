//! Manager facade tying all components together.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backends::Backends;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::state::ValueStore;
use crate::subscriptions::{ChangeHandle, SubscriptionId};
use crate::sync::{
    PeriodicScheduler, RefreshOutcome, SubscriptionListener, SyncCounters, SyncStats,
    UpdateCoordinator,
};
use crate::types::{SheetKey, Timestamp, UpdateSource};
use crate::values::{TypeRegistry, TypedValue};

/// Synchronized view of one (document, sub-document) pair.
///
/// Construction performs an immediate refresh, subscribes to the sheet's
/// broadcast topic, and starts the periodic scheduler. Reads never block on
/// I/O. Dropping the manager destroys it.
pub struct SheetManager {
    config: SyncConfig,
    key: SheetKey,
    values: Arc<ValueStore>,
    coordinator: Arc<UpdateCoordinator>,
    listener: SubscriptionListener,
    scheduler: Option<PeriodicScheduler>,
    counters: Arc<SyncCounters>,
}

impl SheetManager {
    /// Create a manager with the built-in type registry.
    pub fn new(config: SyncConfig, backends: Backends) -> Result<Self> {
        Self::with_registry(config, backends, TypeRegistry::new())
    }

    /// Create a manager with a custom type registry.
    pub fn with_registry(
        config: SyncConfig,
        backends: Backends,
        registry: TypeRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let key = config.key();
        let counters = Arc::new(SyncCounters::new());
        let values = Arc::new(ValueStore::new(registry, config.subscription_buffer));
        let coordinator = Arc::new(UpdateCoordinator::new(
            &config,
            Arc::clone(&values),
            &backends,
            Arc::clone(&counters),
        ));

        let listener = if config.subscribe_broadcasts {
            SubscriptionListener::start(
                key,
                Arc::clone(&backends.broadcast),
                &values,
                Arc::clone(&counters),
            )
        } else {
            SubscriptionListener::inactive(key, Arc::clone(&backends.broadcast))
        };

        let initial = coordinator.refresh();
        info!(
            key = %key,
            document_id = %config.document_id,
            outcome = ?initial,
            "Sheet manager started"
        );

        let scheduler = if config.run_scheduler {
            match PeriodicScheduler::start(config.refresh_interval, Arc::clone(&coordinator)) {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    listener.stop();
                    values.close();
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            key,
            values,
            coordinator,
            listener,
            scheduler,
            counters,
        })
    }

    /// Run a refresh cycle now. Failures come back as an outcome, never an error.
    pub fn refresh_now(&self) -> RefreshOutcome {
        self.coordinator.refresh()
    }

    /// The value for `name`, or `default` if absent.
    pub fn get(&self, name: &str, default: TypedValue) -> TypedValue {
        self.values.get(name, default)
    }

    pub fn value(&self, name: &str) -> Option<TypedValue> {
        self.values.value(name)
    }

    /// Snapshot of every value.
    pub fn values(&self) -> HashMap<String, TypedValue> {
        self.values.values()
    }

    /// Observe changes to one value.
    pub fn subscribe(&self, name: &str) -> ChangeHandle {
        self.values.on_change(name)
    }

    /// Observe any change; events carry the full value map.
    pub fn subscribe_any(&self) -> ChangeHandle {
        self.values.on_any_change()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.values.unsubscribe(id)
    }

    pub fn last_updated_at(&self) -> Timestamp {
        self.values.last_updated()
    }

    pub fn last_source(&self) -> Option<UpdateSource> {
        self.values.last_source()
    }

    /// Shared-store key and broadcast topic.
    pub fn key(&self) -> SheetKey {
        self.key
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_alive(&self) -> bool {
        self.values.is_alive()
    }

    /// Whether the broadcast subscription is active.
    pub fn is_listening(&self) -> bool {
        self.listener.is_listening()
    }

    pub fn stats(&self) -> SyncStats {
        self.counters.snapshot()
    }

    /// Stop the scheduler, leave the broadcast topic, and release every
    /// observer. Values stay readable; nothing mutates them afterwards.
    pub fn destroy(&self) {
        if !self.values.is_alive() {
            return;
        }

        self.values.close();
        if let Some(scheduler) = &self.scheduler {
            scheduler.stop();
        }
        self.listener.stop();
        debug!(key = %self.key, "Sheet manager destroyed");
    }
}

impl Drop for SheetManager {
    fn drop(&mut self) {
        self.destroy();
    }
}
