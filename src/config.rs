//! Manager configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::subscriptions::DEFAULT_BUFFER_SIZE;
use crate::types::SheetKey;

/// Default freshness window and polling period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for one synchronized sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote document identifier.
    pub document_id: String,

    /// Tab or sub-document within the document.
    pub sub_document_id: Option<String>,

    /// Values younger than this are fresh; also the scheduler period.
    /// Serialized as whole seconds.
    #[serde(with = "duration_secs", rename = "refresh_interval_secs")]
    pub refresh_interval: Duration,

    /// Buffered events per observer before it is dropped.
    pub subscription_buffer: usize,

    /// Run the background refresh thread.
    pub run_scheduler: bool,

    /// Listen for peer broadcasts.
    pub subscribe_broadcasts: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            document_id: String::new(),
            sub_document_id: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            subscription_buffer: DEFAULT_BUFFER_SIZE,
            run_scheduler: true,
            subscribe_broadcasts: true,
        }
    }
}

impl SyncConfig {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Default::default()
        }
    }

    pub fn with_sub_document(mut self, sub_document_id: impl Into<String>) -> Self {
        self.sub_document_id = Some(sub_document_id.into());
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_subscription_buffer(mut self, size: usize) -> Self {
        self.subscription_buffer = size;
        self
    }

    pub fn with_scheduler(mut self, enabled: bool) -> Self {
        self.run_scheduler = enabled;
        self
    }

    pub fn with_broadcasts(mut self, enabled: bool) -> Self {
        self.subscribe_broadcasts = enabled;
        self
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.document_id.is_empty() {
            return Err(SyncError::InvalidConfig("document_id must not be empty".into()));
        }
        if self.refresh_interval.as_secs() == 0 {
            return Err(SyncError::InvalidConfig(
                "refresh_interval must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Store key and broadcast topic for this sheet.
    pub fn key(&self) -> SheetKey {
        SheetKey::derive(&self.document_id, self.sub_document_id.as_deref())
    }

    /// Refresh interval in whole seconds, as compared against timestamps.
    pub fn refresh_secs(&self) -> i64 {
        self.refresh_interval.as_secs() as i64
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
