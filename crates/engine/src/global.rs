//! The Global Data pseudo-form.
//!
//! A fixed catalog of session-wide values that is always a valid prefill
//! source, whatever the node's position in the graph.  Built once at process
//! start and never changed afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::models::{FieldMeta, FieldSchema, FieldValue};

/// Sentinel node id (and form id) of the global data source.
pub const GLOBAL_DATA_ID: &str = "global-data";

/// Display name of the global data source.
pub const GLOBAL_DATA_NAME: &str = "Global Data";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The configurable part of the global catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDataConfig {
    pub user_id: String,
    pub session_id: String,
    pub tenant_id: String,
}

impl Default for GlobalDataConfig {
    fn default() -> Self {
        Self {
            user_id: "user_12345".into(),
            session_id: "session_67890".into(),
            tenant_id: "1".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// GlobalData
// ---------------------------------------------------------------------------

/// Schema and values of the global data source.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalData {
    schema: FieldSchema,
    values: BTreeMap<String, FieldValue>,
}

impl GlobalData {
    /// The default catalog, stamped with the current time.
    pub fn standard() -> Self {
        Self::capture(&GlobalDataConfig::default())
    }

    /// Build the catalog from `config`, stamped with the current time.
    pub fn capture(config: &GlobalDataConfig) -> Self {
        Self::at(config, Local::now())
    }

    /// Build the catalog from `config` as of `now`.
    pub fn at(config: &GlobalDataConfig, now: DateTime<Local>) -> Self {
        let timestamp = now
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let current_date = now.format("%-m/%-d/%Y").to_string();

        let entries = [
            ("user_id", "User ID", FieldValue::from(config.user_id.as_str())),
            ("session_id", "Session ID", FieldValue::from(config.session_id.as_str())),
            ("timestamp", "Current Timestamp", FieldValue::from(timestamp)),
            ("tenant_id", "Tenant ID", FieldValue::from(config.tenant_id.as_str())),
            ("current_date", "Current Date", FieldValue::from(current_date)),
        ];

        let mut schema = FieldSchema::default();
        let mut values = BTreeMap::new();
        for (key, title, value) in entries {
            let mut meta = FieldMeta::new(title, "string");
            meta.avantos_type = Some("short-text".into());
            schema.properties.insert(key.to_owned(), meta);
            values.insert(key.to_owned(), value);
        }

        Self { schema, values }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }
}
