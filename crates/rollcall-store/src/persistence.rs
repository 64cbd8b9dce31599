//! Versioned persisted chart configuration blob.
//!
//! Current format (version 2):
//!
//! ```json
//! {
//!   "version": 2,
//!   "charts": [
//!     { "id": "chart", "filters": { "name": "git", "drop": true, "metric": "count" } }
//!   ]
//! }
//! ```
//!
//! Unknown fields anywhere in a version 2 blob are rejected. A blob without a
//! numeric `version` is the legacy version 1 mapping `{slotId: {filters}}`,
//! where the metric is stored under `type` and unset text dimensions are
//! empty strings. Legacy blobs are upgraded on read; fields the upgrade does
//! not know are dropped and reported as warnings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use rollcall_core::defaults::{CHART_BLOB_VERSION, LEGACY_CHART_BLOB_VERSION};
use rollcall_core::{Error, FilterSpecification, Metric, Result};

/// One persisted chart slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedChart {
    pub id: String,
    pub filters: FilterSpecification,
}

/// The whole persisted configuration, slots in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartBlob {
    pub version: u32,
    pub charts: Vec<PersistedChart>,
}

/// A decoded blob plus what the upgrade had to do to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBlob {
    pub blob: ChartBlob,
    /// Version found on disk before any upgrade.
    pub source_version: u32,
    /// Fields dropped while upgrading.
    pub warnings: Vec<String>,
}

impl ChartBlob {
    /// Blob at the current version.
    pub fn new(charts: Vec<PersistedChart>) -> Self {
        Self {
            version: CHART_BLOB_VERSION,
            charts,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode and, for legacy blobs, upgrade to the current version.
    pub fn decode(text: &str) -> Result<DecodedBlob> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Decode(format!("chart blob is not JSON: {}", e)))?;

        let Value::Object(map) = value else {
            return Err(Error::Decode("chart blob must be a JSON object".to_string()));
        };

        let decoded = match map.get("version").and_then(Value::as_u64) {
            Some(version) if version == u64::from(CHART_BLOB_VERSION) => {
                let blob: ChartBlob = serde_json::from_value(Value::Object(map))
                    .map_err(|e| Error::Decode(format!("invalid chart blob: {}", e)))?;
                DecodedBlob {
                    blob,
                    source_version: CHART_BLOB_VERSION,
                    warnings: Vec::new(),
                }
            }
            Some(version) => {
                return Err(Error::Decode(format!(
                    "unsupported chart blob version {} (supported: {})",
                    version, CHART_BLOB_VERSION
                )));
            }
            None => upgrade_legacy(map)?,
        };

        decoded.blob.validate()?;

        for warning in &decoded.warnings {
            warn!(
                source_version = decoded.source_version,
                warning = %warning,
                "Chart blob upgrade dropped data"
            );
        }
        if decoded.source_version != CHART_BLOB_VERSION {
            info!(
                from = decoded.source_version,
                to = CHART_BLOB_VERSION,
                slot_count = decoded.blob.charts.len(),
                "Chart blob upgraded"
            );
        }

        Ok(decoded)
    }

    /// At least one slot, ids non-empty and unique.
    pub fn validate(&self) -> Result<()> {
        if self.charts.is_empty() {
            return Err(Error::Decode("chart blob contains no charts".to_string()));
        }
        let mut seen = HashSet::new();
        for chart in &self.charts {
            if chart.id.trim().is_empty() {
                return Err(Error::Decode("chart id must not be empty".to_string()));
            }
            if !seen.insert(chart.id.as_str()) {
                return Err(Error::Decode(format!("duplicate chart id '{}'", chart.id)));
            }
        }
        Ok(())
    }
}

// =============================================================================
// LEGACY UPGRADE
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyFilters {
    name: Option<String>,
    time: Option<String>,
    tags: Option<String>,
    date: Option<String>,
    drop: Option<bool>,
    categorize: Option<bool>,
    #[serde(rename = "type", alias = "metric")]
    kind: Option<Metric>,
    #[serde(flatten)]
    unknown: Map<String, Value>,
}

impl LegacyFilters {
    fn into_spec(self) -> FilterSpecification {
        let mut spec = FilterSpecification::new()
            .dropping_empty(self.drop.unwrap_or(false))
            .categorized(self.categorize.unwrap_or(false))
            .with_metric(self.kind.unwrap_or_default());
        spec.name = self.name.filter(|v| !v.is_empty());
        spec.time = self.time.filter(|v| !v.is_empty());
        spec.tags = self.tags.filter(|v| !v.is_empty());
        spec.date = self.date.filter(|v| !v.is_empty());
        spec
    }
}

fn upgrade_legacy(map: Map<String, Value>) -> Result<DecodedBlob> {
    let mut charts = Vec::with_capacity(map.len());
    let mut warnings = Vec::new();

    for (id, entry) in map {
        let Value::Object(mut entry) = entry else {
            return Err(Error::Decode(format!(
                "legacy chart '{}' is not an object",
                id
            )));
        };

        let filters = match entry.remove("filters") {
            None | Some(Value::Null) => LegacyFilters::default(),
            Some(filters) => serde_json::from_value::<LegacyFilters>(filters).map_err(|e| {
                Error::Decode(format!("legacy chart '{}' has invalid filters: {}", id, e))
            })?,
        };

        for key in entry.keys() {
            warnings.push(format!("chart '{}': dropped field '{}'", id, key));
        }
        for key in filters.unknown.keys() {
            warnings.push(format!("chart '{}': dropped filter '{}'", id, key));
        }

        charts.push(PersistedChart {
            id,
            filters: filters.into_spec(),
        });
    }

    Ok(DecodedBlob {
        blob: ChartBlob::new(charts),
        source_version: LEGACY_CHART_BLOB_VERSION,
        warnings,
    })
}
