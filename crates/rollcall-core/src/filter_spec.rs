//! Filter specification carried by every chart slot.
//!
//! A [`FilterSpecification`] bundles independent filter dimensions, all
//! optional:
//!
//! - **name**: case-insensitive substring query against the title
//! - **time**: `H:MM-H:MM` clock window against the local start/end
//! - **tags**: exact tag membership query
//! - **date**: `<epochMillis>-<epochMillis>` absolute window
//! - **drop**: exclude workshops with zero attendance
//! - **categorize**: replace workshop rows with one row per tag
//! - **metric**: raw counts or percent of capacity
//!
//! The four text dimensions hold filter expressions (see
//! [`crate::expression`]). An empty expression means the dimension is not
//! applied.
//!
//! # Example
//!
//! ```
//! use rollcall_core::{FilterSpecification, Metric};
//!
//! let spec = FilterSpecification::new()
//!     .with_name("git OR python")
//!     .with_time("9:00-12:00")
//!     .dropping_empty(true)
//!     .with_metric(Metric::Percentage);
//!
//! assert_eq!(spec.name(), Some("git OR python"));
//! assert!(spec.tags().is_none());
//! assert!(!spec.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// =============================================================================
// METRIC
// =============================================================================

/// Units reported for attendance, registrations, and capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Raw counts.
    #[default]
    Count,
    /// Counts as percent of capacity.
    Percentage,
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "percentage" => Ok(Self::Percentage),
            _ => Err(Error::InvalidInput(format!("unknown metric: {}", s))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Percentage => write!(f, "percentage"),
        }
    }
}

// =============================================================================
// DIMENSION
// =============================================================================

/// The text filter dimensions, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Name,
    Time,
    Tags,
    Date,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Self::Name, Self::Time, Self::Tags, Self::Date];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Time => "time",
            Self::Tags => "tags",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FILTER SPECIFICATION
// =============================================================================

/// Declarative filter applied by the pipeline to produce a chart or table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpecification {
    /// Title substring expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Clock window expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Tag membership expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    /// Epoch-millisecond window expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Exclude workshops nobody attended.
    pub drop: bool,

    /// Aggregate into one row per tag.
    pub categorize: bool,

    pub metric: Metric,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn normalize(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl FilterSpecification {
    /// Create an empty specification (every record passes, raw counts).
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // BUILDER METHODS
    // =========================================================================

    pub fn with_name(mut self, expression: impl Into<String>) -> Self {
        self.name = normalize(Some(expression.into()));
        self
    }

    pub fn with_time(mut self, expression: impl Into<String>) -> Self {
        self.time = normalize(Some(expression.into()));
        self
    }

    pub fn with_tags(mut self, expression: impl Into<String>) -> Self {
        self.tags = normalize(Some(expression.into()));
        self
    }

    pub fn with_date(mut self, expression: impl Into<String>) -> Self {
        self.date = normalize(Some(expression.into()));
        self
    }

    pub fn dropping_empty(mut self, drop: bool) -> Self {
        self.drop = drop;
        self
    }

    pub fn categorized(mut self, categorize: bool) -> Self {
        self.categorize = categorize;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Name expression, `None` when unset or empty.
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn time(&self) -> Option<&str> {
        non_empty(&self.time)
    }

    pub fn tags(&self) -> Option<&str> {
        non_empty(&self.tags)
    }

    pub fn date(&self) -> Option<&str> {
        non_empty(&self.date)
    }

    /// Expression for a text dimension, `None` when the dimension is not applied.
    pub fn expression(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Name => self.name(),
            Dimension::Time => self.time(),
            Dimension::Tags => self.tags(),
            Dimension::Date => self.date(),
        }
    }

    /// Text dimensions that will be applied, in pipeline order.
    pub fn active_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.expression(*d).is_some())
            .collect()
    }

    /// True when the pipeline would only sort its input.
    pub fn is_empty(&self) -> bool {
        self.active_dimensions().is_empty()
            && !self.drop
            && !self.categorize
            && self.metric == Metric::Count
    }

    /// Copy with empty expressions replaced by `None`.
    pub fn normalized(&self) -> Self {
        Self {
            name: normalize(self.name.clone()),
            time: normalize(self.time.clone()),
            tags: normalize(self.tags.clone()),
            date: normalize(self.date.clone()),
            ..self.clone()
        }
    }

    /// Copy with categorize forced off, for the detail table.
    pub fn for_table(&self) -> Self {
        Self {
            categorize: false,
            ..self.clone()
        }
    }
}

// =============================================================================
// FILTER PATCH
// =============================================================================

/// Field-level change to a [`FilterSpecification`].
///
/// Absent fields are left alone. For the text dimensions an empty string
/// clears the dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
}

impl FilterPatch {
    /// True when applying the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `spec` in place.
    pub fn apply(&self, spec: &mut FilterSpecification) {
        if let Some(name) = &self.name {
            spec.name = normalize(Some(name.clone()));
        }
        if let Some(time) = &self.time {
            spec.time = normalize(Some(time.clone()));
        }
        if let Some(tags) = &self.tags {
            spec.tags = normalize(Some(tags.clone()));
        }
        if let Some(date) = &self.date {
            spec.date = normalize(Some(date.clone()));
        }
        if let Some(drop) = self.drop {
            spec.drop = drop;
        }
        if let Some(categorize) = self.categorize {
            spec.categorize = categorize;
        }
        if let Some(metric) = self.metric {
            spec.metric = metric;
        }
    }
}
