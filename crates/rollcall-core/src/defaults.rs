//! Centralized default constants for the rollcall system.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// CHART SLOTS
// =============================================================================

/// Identifier of the first chart slot.
pub const FIRST_SLOT_ID: &str = "chart";

/// Prefix for subsequent chart slot identifiers (`chart-1`, `chart-2`, ...).
pub const SLOT_ID_PREFIX: &str = "chart";

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Version written into every persisted chart configuration blob.
pub const CHART_BLOB_VERSION: u32 = 2;

/// Version assigned to the unversioned slot-id → filters mapping.
pub const LEGACY_CHART_BLOB_VERSION: u32 = 1;

/// Default location of the persisted chart configuration blob.
pub const CHARTS_FILE: &str = "data/charts.json";

// =============================================================================
// METRICS
// =============================================================================

/// Capacity value reported for every row in percentage mode.
pub const PERCENT_CAPACITY: f64 = 100.0;

// =============================================================================
// RECORD SOURCE
// =============================================================================

/// Timeout for record source HTTP requests in seconds.
pub const SOURCE_TIMEOUT_SECS: u64 = 30;

/// Minimum interval between two upstream refreshes (24 hours).
pub const REFRESH_MIN_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Events starting before this date are dropped during ingest.
pub const INGEST_CUTOFF: &str = "2024-01-01";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;
