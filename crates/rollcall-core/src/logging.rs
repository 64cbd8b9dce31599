//! Structured logging schema and field name constants for rollcall.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, filter stage or blob fell back |
//! | INFO  | Lifecycle events (refresh, slot created, restore) |
//! | DEBUG | Per-stage row counts, decision points |
//! | TRACE | Per-record decisions |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "filter", "store", "ingest"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "apply", "refresh", "restore", "create_slot"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Chart slot identifier.
pub const SLOT_ID: &str = "slot_id";

/// Workshop record id.
pub const RECORD_ID: &str = "record_id";

/// Filter dimension being applied ("drop", "name", "time", "tags", "date").
pub const DIMENSION: &str = "dimension";

/// Raw filter expression text.
pub const EXPRESSION: &str = "expression";

/// Record store generation number.
pub const GENERATION: &str = "generation";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records entering a stage.
pub const RECORD_COUNT: &str = "record_count";

/// Number of rows produced by a stage or pipeline.
pub const RESULT_COUNT: &str = "result_count";

/// Number of chart slots affected.
pub const SLOT_COUNT: &str = "slot_count";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_FIELDS: &[&str] = &[
        SUBSYSTEM,
        OPERATION,
        SLOT_ID,
        RECORD_ID,
        DIMENSION,
        EXPRESSION,
        GENERATION,
        DURATION_MS,
        RECORD_COUNT,
        RESULT_COUNT,
        SLOT_COUNT,
    ];

    #[test]
    fn test_field_names_are_snake_case() {
        for field in ALL_FIELDS {
            assert!(
                field
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '_'),
                "field '{}' is not snake_case",
                field
            );
        }
    }

    #[test]
    fn test_field_names_are_unique() {
        let unique: HashSet<_> = ALL_FIELDS.iter().collect();
        assert_eq!(unique.len(), ALL_FIELDS.len());
    }
}
