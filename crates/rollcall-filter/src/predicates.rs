//! Term predicates for each filter dimension.
//!
//! Every dimension parses its expression once and evaluates it over borrowed
//! records. Window terms read the leading number of each bound, so the compound
//! pieces of a mixed expression still parse. Unparsable terms never fail the
//! pipeline: a bad clock window turns the whole time stage into a no-op, a bad
//! date window matches nothing.

use tracing::{debug, warn};

use rollcall_core::{ClockWindow, DateWindow, Dimension, FilterExpr, WorkshopRecord};

/// Keep only workshops somebody attended.
pub fn drop_unattended<'a>(rows: &[&'a WorkshopRecord]) -> Vec<&'a WorkshopRecord> {
    rows.iter().copied().filter(|r| r.attendance > 0).collect()
}

/// Case-insensitive substring match of `term` against the title.
pub fn name_matches(record: &WorkshopRecord, term: &str) -> bool {
    record.title.to_lowercase().contains(&term.to_lowercase())
}

/// Evaluate `expression` for `dimension` over `rows`.
pub fn apply_dimension<'a>(
    rows: &[&'a WorkshopRecord],
    dimension: Dimension,
    expression: &str,
) -> Vec<&'a WorkshopRecord> {
    let expr = FilterExpr::parse(expression);

    let result = match dimension {
        Dimension::Name => expr.evaluate(rows, &|record: &WorkshopRecord, term: &String| {
            name_matches(record, term)
        }),
        Dimension::Tags => expr.evaluate(rows, &|record: &WorkshopRecord, term: &String| {
            record.has_tag(term)
        }),
        Dimension::Time => match expr.try_map(|term| term.parse::<ClockWindow>()) {
            Ok(windows) => windows.evaluate(rows, &|record: &WorkshopRecord, w: &ClockWindow| {
                w.contains(record)
            }),
            Err(e) => {
                warn!(
                    dimension = "time",
                    expression,
                    error = %e,
                    "Unparsable time filter, stage skipped"
                );
                rows.to_vec()
            }
        },
        Dimension::Date => {
            let windows = expr.map(|term| match term.parse::<DateWindow>() {
                Ok(window) => Some(window),
                Err(e) => {
                    warn!(
                        dimension = "date",
                        expression,
                        error = %e,
                        "Unparsable date term matches nothing"
                    );
                    None
                }
            });
            windows.evaluate(
                rows,
                &|record: &WorkshopRecord, w: &Option<DateWindow>| {
                    w.map_or(false, |w| w.contains(record))
                },
            )
        }
    };

    debug!(
        dimension = dimension.as_str(),
        record_count = rows.len(),
        result_count = result.len(),
        "Filter stage applied"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::parse_timestamp;

    fn record(id: i64, title: &str, tags: &[&str], start: &str, end: &str) -> WorkshopRecord {
        WorkshopRecord {
            id,
            title: title.to_string(),
            presenter: String::new(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            start: parse_timestamp(start).unwrap().into(),
            end: parse_timestamp(end).unwrap().into(),
            seats: 20,
            seats_taken: 10,
            attendance: id as u64 % 3,
        }
    }

    fn sample() -> Vec<WorkshopRecord> {
        vec![
            record(
                1,
                "Intro to Git",
                &["git", "tools"],
                "2024-02-01T09:00:00Z",
                "2024-02-01T11:00:00Z",
            ),
            record(
                2,
                "Advanced Python",
                &["python"],
                "2024-02-02T13:00:00Z",
                "2024-02-02T15:00:00Z",
            ),
            record(
                3,
                "Python for HPC",
                &["python", "HPC Core"],
                "2024-03-10T10:00:00Z",
                "2024-03-10T12:30:00Z",
            ),
        ]
    }

    fn ids(rows: &[&WorkshopRecord]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_drop_unattended() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        // attendance = id % 3 -> record 3 has zero
        assert_eq!(ids(&drop_unattended(&refs)), vec![1, 2]);
    }

    #[test]
    fn test_name_matches_case_insensitive() {
        let records = sample();
        assert!(name_matches(&records[0], "GIT"));
        assert!(name_matches(&records[1], "python"));
        assert!(!name_matches(&records[1], "git"));
    }

    #[test]
    fn test_name_dimension_or_keeps_duplicates() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        let out = apply_dimension(&refs, Dimension::Name, "python OR hpc");
        assert_eq!(ids(&out), vec![2, 3, 3]);
    }

    #[test]
    fn test_tags_dimension_exact_membership() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        assert_eq!(ids(&apply_dimension(&refs, Dimension::Tags, "HPC Core")), vec![3]);
        assert!(apply_dimension(&refs, Dimension::Tags, "hpc core").is_empty());
        assert_eq!(
            ids(&apply_dimension(&refs, Dimension::Tags, "python AND HPC Core")),
            vec![3]
        );
    }

    #[test]
    fn test_time_dimension_windows() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        assert_eq!(
            ids(&apply_dimension(&refs, Dimension::Time, "8:00-12:00")),
            vec![1]
        );
        assert_eq!(
            ids(&apply_dimension(&refs, Dimension::Time, "8:00-12:00 OR 12:00-18:00")),
            vec![1, 2]
        );
    }

    #[test]
    fn test_time_dimension_mixed_expression() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        // union: 8-12 and 12-18 -> [1, 2]; narrowed by 8-12 and 9-15 -> [1]
        let out = apply_dimension(
            &refs,
            Dimension::Time,
            "8:00-12:00 OR 12:00-18:00 AND 9:00-15:00",
        );
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn test_time_dimension_unparsable_is_noop() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        let out = apply_dimension(&refs, Dimension::Time, "morning");
        assert_eq!(ids(&out), vec![1, 2, 3]);
    }

    #[test]
    fn test_date_dimension_window() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        let feb_from = parse_timestamp("2024-02-01T00:00:00Z").unwrap().timestamp_millis();
        let feb_to = parse_timestamp("2024-03-01T00:00:00Z").unwrap().timestamp_millis();
        let expr = format!("{}-{}", feb_from, feb_to);
        assert_eq!(ids(&apply_dimension(&refs, Dimension::Date, &expr)), vec![1, 2]);
    }

    #[test]
    fn test_date_dimension_mixed_expression() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        let ms = |ts: &str| parse_timestamp(ts).unwrap().timestamp_millis();
        let feb1 = ms("2024-02-01T00:00:00Z");
        let feb2 = ms("2024-02-02T00:00:00Z");
        let mar1 = ms("2024-03-01T00:00:00Z");
        let apr1 = ms("2024-04-01T00:00:00Z");

        // union: Feb and Mar -> [1, 2, 3]; narrowed by Feb and Feb 2 onwards -> [2]
        let expr = format!(
            "{}-{} OR {}-{} AND {}-{}",
            feb1, mar1, mar1, apr1, feb2, apr1
        );
        assert_eq!(ids(&apply_dimension(&refs, Dimension::Date, &expr)), vec![2]);
    }

    #[test]
    fn test_date_dimension_unparsable_term_matches_nothing() {
        let records = sample();
        let refs: Vec<&WorkshopRecord> = records.iter().collect();
        assert!(apply_dimension(&refs, Dimension::Date, "NaN-NaN").is_empty());

        // a valid sibling term still contributes
        let all = format!("0-{} OR garbage", i64::MAX);
        assert_eq!(ids(&apply_dimension(&refs, Dimension::Date, &all)), vec![1, 2, 3]);
    }
}
