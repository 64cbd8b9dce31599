//! # rollcall-core
//!
//! Core types, traits, and abstractions for the rollcall workshop dashboard.
//!
//! This crate provides the record model, the filter specification carried by
//! every chart slot, and the small AND/OR filter expression language that the
//! pipeline in `rollcall-filter` evaluates.

pub mod defaults;
pub mod error;
pub mod expression;
pub mod filter_spec;
pub mod logging;
pub mod models;
pub mod terms;
pub mod timestamp;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ParseError, Result};
pub use expression::{evaluate, FilterExpr};
pub use filter_spec::{Dimension, FilterPatch, FilterSpecification, Metric};
pub use models::*;
pub use terms::{ClockWindow, DateWindow};
pub use timestamp::{parse_timestamp, FlexibleTimestamp};
pub use traits::*;
