//! Human-readable summaries and ceiling assessment.

mod ceiling;
mod summary;

pub use ceiling::{assess_ceiling, CeilingPolicy};
pub use summary::{summary_block, summary_line, SummaryLabel, UNKNOWN_IDENTIFIER};
