//! Display model implementations for table and JSON output
//!
//! Display models transform validation results and saved sessions into
//! CLI-friendly rows with appropriate column names and serialization.

mod common;
mod result;
mod session;

pub use common::{format_difference, format_utc_minute};
pub use result::ResultDisplay;
pub use session::SessionDisplay;
