//! Migration validation core
//!
//! Snapshots are retrieved from metric providers, optionally enriched with
//! archive counts, then compared into an ordered list of classified results.

pub mod archive;
pub mod compare;
pub mod report;
pub mod retrieve;
pub mod snapshot;

pub use archive::load_archive;
pub use compare::{ComparisonOptions, ComparisonResult, Status, StatusSummary, compare};
pub use report::ValidationReport;
pub use retrieve::{RetrievalOptions, check_rate_limits, retrieve_pair, validate_access_pair};
pub use snapshot::{PullRequestCounts, RepositoryIdentity};
