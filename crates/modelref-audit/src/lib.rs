//! Audit pipeline of the model reference console.
//!
//! Everything here is synchronous and side-effect free: reference records and
//! an optional audit response go in, display rows and CSV come out.
//!
//! ```text
//! records ──group──▶ CatalogEntry ──aggregate(audit?)──▶ rows ──filter──▶ sort/rank ──▶ csv
//! ```

pub mod export;
pub mod filter;
pub mod group;
pub mod hosts;
pub mod metrics;
pub mod reduce;
pub mod report;
pub mod sort;

pub use export::{escape_field, to_csv, CSV_HEADER};
pub use filter::{available_tags, is_parameter_tag, AvailableTags, ClientFilter};
pub use group::{group_text_models, CatalogEntry, GroupedTextModel, TextVariation};
pub use metrics::{aggregate, GroupInfo, ModelWithAuditMetrics, UsageFigures};
pub use report::{build_report, AuditReport, ReportInput};
pub use sort::{rank_deletion_candidates, SortColumn, SortDirection, SortState};
