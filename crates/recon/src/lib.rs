//! `unidoc-recon`: field reconciliation engine.
//!
//! Pure engine crate: receives per-source field lists, returns an evaluated,
//! optionally human-reviewed, field map plus its report and unified document.
//! No CLI or filesystem dependencies.

pub mod align;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod model;
pub mod policy;
pub mod report;
pub mod review;
pub mod summary;

pub use align::align;
pub use config::ReconConfig;
pub use document::render_unified_document;
pub use engine::run;
pub use error::ReconError;
pub use evaluate::evaluate;
pub use model::{EvaluatedMap, FieldRecord, HumanDecisions, Marker, ReconResult, SourceFields};
pub use policy::{DecisionPolicy, PolicyVerdict};
pub use report::render_report;
pub use review::apply_overrides;
