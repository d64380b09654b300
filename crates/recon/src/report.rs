use std::io::Write;

use crate::error::ReconError;
use crate::model::{EvaluatedMap, FieldRecord, NOT_APPLICABLE};

pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.9;

pub const REPORT_HEADER: [&str; 8] = [
    "FieldName",
    "TruthSource",
    "TruthValue",
    "TruthIsRequired",
    "TruthLastUpdated",
    "OverallConfidence",
    "NeedsReview",
    "AllSourcesDetailsJSON",
];

/// One report line, already rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub field_name: String,
    pub truth_source: String,
    pub truth_value: String,
    pub truth_is_required: String,
    pub truth_last_updated: String,
    pub overall_confidence: String,
    pub needs_review: String,
    pub all_sources_details: String,
}

impl ReportRow {
    fn as_record(&self) -> [&str; 8] {
        [
            &self.field_name,
            &self.truth_source,
            &self.truth_value,
            &self.truth_is_required,
            &self.truth_last_updated,
            &self.overall_confidence,
            &self.needs_review,
            &self.all_sources_details,
        ]
    }
}

/// Build report rows in the evaluated map's iteration order.
pub fn build_report(evaluated: &EvaluatedMap, review_threshold: f64) -> Result<Vec<ReportRow>, ReconError> {
    evaluated
        .iter()
        .map(|(field, record)| build_row(field, record, review_threshold))
        .collect()
}

fn build_row(field: &str, record: &FieldRecord, review_threshold: f64) -> Result<ReportRow, ReconError> {
    let (truth_value, truth_is_required, truth_last_updated) = match record.truth_entry() {
        Some(entry) => (
            entry.value.clone(),
            entry.is_required.to_string(),
            entry.last_updated.clone(),
        ),
        None => (
            NOT_APPLICABLE.to_string(),
            NOT_APPLICABLE.to_string(),
            NOT_APPLICABLE.to_string(),
        ),
    };

    let all_sources_details = serde_json::to_string(&record.diff)
        .map_err(|e| ReconError::Render(format!("field '{field}': {e}")))?;

    Ok(ReportRow {
        field_name: field.to_string(),
        truth_source: record
            .truth_source
            .as_ref()
            .map_or_else(|| NOT_APPLICABLE.to_string(), |t| t.to_string()),
        truth_value,
        truth_is_required,
        truth_last_updated,
        overall_confidence: format_confidence(record.confidence_overall),
        needs_review: python_bool(record.needs_review(review_threshold)).to_string(),
        all_sources_details,
    })
}

/// Write the header plus rows as CSV.
pub fn write_report<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), ReconError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(REPORT_HEADER)?;
    for row in rows {
        csv.write_record(row.as_record())?;
    }
    csv.flush()?;
    Ok(())
}

/// Render the full report to a CSV string.
pub fn render_report(evaluated: &EvaluatedMap, review_threshold: f64) -> Result<String, ReconError> {
    let rows = build_report(evaluated, review_threshold)?;
    let mut buf = Vec::new();
    write_report(&rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReconError::Render(e.to_string()))
}

/// Whole numbers keep one decimal place (`1.0`), everything else prints at
/// full precision.
pub fn format_confidence(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

fn python_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}
