use crate::model::{EvaluatedMap, ReconSummary, TruthSource};

/// Compute summary statistics from an evaluated map.
pub fn compute_summary(evaluated: &EvaluatedMap, review_threshold: f64) -> ReconSummary {
    let mut summary = ReconSummary {
        total_fields: evaluated.len(),
        ..ReconSummary::default()
    };

    for record in evaluated.values() {
        if record.truth_entry().is_some() {
            summary.resolved += 1;
        }
        if record.needs_review(review_threshold) {
            summary.needs_review += 1;
        }
        match record.truth_source {
            Some(TruthSource::NotFound) | None => summary.no_truth_source += 1,
            Some(TruthSource::ManualInput) => summary.manual_inputs += 1,
            Some(TruthSource::Source(_)) => {}
        }
        if record.diff.values().any(|slot| slot.is_modified()) {
            summary.overridden += 1;
        }
    }

    summary
}
