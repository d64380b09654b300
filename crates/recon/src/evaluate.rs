use std::collections::BTreeMap;

use crate::error::ReconError;
use crate::model::{AlignedFieldMap, DiffEntry, DiffSlot, EvaluatedMap, FieldRecord, Slot, TruthSource};
use crate::policy::{DecisionPolicy, PolicyVerdict};

/// Ask the policy about every field and build the evaluated map.
///
/// Fails as a whole on the first policy failure or malformed verdict; no
/// partially evaluated map is returned.
pub fn evaluate(aligned: &AlignedFieldMap, policy: &dyn DecisionPolicy) -> Result<EvaluatedMap, ReconError> {
    let mut evaluated = EvaluatedMap::new();

    for (field, slots) in aligned {
        let verdict = policy
            .decide(field, slots)
            .map_err(|e| ReconError::policy(field, e.to_string()))?;
        check_verdict(field, slots, &verdict)?;
        evaluated.insert(field.clone(), build_record(slots, verdict));
    }

    log::debug!(
        "evaluated {} field(s) with policy '{}'",
        evaluated.len(),
        policy.name()
    );
    Ok(evaluated)
}

fn check_verdict(field: &str, slots: &BTreeMap<String, Slot>, verdict: &PolicyVerdict) -> Result<(), ReconError> {
    for source in slots.keys() {
        if !verdict.per_source.contains_key(source) {
            return Err(ReconError::policy(field, format!("no confidence for source '{source}'")));
        }
    }
    if let Some(extra) = verdict.per_source.keys().find(|s| !slots.contains_key(*s)) {
        return Err(ReconError::policy(field, format!("confidence for unknown source '{extra}'")));
    }
    if let Some((source, _)) = verdict.per_source.iter().find(|(_, c)| !c.is_finite()) {
        return Err(ReconError::policy(field, format!("non-finite confidence for source '{source}'")));
    }
    if !verdict.confidence_overall.is_finite() {
        return Err(ReconError::policy(field, "non-finite overall confidence"));
    }
    match &verdict.truth_source {
        Some(TruthSource::Source(name)) if !slots.contains_key(name) => Err(ReconError::policy(
            field,
            format!("truth source '{name}' is not one of the field's sources"),
        )),
        Some(TruthSource::ManualInput) => Err(ReconError::policy(
            field,
            "policy may not choose MANUAL_INPUT",
        )),
        _ => Ok(()),
    }
}

fn build_record(slots: &BTreeMap<String, Slot>, verdict: PolicyVerdict) -> FieldRecord {
    let diff = slots
        .iter()
        .map(|(source, slot)| {
            let confidence = clamp_unit(verdict.per_source[source]);
            let diff_slot = match slot {
                Slot::Present(entry) => DiffSlot::Present(DiffEntry {
                    modified: false,
                    value: entry.original_value.clone(),
                    original_value: entry.original_value.clone(),
                    last_updated: entry.last_updated.clone(),
                    is_required: entry.is_required,
                    confidence,
                }),
                Slot::Absent => DiffSlot::Absent { confidence },
            };
            (source.clone(), diff_slot)
        })
        .collect();

    FieldRecord {
        diff,
        truth_source: verdict.truth_source,
        explanation: verdict.explanation,
        confidence_overall: clamp_unit(verdict.confidence_overall),
    }
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
