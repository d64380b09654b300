use crate::model::{
    DiffEntry, DiffSlot, EvaluatedMap, FieldRecord, HumanDecision, HumanDecisions, Marker, RequiredFlag,
    TruthSource, NOT_APPLICABLE,
};

pub const MANUAL_OVERRIDE_EXPLANATION: &str = "Manually overridden by human reviewer.";

/// Apply reviewer decisions on top of an evaluated map.
///
/// Takes the map by value: the input is consumed. Applying the same decisions
/// twice gives the same result as once.
///
/// Skipped with a warning, leaving the field untouched:
/// - a decision for a field not in the map
/// - a missing or empty `chosenSource`
/// - a `chosenSource` that is not a key of the field's diff
/// - `chosenSource: "MANUAL_INPUT"` without a `manualValue`; no manual entry
///   with a null value is created
pub fn apply_overrides(mut evaluated: EvaluatedMap, decisions: &HumanDecisions) -> EvaluatedMap {
    let mut applied = 0usize;

    for (field, decision) in decisions {
        let Some(record) = evaluated.get_mut(field) else {
            log::warn!("ignoring decision for unknown field '{field}'");
            continue;
        };
        if apply_decision(field, record, decision) {
            applied += 1;
        }
    }

    log::debug!("applied {applied} of {} human decision(s)", decisions.len());
    evaluated
}

fn apply_decision(field: &str, record: &mut FieldRecord, decision: &HumanDecision) -> bool {
    let chosen = match decision.chosen_source.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => return false,
    };

    if chosen == Marker::ManualInput.as_str() {
        let Some(value) = decision.manual_value.clone() else {
            log::warn!("ignoring manual input for field '{field}': no manualValue given");
            return false;
        };
        record.diff.insert(
            Marker::ManualInput.as_str().to_string(),
            DiffSlot::Present(DiffEntry {
                modified: true,
                original_value: value.clone(),
                value,
                last_updated: decision
                    .manual_last_updated
                    .clone()
                    .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
                is_required: decision.manual_is_required.unwrap_or(RequiredFlag::NotApplicable),
                confidence: 1.0,
            }),
        );
        record.truth_source = Some(TruthSource::ManualInput);
        record.explanation = MANUAL_OVERRIDE_EXPLANATION.to_string();
        record.confidence_overall = 1.0;
        return true;
    }

    let Some(slot) = record.diff.get_mut(chosen) else {
        log::warn!("ignoring decision for field '{field}': source '{chosen}' is not in its diff");
        return false;
    };
    // An absent slot stays as it is; only the top-level truth changes.
    if let DiffSlot::Present(entry) = slot {
        entry.modified = true;
        entry.confidence = 1.0;
    }
    record.truth_source = Some(TruthSource::Source(chosen.to_string()));
    record.explanation = format!("Overridden by human reviewer to use {chosen}.");
    record.confidence_overall = 1.0;
    true
}
