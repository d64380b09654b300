use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReconError;
use crate::model::{AlignedFieldMap, FieldInput, Marker, Slot, SourceFieldEntry, SourceFields};

/// Merge per-source field lists into a field → source → slot map.
///
/// Every field observed in any source gets a slot for every source: the
/// source's entry when it has one, `Slot::Absent` otherwise. A source that
/// lists the same field twice keeps the last occurrence.
pub fn align(per_source: &SourceFields) -> Result<AlignedFieldMap, ReconError> {
    for (source, fields) in per_source {
        validate_source(source, fields)?;
    }

    let mut by_source: BTreeMap<&str, BTreeMap<&str, &FieldInput>> = BTreeMap::new();
    for (source, fields) in per_source {
        let entries = by_source.entry(source.as_str()).or_default();
        for field in fields {
            if entries.insert(field.field_name.as_str(), field).is_some() {
                log::warn!(
                    "source '{source}' lists field '{}' more than once; keeping the last occurrence",
                    field.field_name
                );
            }
        }
    }

    let field_names: BTreeSet<&str> = by_source
        .values()
        .flat_map(|entries| entries.keys().copied())
        .collect();

    let mut aligned = AlignedFieldMap::new();
    for name in field_names {
        let slots = by_source
            .iter()
            .map(|(source, entries)| {
                let slot = match entries.get(name) {
                    Some(field) => Slot::Present(SourceFieldEntry {
                        original_value: field.field_value.clone(),
                        last_updated: field.last_updated.clone(),
                        is_required: field.is_required,
                    }),
                    None => Slot::Absent,
                };
                (source.to_string(), slot)
            })
            .collect();
        aligned.insert(name.to_string(), slots);
    }

    log::debug!(
        "aligned {} field(s) across {} source(s)",
        aligned.len(),
        per_source.len()
    );
    Ok(aligned)
}

/// Parse alignment input from JSON, mapping shape errors (missing keys,
/// wrong types) to `ReconError::Validation`.
pub fn parse_source_fields(json: &str) -> Result<SourceFields, ReconError> {
    serde_json::from_str(json).map_err(|e| ReconError::Validation(e.to_string()))
}

fn validate_source(source: &str, fields: &[FieldInput]) -> Result<(), ReconError> {
    if source.is_empty() {
        return Err(ReconError::Validation("source name must not be empty".into()));
    }
    if let Some(marker) = Marker::parse(source) {
        return Err(ReconError::Validation(format!(
            "source name '{marker}' is reserved"
        )));
    }
    if let Some(pos) = fields.iter().position(|f| f.field_name.is_empty()) {
        return Err(ReconError::Validation(format!(
            "source '{source}': field #{} has an empty fieldName",
            pos + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequiredFlag;

    fn field(name: &str, value: &str, date: &str) -> FieldInput {
        FieldInput {
            field_name: name.into(),
            field_value: value.into(),
            is_required: RequiredFlag::Flag(true),
            last_updated: date.into(),
        }
    }

    #[test]
    fn source_without_field_gets_absent_slot() {
        let input = parse_source_fields(
            r#"{"source1": [{"fieldName":"Version","fieldValue":"1.0","isRequired":false,"lastUpdated":"2023-10-01"}], "source2": []}"#,
        )
        .unwrap();
        let aligned = align(&input).unwrap();

        assert_eq!(aligned.len(), 1);
        let version = &aligned["Version"];
        assert_eq!(version.len(), 2);
        assert_eq!(
            version["source1"],
            Slot::Present(SourceFieldEntry {
                original_value: "1.0".into(),
                last_updated: "2023-10-01".into(),
                is_required: RequiredFlag::Flag(false),
            })
        );
        assert_eq!(version["source2"], Slot::Absent);
    }

    #[test]
    fn union_of_fields_is_total() {
        let input = SourceFields::from([
            (
                "source1".to_string(),
                vec![field("Title", "Component One", "2023-10-01"), field("Version", "1.0", "2023-10-01")],
            ),
            (
                "source2".to_string(),
                vec![field("Title", "Component 1", "2023-10-02"), field("Author", "Two", "2023-10-02")],
            ),
        ]);
        let aligned = align(&input).unwrap();

        assert_eq!(aligned.keys().collect::<Vec<_>>(), vec!["Author", "Title", "Version"]);
        for slots in aligned.values() {
            assert_eq!(slots.keys().collect::<Vec<_>>(), vec!["source1", "source2"]);
        }
        assert_eq!(aligned["Author"]["source1"], Slot::Absent);
        assert_eq!(aligned["Version"]["source2"], Slot::Absent);
    }

    #[test]
    fn duplicate_field_last_occurrence_wins() {
        let input = SourceFields::from([(
            "source1".to_string(),
            vec![field("Title", "first", "2023-01-01"), field("Title", "second", "2023-02-01")],
        )]);
        let aligned = align(&input).unwrap();
        let entry = aligned["Title"]["source1"].as_present().unwrap();
        assert_eq!(entry.original_value, "second");
        assert_eq!(entry.last_updated, "2023-02-01");
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let input = SourceFields::from([(
            "source1".to_string(),
            vec![field("Title", "a", "N/A"), field("title", "b", "N/A")],
        )]);
        let aligned = align(&input).unwrap();
        assert_eq!(aligned.len(), 2);
    }

    #[test]
    fn empty_sources_yield_empty_map() {
        let input = SourceFields::from([("source1".to_string(), vec![]), ("source2".to_string(), vec![])]);
        assert!(align(&input).unwrap().is_empty());
    }

    #[test]
    fn missing_key_is_validation_error() {
        let err = parse_source_fields(r#"{"source1": [{"fieldName":"Title","fieldValue":"x","isRequired":true}]}"#)
            .unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)));
        assert!(err.to_string().contains("lastUpdated"));
    }

    #[test]
    fn reserved_source_name_rejected() {
        let input = SourceFields::from([("MANUAL_INPUT".to_string(), vec![field("Title", "x", "N/A")])]);
        let err = align(&input).unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)));
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn empty_field_name_rejected() {
        let input = SourceFields::from([("source1".to_string(), vec![field("", "x", "N/A")])]);
        assert!(matches!(align(&input), Err(ReconError::Validation(_))));
    }
}
