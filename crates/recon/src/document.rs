use std::io::Write;

use crate::error::ReconError;
use crate::model::{EvaluatedMap, Marker};

/// Render resolved fields as `Field/Value/Required/Last Updated` blocks.
///
/// Fields with no truth source, a truth source that does not resolve to a
/// structured entry, or a truth value of `ENUM.NO_FIELD` are left out.
/// Line breaks inside names and values are folded to spaces so every block
/// stays four lines and reads back through the block parser.
pub fn render_unified_document(evaluated: &EvaluatedMap) -> String {
    let mut out = String::new();
    for (field, record) in evaluated {
        if !record.has_truth() {
            continue;
        }
        let Some(entry) = record.truth_entry() else {
            continue;
        };
        if entry.value == Marker::NoField.as_str() {
            continue;
        }
        out.push_str(&format!(
            "Field: {}\nValue: {}\nRequired: {}\nLast Updated: {}\n\n",
            single_line(field),
            single_line(&entry.value),
            entry.is_required,
            single_line(&entry.last_updated)
        ));
    }
    out
}

fn single_line(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

pub fn write_unified_document<W: Write>(evaluated: &EvaluatedMap, mut writer: W) -> Result<(), ReconError> {
    writer.write_all(render_unified_document(evaluated).as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiffEntry, DiffSlot, FieldRecord, RequiredFlag, TruthSource};
    use std::collections::BTreeMap;

    fn present(value: &str, required: RequiredFlag, date: &str) -> DiffSlot {
        DiffSlot::Present(DiffEntry {
            modified: false,
            value: value.into(),
            original_value: value.into(),
            last_updated: date.into(),
            is_required: required,
            confidence: 0.9,
        })
    }

    fn field(slot: DiffSlot, truth: Option<TruthSource>) -> FieldRecord {
        FieldRecord {
            diff: BTreeMap::from([("source1".to_string(), slot)]),
            truth_source: truth,
            explanation: String::new(),
            confidence_overall: 0.9,
        }
    }

    fn source1() -> Option<TruthSource> {
        Some(TruthSource::Source("source1".into()))
    }

    #[test]
    fn renders_blocks_in_order() {
        let evaluated = EvaluatedMap::from([
            ("Title".to_string(), field(present("Component One", RequiredFlag::Flag(true), "2023-10-01"), source1())),
            ("Version".to_string(), field(present("1.0", RequiredFlag::Flag(false), "N/A"), source1())),
        ]);
        assert_eq!(
            render_unified_document(&evaluated),
            "Field: Title\nValue: Component One\nRequired: True\nLast Updated: 2023-10-01\n\n\
             Field: Version\nValue: 1.0\nRequired: False\nLast Updated: N/A\n\n"
        );
    }

    #[test]
    fn skips_unresolved_fields() {
        let evaluated = EvaluatedMap::from([
            ("A".to_string(), field(present("x", RequiredFlag::Flag(true), "N/A"), None)),
            ("B".to_string(), field(present("x", RequiredFlag::Flag(true), "N/A"), Some(TruthSource::NotFound))),
            ("C".to_string(), field(DiffSlot::Absent { confidence: 0.2 }, source1())),
            ("D".to_string(), field(present("x", RequiredFlag::Flag(true), "N/A"), Some(TruthSource::ManualInput))),
            ("E".to_string(), field(present("ENUM.NO_FIELD", RequiredFlag::Flag(true), "N/A"), source1())),
        ]);
        assert_eq!(render_unified_document(&evaluated), "");
    }

    #[test]
    fn required_not_applicable() {
        let evaluated = EvaluatedMap::from([(
            "Owner".to_string(),
            field(present("Team", RequiredFlag::NotApplicable, "2024-01-01"), source1()),
        )]);
        assert!(render_unified_document(&evaluated).contains("Required: N/A\n"));
    }

    #[test]
    fn multiline_value_stays_in_one_block() {
        let record = FieldRecord {
            diff: BTreeMap::from([(
                "MANUAL_INPUT".to_string(),
                present("line1\nRequired: No\r\nline3", RequiredFlag::Flag(true), "2024-01-01\n"),
            )]),
            truth_source: Some(TruthSource::ManualInput),
            explanation: String::new(),
            confidence_overall: 1.0,
        };
        let evaluated = EvaluatedMap::from([("Title".to_string(), record)]);

        let doc = render_unified_document(&evaluated);
        assert_eq!(
            doc,
            "Field: Title\nValue: line1 Required: No line3\nRequired: True\nLast Updated: 2024-01-01 \n\n"
        );

        let parsed = crate::extract::parse_field_blocks(&doc).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].field_value, "line1 Required: No line3");
        assert_eq!(parsed[0].is_required, RequiredFlag::Flag(true));
    }

    #[test]
    fn output_is_reproducible() {
        let evaluated = EvaluatedMap::from([(
            "Title".to_string(),
            field(present("T", RequiredFlag::Flag(true), "2023-10-01"), source1()),
        )]);
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_unified_document(&evaluated, &mut a).unwrap();
        write_unified_document(&evaluated, &mut b).unwrap();
        assert_eq!(a, b);
        assert!(a.ends_with(b"\n\n"));
    }
}
