//! Parser for the plain `Field:` block layout used by source documents.
//!
//! ```text
//! Field: Title
//! Value: Component One
//! Required: Yes
//! Last Updated: 2023-10-01
//! ```
//!
//! Blocks are separated by blank lines. The unified document renderer emits
//! the same layout, so its output parses back through here.

use crate::error::ReconError;
use crate::model::{FieldInput, RequiredFlag, NOT_APPLICABLE};

/// Parse every field block in `text`, in document order.
pub fn parse_field_blocks(text: &str) -> Result<Vec<FieldInput>, ReconError> {
    let mut fields = Vec::new();
    let mut current: Option<FieldInput> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            fields.extend(current.take());
            continue;
        }

        let (key, value) = line.split_once(':').ok_or_else(|| {
            ReconError::Validation(format!("line {line_no}: expected 'Key: value', found \"{line}\""))
        })?;
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        if key == "field" {
            if value.is_empty() {
                return Err(ReconError::Validation(format!("line {line_no}: empty field name")));
            }
            fields.extend(current.take());
            current = Some(FieldInput {
                field_name: value.to_string(),
                field_value: String::new(),
                is_required: RequiredFlag::NotApplicable,
                last_updated: NOT_APPLICABLE.to_string(),
            });
            continue;
        }

        let field = current.as_mut().ok_or_else(|| {
            ReconError::Validation(format!("line {line_no}: '{}' outside a Field block", key))
        })?;
        match key.as_str() {
            "value" => field.field_value = value.to_string(),
            "required" => {
                field.is_required = RequiredFlag::parse_word(value).ok_or_else(|| {
                    ReconError::Validation(format!("line {line_no}: unrecognized required status \"{value}\""))
                })?;
            }
            "last updated" => {
                field.last_updated = if value.is_empty() {
                    NOT_APPLICABLE.to_string()
                } else {
                    value.to_string()
                };
            }
            other => {
                return Err(ReconError::Validation(format!("line {line_no}: unknown key '{other}'")));
            }
        }
    }

    fields.extend(current);
    Ok(fields)
}
