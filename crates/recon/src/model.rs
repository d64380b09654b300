use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Reserved names shared by every stage. Nothing outside this enum spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// A source does not carry the field.
    NoField,
    /// No source could be chosen as truth.
    NoTruthSourceFound,
    /// Human-authored value. Only Human Override introduces it.
    ManualInput,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::NoField, Marker::NoTruthSourceFound, Marker::ManualInput];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoField => "ENUM.NO_FIELD",
            Self::NoTruthSourceFound => "NO_TRUTH_SOURCE_FOUND",
            Self::ManualInput => "MANUAL_INPUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal rendered wherever a value is unknown.
pub const NOT_APPLICABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Required flag
// ---------------------------------------------------------------------------

/// `isRequired` is either a boolean or the `N/A` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredFlag {
    Flag(bool),
    #[default]
    NotApplicable,
}

impl RequiredFlag {
    /// Accepts the words documentation sources use for required status.
    pub fn parse_word(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "required" => Some(Self::Flag(true)),
            "false" | "no" | "optional" => Some(Self::Flag(false)),
            "n/a" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

impl From<bool> for RequiredFlag {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl fmt::Display for RequiredFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(true) => f.write_str("True"),
            Self::Flag(false) => f.write_str("False"),
            Self::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

impl Serialize for RequiredFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flag(b) => serializer.serialize_bool(*b),
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for RequiredFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(Self::Flag(b)),
            Raw::Text(s) => Self::parse_word(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid required flag: \"{s}\""))),
        }
    }
}

// ---------------------------------------------------------------------------
// Alignment input + output
// ---------------------------------------------------------------------------

/// One field as extracted from one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInput {
    pub field_name: String,
    pub field_value: String,
    pub is_required: RequiredFlag,
    pub last_updated: String,
}

/// Extracted fields grouped by source name.
pub type SourceFields = BTreeMap<String, Vec<FieldInput>>;

/// One source's knowledge of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFieldEntry {
    pub original_value: String,
    pub last_updated: String,
    pub is_required: RequiredFlag,
}

/// A (field, source) slot. Absent serializes as the bare `ENUM.NO_FIELD` string.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Present(SourceFieldEntry),
    Absent,
}

impl Slot {
    pub fn as_present(&self) -> Option<&SourceFieldEntry> {
        match self {
            Self::Present(entry) => Some(entry),
            Self::Absent => None,
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(entry) => entry.serialize(serializer),
            Self::Absent => serializer.serialize_str(Marker::NoField.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Entry(SourceFieldEntry),
            Marker(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Entry(entry) => Ok(Self::Present(entry)),
            Raw::Marker(s) if s == Marker::NoField.as_str() => Ok(Self::Absent),
            Raw::Marker(s) => Err(de::Error::custom(format!("unexpected slot marker: \"{s}\""))),
        }
    }
}

/// Field name → source name → slot. Total over every known source.
pub type AlignedFieldMap = BTreeMap<String, BTreeMap<String, Slot>>;

// ---------------------------------------------------------------------------
// Evaluation output
// ---------------------------------------------------------------------------

/// Evaluated form of a present slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub modified: bool,
    pub value: String,
    pub original_value: String,
    pub last_updated: String,
    pub is_required: RequiredFlag,
    pub confidence: f64,
}

/// Evaluated slot. An absent slot has no `modified` state of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffSlot {
    Present(DiffEntry),
    Absent { confidence: f64 },
}

impl DiffSlot {
    pub fn as_present(&self) -> Option<&DiffEntry> {
        match self {
            Self::Present(entry) => Some(entry),
            Self::Absent { .. } => None,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Present(entry) => &entry.value,
            Self::Absent { .. } => Marker::NoField.as_str(),
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Present(entry) => entry.confidence,
            Self::Absent { confidence } => *confidence,
        }
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, Self::Present(DiffEntry { modified: true, .. }))
    }
}

impl Serialize for DiffSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(entry) => entry.serialize(serializer),
            Self::Absent { confidence } => {
                let mut s = serializer.serialize_struct("DiffSlot", 3)?;
                s.serialize_field("modified", &false)?;
                s.serialize_field("value", Marker::NoField.as_str())?;
                s.serialize_field("confidence", confidence)?;
                s.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DiffSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct AbsentRaw {
            value: String,
            #[serde(default)]
            confidence: f64,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Entry(DiffEntry),
            Absent(AbsentRaw),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Entry(entry) => Ok(Self::Present(entry)),
            Raw::Absent(raw) if raw.value == Marker::NoField.as_str() => Ok(Self::Absent {
                confidence: raw.confidence,
            }),
            Raw::Absent(raw) => Err(de::Error::custom(format!(
                "diff entry with value \"{}\" is missing originalValue/lastUpdated/isRequired",
                raw.value
            ))),
        }
    }
}

/// Which slot a field's truth comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruthSource {
    Source(String),
    ManualInput,
    NotFound,
}

impl TruthSource {
    /// Key into the field's diff, if this truth source has one.
    pub fn diff_key(&self) -> Option<&str> {
        match self {
            Self::Source(name) => Some(name),
            Self::ManualInput => Some(Marker::ManualInput.as_str()),
            Self::NotFound => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Source(name) => name,
            Self::ManualInput => Marker::ManualInput.as_str(),
            Self::NotFound => Marker::NoTruthSourceFound.as_str(),
        }
    }
}

impl fmt::Display for TruthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TruthSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TruthSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match Marker::parse(&s) {
            Some(Marker::ManualInput) => Ok(Self::ManualInput),
            Some(Marker::NoTruthSourceFound) => Ok(Self::NotFound),
            Some(Marker::NoField) => Err(de::Error::custom("ENUM.NO_FIELD is not a truth source")),
            None => Ok(Self::Source(s)),
        }
    }
}

/// Evaluated form of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub diff: BTreeMap<String, DiffSlot>,
    #[serde(default)]
    pub truth_source: Option<TruthSource>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub confidence_overall: f64,
}

impl FieldRecord {
    /// The structured diff entry the truth source points at, if any.
    pub fn truth_entry(&self) -> Option<&DiffEntry> {
        let key = self.truth_source.as_ref()?.diff_key()?;
        self.diff.get(key)?.as_present()
    }

    pub fn has_truth(&self) -> bool {
        matches!(
            self.truth_source,
            Some(TruthSource::Source(_)) | Some(TruthSource::ManualInput)
        )
    }

    /// Strict less-than against the threshold, or no usable truth source.
    pub fn needs_review(&self, threshold: f64) -> bool {
        self.confidence_overall < threshold || !self.has_truth()
    }
}

/// Field name → evaluated record. Canonical state after evaluation.
pub type EvaluatedMap = BTreeMap<String, FieldRecord>;

// ---------------------------------------------------------------------------
// Human review
// ---------------------------------------------------------------------------

/// A reviewer's decision for one field. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanDecision {
    #[serde(default)]
    pub chosen_source: Option<String>,
    #[serde(default)]
    pub manual_value: Option<String>,
    #[serde(default)]
    pub manual_is_required: Option<RequiredFlag>,
    #[serde(default)]
    pub manual_last_updated: Option<String>,
}

pub type HumanDecisions = BTreeMap<String, HumanDecision>;

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconSummary {
    pub total_fields: usize,
    pub resolved: usize,
    pub needs_review: usize,
    pub no_truth_source: usize,
    pub overridden: usize,
    pub manual_inputs: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconMeta {
    pub component: String,
    pub policy: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub fields: EvaluatedMap,
}
