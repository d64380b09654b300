//! Decision policies: score each source's slot for one field and pick a truth source.
//!
//! Evaluation treats the policy as an opaque collaborator. The built-in
//! policies are deterministic heuristics; an external reasoning service can be
//! plugged in by implementing [`DecisionPolicy`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::error::Error;

use chrono::NaiveDate;

use crate::config::{PolicyConfig, PolicyStrategy};
use crate::model::{Slot, SourceFieldEntry, TruthSource};

/// Failure reported by a policy. Evaluation wraps it in `ReconError::Policy`.
pub type PolicyFailure = Box<dyn Error + Send + Sync>;

/// A policy's answer for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyVerdict {
    /// Confidence per source name. Must cover exactly the field's sources.
    pub per_source: BTreeMap<String, f64>,
    pub truth_source: Option<TruthSource>,
    pub explanation: String,
    pub confidence_overall: f64,
}

pub trait DecisionPolicy {
    /// Short identifier recorded in run metadata.
    fn name(&self) -> &str;

    fn decide(&self, field: &str, slots: &BTreeMap<String, Slot>) -> Result<PolicyVerdict, PolicyFailure>;
}

/// Build the configured built-in policy.
pub fn build_policy(config: &PolicyConfig) -> Box<dyn DecisionPolicy> {
    match config.strategy {
        PolicyStrategy::Recency => Box::new(RecencyPolicy::from_config(config)),
        PolicyStrategy::Majority => Box::new(MajorityPolicy::from_config(config)),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

struct Candidate<'a> {
    source: &'a str,
    entry: &'a SourceFieldEntry,
    date: Option<NaiveDate>,
}

fn candidates(slots: &BTreeMap<String, Slot>) -> Vec<Candidate<'_>> {
    slots
        .iter()
        .filter_map(|(source, slot)| {
            slot.as_present().map(|entry| Candidate {
                source,
                entry,
                date: NaiveDate::parse_from_str(entry.last_updated.trim(), "%Y-%m-%d").ok(),
            })
        })
        .collect()
}

/// Newest dated entry first, undated last, then source name.
fn newest_first(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.source.cmp(b.source))
}

fn no_truth(slots: &BTreeMap<String, Slot>, absent_confidence: f64, no_truth_confidence: f64) -> PolicyVerdict {
    PolicyVerdict {
        per_source: slots
            .keys()
            .map(|source| (source.clone(), absent_confidence))
            .collect(),
        truth_source: Some(TruthSource::NotFound),
        explanation: "No source provides this field.".into(),
        confidence_overall: no_truth_confidence,
    }
}

// ---------------------------------------------------------------------------
// Recency
// ---------------------------------------------------------------------------

/// The most recently updated entry wins. Confidence drops as other present
/// sources disagree with the winning value.
#[derive(Debug, Clone)]
pub struct RecencyPolicy {
    pub absent_confidence: f64,
    pub no_truth_confidence: f64,
}

impl RecencyPolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            absent_confidence: config.absent_confidence,
            no_truth_confidence: config.no_truth_confidence,
        }
    }
}

impl DecisionPolicy for RecencyPolicy {
    fn name(&self) -> &str {
        "recency"
    }

    fn decide(&self, _field: &str, slots: &BTreeMap<String, Slot>) -> Result<PolicyVerdict, PolicyFailure> {
        let present = candidates(slots);
        let Some(winner) = present.iter().min_by(|a, b| newest_first(a, b)) else {
            return Ok(no_truth(slots, self.absent_confidence, self.no_truth_confidence));
        };

        let winning_value = &winner.entry.original_value;
        let agreeing = present
            .iter()
            .filter(|c| &c.entry.original_value == winning_value)
            .count();
        let agreement = agreeing as f64 / present.len() as f64;
        let agree_confidence = 0.5 + 0.5 * agreement;
        let dissent_confidence = 0.5 * (1.0 - agreement);

        let per_source = slots
            .iter()
            .map(|(source, slot)| {
                let confidence = match slot {
                    Slot::Present(e) if &e.original_value == winning_value => agree_confidence,
                    Slot::Present(_) => dissent_confidence,
                    Slot::Absent => self.absent_confidence,
                };
                (source.clone(), confidence)
            })
            .collect();

        let explanation = match winner.date {
            Some(date) => format!(
                "{} has the most recent lastUpdated ({date}); {agreeing} of {} present source(s) agree.",
                winner.source,
                present.len()
            ),
            None => format!(
                "No source has a parseable lastUpdated; chose {} by name; {agreeing} of {} present source(s) agree.",
                winner.source,
                present.len()
            ),
        };

        Ok(PolicyVerdict {
            per_source,
            truth_source: Some(TruthSource::Source(winner.source.to_string())),
            explanation,
            confidence_overall: agree_confidence,
        })
    }
}

// ---------------------------------------------------------------------------
// Majority
// ---------------------------------------------------------------------------

/// The value reported by the most present sources wins; ties go to the group
/// holding the most recent entry. The truth source is that group's newest entry.
#[derive(Debug, Clone)]
pub struct MajorityPolicy {
    pub absent_confidence: f64,
    pub no_truth_confidence: f64,
}

impl MajorityPolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            absent_confidence: config.absent_confidence,
            no_truth_confidence: config.no_truth_confidence,
        }
    }
}

impl DecisionPolicy for MajorityPolicy {
    fn name(&self) -> &str {
        "majority"
    }

    fn decide(&self, _field: &str, slots: &BTreeMap<String, Slot>) -> Result<PolicyVerdict, PolicyFailure> {
        let present = candidates(slots);
        if present.is_empty() {
            return Ok(no_truth(slots, self.absent_confidence, self.no_truth_confidence));
        }

        let mut groups: BTreeMap<&str, Vec<&Candidate<'_>>> = BTreeMap::new();
        for c in &present {
            groups.entry(c.entry.original_value.as_str()).or_default().push(c);
        }
        for members in groups.values_mut() {
            members.sort_by(|a, b| newest_first(a, b));
        }

        let (_, winners) = groups
            .iter()
            .min_by(|(_, a), (_, b)| b.len().cmp(&a.len()).then_with(|| newest_first(a[0], b[0])))
            .ok_or("no value groups")?;
        let truth = winners[0];
        let total = present.len() as f64;

        let per_source = slots
            .iter()
            .map(|(source, slot)| {
                let confidence = match slot {
                    Slot::Present(e) => groups[e.original_value.as_str()].len() as f64 / total,
                    Slot::Absent => self.absent_confidence,
                };
                (source.clone(), confidence)
            })
            .collect();

        Ok(PolicyVerdict {
            per_source,
            truth_source: Some(TruthSource::Source(truth.source.to_string())),
            explanation: format!(
                "{} of {} present source(s) report this value; {} is the most recent of them.",
                winners.len(),
                present.len(),
                truth.source
            ),
            confidence_overall: winners.len() as f64 / total,
        })
    }
}
