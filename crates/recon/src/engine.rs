use crate::align::align;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evaluate::evaluate;
use crate::extract::parse_field_blocks;
use crate::model::{HumanDecisions, ReconMeta, ReconResult, SourceFields};
use crate::policy::{build_policy, DecisionPolicy};
use crate::review::apply_overrides;
use crate::summary::compute_summary;

/// Run reconciliation with the policy named in the config.
pub fn run(
    config: &ReconConfig,
    per_source: &SourceFields,
    decisions: Option<&HumanDecisions>,
) -> Result<ReconResult, ReconError> {
    let policy = build_policy(&config.policy);
    run_with_policy(config, per_source, policy.as_ref(), decisions)
}

/// Align → evaluate → (optional) override, then summarize.
pub fn run_with_policy(
    config: &ReconConfig,
    per_source: &SourceFields,
    policy: &dyn DecisionPolicy,
    decisions: Option<&HumanDecisions>,
) -> Result<ReconResult, ReconError> {
    let aligned = align(per_source)?;
    let mut fields = evaluate(&aligned, policy)?;

    if let Some(decisions) = decisions {
        fields = apply_overrides(fields, decisions);
    }

    let summary = compute_summary(&fields, config.review.threshold);
    log::debug!(
        "component '{}': {} field(s), {} need review",
        config.component,
        summary.total_fields,
        summary.needs_review
    );

    Ok(ReconResult {
        meta: ReconMeta {
            component: config.component.clone(),
            policy: policy.name().to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        fields,
    })
}

/// Extract field blocks from each source's raw document text.
///
/// A source whose document cannot be parsed is logged and kept with an empty
/// field list, so it still gets a slot in every field. Fails only when no
/// source yields any field.
pub fn extract_sources<'a, I>(docs: I) -> Result<SourceFields, ReconError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut per_source = SourceFields::new();
    let mut failures = Vec::new();
    for (source, text) in docs {
        let fields = match parse_field_blocks(text) {
            Ok(fields) => fields,
            Err(e) => {
                let detail = match e {
                    ReconError::Validation(msg) => msg,
                    other => other.to_string(),
                };
                log::warn!("skipping document from source '{source}': {detail}");
                failures.push(format!("source '{source}': {detail}"));
                Vec::new()
            }
        };
        log::debug!("extracted {} field(s) from '{source}'", fields.len());
        per_source.insert(source.to_string(), fields);
    }

    if per_source.values().all(Vec::is_empty) {
        let mut msg = String::from("no fields were extracted from any source");
        if !failures.is_empty() {
            msg.push_str(" (");
            msg.push_str(&failures.join("; "));
            msg.push(')');
        }
        return Err(ReconError::Validation(msg));
    }
    Ok(per_source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TruthSource;

    const SOURCE1: &str = "\
Field: Title
Value: Component One
Required: Yes
Last Updated: 2023-10-01

Field: Version
Value: 1.0
Required: No
Last Updated: 2023-10-01
";

    const SOURCE2: &str = "\
Field: Title
Value: Component 1
Required: True
Last Updated: 2023-10-02

Field: Author
Value: SourceTwo
Required: Optional
Last Updated: 2023-10-02
";

    fn config() -> ReconConfig {
        ReconConfig::from_toml(r#"component = "component1""#).unwrap()
    }

    #[test]
    fn extract_then_run() {
        let per_source = extract_sources([("source1", SOURCE1), ("source2", SOURCE2)]).unwrap();
        let result = run(&config(), &per_source, None).unwrap();

        assert_eq!(result.meta.component, "component1");
        assert_eq!(result.meta.policy, "recency");
        assert_eq!(result.summary.total_fields, 3);
        assert_eq!(
            result.fields["Title"].truth_source,
            Some(TruthSource::Source("source2".into()))
        );
        // Title sources disagree, so it needs review
        assert!(result.fields["Title"].needs_review(0.9));
        assert_eq!(result.fields["Version"].confidence_overall, 1.0);
    }

    #[test]
    fn run_applies_decisions() {
        let per_source = extract_sources([("source1", SOURCE1), ("source2", SOURCE2)]).unwrap();
        let decisions: HumanDecisions =
            serde_json::from_str(r#"{"Title": {"chosenSource": "source1"}}"#).unwrap();
        let result = run(&config(), &per_source, Some(&decisions)).unwrap();

        assert_eq!(
            result.fields["Title"].truth_source,
            Some(TruthSource::Source("source1".into()))
        );
        assert_eq!(result.summary.overridden, 1);
    }

    #[test]
    fn unparseable_source_keeps_empty_slot() {
        let per_source = extract_sources([
            ("source1", SOURCE1),
            ("source2", "Title is A, updated last week.\n"),
        ])
        .unwrap();
        assert_eq!(per_source["source1"].len(), 2);
        assert!(per_source["source2"].is_empty());

        let result = run(&config(), &per_source, None).unwrap();
        assert_eq!(
            result.fields["Title"].diff["source2"].value(),
            "ENUM.NO_FIELD"
        );
        assert_eq!(
            result.fields["Title"].truth_source,
            Some(TruthSource::Source("source1".into()))
        );
    }

    #[test]
    fn nothing_extracted_fails() {
        let err = extract_sources([("source1", "Value: orphan"), ("source2", "")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("validation error: no fields were extracted from any source"));
        assert!(msg.contains("source 'source1': line 1: 'value' outside a Field block"));
        assert_eq!(msg.matches("validation error").count(), 1);
    }
}
