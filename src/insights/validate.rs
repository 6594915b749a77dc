//! Shallow structural coalescing of LLM output.
//!
//! Each top-level key of the default shape is taken from the raw response when
//! it is present, non-null and deserializes into the expected field type;
//! otherwise the default value is kept. Nothing deeper than the top level is
//! checked, beyond the score clamping done during deserialization.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{
    AuditDeckIntelligence, BusinessInsights, ClosingStrategies, FinancialIntelligence,
    PresentationTalkingPoints, TranscriptAnalysis,
};

/// Result of coalescing: the value plus the keys that were replaced by defaults.
#[derive(Debug, Clone)]
pub struct Coalesced<T> {
    pub value: T,
    pub defaulted: Vec<String>,
}

pub fn coalesce<T>(raw: &Value) -> Coalesced<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    let base = match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => map,
        _ => {
            return Coalesced {
                value: T::default(),
                defaulted: Vec::new(),
            }
        }
    };

    let Some(raw_obj) = raw.as_object() else {
        return Coalesced {
            value: T::default(),
            defaulted: base.keys().cloned().collect(),
        };
    };

    let mut merged: Map<String, Value> = base.clone();
    let mut defaulted = Vec::new();

    for key in base.keys() {
        match raw_obj.get(key) {
            Some(candidate) if !candidate.is_null() => {
                let mut trial = merged.clone();
                trial.insert(key.clone(), candidate.clone());
                if serde_json::from_value::<T>(Value::Object(trial.clone())).is_ok() {
                    merged = trial;
                } else {
                    log::debug!("Discarding ill-typed LLM field '{key}'");
                    defaulted.push(key.clone());
                }
            }
            _ => defaulted.push(key.clone()),
        }
    }

    let value = serde_json::from_value(Value::Object(merged)).unwrap_or_default();
    Coalesced { value, defaulted }
}

pub fn validate_transcript_analysis(raw: &Value) -> TranscriptAnalysis {
    coalesce(raw).value
}

pub fn validate_financial_intelligence(raw: &Value) -> FinancialIntelligence {
    coalesce(raw).value
}

pub fn validate_business_insights(raw: &Value) -> BusinessInsights {
    coalesce(raw).value
}

pub fn validate_audit_deck_intelligence(raw: &Value) -> AuditDeckIntelligence {
    coalesce(raw).value
}

pub fn validate_talking_points(raw: &Value) -> PresentationTalkingPoints {
    coalesce(raw).value
}

pub fn validate_closing_strategies(raw: &Value) -> ClosingStrategies {
    coalesce(raw).value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys_of<T: Serialize>(value: &T) -> Vec<String> {
        let mut keys: Vec<String> = serde_json::to_value(value)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn sorted(keys: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        v.sort();
        v
    }

    #[test]
    fn test_empty_object_yields_every_required_key() {
        let empty = json!({});

        assert_eq!(
            keys_of(&validate_transcript_analysis(&empty)),
            sorted(&[
                "summary",
                "pain_points",
                "decision_makers",
                "budget_signals",
                "timeline",
                "objections",
                "buying_signals",
                "next_steps",
                "sentiment",
                "sales_score",
            ])
        );
        assert_eq!(
            keys_of(&validate_financial_intelligence(&empty)),
            sorted(&[
                "health_score",
                "summary",
                "key_metrics",
                "risk_areas",
                "opportunities",
                "cash_flow_assessment",
                "benchmark_comparison",
            ])
        );
        assert_eq!(
            keys_of(&validate_business_insights(&empty)),
            sorted(&[
                "executive_summary",
                "key_findings",
                "recommendations",
                "priority_actions",
                "roi_projection",
                "closeability",
            ])
        );
        assert_eq!(
            keys_of(&validate_audit_deck_intelligence(&empty)),
            sorted(&[
                "executive_summary",
                "financial_story",
                "key_issues",
                "recommendations",
                "proposed_engagement",
                "expected_outcomes",
            ])
        );
        assert_eq!(
            keys_of(&validate_talking_points(&empty)),
            sorted(&[
                "opening",
                "key_messages",
                "financial_highlights",
                "objection_responses",
                "closing_statement",
            ])
        );
        assert_eq!(
            keys_of(&validate_closing_strategies(&empty)),
            sorted(&[
                "closeability_score",
                "primary_strategy",
                "strategies",
                "urgency_drivers",
                "risk_factors",
                "next_steps",
            ])
        );
    }

    #[test]
    fn test_present_keys_are_kept() {
        let raw = json!({
            "summary": "Owner wants faster closes",
            "pain_points": [{"issue": "Manual reconciliations", "severity": "high"}],
            "sales_score": 72
        });
        let analysis = validate_transcript_analysis(&raw);
        assert_eq!(analysis.summary, "Owner wants faster closes");
        assert_eq!(analysis.pain_points.len(), 1);
        assert_eq!(analysis.pain_points[0].severity, "high");
        assert_eq!(analysis.sales_score, 72);
        assert!(analysis.objections.is_empty());
    }

    #[test]
    fn test_ill_typed_keys_fall_back_individually() {
        let raw = json!({
            "executive_summary": "Solid margins, weak controls",
            "key_findings": "not a list",
            "closeability": 250
        });
        let coalesced = coalesce::<BusinessInsights>(&raw);
        assert_eq!(coalesced.value.executive_summary, "Solid margins, weak controls");
        assert!(coalesced.value.key_findings.is_empty());
        assert_eq!(coalesced.value.closeability, 100);
        assert!(coalesced.defaulted.contains(&"key_findings".to_string()));
        assert!(!coalesced.defaulted.contains(&"executive_summary".to_string()));
    }

    #[test]
    fn test_null_values_are_defaulted() {
        let raw = json!({ "opening": null, "closing_statement": "Let's start Monday." });
        let points = validate_talking_points(&raw);
        assert!(points.opening.is_empty());
        assert_eq!(points.closing_statement, "Let's start Monday.");
    }

    #[test]
    fn test_non_object_input_is_default() {
        let strategies = validate_closing_strategies(&json!(["not", "an", "object"]));
        assert_eq!(strategies, ClosingStrategies::default());
    }

    #[test]
    fn test_scores_are_clamped() {
        let intel = validate_financial_intelligence(&json!({ "health_score": -5 }));
        assert_eq!(intel.health_score, 0);
        let closing = validate_closing_strategies(&json!({ "closeability_score": 64.4 }));
        assert_eq!(closing.closeability_score, 64);
    }
}
