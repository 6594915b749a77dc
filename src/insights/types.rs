use serde::{Deserialize, Deserializer, Serialize};

use crate::benchmarks::IndustryBenchmark;

/// Accepts any JSON number and clamps it into a 0..=100 score.
pub(crate) fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_score(raw))
}

pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// What the engine knows about the company being analyzed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_id: Option<String>,
    pub name: String,
    pub industry: Option<String>,
    pub contact_name: Option<String>,
    pub benchmark: Option<IndustryBenchmark>,
}

impl CompanyProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainPoint {
    pub issue: String,
    pub severity: String,
    pub quote: Option<String>,
    pub financial_impact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionMaker {
    pub name: String,
    pub role: String,
    pub influence: String,
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAnalysis {
    pub summary: String,
    pub pain_points: Vec<PainPoint>,
    pub decision_makers: Vec<DecisionMaker>,
    pub budget_signals: Vec<String>,
    pub timeline: String,
    pub objections: Vec<String>,
    pub buying_signals: Vec<String>,
    pub next_steps: Vec<String>,
    pub sentiment: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub sales_score: u8,
}

// ---------------------------------------------------------------------------
// Financial intelligence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricInsight {
    pub name: String,
    pub value: String,
    pub assessment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskArea {
    pub area: String,
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialIntelligence {
    #[serde(deserialize_with = "deserialize_score")]
    pub health_score: u8,
    pub summary: String,
    pub key_metrics: Vec<MetricInsight>,
    pub risk_areas: Vec<RiskArea>,
    pub opportunities: Vec<String>,
    pub cash_flow_assessment: String,
    pub benchmark_comparison: String,
}

// ---------------------------------------------------------------------------
// Business insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub estimated_impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInsights {
    pub executive_summary: String,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub priority_actions: Vec<String>,
    pub roi_projection: String,
    #[serde(deserialize_with = "deserialize_score")]
    pub closeability: u8,
}

// ---------------------------------------------------------------------------
// Audit deck intelligence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditIssue {
    pub title: String,
    pub detail: String,
    pub impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementTerms {
    pub service_tier: String,
    pub monthly_fee: f64,
    pub duration_months: u32,
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDeckIntelligence {
    pub executive_summary: String,
    pub financial_story: String,
    pub key_issues: Vec<AuditIssue>,
    pub recommendations: Vec<Recommendation>,
    pub proposed_engagement: EngagementTerms,
    pub expected_outcomes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Presentation talking points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectionResponse {
    pub objection: String,
    pub response: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationTalkingPoints {
    pub opening: String,
    pub key_messages: Vec<String>,
    pub financial_highlights: Vec<String>,
    pub objection_responses: Vec<ObjectionResponse>,
    pub closing_statement: String,
}

// ---------------------------------------------------------------------------
// Closing strategies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosingStrategy {
    pub name: String,
    pub description: String,
    pub when_to_use: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosingStrategies {
    #[serde(deserialize_with = "deserialize_score")]
    pub closeability_score: u8,
    pub primary_strategy: String,
    pub strategies: Vec<ClosingStrategy>,
    pub urgency_drivers: Vec<String>,
    pub risk_factors: Vec<String>,
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-12.0), 0);
        assert_eq!(clamp_score(87.6), 88);
        assert_eq!(clamp_score(140.0), 100);
        assert_eq!(clamp_score(f64::NAN), 0);
    }

    #[test]
    fn test_nested_items_tolerate_missing_fields() {
        let point: PainPoint = serde_json::from_value(serde_json::json!({
            "issue": "Month-end close takes three weeks"
        }))
        .unwrap();
        assert_eq!(point.issue, "Month-end close takes three weeks");
        assert!(point.severity.is_empty());
        assert!(point.quote.is_none());
    }
}
