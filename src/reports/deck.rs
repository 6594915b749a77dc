use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::shared::utils::format_currency;
use crate::financials::FinancialSnapshot;
use crate::insights::{
    AnalysisKind, AuditDeckIntelligence, AuditIssue, CompanyProfile, EngagementTerms, Insight,
    InsightSource, PainPoint, Recommendation, TranscriptAnalysis,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckFinancials {
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub profit_margin: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub debt_to_equity: f64,
    pub as_of: DateTime<Utc>,
}

impl From<&FinancialSnapshot> for DeckFinancials {
    fn from(s: &FinancialSnapshot) -> Self {
        Self {
            revenue: s.revenue,
            expenses: s.expenses,
            net_income: s.net_income,
            profit_margin: s.profit_margin,
            total_assets: s.total_assets,
            total_liabilities: s.total_liabilities,
            total_equity: s.total_equity,
            debt_to_equity: s.debt_to_equity,
            as_of: s.created_at,
        }
    }
}

impl DeckFinancials {
    /// Label/value pairs in presentation order, shared by every export format.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Revenue", format_currency(self.revenue)),
            ("Expenses", format_currency(self.expenses)),
            ("Net Income", format_currency(self.net_income)),
            ("Profit Margin", format!("{:.1}%", self.profit_margin)),
            ("Total Assets", format_currency(self.total_assets)),
            ("Total Liabilities", format_currency(self.total_liabilities)),
            ("Total Equity", format_currency(self.total_equity)),
            ("Debt to Equity", format!("{:.2}", self.debt_to_equity)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub industry: String,
    pub avg_profit_margin: f64,
    pub avg_debt_to_equity: f64,
}

/// Where the generated narrative came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProvenance {
    pub source: InsightSource,
    #[serde(default)]
    pub fallback_sections: Vec<String>,
}

impl AiProvenance {
    pub fn is_fallback(&self) -> bool {
        self.source == InsightSource::Fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditDeck {
    pub company_id: String,
    pub company_name: String,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: String,
    pub financial_story: String,
    pub financials: DeckFinancials,
    #[serde(default)]
    pub benchmark: Option<BenchmarkComparison>,
    #[serde(default)]
    pub pain_points: Vec<PainPoint>,
    #[serde(default)]
    pub key_issues: Vec<AuditIssue>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    pub engagement: EngagementTerms,
    #[serde(default)]
    pub expected_outcomes: Vec<String>,
    pub ai_content: AiProvenance,
}

impl AuditDeck {
    /// Marks an upstream analysis that fell back, so the deck as a whole is flagged.
    pub fn note_fallback(&mut self, kind: AnalysisKind) {
        let name = kind.as_str().to_string();
        if !self.ai_content.fallback_sections.contains(&name) {
            self.ai_content.fallback_sections.push(name);
        }
        self.ai_content.source = InsightSource::Fallback;
    }
}

pub fn build_audit_deck(
    prospect: &CompanyProfile,
    snapshot: &FinancialSnapshot,
    transcript_analysis: Option<&TranscriptAnalysis>,
    intelligence: &Insight<AuditDeckIntelligence>,
    generated_at: DateTime<Utc>,
) -> AuditDeck {
    let intel = intelligence.value();

    let mut ai_content = AiProvenance {
        source: intelligence.source(),
        fallback_sections: Vec::new(),
    };
    if intelligence.is_fallback() {
        ai_content
            .fallback_sections
            .push(AnalysisKind::AuditDeckIntelligence.as_str().to_string());
    }

    AuditDeck {
        company_id: prospect.company_id.clone().unwrap_or_default(),
        company_name: prospect.name.clone(),
        title: format!("{} Financial Audit", prospect.name),
        generated_at,
        executive_summary: intel.executive_summary.clone(),
        financial_story: intel.financial_story.clone(),
        financials: DeckFinancials::from(snapshot),
        benchmark: prospect.benchmark.as_ref().map(|b| BenchmarkComparison {
            industry: b.industry.clone(),
            avg_profit_margin: b.avg_profit_margin,
            avg_debt_to_equity: b.avg_debt_to_equity,
        }),
        pain_points: transcript_analysis
            .map(|t| t.pain_points.clone())
            .unwrap_or_default(),
        key_issues: intel.key_issues.clone(),
        recommendations: intel.recommendations.clone(),
        engagement: intel.proposed_engagement.clone(),
        expected_outcomes: intel.expected_outcomes.clone(),
        ai_content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::sample_snapshot;
    use crate::insights::{fallback, FallbackReason};

    fn profile() -> CompanyProfile {
        CompanyProfile {
            company_id: Some("realm-1".into()),
            ..CompanyProfile::named("Acme Builders")
        }
    }

    #[test]
    fn test_inferred_deck() {
        let intel = AuditDeckIntelligence {
            executive_summary: "Margins trail peers".into(),
            ..fallback::audit_deck_intelligence("Acme Builders")
        };
        let transcript = fallback::transcript_analysis("Acme Builders");
        let snapshot = sample_snapshot("realm-1");

        let deck = build_audit_deck(
            &profile(),
            &snapshot,
            Some(&transcript),
            &Insight::Inferred(intel),
            snapshot.created_at,
        );

        assert_eq!(deck.title, "Acme Builders Financial Audit");
        assert_eq!(deck.company_id, "realm-1");
        assert_eq!(deck.executive_summary, "Margins trail peers");
        assert_eq!(deck.pain_points.len(), transcript.pain_points.len());
        assert_eq!(deck.financials.revenue, snapshot.revenue);
        assert!(!deck.ai_content.is_fallback());
    }

    #[test]
    fn test_fallback_is_recorded() {
        let snapshot = sample_snapshot("realm-1");
        let mut deck = build_audit_deck(
            &profile(),
            &snapshot,
            None,
            &Insight::Fallback {
                value: fallback::audit_deck_intelligence("Acme Builders"),
                reason: FallbackReason::NotAnObject,
            },
            snapshot.created_at,
        );

        assert!(deck.ai_content.is_fallback());
        assert_eq!(deck.ai_content.fallback_sections, vec!["audit_deck_intelligence"]);
        assert!(deck.pain_points.is_empty());

        deck.note_fallback(AnalysisKind::FinancialIntelligence);
        deck.note_fallback(AnalysisKind::FinancialIntelligence);
        assert_eq!(deck.ai_content.fallback_sections.len(), 2);
    }

    #[test]
    fn test_note_fallback_flags_inferred_deck() {
        let snapshot = sample_snapshot("realm-1");
        let mut deck = build_audit_deck(
            &profile(),
            &snapshot,
            None,
            &Insight::Inferred(AuditDeckIntelligence::default()),
            snapshot.created_at,
        );
        deck.note_fallback(AnalysisKind::BusinessInsights);
        assert!(deck.ai_content.is_fallback());
    }

    #[test]
    fn test_financial_rows_formatting() {
        let mut snapshot = sample_snapshot("realm-1");
        snapshot.revenue = 1_250_000.0;
        snapshot.profit_margin = 12.345;
        let rows = DeckFinancials::from(&snapshot).rows();
        assert_eq!(rows[0], ("Revenue", "$1,250,000".to_string()));
        assert_eq!(rows[3], ("Profit Margin", "12.3%".to_string()));
    }
}
