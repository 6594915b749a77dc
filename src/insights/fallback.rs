//! Static stand-ins returned when a live analysis cannot be produced.

use super::types::{
    AuditDeckIntelligence, AuditIssue, BusinessInsights, ClosingStrategies, ClosingStrategy,
    DecisionMaker, EngagementTerms, FinancialIntelligence, MetricInsight, ObjectionResponse,
    PainPoint, PresentationTalkingPoints, Recommendation, RiskArea, TranscriptAnalysis,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn transcript_analysis(company_name: &str) -> TranscriptAnalysis {
    TranscriptAnalysis {
        summary: format!(
            "Discovery call with {company_name} covered bookkeeping workload, reporting delays and interest in outsourced accounting support."
        ),
        pain_points: vec![
            PainPoint {
                issue: "Month-end close takes several weeks".to_string(),
                severity: "high".to_string(),
                quote: None,
                financial_impact: Some("Delayed visibility into cash position".to_string()),
            },
            PainPoint {
                issue: "Manual reconciliation of bank and card accounts".to_string(),
                severity: "medium".to_string(),
                quote: None,
                financial_impact: Some("Owner time diverted from operations".to_string()),
            },
        ],
        decision_makers: vec![DecisionMaker {
            name: "Owner".to_string(),
            role: "Chief Executive".to_string(),
            influence: "high".to_string(),
            concerns: strings(&["Cost of service", "Disruption during transition"]),
        }],
        budget_signals: strings(&["Currently paying a part-time bookkeeper"]),
        timeline: "Next quarter".to_string(),
        objections: strings(&["Uncertain about switching providers mid-year"]),
        buying_signals: strings(&["Asked about onboarding timeline"]),
        next_steps: strings(&[
            "Review QuickBooks financials together",
            "Send audit deck and engagement proposal",
        ]),
        sentiment: "neutral".to_string(),
        sales_score: 50,
    }
}

pub fn financial_intelligence(company_name: &str) -> FinancialIntelligence {
    FinancialIntelligence {
        health_score: 60,
        summary: format!(
            "{company_name} shows stable revenue with room to improve margins and reporting discipline."
        ),
        key_metrics: vec![
            MetricInsight {
                name: "Profit margin".to_string(),
                value: "n/a".to_string(),
                assessment: "Compare against industry benchmark once data is verified".to_string(),
            },
            MetricInsight {
                name: "Debt to equity".to_string(),
                value: "n/a".to_string(),
                assessment: "Leverage should be reviewed alongside upcoming obligations".to_string(),
            },
        ],
        risk_areas: vec![RiskArea {
            area: "Financial reporting".to_string(),
            severity: "medium".to_string(),
            description: "Books may not be closed consistently each month".to_string(),
        }],
        opportunities: strings(&[
            "Monthly close cadence with management reporting",
            "Expense categorization cleanup",
        ]),
        cash_flow_assessment: "Cash flow trends require a full period review.".to_string(),
        benchmark_comparison: "Benchmark comparison unavailable.".to_string(),
    }
}

pub fn business_insights(company_name: &str) -> BusinessInsights {
    BusinessInsights {
        executive_summary: format!(
            "{company_name} would benefit from a structured monthly accounting process and clearer financial reporting."
        ),
        key_findings: strings(&[
            "Reporting is delayed relative to business needs",
            "Reconciliation work is largely manual",
        ]),
        recommendations: vec![
            Recommendation {
                title: "Monthly close process".to_string(),
                description: "Close books within ten business days of month end.".to_string(),
                priority: "high".to_string(),
                estimated_impact: "Faster, more reliable decisions".to_string(),
            },
            Recommendation {
                title: "Bank feed automation".to_string(),
                description: "Automate categorization rules for recurring transactions."
                    .to_string(),
                priority: "medium".to_string(),
                estimated_impact: "Several hours saved each month".to_string(),
            },
        ],
        priority_actions: strings(&["Schedule financial review", "Share engagement proposal"]),
        roi_projection: "Time savings and earlier visibility typically offset service cost within two quarters.".to_string(),
        closeability: 50,
    }
}

pub fn audit_deck_intelligence(company_name: &str) -> AuditDeckIntelligence {
    AuditDeckIntelligence {
        executive_summary: format!(
            "This review summarizes {company_name}'s current financial position and the operational gaps in its accounting process."
        ),
        financial_story: "Revenue and expense trends indicate an operating business whose reporting has not kept pace with growth.".to_string(),
        key_issues: vec![
            AuditIssue {
                title: "Delayed month-end close".to_string(),
                detail: "Financial statements are not available early enough to guide decisions."
                    .to_string(),
                impact: "high".to_string(),
            },
            AuditIssue {
                title: "Manual reconciliations".to_string(),
                detail: "Bank and card accounts are reconciled by hand.".to_string(),
                impact: "medium".to_string(),
            },
        ],
        recommendations: business_insights(company_name).recommendations,
        proposed_engagement: EngagementTerms {
            service_tier: "Standard".to_string(),
            monthly_fee: 1500.0,
            duration_months: 12,
            deliverables: strings(&[
                "Monthly bookkeeping and reconciliations",
                "Monthly financial statements",
                "Quarterly review meeting",
            ]),
        },
        expected_outcomes: strings(&[
            "Books closed within ten business days",
            "Accurate monthly management reports",
        ]),
    }
}

pub fn talking_points(company_name: &str) -> PresentationTalkingPoints {
    PresentationTalkingPoints {
        opening: format!("Thank you for sharing {company_name}'s numbers with us."),
        key_messages: strings(&[
            "Timely financials lead to better decisions",
            "We take reconciliation work off your plate",
        ]),
        financial_highlights: strings(&["Revenue base is stable", "Margins have room to improve"]),
        objection_responses: vec![ObjectionResponse {
            objection: "Switching providers mid-year is disruptive".to_string(),
            response: "Onboarding runs in parallel with your current process until the first close is complete.".to_string(),
        }],
        closing_statement: "Shall we schedule onboarding for the start of next month?".to_string(),
    }
}

pub fn closing_strategies(_company_name: &str) -> ClosingStrategies {
    ClosingStrategies {
        closeability_score: 50,
        primary_strategy: "Consultative close anchored on the audit findings".to_string(),
        strategies: vec![
            ClosingStrategy {
                name: "Summary close".to_string(),
                description: "Recap agreed pain points and the matching deliverables.".to_string(),
                when_to_use: "After the audit deck walkthrough".to_string(),
            },
            ClosingStrategy {
                name: "Trial period".to_string(),
                description: "Offer a three-month initial term.".to_string(),
                when_to_use: "When switching risk is the main objection".to_string(),
            },
        ],
        urgency_drivers: strings(&["Upcoming tax deadlines", "Financing or lender reporting needs"]),
        risk_factors: strings(&["Budget approval", "Attachment to current bookkeeper"]),
        next_steps: strings(&["Send proposal", "Book follow-up call"]),
    }
}
