use serde::Serialize;

use super::types::{
    BusinessInsights, CompanyProfile, FinancialIntelligence, TranscriptAnalysis,
};
use crate::financials::FinancialSnapshot;

/// Transcripts longer than this are cut before prompting.
pub const MAX_TRANSCRIPT_CHARS: usize = 24_000;

pub const TRANSCRIPT_SYSTEM_PROMPT: &str = r#"You are a senior sales analyst for an outsourced accounting and CFO services firm.
You read discovery call transcripts and extract structured sales intelligence.
Respond with a single JSON object using exactly these keys:
{
  "summary": string,
  "pain_points": [{"issue": string, "severity": "low"|"medium"|"high", "quote": string|null, "financial_impact": string|null}],
  "decision_makers": [{"name": string, "role": string, "influence": "low"|"medium"|"high", "concerns": [string]}],
  "budget_signals": [string],
  "timeline": string,
  "objections": [string],
  "buying_signals": [string],
  "next_steps": [string],
  "sentiment": "positive"|"neutral"|"negative",
  "sales_score": integer 0-100
}
Only use facts stated in the transcript. Use empty arrays when nothing applies."#;

pub const FINANCIAL_SYSTEM_PROMPT: &str = r#"You are a fractional CFO reviewing a small business's QuickBooks financials.
Assess financial health and identify risks and opportunities for an advisory engagement.
Respond with a single JSON object using exactly these keys:
{
  "health_score": integer 0-100,
  "summary": string,
  "key_metrics": [{"name": string, "value": string, "assessment": string}],
  "risk_areas": [{"area": string, "severity": "low"|"medium"|"high", "description": string}],
  "opportunities": [string],
  "cash_flow_assessment": string,
  "benchmark_comparison": string
}
Base every statement on the numbers provided. Amounts are in US dollars."#;

pub const BUSINESS_INSIGHTS_SYSTEM_PROMPT: &str = r#"You are a strategy advisor combining sales call intelligence with financial analysis.
Produce business insights that connect the prospect's stated pain points to their financial data.
Respond with a single JSON object using exactly these keys:
{
  "executive_summary": string,
  "key_findings": [string],
  "recommendations": [{"title": string, "description": string, "priority": "low"|"medium"|"high", "estimated_impact": string}],
  "priority_actions": [string],
  "roi_projection": string,
  "closeability": integer 0-100
}"#;

pub const AUDIT_DECK_SYSTEM_PROMPT: &str = r#"You write the content of a financial audit presentation delivered to a prospect.
The deck explains the current state of the books, the issues found, and a proposed engagement.
Respond with a single JSON object using exactly these keys:
{
  "executive_summary": string,
  "financial_story": string,
  "key_issues": [{"title": string, "detail": string, "impact": "low"|"medium"|"high"}],
  "recommendations": [{"title": string, "description": string, "priority": "low"|"medium"|"high", "estimated_impact": string}],
  "proposed_engagement": {"service_tier": string, "monthly_fee": number, "duration_months": integer, "deliverables": [string]},
  "expected_outcomes": [string]
}
Write for a business owner, not an accountant. Keep each field concise."#;

pub const TALKING_POINTS_SYSTEM_PROMPT: &str = r#"You coach an account executive before an audit deck presentation.
Respond with a single JSON object using exactly these keys:
{
  "opening": string,
  "key_messages": [string],
  "financial_highlights": [string],
  "objection_responses": [{"objection": string, "response": string}],
  "closing_statement": string
}
Ground every point in the analysis provided."#;

pub const CLOSING_SYSTEM_PROMPT: &str = r#"You are a sales closing strategist for professional services.
Recommend how to close this prospect given the call analysis and business insights.
Respond with a single JSON object using exactly these keys:
{
  "closeability_score": integer 0-100,
  "primary_strategy": string,
  "strategies": [{"name": string, "description": string, "when_to_use": string}],
  "urgency_drivers": [string],
  "risk_factors": [string],
  "next_steps": [string]
}"#;

/// Cuts `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn company_block(company: &CompanyProfile) -> String {
    let mut block = format!("Company: {}\n", company.name);
    if let Some(industry) = &company.industry {
        block.push_str(&format!("Industry: {industry}\n"));
    }
    if let Some(contact) = &company.contact_name {
        block.push_str(&format!("Primary contact: {contact}\n"));
    }
    block
}

pub fn transcript_prompt(transcript: &str, company_name: &str) -> String {
    let body = truncate_chars(transcript, MAX_TRANSCRIPT_CHARS);
    let note = if body.len() < transcript.len() {
        "\n(Transcript truncated.)"
    } else {
        ""
    };
    format!(
        "Analyze this sales call transcript with {company_name}.\n\nTRANSCRIPT:\n{body}{note}"
    )
}

pub fn financial_prompt(financials: &FinancialSnapshot, company: &CompanyProfile) -> String {
    let mut prompt = company_block(company);
    prompt.push_str(&format!(
        "\nFINANCIAL SNAPSHOT:\n\
         Revenue: {:.2}\n\
         Expenses: {:.2}\n\
         Net income: {:.2}\n\
         Profit margin: {:.2}%\n\
         Total assets: {:.2}\n\
         Total liabilities: {:.2}\n\
         Total equity: {:.2}\n\
         Debt to equity: {:.2}\n",
        financials.revenue,
        financials.expenses,
        financials.net_income,
        financials.profit_margin,
        financials.total_assets,
        financials.total_liabilities,
        financials.total_equity,
        financials.debt_to_equity,
    ));
    if let Some(benchmark) = &company.benchmark {
        prompt.push_str(&format!(
            "\nINDUSTRY BENCHMARK ({}):\n\
             Average profit margin: {:.1}%\n\
             Average debt to equity: {:.2}\n\
             Average revenue growth: {:.1}%\n",
            benchmark.industry,
            benchmark.avg_profit_margin,
            benchmark.avg_debt_to_equity,
            benchmark.avg_revenue_growth,
        ));
    }
    prompt
}

pub fn business_insights_prompt(
    transcript_analysis: &TranscriptAnalysis,
    financial_intelligence: &FinancialIntelligence,
    company: &CompanyProfile,
) -> String {
    format!(
        "{}\nCALL ANALYSIS:\n{}\n\nFINANCIAL INTELLIGENCE:\n{}",
        company_block(company),
        to_json(transcript_analysis),
        to_json(financial_intelligence)
    )
}

pub fn audit_deck_prompt(
    transcript_analysis: &TranscriptAnalysis,
    financial_intelligence: &FinancialIntelligence,
    business_insights: &BusinessInsights,
    company: &CompanyProfile,
) -> String {
    format!(
        "{}\nCALL ANALYSIS:\n{}\n\nFINANCIAL INTELLIGENCE:\n{}\n\nBUSINESS INSIGHTS:\n{}",
        company_block(company),
        to_json(transcript_analysis),
        to_json(financial_intelligence),
        to_json(business_insights)
    )
}

pub fn talking_points_prompt(
    business_insights: &BusinessInsights,
    transcript_analysis: &TranscriptAnalysis,
    company: &CompanyProfile,
) -> String {
    format!(
        "{}\nBUSINESS INSIGHTS:\n{}\n\nCALL ANALYSIS:\n{}",
        company_block(company),
        to_json(business_insights),
        to_json(transcript_analysis)
    )
}

pub fn closing_prompt(
    transcript_analysis: &TranscriptAnalysis,
    business_insights: &BusinessInsights,
    company: &CompanyProfile,
) -> String {
    format!(
        "{}\nCALL ANALYSIS:\n{}\n\nBUSINESS INSIGHTS:\n{}",
        company_block(company),
        to_json(transcript_analysis),
        to_json(business_insights)
    )
}
