use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::{fallback, prompts, validate, AnalysisKind, FallbackReason, Insight, InsightEnvelope};
use super::types::{
    AuditDeckIntelligence, BusinessInsights, ClosingStrategies, CompanyProfile,
    FinancialIntelligence, PresentationTalkingPoints, TranscriptAnalysis,
};
use crate::financials::FinancialSnapshot;
use crate::llm::{extract_json, ChatMessage, CompletionOptions, LLMProvider};

pub struct InsightsEngine {
    llm: Arc<dyn LLMProvider>,
}

/// Every insight produced for one company in a single pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullAnalysis {
    pub transcript_analysis: Option<InsightEnvelope<TranscriptAnalysis>>,
    pub financial_intelligence: InsightEnvelope<FinancialIntelligence>,
    pub business_insights: InsightEnvelope<BusinessInsights>,
    pub talking_points: InsightEnvelope<PresentationTalkingPoints>,
    pub closing_strategies: InsightEnvelope<ClosingStrategies>,
}

impl InsightsEngine {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Sends one prompt and turns the completion into `T`, or the fallback.
    async fn run<T, V>(
        &self,
        kind: AnalysisKind,
        system_prompt: &str,
        user_prompt: String,
        fallback: T,
        validate: V,
    ) -> Insight<T>
    where
        T: DeserializeOwned,
        V: FnOnce(&Value) -> T,
    {
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];
        let options = CompletionOptions::json(kind.temperature());

        let content = match self.llm.generate(&messages, &options).await {
            Ok(content) => content,
            Err(e) => {
                return fall_back(kind, fallback, FallbackReason::Provider(e.to_string()));
            }
        };

        let parsed: Value = match serde_json::from_str(&extract_json(&content)) {
            Ok(value) => value,
            Err(e) => {
                return fall_back(kind, fallback, FallbackReason::MalformedJson(e.to_string()));
            }
        };

        if !parsed.is_object() {
            return fall_back(kind, fallback, FallbackReason::NotAnObject);
        }

        log::debug!("{kind} produced by {}", self.llm.model());
        Insight::Inferred(validate(&parsed))
    }

    pub async fn analyze_call_transcript(
        &self,
        transcript: &str,
        company_name: &str,
    ) -> Insight<TranscriptAnalysis> {
        self.run(
            AnalysisKind::TranscriptAnalysis,
            prompts::TRANSCRIPT_SYSTEM_PROMPT,
            prompts::transcript_prompt(transcript, company_name),
            fallback::transcript_analysis(company_name),
            validate::validate_transcript_analysis,
        )
        .await
    }

    pub async fn analyze_financial_data(
        &self,
        financial_data: &FinancialSnapshot,
        company_info: &CompanyProfile,
    ) -> Insight<FinancialIntelligence> {
        self.run(
            AnalysisKind::FinancialIntelligence,
            prompts::FINANCIAL_SYSTEM_PROMPT,
            prompts::financial_prompt(financial_data, company_info),
            fallback::financial_intelligence(&company_info.name),
            validate::validate_financial_intelligence,
        )
        .await
    }

    pub async fn generate_business_insights(
        &self,
        transcript_analysis: &TranscriptAnalysis,
        financial_intelligence: &FinancialIntelligence,
        company_info: &CompanyProfile,
    ) -> Insight<BusinessInsights> {
        self.run(
            AnalysisKind::BusinessInsights,
            prompts::BUSINESS_INSIGHTS_SYSTEM_PROMPT,
            prompts::business_insights_prompt(
                transcript_analysis,
                financial_intelligence,
                company_info,
            ),
            fallback::business_insights(&company_info.name),
            validate::validate_business_insights,
        )
        .await
    }

    pub async fn generate_audit_deck_intelligence(
        &self,
        transcript_analysis: &TranscriptAnalysis,
        financial_intelligence: &FinancialIntelligence,
        business_insights: &BusinessInsights,
        company_info: &CompanyProfile,
    ) -> Insight<AuditDeckIntelligence> {
        self.run(
            AnalysisKind::AuditDeckIntelligence,
            prompts::AUDIT_DECK_SYSTEM_PROMPT,
            prompts::audit_deck_prompt(
                transcript_analysis,
                financial_intelligence,
                business_insights,
                company_info,
            ),
            fallback::audit_deck_intelligence(&company_info.name),
            validate::validate_audit_deck_intelligence,
        )
        .await
    }

    pub async fn generate_presentation_talking_points(
        &self,
        business_insights: &BusinessInsights,
        transcript_analysis: &TranscriptAnalysis,
        company_info: &CompanyProfile,
    ) -> Insight<PresentationTalkingPoints> {
        self.run(
            AnalysisKind::TalkingPoints,
            prompts::TALKING_POINTS_SYSTEM_PROMPT,
            prompts::talking_points_prompt(business_insights, transcript_analysis, company_info),
            fallback::talking_points(&company_info.name),
            validate::validate_talking_points,
        )
        .await
    }

    pub async fn generate_closing_strategies(
        &self,
        transcript_analysis: &TranscriptAnalysis,
        business_insights: &BusinessInsights,
        company_info: &CompanyProfile,
    ) -> Insight<ClosingStrategies> {
        self.run(
            AnalysisKind::ClosingStrategies,
            prompts::CLOSING_SYSTEM_PROMPT,
            prompts::closing_prompt(transcript_analysis, business_insights, company_info),
            fallback::closing_strategies(&company_info.name),
            validate::validate_closing_strategies,
        )
        .await
    }

    /// Runs the chain for one company. A missing transcript analysis is
    /// replaced by an empty one so the financial side still gets analyzed.
    pub async fn run_full_analysis(
        &self,
        transcript_analysis: Option<Insight<TranscriptAnalysis>>,
        financials: &FinancialSnapshot,
        company_info: &CompanyProfile,
    ) -> FullAnalysis {
        let transcript = transcript_analysis
            .as_ref()
            .map(|insight| insight.value().clone())
            .unwrap_or_default();

        let financial = self.analyze_financial_data(financials, company_info).await;
        let insights = self
            .generate_business_insights(&transcript, financial.value(), company_info)
            .await;
        let talking_points = self
            .generate_presentation_talking_points(insights.value(), &transcript, company_info)
            .await;
        let closing = self
            .generate_closing_strategies(&transcript, insights.value(), company_info)
            .await;

        FullAnalysis {
            transcript_analysis: transcript_analysis.map(Into::into),
            financial_intelligence: financial.into(),
            business_insights: insights.into(),
            talking_points: talking_points.into(),
            closing_strategies: closing.into(),
        }
    }
}

fn fall_back<T>(kind: AnalysisKind, value: T, reason: FallbackReason) -> Insight<T> {
    log::warn!("{kind} fell back to static content: {reason}");
    Insight::Fallback { value, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::{sample_snapshot, MockLLMProvider};
    use crate::llm::LlmError;

    fn engine(provider: MockLLMProvider) -> (InsightsEngine, Arc<MockLLMProvider>) {
        let provider = Arc::new(provider);
        (InsightsEngine::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_transcript_analysis_inferred() {
        let (engine, provider) = engine(MockLLMProvider::with_response(
            r#"{"summary": "Wants monthly reporting", "sales_score": 81, "objections": ["price"]}"#,
        ));

        let insight = engine
            .analyze_call_transcript("Dana: we close the books in week three.", "Acme")
            .await;

        assert!(!insight.is_fallback());
        assert_eq!(insight.value().summary, "Wants monthly reporting");
        assert_eq!(insight.value().sales_score, 81);
        assert_eq!(insight.value().objections, vec!["price".to_string()]);

        let calls = provider.calls().await;
        assert_eq!(calls.len(), 1);
        assert!((calls[0].1.temperature - 0.3).abs() < f32::EPSILON);
        assert!(calls[0].1.json_mode);
        assert_eq!(calls[0].0[0].role, "system");
        assert!(calls[0].0[1].content.contains("we close the books"));
    }

    #[tokio::test]
    async fn test_provider_failure_returns_flagged_fallback() {
        let (engine, _) = engine(MockLLMProvider::failing(LlmError::EmptyResponse));

        let insight = engine.analyze_call_transcript("hello", "Acme").await;

        assert!(insight.is_fallback());
        assert!(matches!(
            insight.fallback_reason(),
            Some(FallbackReason::Provider(_))
        ));
        assert_eq!(insight.value(), &fallback::transcript_analysis("Acme"));
    }

    #[tokio::test]
    async fn test_malformed_json_returns_fallback() {
        let (engine, _) = engine(MockLLMProvider::with_response("I cannot help with that."));
        let company = CompanyProfile::named("Acme");

        let insight = engine
            .analyze_financial_data(&sample_snapshot("realm-1"), &company)
            .await;

        assert!(matches!(
            insight.fallback_reason(),
            Some(FallbackReason::MalformedJson(_))
        ));
        assert_eq!(insight.value().health_score, 60);
    }

    #[tokio::test]
    async fn test_array_response_is_not_an_object() {
        let (engine, _) = engine(MockLLMProvider::with_response("[1, 2, 3]"));
        let company = CompanyProfile::named("Acme");

        let insight = engine
            .generate_closing_strategies(
                &TranscriptAnalysis::default(),
                &BusinessInsights::default(),
                &company,
            )
            .await;

        assert_eq!(insight.fallback_reason(), Some(&FallbackReason::NotAnObject));
    }

    #[tokio::test]
    async fn test_code_fenced_json_is_accepted() {
        let (engine, _) = engine(MockLLMProvider::with_response(
            "```json\n{\"opening\": \"Thanks for your time\"}\n```",
        ));
        let company = CompanyProfile::named("Acme");

        let insight = engine
            .generate_presentation_talking_points(
                &BusinessInsights::default(),
                &TranscriptAnalysis::default(),
                &company,
            )
            .await;

        assert!(!insight.is_fallback());
        assert_eq!(insight.value().opening, "Thanks for your time");
        assert!(insight.value().key_messages.is_empty());
    }

    #[tokio::test]
    async fn test_full_analysis_issues_four_calls_without_transcript() {
        let (engine, provider) = engine(MockLLMProvider::with_response("{}"));
        let company = CompanyProfile::named("Acme");

        let analysis = engine
            .run_full_analysis(None, &sample_snapshot("realm-1"), &company)
            .await;

        assert!(analysis.transcript_analysis.is_none());
        assert_eq!(provider.calls().await.len(), 4);
        assert_eq!(
            analysis.business_insights.source,
            super::super::InsightSource::Inferred
        );
    }
}
