use crate::core::shared::utils::format_currency;
use crate::reports::AuditDeck;

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(String),
    Bullets(Vec<String>),
    Table(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeckSlide {
    pub title: String,
    pub subtitle: Option<String>,
    pub blocks: Vec<Block>,
}

impl DeckSlide {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            blocks: Vec::new(),
        }
    }

    fn paragraph(mut self, text: &str) -> Self {
        if !text.trim().is_empty() {
            self.blocks.push(Block::Paragraph(text.trim().to_string()));
        }
        self
    }

    fn bullets(mut self, items: Vec<String>) -> Self {
        let items: Vec<String> = items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if !items.is_empty() {
            self.blocks.push(Block::Bullets(items));
        }
        self
    }

    fn table(mut self, rows: Vec<(String, String)>) -> Self {
        if !rows.is_empty() {
            self.blocks.push(Block::Table(rows));
        }
        self
    }

    /// Every line of text on the slide, in reading order.
    pub fn lines(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];
        out.extend(self.subtitle.iter().cloned());
        for block in &self.blocks {
            match block {
                Block::Paragraph(text) => out.push(text.clone()),
                Block::Bullets(items) => out.extend(items.iter().cloned()),
                Block::Table(rows) => {
                    out.extend(rows.iter().map(|(label, value)| format!("{label}: {value}")))
                }
            }
        }
        out
    }
}

fn joined(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Lays the deck out as an ordered list of slides shared by every format.
pub fn deck_outline(deck: &AuditDeck) -> Vec<DeckSlide> {
    let mut slides = Vec::new();

    let mut title = DeckSlide::new(deck.title.clone());
    title.subtitle = Some(format!(
        "Prepared for {} on {}",
        deck.company_name,
        deck.generated_at.format("%B %-d, %Y")
    ));
    if deck.ai_content.is_fallback() {
        title = title.paragraph(
            "Some sections use placeholder content because AI analysis was unavailable.",
        );
    }
    slides.push(title);

    slides.push(
        DeckSlide::new("Executive Summary")
            .paragraph(&deck.executive_summary)
            .paragraph(&deck.financial_story),
    );

    let mut rows: Vec<(String, String)> = deck
        .financials
        .rows()
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .collect();
    if let Some(benchmark) = &deck.benchmark {
        rows.push((
            format!("{} Avg. Profit Margin", benchmark.industry),
            format!("{:.1}%", benchmark.avg_profit_margin),
        ));
        rows.push((
            format!("{} Avg. Debt to Equity", benchmark.industry),
            format!("{:.2}", benchmark.avg_debt_to_equity),
        ));
    }
    let mut financials = DeckSlide::new("Financial Snapshot").table(rows);
    financials.subtitle = Some(format!(
        "As of {}",
        deck.financials.as_of.format("%Y-%m-%d")
    ));
    slides.push(financials);

    if !deck.pain_points.is_empty() {
        slides.push(
            DeckSlide::new("What We Heard").bullets(
                deck.pain_points
                    .iter()
                    .map(|p| {
                        let severity = if p.severity.is_empty() {
                            String::new()
                        } else {
                            format!("({})", p.severity)
                        };
                        joined(&[
                            &format!("{} {}", p.issue, severity),
                            p.financial_impact.as_deref().unwrap_or(""),
                        ])
                    })
                    .collect(),
            ),
        );
    }

    slides.push(
        DeckSlide::new("Key Issues").bullets(
            deck.key_issues
                .iter()
                .map(|i| joined(&[&i.title, &i.detail, &i.impact]))
                .collect(),
        ),
    );

    slides.push(
        DeckSlide::new("Recommendations").bullets(
            deck.recommendations
                .iter()
                .map(|r| {
                    let title = if r.priority.is_empty() {
                        r.title.clone()
                    } else {
                        format!("[{}] {}", r.priority, r.title)
                    };
                    joined(&[&title, &r.description, &r.estimated_impact])
                })
                .collect(),
        ),
    );

    let engagement = &deck.engagement;
    slides.push(
        DeckSlide::new("Proposed Engagement")
            .table(vec![
                ("Service Tier".to_string(), engagement.service_tier.clone()),
                (
                    "Monthly Fee".to_string(),
                    format_currency(engagement.monthly_fee),
                ),
                (
                    "Duration".to_string(),
                    format!("{} months", engagement.duration_months),
                ),
            ])
            .bullets(engagement.deliverables.clone()),
    );

    slides.push(DeckSlide::new("Expected Outcomes").bullets(deck.expected_outcomes.clone()));

    slides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::sample_deck;

    #[test]
    fn test_outline_order() {
        let deck = sample_deck();
        let titles: Vec<String> = deck_outline(&deck).into_iter().map(|s| s.title).collect();
        assert_eq!(titles[0], deck.title);
        assert_eq!(titles[1], "Executive Summary");
        assert_eq!(titles[2], "Financial Snapshot");
        assert_eq!(titles.last().map(String::as_str), Some("Expected Outcomes"));
    }

    #[test]
    fn test_pain_points_slide_skipped_when_empty() {
        let mut deck = sample_deck();
        deck.pain_points.clear();
        assert!(deck_outline(&deck)
            .iter()
            .all(|s| s.title != "What We Heard"));
    }

    #[test]
    fn test_fallback_notice_on_title_slide() {
        let mut deck = sample_deck();
        assert!(deck_outline(&deck)[0].blocks.is_empty());

        deck.note_fallback(crate::insights::AnalysisKind::BusinessInsights);
        let lines = deck_outline(&deck)[0].lines();
        assert!(lines.iter().any(|l| l.contains("placeholder content")));
    }

    #[test]
    fn test_financial_table_includes_benchmark() {
        let deck = sample_deck();
        let slide = &deck_outline(&deck)[2];
        let Some(Block::Table(rows)) = slide.blocks.first() else {
            panic!("expected a table");
        };
        assert_eq!(rows[0].0, "Revenue");
        assert!(rows.iter().any(|(label, _)| label.ends_with("Avg. Profit Margin")));
    }
}
