use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sales pipeline position, derived from which related records exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    New,
    Connected,
    FinancialsPulled,
    CallAnalyzed,
    ReportReady,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Connected => "connected",
            Self::FinancialsPulled => "financials_pulled",
            Self::CallAnalyzed => "call_analyzed",
            Self::ReportReady => "report_ready",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSignals {
    pub has_token: bool,
    pub has_snapshot: bool,
    pub has_analyzed_call: bool,
    pub has_report: bool,
}

pub fn derive_workflow_stage(signals: StageSignals) -> WorkflowStage {
    if signals.has_report {
        WorkflowStage::ReportReady
    } else if signals.has_analyzed_call {
        WorkflowStage::CallAnalyzed
    } else if signals.has_snapshot {
        WorkflowStage::FinancialsPulled
    } else if signals.has_token {
        WorkflowStage::Connected
    } else {
        WorkflowStage::New
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    pub company_id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
    pub workflow_stage: WorkflowStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProspectRequest {
    pub company_id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProspectRequest {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProspectsQuery {
    pub search: Option<String>,
    pub stage: Option<WorkflowStage>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_precedence() {
        let all = StageSignals {
            has_token: true,
            has_snapshot: true,
            has_analyzed_call: true,
            has_report: true,
        };
        assert_eq!(derive_workflow_stage(all), WorkflowStage::ReportReady);

        let no_report = StageSignals {
            has_report: false,
            ..all
        };
        assert_eq!(derive_workflow_stage(no_report), WorkflowStage::CallAnalyzed);

        let pulled = StageSignals {
            has_token: true,
            has_snapshot: true,
            ..StageSignals::default()
        };
        assert_eq!(derive_workflow_stage(pulled), WorkflowStage::FinancialsPulled);

        let connected = StageSignals {
            has_token: true,
            ..StageSignals::default()
        };
        assert_eq!(derive_workflow_stage(connected), WorkflowStage::Connected);
        assert_eq!(
            derive_workflow_stage(StageSignals::default()),
            WorkflowStage::New
        );
    }

    #[test]
    fn test_report_wins_even_without_token() {
        let signals = StageSignals {
            has_report: true,
            ..StageSignals::default()
        };
        assert_eq!(derive_workflow_stage(signals), WorkflowStage::ReportReady);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&WorkflowStage::FinancialsPulled).unwrap();
        assert_eq!(json, "\"financials_pulled\"");
    }
}
