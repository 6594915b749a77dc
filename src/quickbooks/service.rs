use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::tokens::TokenManager;
use super::QuickBooksError;

const MINOR_VERSION: &str = "65";
const DEFAULT_DATE_MACRO: &str = "This Fiscal Year-to-date";

/// Reporting window; without explicit dates QBO's fiscal year-to-date is used.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportPeriod {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportPeriod {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("minorversion", MINOR_VERSION.to_string())];
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => {
                params.push(("start_date", start.format("%Y-%m-%d").to_string()));
                params.push(("end_date", end.format("%Y-%m-%d").to_string()));
            }
            _ => params.push(("date_macro", DEFAULT_DATE_MACRO.to_string())),
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(rename = "CompanyName", default)]
    pub company_name: String,
    #[serde(rename = "LegalName", default)]
    pub legal_name: Option<String>,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "nested_address")]
    pub email: Option<String>,
    #[serde(rename = "PrimaryPhone", default, deserialize_with = "nested_phone")]
    pub phone: Option<String>,
    #[serde(rename = "FiscalYearStartMonth", default)]
    pub fiscal_year_start_month: Option<String>,
}

fn nested_address<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.get("Address"))
        .and_then(Value::as_str)
        .map(String::from))
}

fn nested_phone<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.get("FreeFormNumber"))
        .and_then(Value::as_str)
        .map(String::from))
}

/// Bearer-authenticated calls against the QBO accounting API.
pub struct QuickBooksService {
    client: Client,
    tokens: Arc<TokenManager>,
    base_url: String,
}

impl QuickBooksService {
    pub fn new(client: Client, tokens: Arc<TokenManager>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    async fn get_json(
        &self,
        company_id: &str,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, QuickBooksError> {
        let access_token = self.tokens.get_valid_access_token(company_id).await?;
        let url = format!("{}/v3/company/{}/{}", self.base_url, company_id, path);

        log::debug!("QBO GET {url}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("QBO {path} for company {company_id} returned {status}");
            return Err(QuickBooksError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    pub async fn get_profit_and_loss(
        &self,
        company_id: &str,
        period: &ReportPeriod,
    ) -> Result<Value, QuickBooksError> {
        self.get_json(company_id, "reports/ProfitAndLoss", &period.query())
            .await
    }

    pub async fn get_balance_sheet(
        &self,
        company_id: &str,
        period: &ReportPeriod,
    ) -> Result<Value, QuickBooksError> {
        self.get_json(company_id, "reports/BalanceSheet", &period.query())
            .await
    }

    pub async fn get_company_info(&self, company_id: &str) -> Result<CompanyInfo, QuickBooksError> {
        let path = format!("companyinfo/{company_id}");
        let body = self
            .get_json(company_id, &path, &[("minorversion", MINOR_VERSION.to_string())])
            .await?;
        let info = body
            .get("CompanyInfo")
            .cloned()
            .and_then(|v| serde_json::from_value::<CompanyInfo>(v).ok())
            .unwrap_or_default();
        Ok(info)
    }
}
