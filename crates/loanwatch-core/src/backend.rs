// HTTP backend adapter - plugs the API client into the store and sync loop seams
use loanwatch_api::{ApiError, ApplicationRecord, LoanAppClient};
use tracing::debug;

use crate::models::{ApplicationStatus, LoanApplication};
use crate::store::ApplicationSource;
use crate::sync::{ChangeFeed, PollSignal};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: LoanAppClient,
}

impl HttpBackend {
    pub fn new(client: LoanAppClient) -> Self {
        Self { client }
    }

    pub fn from_base_url(base_url: &str) -> Result<Self> {
        let client = LoanAppClient::with_base_url(base_url)
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &LoanAppClient {
        &self.client
    }
}

fn convert_record(record: ApplicationRecord) -> LoanApplication {
    LoanApplication {
        id: record.id,
        applicant_name: record.applicant_name,
        credit_score: record.credit_score,
        amount_requested: record.amount_requested,
        risk_factor: record.risk_factor,
        status: ApplicationStatus::from(record.status),
        created_at: record.created_at,
    }
}

fn describe(e: &ApiError) -> String {
    match e {
        ApiError::RequestFailed { status, .. } => format!("server responded with status {}", status),
        ApiError::ParseError(err) => format!("malformed response body ({})", err),
        other => other.to_string(),
    }
}

#[async_trait::async_trait]
impl ApplicationSource for HttpBackend {
    async fn fetch_applications(&self) -> Result<Vec<LoanApplication>> {
        let records = self
            .client
            .list_applications()
            .await
            .map_err(|e| Error::Fetch(describe(&e)))?;

        Ok(records.into_iter().map(convert_record).collect())
    }
}

#[async_trait::async_trait]
impl ChangeFeed for HttpBackend {
    async fn poll(&self) -> Result<PollSignal> {
        let response = self
            .client
            .poll()
            .await
            .map_err(|e| Error::Poll(describe(&e)))?;

        debug!("Poll answered with action {:?}", response.action);

        Ok(if response.is_refresh() {
            PollSignal::Refresh
        } else {
            PollSignal::NoChange
        })
    }
}
