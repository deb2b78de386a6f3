use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Poll action that tells the client to re-fetch
pub const REFRESH_ACTION: &str = "refresh";

/// One loan application as the backend serializes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: u64,
    pub applicant_name: String,
    pub credit_score: i32,
    pub amount_requested: f64,
    pub risk_factor: f64, // 0.0 to 1.0
    pub status: String,   // approved, review_required, rejected (or whatever comes next)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// RFC 3339, or an offset-less timestamp (`2024-03-05T10:15:00`,
/// `2024-03-05 10:15:00`, `2024-03-05`) taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {}", raw)))
}

/// Body of `GET /applications`
///
/// The backend emits `null` instead of `[]` when the table is empty,
/// so a missing or null list is treated as an empty snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationsResponse {
    #[serde(default)]
    pub applications: Option<Vec<ApplicationRecord>>,
    #[serde(default)]
    pub count: Option<usize>,
}

impl ApplicationsResponse {
    pub fn into_records(self) -> Vec<ApplicationRecord> {
        self.applications.unwrap_or_default()
    }
}

/// Body of `GET /poll`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub action: Option<String>,
}

impl PollResponse {
    /// Lenient read of a poll body: any JSON value is accepted and a
    /// non-string or absent `action` simply means "no change"
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            action: value
                .get("action")
                .and_then(|action| action.as_str())
                .map(str::to_string),
        }
    }

    /// Anything other than an explicit "refresh" means nothing changed
    pub fn is_refresh(&self) -> bool {
        self.action.as_deref() == Some(REFRESH_ACTION)
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of `POST /trigger-refresh`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub message: String,
}
