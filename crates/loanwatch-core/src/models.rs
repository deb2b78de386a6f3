use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Loan application - one row of the dashboard
///
/// Immutable snapshot of what the backend said; a refresh replaces the whole
/// list rather than patching individual rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: u64,
    pub applicant_name: String,
    pub credit_score: i32,
    pub amount_requested: f64,
    /// Normalized 0.0..=1.0, higher is riskier
    pub risk_factor: f64,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Decision status as reported by the backend
///
/// The known set is closed, but the backend may grow new values before the
/// dashboard does. Those are carried verbatim in `Other` and rendered as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApplicationStatus {
    Approved,
    ReviewRequired,
    Rejected,
    Other(String),
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::ReviewRequired => "review_required",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ApplicationStatus::Other(_))
    }
}

impl From<String> for ApplicationStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "approved" => ApplicationStatus::Approved,
            "review_required" => ApplicationStatus::ReviewRequired,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Other(raw),
        }
    }
}

impl From<&str> for ApplicationStatus {
    fn from(raw: &str) -> Self {
        ApplicationStatus::from(raw.to_string())
    }
}

impl From<ApplicationStatus> for String {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which slice of the snapshot the reviewer is looking at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Approved,
    ReviewRequired,
    Rejected,
}

impl StatusFilter {
    /// Tab order on the dashboard
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Approved,
        StatusFilter::ReviewRequired,
        StatusFilter::Rejected,
    ];

    pub fn matches(&self, status: &ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Approved => *status == ApplicationStatus::Approved,
            StatusFilter::ReviewRequired => *status == ApplicationStatus::ReviewRequired,
            StatusFilter::Rejected => *status == ApplicationStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Approved => "approved",
            StatusFilter::ReviewRequired => "review_required",
            StatusFilter::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Approved => "Approved",
            StatusFilter::ReviewRequired => "Review Required",
            StatusFilter::Rejected => "Rejected",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl FromStr for StatusFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidFilter(s.to_string()))
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-filter counts shown next to each filter tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub approved: usize,
    pub review_required: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn from_applications(applications: &[LoanApplication]) -> Self {
        applications
            .iter()
            .fold(Self::default(), |mut counts, app| {
                counts.all += 1;
                match app.status {
                    ApplicationStatus::Approved => counts.approved += 1,
                    ApplicationStatus::ReviewRequired => counts.review_required += 1,
                    ApplicationStatus::Rejected => counts.rejected += 1,
                    ApplicationStatus::Other(_) => {}
                }
                counts
            })
    }

    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Approved => self.approved,
            StatusFilter::ReviewRequired => self.review_required,
            StatusFilter::Rejected => self.rejected,
        }
    }
}
