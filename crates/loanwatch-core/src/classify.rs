use serde::{Deserialize, Serialize};

use crate::models::{ApplicationStatus, LoanApplication};

/// Below this the applicant is low risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.3;
/// At or above this the applicant is high risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Derived risk bucket - never stored, always computed from `risk_factor`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// risk_factor < 0.3
    Low,
    /// 0.3 <= risk_factor < 0.7
    Medium,
    /// risk_factor >= 0.7 (and anything that doesn't compare, like NaN)
    High,
}

impl RiskLevel {
    pub fn from_factor(risk_factor: f64) -> Self {
        if risk_factor < MEDIUM_RISK_THRESHOLD {
            RiskLevel::Low
        } else if risk_factor < HIGH_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            RiskLevel::Low => "green",
            RiskLevel::Medium => "yellow",
            RiskLevel::High => "red",
        }
    }
}

/// Everything the view needs to style one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub risk_level: RiskLevel,
    pub risk_label: &'static str,
    pub status_label: String,
    /// e.g. `risk risk-medium`
    pub risk_style: String,
    /// e.g. `status status-review_required`
    pub status_style: String,
}

/// Classify an application for display
///
/// Pure and deterministic: the same record always yields the same result.
pub fn classify(app: &LoanApplication) -> Classification {
    let risk_level = RiskLevel::from_factor(app.risk_factor);

    Classification {
        risk_level,
        risk_label: risk_level.label(),
        status_label: status_label(&app.status),
        risk_style: format!("risk risk-{}", risk_level.as_str()),
        status_style: format!("status status-{}", app.status.as_str()),
    }
}

/// Uppercased status, unknown values passed through as-is
pub fn status_label(status: &ApplicationStatus) -> String {
    status.as_str().to_uppercase()
}

/// Color for a status badge; unknown statuses stay neutral
pub fn status_color_code(status: &ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Approved => "green",
        ApplicationStatus::ReviewRequired => "yellow",
        ApplicationStatus::Rejected => "red",
        ApplicationStatus::Other(_) => "gray",
    }
}
