// Display formatting for table cells
use chrono::{DateTime, Utc};

/// `$12,500.00` style currency
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("${}", amount);
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 { "-" } else { "" };

    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Risk factor as a percentage with one decimal, `0.4567` -> `45.7%`
pub fn format_risk_percent(risk_factor: f64) -> String {
    format!("{:.1}%", risk_factor * 100.0)
}

/// `Mar 5, 2024`
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%b %-d, %Y").to_string()
}

/// Header line above the table
pub fn summary_line(total: usize) -> String {
    format!("Reviewing {} loan applications", total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "$0.00");
        assert_eq!(format_amount(999.5), "$999.50");
        assert_eq!(format_amount(1000.0), "$1,000.00");
        assert_eq!(format_amount(12500.0), "$12,500.00");
        assert_eq!(format_amount(1234567.891), "$1,234,567.89");
        assert_eq!(format_amount(-2500.0), "-$2,500.00");
    }

    #[test]
    fn test_format_risk_percent() {
        assert_eq!(format_risk_percent(0.0), "0.0%");
        assert_eq!(format_risk_percent(0.4567), "45.7%");
        assert_eq!(format_risk_percent(1.0), "100.0%");
    }

    #[test]
    fn test_format_date() {
        let ts: DateTime<Utc> = "2024-03-05T23:15:00Z".parse().unwrap();
        assert_eq!(format_date(&ts), "Mar 5, 2024");

        let ts: DateTime<Utc> = "2023-11-21T08:00:00Z".parse().unwrap();
        assert_eq!(format_date(&ts), "Nov 21, 2023");
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line(3), "Reviewing 3 loan applications");
    }
}
