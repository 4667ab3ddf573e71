use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::CarrierProfile;

/// Per-load thresholds a carrier must meet before bidding. Every field is
/// optional; an absent field is no constraint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    pub max_accident_history: Option<u32>,
    pub max_theft_complaints: Option<u32>,
    pub max_truck_age: Option<u32>,
    pub min_experience_years: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_eligible: bool,
    pub reasons: Vec<String>,
}

/// Compares a carrier's compliance profile against a load's criteria.
///
/// Pure: time is an explicit argument, no state is read or written. Every
/// failing check contributes its own reason so the caller can present all
/// deficiencies at once. Shared verbatim with any pre-flight client check so
/// the two cannot drift.
pub fn evaluate(
    profile: &CarrierProfile,
    criteria: &EligibilityCriteria,
    now: DateTime<Utc>,
) -> Evaluation {
    let mut reasons = Vec::new();

    if let Some(max) = criteria.max_accident_history {
        if profile.accident_count > max {
            reasons.push(format!(
                "You have {} accidents in your history, but the maximum allowed is {}",
                profile.accident_count, max
            ));
        }
    }

    if let Some(max) = criteria.max_theft_complaints {
        if profile.theft_complaint_count > max {
            reasons.push(format!(
                "You have {} theft complaints in your history, but the maximum allowed is {}",
                profile.theft_complaint_count, max
            ));
        }
    }

    if let Some(max) = criteria.max_truck_age {
        let age = i64::from(now.year()) - i64::from(profile.truck_year);
        if age > i64::from(max) {
            reasons.push(format!(
                "Your truck is {} years old, but the maximum age allowed is {} years",
                age, max
            ));
        }
    }

    if let Some(min) = criteria.min_experience_years {
        let years = license_tenure_years(profile.license_issue_date, now);
        if years < i64::from(min) {
            reasons.push(format!(
                "You have {} years of driving experience, but the minimum required is {} years",
                years, min
            ));
        }
    }

    Evaluation {
        is_eligible: reasons.is_empty(),
        reasons,
    }
}

/// Whole years since the license was issued, Julian-year approximation
/// (floor of elapsed days / 365.25), not calendar-year arithmetic.
fn license_tenure_years(issued: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let days = (now - issued).num_days();
    (days as f64 / 365.25).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn profile(
        accidents: u32,
        thefts: u32,
        truck_year: i32,
        license_years_ago: i64,
    ) -> CarrierProfile {
        CarrierProfile {
            id: Uuid::new_v4(),
            company_name: "Acme Freight".into(),
            contact_name: "J. Doe".into(),
            contact_phone: "555-0100".into(),
            rating: None,
            accident_count: accidents,
            theft_complaint_count: thefts,
            truck_year,
            license_issue_date: now() - Duration::days(license_years_ago * 366),
        }
    }

    #[test]
    fn no_criteria_means_no_constraint() {
        let result = evaluate(
            &profile(10, 10, 1990, 0),
            &EligibilityCriteria::default(),
            now(),
        );
        assert!(result.is_eligible);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn collects_every_failing_reason() {
        // 2 accidents vs max 1, 6-year-old truck vs max 5, 3 years tenure vs min 5
        let criteria = EligibilityCriteria {
            max_accident_history: Some(1),
            max_theft_complaints: None,
            max_truck_age: Some(5),
            min_experience_years: Some(5),
        };
        let result = evaluate(&profile(2, 0, 2020, 3), &criteria, now());

        assert!(!result.is_eligible);
        assert_eq!(result.reasons.len(), 3);
        assert!(result.reasons[0].contains("2 accidents"));
        assert!(result.reasons[1].contains("6 years old"));
        assert!(result.reasons[2].contains("3 years of driving experience"));
    }

    #[test]
    fn short_license_tenure_reports_both_numbers() {
        let criteria = EligibilityCriteria {
            min_experience_years: Some(5),
            ..Default::default()
        };
        let result = evaluate(&profile(0, 0, 2026, 4), &criteria, now());

        assert!(!result.is_eligible);
        assert_eq!(result.reasons.len(), 1);
        assert!(result.reasons[0].contains('4'));
        assert!(result.reasons[0].contains('5'));
    }

    #[test]
    fn thresholds_are_inclusive() {
        // exactly at each limit passes
        let criteria = EligibilityCriteria {
            max_accident_history: Some(2),
            max_theft_complaints: Some(1),
            max_truck_age: Some(6),
            min_experience_years: Some(3),
        };
        let result = evaluate(&profile(2, 1, 2020, 3), &criteria, now());
        assert!(result.is_eligible, "{:?}", result.reasons);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let criteria = EligibilityCriteria {
            max_accident_history: Some(0),
            min_experience_years: Some(10),
            ..Default::default()
        };
        let p = profile(1, 0, 2024, 2);
        let first = evaluate(&p, &criteria, now());
        let second = evaluate(&p, &criteria, now());

        assert_eq!(first.is_eligible, second.is_eligible);
        assert_eq!(first.reasons, second.reasons);
    }

    #[test]
    fn tenure_uses_julian_years() {
        // 1461 days = 4.0 Julian years exactly; one day short floors to 3
        let issued = now() - Duration::days(1460);
        assert_eq!(license_tenure_years(issued, now()), 3);
        let issued = now() - Duration::days(1461);
        assert_eq!(license_tenure_years(issued, now()), 4);
    }
}
