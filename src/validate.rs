use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::GradeError;
use crate::models::GradeRecord;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Scale of the `score` and `credit` columns.
pub const SCORE_PLACES: u32 = 2;
pub const CREDIT_PLACES: u32 = 1;

pub fn validate_score(score: f64) -> Result<f64, GradeError> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(GradeError::ScoreOutOfRange(score));
    }
    Ok(score)
}

pub fn validate_credit(credit: f64) -> Result<f64, GradeError> {
    if !credit.is_finite() || credit <= 0.0 {
        return Err(GradeError::InvalidCredit(credit));
    }
    Ok(credit)
}

/// Rejects values the database would silently round on insert.
pub fn validate_places(field: &'static str, value: f64, places: u32) -> Result<f64, GradeError> {
    let scale = Decimal::from_str(&value.to_string())
        .map(|d| d.normalize().scale())
        .unwrap_or(u32::MAX);
    if scale > places {
        return Err(GradeError::TooPrecise {
            field,
            value,
            places,
        });
    }
    Ok(value)
}

pub fn validate_year(year: i32) -> Result<i32, GradeError> {
    if !(1900..=2100).contains(&year) {
        return Err(GradeError::InvalidYear(year));
    }
    Ok(year)
}

pub fn validate_semester(semester: &str) -> Result<&str, GradeError> {
    let trimmed = semester.trim();
    if trimmed.is_empty() {
        return Err(GradeError::EmptySemester);
    }
    Ok(trimmed)
}

pub fn validate_record(record: &GradeRecord) -> Result<(), GradeError> {
    validate_score(record.score)?;
    validate_places("score", record.score, SCORE_PLACES)?;
    validate_credit(record.credit)?;
    validate_places("credit", record.credit, CREDIT_PLACES)?;
    validate_year(record.year)?;
    validate_semester(&record.semester)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: f64) -> GradeRecord {
        GradeRecord {
            student_no: "S2024001".to_string(),
            full_name: "Lin Wei".to_string(),
            class_name: "CS-2024-1".to_string(),
            course_code: "CS101".to_string(),
            course_name: "Programming Fundamentals".to_string(),
            credit: 4.0,
            semester: "fall".to_string(),
            year: 2024,
            score,
            source_key: None,
        }
    }

    #[test]
    fn score_bounds_are_inclusive() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(100.0).is_ok());
        assert!(matches!(validate_score(-0.01), Err(GradeError::ScoreOutOfRange(_))));
        assert!(matches!(validate_score(100.01), Err(GradeError::ScoreOutOfRange(_))));
        assert!(validate_score(f64::NAN).is_err());
        assert!(validate_score(f64::INFINITY).is_err());
    }

    #[test]
    fn credit_must_be_positive() {
        assert!(validate_credit(0.5).is_ok());
        assert!(validate_credit(0.0).is_err());
        assert!(validate_credit(-2.0).is_err());
    }

    #[test]
    fn values_beyond_column_scale_are_rejected() {
        assert!(validate_places("score", 66.67, SCORE_PLACES).is_ok());
        assert!(validate_places("score", 66.0, SCORE_PLACES).is_ok());
        assert!(matches!(
            validate_places("score", 66.666, SCORE_PLACES),
            Err(GradeError::TooPrecise { field: "score", .. })
        ));
        assert!(validate_places("credit", 2.5, CREDIT_PLACES).is_ok());
        assert!(validate_places("credit", 2.25, CREDIT_PLACES).is_err());
    }

    #[test]
    fn record_with_three_decimal_score_is_rejected() {
        let err = validate_record(&record(66.666)).unwrap_err();
        assert_eq!(err.to_string(), "score 66.666 has more than 2 decimal places");

        let mut too_fine_credit = record(80.0);
        too_fine_credit.credit = 2.25;
        assert!(matches!(
            validate_record(&too_fine_credit),
            Err(GradeError::TooPrecise { field: "credit", .. })
        ));
    }

    #[test]
    fn year_and_semester_checks() {
        assert!(validate_year(2024).is_ok());
        assert!(validate_year(1800).is_err());
        assert_eq!(validate_semester("  spring ").unwrap(), "spring");
        assert!(matches!(validate_semester("   "), Err(GradeError::EmptySemester)));
    }

    #[test]
    fn record_validation_reports_first_failure() {
        assert!(validate_record(&record(88.0)).is_ok());
        let err = validate_record(&record(120.0)).unwrap_err();
        assert_eq!(err.to_string(), "Score out of range: 120 (expected 0 to 100)");
    }
}
