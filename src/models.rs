use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSample {
    pub student_id: Uuid,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeStatistics {
    pub average_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    /// Fraction in [0, 1], not a percentage.
    pub passing_rate: f64,
    pub evaluated_student_count: usize,
    pub total_student_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Filter handed to the persistence layer when fetching scores.
#[derive(Debug, Clone)]
pub struct GradeScope {
    pub class_name: String,
    pub course_code: String,
    pub semester: Option<String>,
    pub year: Option<i32>,
}

impl GradeScope {
    pub fn label(&self) -> String {
        let mut label = format!("{} / {}", self.class_name, self.course_code);
        if let Some(semester) = &self.semester {
            label.push_str(&format!(" / {semester}"));
        }
        if let Some(year) = self.year {
            label.push_str(&format!(" / {year}"));
        }
        label
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeRecord {
    pub student_no: String,
    pub full_name: String,
    pub class_name: String,
    pub course_code: String,
    pub course_name: String,
    pub credit: f64,
    pub semester: String,
    pub year: i32,
    pub score: f64,
    pub source_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGrade {
    pub course_code: String,
    pub course_name: String,
    pub credit: f64,
    pub semester: String,
    pub year: i32,
    pub score: Option<f64>,
    pub gpa: f64,
    pub passing: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub student_no: String,
    pub full_name: String,
    pub class_name: String,
    pub grades: Vec<CourseGrade>,
    pub weighted_gpa: f64,
    pub earned_credits: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeSummary {
    pub statistics: GradeStatistics,
    pub distribution: Vec<DistributionBucket>,
}
