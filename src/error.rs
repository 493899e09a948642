use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradeError {
    #[error("Score out of range: {0} (expected 0 to 100)")]
    ScoreOutOfRange(f64),

    #[error("{field} {value} has more than {places} decimal places")]
    TooPrecise {
        field: &'static str,
        value: f64,
        places: u32,
    },

    #[error("Invalid credit: {0}")]
    InvalidCredit(f64),

    #[error("Invalid year: {0}")]
    InvalidYear(i32),

    #[error("Semester must not be empty")]
    EmptySemester,

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },
}

impl GradeError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        GradeError::NotFound {
            kind,
            key: key.into(),
        }
    }
}
