use chrono::Utc;
use serde::Serialize;

/// Response wrapper shared with the web front end: `code`, `message`, `data`
/// and an epoch-millisecond `timestamp`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: T,
    pub timestamp: i64,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics;

    #[test]
    fn envelope_carries_statistics_in_camel_case() {
        let stats = analytics::compute_statistics(&[100.0, 50.0], 3);
        let value = serde_json::to_value(Envelope::success(&stats)).unwrap();

        assert_eq!(value["code"], 200);
        assert_eq!(value["message"], "success");
        assert!(value["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(value["data"]["averageScore"], 75.0);
        assert_eq!(value["data"]["passingRate"], 0.5);
        assert_eq!(value["data"]["evaluatedStudentCount"], 2);
        assert_eq!(value["data"]["totalStudentCount"], 3);
    }

    #[test]
    fn distribution_serializes_as_label_count_pairs() {
        let buckets = analytics::compute_distribution(&[95.0]);
        let value = serde_json::to_value(Envelope::success(&buckets)).unwrap();
        let data = value["data"].as_array().unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data[0]["label"], "90-100分 (优秀)");
        assert_eq!(data[0]["count"], 1);
    }
}
