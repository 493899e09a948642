use grade_analytics::analytics::{
    calculate_gpa, compute_distribution, compute_statistics, is_passing, summarize,
};
use grade_analytics::models::{GradeRecord, ScoreSample};
use grade_analytics::validate::validate_record;
use uuid::Uuid;

fn load_demo_records() -> Vec<GradeRecord> {
    let mut reader = csv::Reader::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/grades.csv"))
        .expect("demo csv should open");
    reader
        .deserialize::<GradeRecord>()
        .collect::<Result<Vec<_>, _>>()
        .expect("demo csv should parse")
}

#[test]
fn demo_csv_rows_are_valid() {
    let records = load_demo_records();
    assert_eq!(records.len(), 7);
    assert!(records.iter().all(|r| validate_record(r).is_ok()));
    assert!(records[2].source_key.is_none());
}

#[test]
fn course_summary_from_demo_csv() {
    let samples: Vec<ScoreSample> = load_demo_records()
        .into_iter()
        .filter(|r| r.course_code == "CS102")
        .map(|r| ScoreSample {
            student_id: Uuid::new_v4(),
            score: r.score,
        })
        .collect();

    let summary = summarize(&samples, 6);
    let stats = &summary.statistics;

    // (91.5 + 84 + 73.5 + 66 + 52) / 5 = 73.4
    assert_eq!(stats.average_score, 73.4);
    assert_eq!(stats.max_score, 91.5);
    assert_eq!(stats.min_score, 52.0);
    assert_eq!(stats.passing_rate, 0.8);
    assert_eq!(stats.evaluated_student_count, 5);
    assert_eq!(stats.total_student_count, 6);

    let counts: Vec<usize> = summary.distribution.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![1, 1, 1, 1, 1]);
}

#[test]
fn bucket_counts_always_sum_to_sample_size() {
    let sets: [&[f64]; 4] = [
        &[0.0, 100.0],
        &[59.99, 60.0, 69.99, 70.0, 79.99, 80.0, 89.99, 90.0],
        &[75.0; 12],
        &[33.3, 66.6, 99.9],
    ];
    for scores in sets {
        let total: usize = compute_distribution(scores).iter().map(|b| b.count).sum();
        assert_eq!(total, scores.len());
        let stats = compute_statistics(scores, scores.len() + 3);
        assert!(stats.evaluated_student_count <= stats.total_student_count);
    }
}

#[test]
fn gpa_and_passing_agree_at_the_boundary() {
    for score in [59.9, 60.0, 60.1, 89.9, 90.0] {
        assert_eq!(is_passing(Some(score)), calculate_gpa(Some(score)) > 0.0);
    }
    assert!(!is_passing(None));
    assert_eq!(calculate_gpa(None), 0.0);
}
