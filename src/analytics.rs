use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{DistributionBucket, GradeStatistics, ScopeSummary, ScoreSample};

pub const PASSING_SCORE: f64 = 60.0;

const BUCKET_LABELS: [&str; 5] = [
    "90-100分 (优秀)",
    "80-89分 (良好)",
    "70-79分 (中等)",
    "60-69分 (及格)",
    "<60分 (不及格)",
];

pub fn compute_statistics(scores: &[f64], total_student_count: usize) -> GradeStatistics {
    let evaluated = scores.len();
    if evaluated == 0 {
        return GradeStatistics {
            average_score: 0.0,
            max_score: 0.0,
            min_score: 0.0,
            passing_rate: 0.0,
            evaluated_student_count: 0,
            total_student_count,
        };
    }

    let mut sum = 0.0;
    let mut max = f64::MIN;
    let mut min = f64::MAX;
    let mut passed = 0usize;

    for &score in scores {
        sum += score;
        max = max.max(score);
        min = min.min(score);
        if score >= PASSING_SCORE {
            passed += 1;
        }
    }

    GradeStatistics {
        average_score: round_half_up(sum / evaluated as f64, 2),
        max_score: max,
        min_score: min,
        passing_rate: round_half_up(passed as f64 / evaluated as f64, 2),
        evaluated_student_count: evaluated,
        total_student_count,
    }
}

pub fn compute_distribution(scores: &[f64]) -> Vec<DistributionBucket> {
    let mut counts = [0usize; 5];
    for &score in scores {
        counts[bucket_index(score)] += 1;
    }

    BUCKET_LABELS
        .into_iter()
        .zip(counts)
        .map(|(label, count)| DistributionBucket { label, count })
        .collect()
}

fn bucket_index(score: f64) -> usize {
    match score {
        s if s >= 90.0 => 0,
        s if s >= 80.0 => 1,
        s if s >= 70.0 => 2,
        s if s >= PASSING_SCORE => 3,
        _ => 4,
    }
}

/// Maps a percentage score onto the 4.0 scale.
///
/// | Score   | GPA |
/// |---------|-----|
/// | >= 90   | 4.0 |
/// | >= 85   | 3.7 |
/// | >= 82   | 3.3 |
/// | >= 78   | 3.0 |
/// | >= 75   | 2.7 |
/// | >= 72   | 2.3 |
/// | >= 68   | 2.0 |
/// | >= 65   | 1.7 |
/// | >= 60   | 1.0 |
/// | < 60    | 0.0 |
pub fn calculate_gpa(score: Option<f64>) -> f64 {
    let Some(score) = score else {
        return 0.0;
    };

    match score {
        s if s >= 90.0 => 4.0,
        s if s >= 85.0 => 3.7,
        s if s >= 82.0 => 3.3,
        s if s >= 78.0 => 3.0,
        s if s >= 75.0 => 2.7,
        s if s >= 72.0 => 2.3,
        s if s >= 68.0 => 2.0,
        s if s >= 65.0 => 1.7,
        s if s >= PASSING_SCORE => 1.0,
        _ => 0.0,
    }
}

pub fn is_passing(score: Option<f64>) -> bool {
    matches!(score, Some(s) if s >= PASSING_SCORE)
}

/// Credit-weighted GPA over graded courses. Entries without a score or with a
/// non-positive credit do not count.
pub fn weighted_gpa(grades: &[(Option<f64>, f64)]) -> f64 {
    let mut points = 0.0;
    let mut credits = 0.0;

    for &(score, credit) in grades {
        if score.is_none() || credit <= 0.0 {
            continue;
        }
        points += calculate_gpa(score) * credit;
        credits += credit;
    }

    if credits == 0.0 {
        0.0
    } else {
        round_half_up(points / credits, 2)
    }
}

pub fn statistics_for_samples(samples: &[ScoreSample], total_student_count: usize) -> GradeStatistics {
    compute_statistics(&sample_scores(samples), total_student_count)
}

pub fn distribution_for_samples(samples: &[ScoreSample]) -> Vec<DistributionBucket> {
    compute_distribution(&sample_scores(samples))
}

pub fn summarize(samples: &[ScoreSample], total_student_count: usize) -> ScopeSummary {
    let scores = sample_scores(samples);
    ScopeSummary {
        statistics: compute_statistics(&scores, total_student_count),
        distribution: compute_distribution(&scores),
    }
}

fn sample_scores(samples: &[ScoreSample]) -> Vec<f64> {
    samples.iter().map(|sample| sample.score).collect()
}

/// Half-up decimal rounding on the shortest decimal form of `value`, so 2.675
/// rounds to 2.68 rather than following its binary approximation down.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    Decimal::from_str(&value.to_string())
        .ok()
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_string().parse::<f64>().ok())
        .unwrap_or(value)
}
