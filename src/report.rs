use std::fmt::Write;

use chrono::NaiveDate;

use crate::analytics;
use crate::models::{GradeScope, ScopeSummary};

const BAR_WIDTH: usize = 30;

pub fn build_report(scope: &GradeScope, generated_on: NaiveDate, summary: &ScopeSummary) -> String {
    let stats = &summary.statistics;
    let mut output = String::new();

    let _ = writeln!(output, "# Grade Statistics Report");
    let _ = writeln!(output, "Generated for {} on {}", scope.label(), generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if stats.evaluated_student_count == 0 {
        let _ = writeln!(output, "No grades recorded for this scope yet.");
    }

    let _ = writeln!(
        output,
        "- Evaluated students: {} of {}",
        stats.evaluated_student_count, stats.total_student_count
    );
    let _ = writeln!(output, "- Average score: {:.2}", stats.average_score);
    let _ = writeln!(output, "- Highest score: {:.2}", stats.max_score);
    let _ = writeln!(output, "- Lowest score: {:.2}", stats.min_score);
    let _ = writeln!(output, "- Passing rate: {:.0}%", stats.passing_rate * 100.0);
    let _ = writeln!(
        output,
        "- GPA at class average: {:.1}",
        analytics::calculate_gpa(Some(stats.average_score))
    );

    let missing = stats
        .total_student_count
        .saturating_sub(stats.evaluated_student_count);
    if missing > 0 {
        let _ = writeln!(output, "- Students without a recorded grade: {missing}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Distribution");
    let _ = writeln!(output, "| Range | Students | |");
    let _ = writeln!(output, "|-------|----------|-|");

    let peak = summary
        .distribution
        .iter()
        .map(|b| b.count)
        .max()
        .unwrap_or(0);
    for bucket in summary.distribution.iter() {
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            bucket.label,
            bucket.count,
            bar(bucket.count, peak)
        );
    }

    output
}

fn bar(count: usize, peak: usize) -> String {
    if peak == 0 {
        return String::new();
    }
    "#".repeat(count * BAR_WIDTH / peak)
}
