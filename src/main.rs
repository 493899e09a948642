use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use grade_analytics::config::Settings;
use grade_analytics::envelope::Envelope;
use grade_analytics::models::GradeScope;
use grade_analytics::{analytics, db, report, validate};

#[derive(Parser)]
#[command(name = "grade-analytics")]
#[command(about = "Grade statistics and GPA reporting for class rosters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ScopeArgs {
    #[arg(long = "class")]
    class_name: String,
    #[arg(long = "course")]
    course_code: String,
    #[arg(long)]
    semester: Option<String>,
    #[arg(long)]
    year: Option<i32>,
}

impl ScopeArgs {
    fn into_scope(self) -> anyhow::Result<GradeScope> {
        let semester = self
            .semester
            .map(|s| validate::validate_semester(&s).map(str::to_string))
            .transpose()?;
        let year = self.year.map(validate::validate_year).transpose()?;
        Ok(GradeScope {
            class_name: self.class_name,
            course_code: self.course_code,
            semester,
            year,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo classes, courses and grades
    Seed,
    /// Import grades from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show statistics and score distribution for a class and course
    Stats {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Print the result as a JSON response envelope
        #[arg(long)]
        json: bool,
    },
    /// Convert a percentage score to GPA
    Gpa {
        #[arg(long)]
        score: f64,
    },
    /// Show a student's grades and credit-weighted GPA
    Transcript {
        #[arg(long)]
        student: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report for a class and course
    Report {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Gpa { score } => {
            let score = validate::validate_score(score)?;
            println!(
                "Score {:.2} -> GPA {:.1} ({})",
                score,
                analytics::calculate_gpa(Some(score)),
                if analytics::is_passing(Some(score)) { "pass" } else { "fail" }
            );
        }
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} grades).");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} grades from {}.", csv.display());
        }
        Commands::Stats { scope, json } => {
            let scope = scope.into_scope()?;
            let pool = connect().await?;
            let samples = db::fetch_scores(&pool, &scope).await?;
            let roster = db::fetch_roster_size(&pool, &scope.class_name).await?;
            let summary = analytics::summarize(&samples, roster);

            if json {
                println!("{}", Envelope::success(&summary).to_json_pretty()?);
                return Ok(());
            }

            let stats = &summary.statistics;
            println!("Statistics for {}:", scope.label());
            println!(
                "- evaluated {} of {} students",
                stats.evaluated_student_count, stats.total_student_count
            );
            println!(
                "- average {:.2}, max {:.2}, min {:.2}",
                stats.average_score, stats.max_score, stats.min_score
            );
            println!("- passing rate {:.0}%", stats.passing_rate * 100.0);
            println!("Distribution:");
            for bucket in summary.distribution.iter() {
                println!("- {}: {}", bucket.label, bucket.count);
            }
        }
        Commands::Transcript { student, json } => {
            let pool = connect().await?;
            let transcript = db::fetch_transcript(&pool, &student).await?;

            if json {
                println!("{}", Envelope::success(&transcript).to_json_pretty()?);
                return Ok(());
            }

            println!(
                "{} ({}, {})",
                transcript.full_name, transcript.student_no, transcript.class_name
            );
            if transcript.grades.is_empty() {
                println!("No grades recorded.");
            }
            for grade in transcript.grades.iter() {
                let score = grade
                    .score
                    .map(|s| format!("{s:.2}"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "- {} {} {} ({} credits, {} {}): GPA {:.1}",
                    grade.course_code,
                    grade.course_name,
                    score,
                    grade.credit,
                    grade.semester,
                    grade.year,
                    grade.gpa
                );
            }
            println!(
                "Weighted GPA {:.2} across {} earned credits",
                transcript.weighted_gpa, transcript.earned_credits
            );
        }
        Commands::Report { scope, out } => {
            let scope = scope.into_scope()?;
            let pool = connect().await?;
            let samples = db::fetch_scores(&pool, &scope).await?;
            let roster = db::fetch_roster_size(&pool, &scope.class_name).await?;
            let summary = analytics::summarize(&samples, roster);
            let report = report::build_report(&scope, chrono::Utc::now().date_naive(), &summary);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let settings = Settings::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")?;
    tracing::debug!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}
