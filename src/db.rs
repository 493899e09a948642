use std::collections::HashSet;

use anyhow::Context;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::analytics;
use crate::error::GradeError;
use crate::models::{CourseGrade, GradeRecord, GradeScope, ScoreSample, Transcript};
use crate::validate;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let students = [
        ("S2024001", "Lin Wei", "CS-2024-1"),
        ("S2024002", "Zhao Min", "CS-2024-1"),
        ("S2024003", "Chen Jing", "CS-2024-1"),
        ("S2024004", "Wang Lei", "CS-2024-1"),
        ("S2024005", "Liu Yang", "CS-2024-1"),
        ("S2024101", "Sun Hao", "SE-2024-1"),
        ("S2024102", "Zhou Ting", "SE-2024-1"),
    ];
    let courses = [
        ("CS101", "Programming Fundamentals", 4.0),
        ("MA201", "Linear Algebra", 3.0),
        ("EN110", "Academic English", 2.0),
    ];
    let scores: [[Option<f64>; 3]; 7] = [
        [Some(95.0), Some(88.0), Some(79.5)],
        [Some(83.5), Some(72.0), Some(91.0)],
        [Some(67.0), Some(58.5), Some(74.0)],
        [Some(45.0), Some(61.0), None],
        [None, Some(90.0), Some(86.0)],
        [Some(76.0), Some(69.5), Some(81.0)],
        [Some(92.5), Some(84.0), Some(65.0)],
    ];

    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;
    for (row, (student_no, full_name, class_name)) in students.iter().enumerate() {
        for (col, (code, name, credit)) in courses.iter().enumerate() {
            let Some(score) = scores[row][col] else {
                continue;
            };
            let record = GradeRecord {
                student_no: student_no.to_string(),
                full_name: full_name.to_string(),
                class_name: class_name.to_string(),
                course_code: code.to_string(),
                course_name: name.to_string(),
                credit: *credit,
                semester: "fall".to_string(),
                year: 2024,
                score,
                source_key: Some(format!("seed-{student_no}-{code}")),
            };
            if insert_record(&mut *tx, &record).await? {
                inserted += 1;
            }
        }
    }
    tx.commit().await?;

    tracing::info!(inserted, "seed grades written");
    Ok(inserted)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let records = read_records(reader)?;

    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for record in records.iter() {
        if insert_record(&mut *tx, record).await? {
            inserted += 1;
        } else {
            skipped += 1;
            tracing::debug!(student = %record.student_no, course = %record.course_code, "duplicate grade skipped");
        }
    }

    tx.commit().await?;
    tracing::info!(inserted, skipped, path = %csv_path.display(), "csv import finished");
    Ok(inserted)
}

/// Parses and validates every row up front so a bad row aborts the import
/// before anything is written.
pub fn read_records<R: std::io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<GradeRecord>> {
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<GradeRecord>().enumerate() {
        // header is line 1
        let line = index + 2;
        let record = result.with_context(|| format!("malformed row on line {line}"))?;
        validate::validate_record(&record).with_context(|| format!("invalid row on line {line}"))?;
        records.push(record);
    }

    Ok(records)
}

/// Upserts the class, student and course for `record` and inserts the grade.
/// Returns false when an equivalent grade already exists.
async fn insert_record(conn: &mut PgConnection, record: &GradeRecord) -> anyhow::Result<bool> {
    let class_id: Uuid = sqlx::query(
        r#"
        INSERT INTO grade_analytics.classes (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.class_name)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    let student_id: Uuid = sqlx::query(
        r#"
        INSERT INTO grade_analytics.students (id, student_no, full_name, class_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_no) DO UPDATE
        SET full_name = EXCLUDED.full_name, class_id = EXCLUDED.class_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.student_no)
    .bind(&record.full_name)
    .bind(class_id)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    let course_id: Uuid = sqlx::query(
        r#"
        INSERT INTO grade_analytics.courses (id, code, name, credit)
        VALUES ($1, $2, $3, $4::numeric)
        ON CONFLICT (code) DO UPDATE
        SET name = EXCLUDED.name, credit = EXCLUDED.credit
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.course_code)
    .bind(&record.course_name)
    .bind(record.credit)
    .fetch_one(&mut *conn)
    .await?
    .get("id");

    let source_key = record
        .source_key
        .clone()
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

    let result = sqlx::query(
        r#"
        INSERT INTO grade_analytics.grades
        (id, student_id, course_id, semester, year, score, source_key)
        VALUES ($1, $2, $3, $4, $5, $6::numeric, $7)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(course_id)
    .bind(record.semester.trim())
    .bind(record.year)
    .bind(record.score)
    .bind(source_key)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn lookup_class_id(pool: &PgPool, class_name: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM grade_analytics.classes WHERE name = $1")
        .bind(class_name)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(row.get("id")),
        None => Err(GradeError::not_found("class", class_name).into()),
    }
}

async fn lookup_course_id(pool: &PgPool, course_code: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM grade_analytics.courses WHERE code = $1")
        .bind(course_code)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Ok(row.get("id")),
        None => Err(GradeError::not_found("course", course_code).into()),
    }
}

/// Calendar order of the term names used in imports; other labels sort after
/// the named terms by their text.
const SEMESTER_RANK: &str = "CASE lower(g.semester) \
     WHEN 'spring' THEN 1 WHEN 'summer' THEN 2 \
     WHEN 'fall' THEN 3 WHEN 'autumn' THEN 3 WHEN 'winter' THEN 4 \
     ELSE 0 END";

pub async fn fetch_scores(pool: &PgPool, scope: &GradeScope) -> anyhow::Result<Vec<ScoreSample>> {
    let class_id = lookup_class_id(pool, &scope.class_name).await?;
    let course_id = lookup_course_id(pool, &scope.course_code).await?;

    let mut query = String::from(
        "SELECT g.student_id, g.score::float8 AS score \
         FROM grade_analytics.grades g \
         JOIN grade_analytics.students s ON s.id = g.student_id \
         WHERE s.class_id = $1 AND g.course_id = $2",
    );
    let mut next_param = 3;
    if scope.semester.is_some() {
        query.push_str(&format!(" AND g.semester = ${next_param}"));
        next_param += 1;
    }
    if scope.year.is_some() {
        query.push_str(&format!(" AND g.year = ${next_param}"));
    }
    query.push_str(" ORDER BY g.year DESC, ");
    query.push_str(SEMESTER_RANK);
    query.push_str(" DESC, g.semester DESC, g.created_at DESC");

    let mut rows = sqlx::query(&query).bind(class_id).bind(course_id);
    if let Some(semester) = &scope.semester {
        rows = rows.bind(semester.as_str());
    }
    if let Some(year) = scope.year {
        rows = rows.bind(year);
    }

    let records = rows.fetch_all(pool).await?;
    tracing::debug!(scope = %scope.label(), rows = records.len(), "scores fetched");

    let samples = records
        .into_iter()
        .map(|row| ScoreSample {
            student_id: row.get("student_id"),
            score: row.get("score"),
        })
        .collect();
    Ok(latest_per_student(samples))
}

/// Keeps the first sample seen for each student. Callers pass samples ordered
/// newest first, so a retaken course counts once with its latest score.
pub fn latest_per_student(samples: Vec<ScoreSample>) -> Vec<ScoreSample> {
    let mut seen = HashSet::new();
    samples
        .into_iter()
        .filter(|sample| seen.insert(sample.student_id))
        .collect()
}

pub async fn fetch_roster_size(pool: &PgPool, class_name: &str) -> anyhow::Result<usize> {
    let class_id = lookup_class_id(pool, class_name).await?;
    let count: i64 = sqlx::query("SELECT COUNT(*) AS total FROM grade_analytics.students WHERE class_id = $1")
        .bind(class_id)
        .fetch_one(pool)
        .await?
        .get("total");
    Ok(usize::try_from(count).unwrap_or(0))
}

pub async fn fetch_transcript(pool: &PgPool, student_no: &str) -> anyhow::Result<Transcript> {
    let student = sqlx::query(
        "SELECT s.id, s.full_name, c.name AS class_name \
         FROM grade_analytics.students s \
         JOIN grade_analytics.classes c ON c.id = s.class_id \
         WHERE s.student_no = $1",
    )
    .bind(student_no)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| GradeError::not_found("student", student_no))?;

    let student_id: Uuid = student.get("id");
    let rows = sqlx::query(
        "SELECT co.code, co.name, co.credit::float8 AS credit, g.semester, g.year, \
         g.score::float8 AS score \
         FROM grade_analytics.grades g \
         JOIN grade_analytics.courses co ON co.id = g.course_id \
         WHERE g.student_id = $1 \
         ORDER BY g.year, g.semester, co.code",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let grades: Vec<CourseGrade> = rows
        .into_iter()
        .map(|row| {
            let score: Option<f64> = row.get("score");
            CourseGrade {
                course_code: row.get("code"),
                course_name: row.get("name"),
                credit: row.get("credit"),
                semester: row.get("semester"),
                year: row.get("year"),
                score,
                gpa: analytics::calculate_gpa(score),
                passing: analytics::is_passing(score),
            }
        })
        .collect();

    Ok(build_transcript(
        student_no.to_string(),
        student.get("full_name"),
        student.get("class_name"),
        grades,
    ))
}

pub fn build_transcript(
    student_no: String,
    full_name: String,
    class_name: String,
    grades: Vec<CourseGrade>,
) -> Transcript {
    let weighted: Vec<(Option<f64>, f64)> = grades.iter().map(|g| (g.score, g.credit)).collect();
    let earned_credits: f64 = grades.iter().filter(|g| g.passing).map(|g| g.credit).sum();

    Transcript {
        student_no,
        full_name,
        class_name,
        weighted_gpa: analytics::weighted_gpa(&weighted),
        earned_credits,
        grades,
    }
}
