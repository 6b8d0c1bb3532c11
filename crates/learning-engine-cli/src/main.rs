//! Learning engine CLI: `lrn` command.
//!
//! Drives the learning engine against a data directory: a course catalog,
//! engine configuration and a file store of progress records, enrollments
//! and certificates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use learning_engine::{
    CertificateId, CourseVersionId, EngineConfig, EnrollmentId, FileStore, LearningService,
    LessonCatalog, LessonId, PolicySource, ProgressUpdate, StaticCatalog, StudentId,
    VerificationStatus,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

const CONFIG_FILE: &str = "config.json";
const CATALOG_FILE: &str = "catalog.json";
const STORE_DIR: &str = "store";

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("LEARNING_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var_os("HOME").ok_or_else(|| anyhow!("HOME not set; pass --data-dir"))?;
    Ok(PathBuf::from(home).join(".learning"))
}

fn catalog_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CATALOG_FILE)
}

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

fn load_catalog(data_dir: &Path) -> Result<StaticCatalog> {
    let path = catalog_path(data_dir);
    if !path.exists() {
        return Ok(StaticCatalog::new());
    }
    StaticCatalog::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn open_service(data_dir: &Path) -> Result<LearningService> {
    let config = EngineConfig::load_or_default(&config_path(data_dir))
        .context("failed to load engine configuration")?;
    let catalog = Arc::new(load_catalog(data_dir)?);
    let store = FileStore::new(data_dir.join(STORE_DIR)).context("failed to open store")?;
    let service = LearningService::with_catalog(catalog, Arc::new(store)).with_config(config)?;
    Ok(service)
}

// ── Time formatting helpers ───────────────────────────────────────────────────

fn micros_to_datetime(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    chrono::DateTime::from_timestamp(secs, 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn opt_datetime(micros: Option<u64>) -> String {
    micros.map(micros_to_datetime).unwrap_or_else(|| "-".to_string())
}

fn opt_score(score: Option<f64>) -> String {
    score.map(|s| format!("{s:.2}")).unwrap_or_else(|| "-".to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Learning engine CLI: track lesson progress, manage enrollments and
/// issue certificates.
#[derive(Parser, Debug)]
#[command(
    name = "lrn",
    about = "Learning engine CLI",
    version,
    long_about = "lrn: learning engine CLI\n\nTrack lesson progress, manage enrollments, record scores,\nand issue and verify course certificates."
)]
struct Cli {
    /// Data directory (default: $LEARNING_HOME or ~/.learning)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the data directory with a default configuration
    Init,

    /// Manage the course catalog
    Course {
        #[command(subcommand)]
        subcommand: CourseCommands,
    },

    /// Enroll a student in a course version
    Enroll {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
    },

    /// Record that a student opened a lesson
    View {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        lesson: String,
    },

    /// Mark a lesson completed
    CompleteLesson {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        lesson: String,
    },

    /// Report the watched position of a lesson video
    Watch {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        lesson: String,
        /// Watched seconds
        #[arg(long, allow_negative_numbers = true)]
        seconds: i64,
    },

    /// Show a student's progress on one lesson
    Lesson {
        #[arg(long)]
        student: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        lesson: String,
    },

    /// Record a quiz or final exam score
    Score {
        /// Enrollment ID
        enrollment: String,
        /// Score value
        value: f64,
        /// Record as the final exam score
        #[arg(long = "final")]
        final_exam: bool,
    },

    /// Manage enrollments
    Enrollment {
        #[command(subcommand)]
        subcommand: EnrollmentCommands,
    },

    /// Eligibility, issuance, revocation and verification of certificates
    Cert {
        #[command(subcommand)]
        subcommand: CertCommands,
    },

    /// Progress and statistics reports
    Report {
        #[command(subcommand)]
        subcommand: ReportCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CourseCommands {
    /// Import course versions from a catalog JSON file
    Import {
        /// Path to the catalog file
        file: PathBuf,
    },
    /// List course versions
    List,
    /// Show a course version's policy and lessons
    Show {
        /// Course version ID
        course: String,
    },
}

#[derive(Subcommand, Debug)]
enum EnrollmentCommands {
    /// Show one enrollment
    Show { enrollment: String },
    /// List enrollments
    List {
        /// Only this student's enrollments
        #[arg(long)]
        student: Option<String>,
    },
    /// Move an eligible enrollment to completed
    Complete { enrollment: String },
    /// Withdraw from a course
    Cancel {
        enrollment: String,
        #[arg(long)]
        reason: String,
    },
    /// Remove a student from a course
    Remove {
        enrollment: String,
        #[arg(long)]
        reason: String,
    },
    /// Recount completed lessons
    Recompute { enrollment: String },
    /// Persist expiry if the access window has ended
    Expire { enrollment: String },
    /// Override the final exam weight (0.5-1.0)
    Weight { enrollment: String, weight: f64 },
    /// Check whether the final exam may be taken
    FinalExam { enrollment: String },
}

#[derive(Subcommand, Debug)]
enum CertCommands {
    /// Show the eligibility breakdown for an enrollment
    Check { enrollment: String },
    /// Issue a certificate
    Issue { enrollment: String },
    /// Revoke a certificate
    Revoke {
        /// Certificate ID
        certificate: String,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "admin")]
        actor: String,
    },
    /// Verify a certificate by its code
    Verify { code: String },
    /// List certificates
    List {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        course: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommands {
    /// Per-chapter progress of an enrollment
    Progress { enrollment: String },
    /// Overview of one student's enrollments
    Student { student: String },
    /// Statistics for one course version
    Course { course: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let json = cli.json;
    let verbose = cli.verbose;
    log::debug!("using data directory {}", data_dir.display());

    match cli.command {
        Commands::Init => cmd_init(&data_dir),
        Commands::Course { subcommand } => match subcommand {
            CourseCommands::Import { file } => cmd_course_import(&data_dir, &file),
            CourseCommands::List => cmd_course_list(&data_dir, json),
            CourseCommands::Show { course } => cmd_course_show(&data_dir, &course, json),
        },
        Commands::Enroll { student, course } => cmd_enroll(&data_dir, &student, &course, json),
        Commands::View {
            student,
            course,
            lesson,
        } => {
            let service = open_service(&data_dir)?;
            let update = service.mark_viewed(
                &StudentId::new(student),
                &LessonId::new(lesson),
                &CourseVersionId::new(course),
            )?;
            print_progress_update(&update, json)
        }
        Commands::CompleteLesson {
            student,
            course,
            lesson,
        } => {
            let service = open_service(&data_dir)?;
            let update = service.mark_completed(
                &StudentId::new(student),
                &LessonId::new(lesson),
                &CourseVersionId::new(course),
            )?;
            print_progress_update(&update, json)
        }
        Commands::Watch {
            student,
            course,
            lesson,
            seconds,
        } => {
            let service = open_service(&data_dir)?;
            let update = service.update_watched_duration(
                &StudentId::new(student),
                &LessonId::new(lesson),
                &CourseVersionId::new(course),
                seconds,
            )?;
            print_progress_update(&update, json)
        }
        Commands::Lesson {
            student,
            course,
            lesson,
        } => cmd_lesson(&data_dir, &student, &course, &lesson, json),
        Commands::Score {
            enrollment,
            value,
            final_exam,
        } => cmd_score(&data_dir, &enrollment, value, final_exam, json),
        Commands::Enrollment { subcommand } => cmd_enrollment(&data_dir, subcommand, json, verbose),
        Commands::Cert { subcommand } => cmd_cert(&data_dir, subcommand, json),
        Commands::Report { subcommand } => cmd_report(&data_dir, subcommand, json),
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `lrn init`
fn cmd_init(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let config = config_path(data_dir);
    if !config.exists() {
        let json = serde_json::to_string_pretty(&EngineConfig::default())?;
        std::fs::write(&config, json).context("failed to write config")?;
    }

    let catalog = catalog_path(data_dir);
    if !catalog.exists() {
        StaticCatalog::new()
            .save(&catalog)
            .context("failed to write catalog")?;
    }

    FileStore::new(data_dir.join(STORE_DIR)).context("failed to create store")?;

    println!("Initialized learning data in {}", data_dir.display());
    println!("  Config:  {}", config.display());
    println!("  Catalog: {}", catalog.display());
    Ok(())
}

/// `lrn course import FILE`
fn cmd_course_import(data_dir: &Path, file: &Path) -> Result<()> {
    let incoming = StaticCatalog::load(file)
        .with_context(|| format!("failed to load catalog {}", file.display()))?;
    let mut catalog = load_catalog(data_dir)?;
    let imported = catalog.merge(incoming);

    std::fs::create_dir_all(data_dir)?;
    catalog
        .save(&catalog_path(data_dir))
        .context("failed to save catalog")?;

    println!("Imported {} course version(s)", imported.len());
    for id in imported {
        println!("  {id}");
    }
    Ok(())
}

/// `lrn course list`
fn cmd_course_list(data_dir: &Path, json: bool) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let ids = catalog.course_versions();
    if json {
        return print_json(&ids);
    }
    if ids.is_empty() {
        println!("No course versions in {}", catalog_path(data_dir).display());
        return Ok(());
    }

    println!("{:<24} {:>7} {:>6} {:>9} {:>6}", "COURSE", "LESSONS", "PASS", "PROGRESS", "DAYS");
    println!("{}", "-".repeat(56));
    for id in ids {
        let tree = catalog.lesson_tree(&id)?;
        let policy = catalog.policy(&id)?;
        println!(
            "{:<24} {:>7} {:>6.2} {:>8.1}% {:>6}",
            id,
            tree.total_lessons(),
            policy.pass_score,
            policy.min_progress_pct,
            policy
                .duration_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

/// `lrn course show COURSE`
fn cmd_course_show(data_dir: &Path, course: &str, json: bool) -> Result<()> {
    let catalog = load_catalog(data_dir)?;
    let entry = catalog.entry(&CourseVersionId::new(course))?;
    if json {
        return print_json(entry);
    }

    println!("Course version {}", entry.id);
    println!("  Pass score:    {:.2}", entry.policy.pass_score);
    println!("  Min progress:  {:.1}%", entry.policy.min_progress_pct);
    if let Some(k) = entry.policy.final_weight {
        println!("  Final weight:  {k}");
    }
    if let Some(days) = entry.policy.duration_days {
        println!("  Access window: {days} days");
    }
    for chapter in &entry.chapters {
        println!("  [{}] {}", chapter.id, chapter.title);
        for lesson in &chapter.lessons {
            let duration = lesson
                .duration_seconds
                .map(|s| format!("{s}s"))
                .unwrap_or_else(|| "untimed".to_string());
            let preview = if lesson.is_preview { " (preview)" } else { "" };
            println!("    {} {} [{duration}]{preview}", lesson.id, lesson.title);
        }
    }
    Ok(())
}

/// `lrn enroll --student S --course C`
fn cmd_enroll(data_dir: &Path, student: &str, course: &str, json: bool) -> Result<()> {
    let service = open_service(data_dir)?;
    let e = service.enroll(&StudentId::new(student), &CourseVersionId::new(course))?;
    if json {
        return print_json(&e);
    }
    println!("Enrolled {} in {}", e.student_id, e.course_version_id);
    println!("  Enrollment: {}", e.id);
    println!("  Ends:       {}", opt_datetime(e.end_at));
    Ok(())
}

fn print_progress_update(update: &ProgressUpdate, json: bool) -> Result<()> {
    if json {
        return print_json(update);
    }
    let p = &update.progress;
    println!("{} -> {}", p.key, p.status);
    println!("  Views:   {}", p.times_viewed);
    println!("  Watched: {}s", p.watched_duration_seconds);
    if update.newly_completed {
        println!("  Lesson completed");
    }
    Ok(())
}

/// `lrn lesson --student S --course C --lesson L`
fn cmd_lesson(data_dir: &Path, student: &str, course: &str, lesson: &str, json: bool) -> Result<()> {
    let service = open_service(data_dir)?;
    let p = service.lesson_progress(
        &StudentId::new(student),
        &LessonId::new(lesson),
        &CourseVersionId::new(course),
    )?;
    if json {
        return print_json(&p);
    }
    println!("{} -> {}", p.key, p.status);
    println!("  Views:        {}", p.times_viewed);
    println!("  Watched:      {}s", p.watched_duration_seconds);
    println!("  First viewed: {}", opt_datetime(p.first_viewed_at));
    println!("  Completed:    {}", opt_datetime(p.completed_at));
    Ok(())
}

/// `lrn score ENROLLMENT VALUE [--final]`
fn cmd_score(data_dir: &Path, enrollment: &str, value: f64, is_final: bool, json: bool) -> Result<()> {
    let service = open_service(data_dir)?;
    let e = service.record_quiz_score(&EnrollmentId::new(enrollment), value, is_final)?;
    if json {
        return print_json(&e);
    }
    let kind = if is_final { "final exam" } else { "quiz" };
    println!("Recorded {kind} score {value} for {}", e.id);
    println!("  Quizzes:    {}", e.quiz_scores.len());
    println!("  Final exam: {}", opt_score(e.final_exam_score));
    println!("  Average:    {}", opt_score(e.average_score));
    Ok(())
}

fn print_enrollment(e: &learning_engine::Enrollment, verbose: bool) {
    let now = learning_engine::time::now_micros();
    println!("Enrollment {}", e.id);
    println!("  Student:     {}", e.student_id);
    println!("  Course:      {}", e.course_version_id);
    println!("  Status:      {}", e.effective_status(now));
    println!("  Completion:  {:.1}%", e.completion_percentage);
    println!("  Average:     {}", opt_score(e.average_score));
    println!("  Certificate: {}", if e.certificate_issued { "issued" } else { "-" });
    println!("  Ends:        {}", opt_datetime(e.end_at));
    if let Some(days) = e.remaining_days(now) {
        println!("  Days left:   {days}");
    }
    if let Some(reason) = &e.cancellation_reason {
        println!("  Cancelled:   {reason}");
    }
    if verbose {
        println!("  Enrolled at: {}", micros_to_datetime(e.enrolled_at));
        println!("  Quiz scores: {:?}", e.quiz_scores);
        println!("  Completed:   {}", opt_datetime(e.completed_at));
    }
}

/// `lrn enrollment ...`
fn cmd_enrollment(
    data_dir: &Path,
    subcommand: EnrollmentCommands,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let service = open_service(data_dir)?;

    let e = match subcommand {
        EnrollmentCommands::List { student } => {
            let enrollments = match student {
                Some(s) => service.enrollments_for_student(&StudentId::new(s))?,
                None => service.store().list_enrollments()?,
            };
            if json {
                return print_json(&enrollments);
            }
            if enrollments.is_empty() {
                println!("No enrollments found");
                return Ok(());
            }
            let now = learning_engine::time::now_micros();
            println!(
                "{:<28} {:<16} {:<20} {:<10} {:>7}",
                "ID", "STUDENT", "COURSE", "STATUS", "DONE"
            );
            println!("{}", "-".repeat(85));
            for e in enrollments {
                println!(
                    "{:<28} {:<16} {:<20} {:<10} {:>6.1}%",
                    e.id,
                    e.student_id,
                    e.course_version_id,
                    e.effective_status(now),
                    e.completion_percentage
                );
            }
            return Ok(());
        }
        EnrollmentCommands::FinalExam { enrollment } => {
            let allowed = service.final_exam_eligibility(&EnrollmentId::new(enrollment))?;
            if json {
                return print_json(&allowed);
            }
            if allowed {
                println!("Final exam: allowed");
            } else {
                println!("Final exam: not yet (progress below the course minimum)");
            }
            return Ok(());
        }
        EnrollmentCommands::Expire { enrollment } => {
            let changed = service.mark_expired(&EnrollmentId::new(&enrollment))?;
            if json {
                return print_json(&changed);
            }
            if changed {
                println!("Enrollment {enrollment} marked expired");
            } else {
                println!("Enrollment {enrollment} unchanged");
            }
            return Ok(());
        }
        EnrollmentCommands::Show { enrollment } => service.enrollment(&EnrollmentId::new(enrollment))?,
        EnrollmentCommands::Complete { enrollment } => {
            service.complete_enrollment(&EnrollmentId::new(enrollment))?
        }
        EnrollmentCommands::Cancel { enrollment, reason } => {
            service.cancel_enrollment(&EnrollmentId::new(enrollment), &reason)?
        }
        EnrollmentCommands::Remove { enrollment, reason } => {
            service.remove_student(&EnrollmentId::new(enrollment), &reason)?
        }
        EnrollmentCommands::Recompute { enrollment } => {
            service.recompute(&EnrollmentId::new(enrollment))?
        }
        EnrollmentCommands::Weight { enrollment, weight } => {
            service.set_final_exam_weight(&EnrollmentId::new(enrollment), weight)?
        }
    };

    if json {
        return print_json(&e);
    }
    print_enrollment(&e, verbose);
    Ok(())
}

/// `lrn cert ...`
fn cmd_cert(data_dir: &Path, subcommand: CertCommands, json: bool) -> Result<()> {
    let service = open_service(data_dir)?;

    match subcommand {
        CertCommands::Check { enrollment } => {
            let report = service.check_eligibility(&EnrollmentId::new(enrollment))?;
            if json {
                return print_json(&report);
            }
            println!("Enrollment {}", report.enrollment_id);
            println!("  Progress: {}", pass_fail(report.meets_progress));
            println!("  Score:    {}", pass_fail(report.has_score && report.meets_score));
            println!("  Window:   {}", pass_fail(report.not_expired));
            println!("  Status:   {}", pass_fail(report.status_allows));
            for err in &report.errors {
                println!("    - {err}");
            }
            println!(
                "  Eligible: {}",
                if report.is_eligible { "yes" } else { "no" }
            );
        }
        CertCommands::Issue { enrollment } => {
            let result = service.issue_certificate(&EnrollmentId::new(enrollment))?;
            if json {
                return print_json(&result);
            }
            let cert = &result.certificate;
            println!("Issued certificate {}", cert.code);
            println!("  ID:     {}", cert.id);
            println!("  Score:  {:.2}", cert.final_score);
            println!("  Grade:  {}", cert.grade);
            println!("  Issued: {}", micros_to_datetime(cert.issued_at));
        }
        CertCommands::Revoke {
            certificate,
            reason,
            actor,
        } => {
            let cert =
                service.revoke_certificate(&CertificateId::new(certificate), &reason, &actor)?;
            if json {
                return print_json(&cert);
            }
            println!("Revoked certificate {}", cert.code);
        }
        CertCommands::Verify { code } => {
            let v = service.verify_certificate(&code)?;
            if json {
                return print_json(&v);
            }
            let status = match v.status {
                VerificationStatus::Valid => "VALID",
                VerificationStatus::Revoked => "REVOKED",
                VerificationStatus::Tampered => "TAMPERED",
            };
            println!("Certificate {}: {status}", v.code);
            println!("  Student: {}", v.student_id);
            println!("  Course:  {}", v.course_version_id);
            println!("  Score:   {:.2} ({})", v.final_score, v.grade);
            println!("  Issued:  {}", micros_to_datetime(v.issued_at));
            if let Some(reason) = &v.revoke_reason {
                println!("  Reason:  {reason}");
            }
        }
        CertCommands::List { student, course } => {
            let certs = match (student, course) {
                (Some(s), _) => service.certificates_for_student(&StudentId::new(s))?,
                (None, Some(c)) => service.certificates_for_version(&CourseVersionId::new(c))?,
                (None, None) => service.store().list_certificates()?,
            };
            if json {
                return print_json(&certs);
            }
            if certs.is_empty() {
                println!("No certificates found");
                return Ok(());
            }
            println!(
                "{:<22} {:<16} {:<20} {:>6} {:<10} REVOKED",
                "CODE", "STUDENT", "COURSE", "SCORE", "GRADE"
            );
            println!("{}", "-".repeat(86));
            for c in certs {
                println!(
                    "{:<22} {:<16} {:<20} {:>6.2} {:<10} {}",
                    c.code,
                    c.student_id,
                    c.course_version_id,
                    c.final_score,
                    c.grade,
                    if c.is_revoked { "yes" } else { "no" }
                );
            }
        }
    }
    Ok(())
}

fn pass_fail(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "FAIL"
    }
}

/// `lrn report ...`
fn cmd_report(data_dir: &Path, subcommand: ReportCommands, json: bool) -> Result<()> {
    let service = open_service(data_dir)?;

    match subcommand {
        ReportCommands::Progress { enrollment } => {
            let report = service.course_progress(&EnrollmentId::new(enrollment))?;
            if json {
                return print_json(&report);
            }
            println!(
                "{} in {}: {}/{} lessons ({:.1}%)",
                report.student_id,
                report.course_version_id,
                report.completed_lessons,
                report.total_lessons,
                report.completion_percentage
            );
            println!(
                "  Watched {}s of {}s, average score {}",
                report.watched_duration_seconds,
                report.total_duration_seconds,
                opt_score(report.average_score)
            );
            for chapter in &report.chapters {
                println!(
                    "  [{}] {} {}/{} ({:.1}%)",
                    chapter.chapter_id,
                    chapter.title,
                    chapter.completed_lessons,
                    chapter.total_lessons,
                    chapter.completion_percentage
                );
                for lesson in &chapter.lessons {
                    println!(
                        "    {:<16} {:<11} views {:<3} watched {}s",
                        lesson.lesson_id, lesson.status, lesson.times_viewed, lesson.watched_duration_seconds
                    );
                }
            }
        }
        ReportCommands::Student { student } => {
            let overview = service.student_overview(&StudentId::new(student))?;
            if json {
                return print_json(&overview);
            }
            println!("Student {}", overview.student_id);
            println!(
                "  Enrollments: {} ({} completed, {} in progress)",
                overview.total_enrollments,
                overview.completed_enrollments,
                overview.in_progress_enrollments
            );
            println!("  Avg completion: {:.1}%", overview.average_completion);
            println!("  Watched hours:  {:.2}", overview.total_watched_hours);
            println!("  Avg score:      {}", opt_score(overview.average_score));
            for c in &overview.courses {
                println!(
                    "    {:<20} {:<10} {:>6.1}%  {}",
                    c.course_version_id,
                    c.status,
                    c.completion_percentage,
                    if c.certificate_issued { "certified" } else { "" }
                );
            }
        }
        ReportCommands::Course { course } => {
            let stats = service.course_stats(&CourseVersionId::new(course))?;
            if json {
                return print_json(&stats);
            }
            println!("Course version {}", stats.course_version_id);
            println!("  Enrollments:     {}", stats.total_enrollments);
            println!("  Active:          {}", stats.active_enrollments);
            println!("  Completed:       {}", stats.completed_enrollments);
            println!("  Cancelled:       {}", stats.cancelled_enrollments);
            println!("  Expired:         {}", stats.expired_enrollments);
            println!("  With progress:   {}", stats.students_with_progress);
            println!("  Completion rate: {:.1}%", stats.completion_rate);
            println!("  Avg completion:  {:.1}%", stats.average_completion);
            println!("  Avg score:       {}", opt_score(stats.average_score));
            println!("  Certificates:    {}", stats.certificates_issued);
        }
    }
    Ok(())
}
