use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use vtu_sgpa::ledger::{CourseField, LedgerError};
use vtu_sgpa::models::{AggregateResult, CourseRecord, Semester};
use vtu_sgpa::session::{Session, StatusLevel};
use vtu_sgpa::{extract, grading, import, presets, report};

#[derive(Parser)]
#[command(name = "sgpa")]
#[command(about = "VTU 2022 scheme SGPA calculator", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Labels {
    /// Semester number (1-8) or "lateral"
    #[arg(long, value_parser = parse_semester)]
    semester: Option<Semester>,
    /// Branch code, e.g. CS
    #[arg(long)]
    branch: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the grading scale
    Grades,
    /// Print or save the sample courses for a semester
    Preset {
        #[arg(long, value_parser = parse_semester)]
        semester: Semester,
        #[arg(long)]
        out_csv: Option<PathBuf>,
    },
    /// Parse pasted transcript text into courses
    Parse {
        #[arg(long)]
        text: PathBuf,
        #[command(flatten)]
        labels: Labels,
        #[arg(long)]
        out_csv: Option<PathBuf>,
    },
    /// Calculate SGPA from a course CSV
    Calculate {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        labels: Labels,
        /// Print the aggregate as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a plain-text report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        labels: Labels,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check an exported report against a course CSV
    Verify {
        #[arg(long)]
        report: PathBuf,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print a shareable summary line
    Share {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "https://vtu-sgpa-calculator.app")]
        link: String,
    },
    /// Edit one field of one course in a course CSV
    Edit {
        #[arg(long)]
        csv: PathBuf,
        /// Zero-based row index
        #[arg(long)]
        row: usize,
        #[arg(long, value_enum)]
        field: FieldArg,
        #[arg(long)]
        value: String,
    },
    /// Remove one course from a course CSV
    Remove {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        row: usize,
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
    /// Send a transcript PDF to the extraction service
    Extract {
        #[arg(long)]
        pdf: PathBuf,
        #[arg(long, default_value = extract::DEFAULT_ENDPOINT)]
        endpoint: String,
        #[arg(long, default_value_t = extract::DEFAULT_TIMEOUT.as_secs())]
        timeout_secs: u64,
        #[arg(long)]
        scheme: Option<String>,
        #[arg(long)]
        out_csv: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Code,
    Name,
    Credits,
    Grade,
}

impl From<FieldArg> for CourseField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Code => CourseField::Code,
            FieldArg::Name => CourseField::Name,
            FieldArg::Credits => CourseField::Credits,
            FieldArg::Grade => CourseField::Grade,
        }
    }
}

fn parse_semester(value: &str) -> Result<Semester, String> {
    Semester::parse(value).ok_or_else(|| format!("expected 1-8 or \"lateral\", got {value:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Grades => {
            println!("Grade  Points  Marks    Level");
            for info in grading::GRADE_SCALE.iter() {
                println!(
                    "{:<6} {:<7} {:<8} {}",
                    info.letter, info.points, info.range, info.level
                );
            }
            for (letter, description) in grading::SPECIAL_GRADES.iter() {
                println!("{letter:<6} {:<7} {:<8} {description}", 0, "-");
            }
        }
        Commands::Preset { semester, out_csv } => {
            let mut session = Session::default();
            if !session.load_preset(semester) {
                print_messages(&mut session);
                return Ok(());
            }
            finish_loaded(&mut session, out_csv.as_deref())?;
        }
        Commands::Parse {
            text,
            labels,
            out_csv,
        } => {
            let raw = std::fs::read_to_string(&text)
                .with_context(|| format!("failed to read {}", text.display()))?;
            let mut session = Session::new(labels.semester, labels.branch);
            session.load_parsed_text(&raw);
            finish_loaded(&mut session, out_csv.as_deref())?;
        }
        Commands::Calculate { csv, labels, json } => {
            let mut session = load_session(&csv, labels)?;
            let Some(aggregate) = calculate(&mut session) else {
                return Ok(());
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&aggregate)?);
            } else {
                let context = session.report_context(Local::now().date_naive());
                print!("{}", report::build_grade_sheet(&context, &aggregate));
            }
        }
        Commands::Report { csv, labels, out } => {
            let mut session = load_session(&csv, labels)?;
            let Some(aggregate) = calculate(&mut session) else {
                return Ok(());
            };

            let context = session.report_context(Local::now().date_naive());
            let out = out.unwrap_or_else(|| PathBuf::from(context.default_file_name()));
            std::fs::write(&out, report::build_report(&context, &aggregate))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Verify { report: path, csv } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let rows = report::read_report_table(&text)?;
            let mut session = load_session(&csv, Labels::none())?;
            let Some(aggregate) = calculate(&mut session) else {
                return Ok(());
            };

            let mismatches = report::compare_report_rows(&rows, &aggregate);
            if mismatches.is_empty() {
                println!("Report matches {} courses in {}.", rows.len(), csv.display());
            } else {
                for mismatch in mismatches.iter() {
                    println!("- {mismatch}");
                }
                anyhow::bail!("report does not match {}", csv.display());
            }
        }
        Commands::Share { csv, link } => {
            let mut session = load_session(&csv, Labels::none())?;
            let Some(aggregate) = calculate(&mut session) else {
                return Ok(());
            };
            println!("{}", report::share_summary(&aggregate, &link));
        }
        Commands::Edit {
            csv,
            row,
            field,
            value,
        } => {
            let mut session = load_unchecked(&csv)?;
            session.ledger.edit_field(row, field.into(), &value)?;
            import::write_courses_csv(&csv, session.ledger.records())?;
            println!("Updated row {row} in {}.", csv.display());
        }
        Commands::Remove { csv, row, yes } => {
            let mut session = load_unchecked(&csv)?;
            let removed = remove_course(&mut session, row, yes)?;
            import::write_courses_csv(&csv, session.ledger.records())?;
            println!("Removed {} from {}.", removed.code, csv.display());
        }
        Commands::Extract {
            pdf,
            endpoint,
            timeout_secs,
            scheme,
            out_csv,
        } => {
            let client = extract::ExtractionClient::new(endpoint, Duration::from_secs(timeout_secs))?;
            let response = client
                .extract_file(&pdf, scheme.as_deref())
                .await
                .context("Error processing PDF")?;

            let totals = extract::summarize(&response);
            let mut session = Session::default();
            session.load_extraction(&response);

            print!("{}", report::extraction_summary(&response));
            println!();
            println!(
                "SGPA {:.2} ({:.1}%) across {} credits, {:.1} credit points",
                totals.weighted_average,
                totals.derived_percentage,
                totals.total_credits,
                totals.total_weighted_points
            );
            if let Some(branch) = session.branch.as_deref() {
                println!(
                    "Branch: {}",
                    presets::branch_name(branch).unwrap_or(branch)
                );
            }

            if let Some(path) = out_csv {
                import::write_courses_csv(&path, session.ledger.records())?;
                println!("Courses written to {}.", path.display());
            }
        }
    }

    Ok(())
}

impl Labels {
    fn none() -> Self {
        Self {
            semester: None,
            branch: None,
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Builds a session from a course CSV, validating every row like a manual add.
fn load_session(csv: &Path, labels: Labels) -> anyhow::Result<Session> {
    let mut session = Session::new(labels.semester, labels.branch);
    for course in import::read_courses_csv(csv)? {
        // Rejected rows are reported and skipped.
        let _ = session.add_course(course);
    }
    print_messages(&mut session);
    Ok(session)
}

fn load_unchecked(csv: &Path) -> anyhow::Result<Session> {
    let mut session = Session::default();
    session.ledger = import::load_ledger_csv(csv)?;
    Ok(session)
}

/// Only a missing `--yes` gets the confirmation hint; a bad row number is
/// reported as is.
fn remove_course(session: &mut Session, row: usize, yes: bool) -> anyhow::Result<CourseRecord> {
    match session.ledger.remove_record(row, yes) {
        Ok(removed) => Ok(removed),
        Err(error @ LedgerError::Unconfirmed) => Err(anyhow::Error::new(error)
            .context("pass --yes to remove the course; this cannot be undone")),
        Err(error) => Err(error.into()),
    }
}

fn calculate(session: &mut Session) -> Option<AggregateResult> {
    let aggregate = session.calculate().ok();
    print_messages(session);
    aggregate
}

fn finish_loaded(session: &mut Session, out_csv: Option<&Path>) -> anyhow::Result<()> {
    print_messages(session);

    println!("{:<10} {:<35} {:<8} {}", "Code", "Name", "Credits", "Grade");
    for course in session.ledger.records() {
        println!(
            "{:<10} {:<35} {:<8} {}",
            course.code, course.name, course.credits, course.grade
        );
    }
    println!("Total credits: {}", session.ledger.total_credits());

    if let Some(path) = out_csv {
        import::write_courses_csv(path, session.ledger.records())?;
        println!("Courses written to {}.", path.display());
    }
    Ok(())
}

fn print_messages(session: &mut Session) {
    for message in session.take_messages() {
        match message.level {
            StatusLevel::Success => tracing::info!("{}", message.text),
            StatusLevel::Warning => eprintln!("warning: {}", message.text),
            StatusLevel::Error => eprintln!("error: {}", message.text),
        }
    }
}
