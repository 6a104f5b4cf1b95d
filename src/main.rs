use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod capture;
mod ledger;
mod models;
mod report;
mod roster;
mod stats;
mod store;

use capture::{CaptureCollaborator, LoggedSms, NotificationCollaborator, SimulatedRecognizer};
use ledger::Ledger;
use models::AntiSpoofingLevel;
use roster::{Roster, StudentUpdate};
use store::Store;

#[derive(Parser)]
#[command(name = "smartattend")]
#[command(about = "Roster and attendance tracker with simulated face recognition", long_about = None)]
struct Cli {
    /// Directory holding the saved roster, attendance and settings files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a small sample roster
    Seed,
    /// Add a single student
    AddStudent {
        #[arg(long)]
        name: String,
        #[arg(long)]
        roll_no: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        phone: String,
    },
    /// Change fields of an existing student
    #[command(group(
        ArgGroup::new("fields")
            .args(["name", "roll_no", "class", "phone"])
            .multiple(true)
            .required(true)
    ))]
    EditStudent {
        #[arg(long)]
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        roll_no: Option<String>,
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List the roster with per-student attendance rates
    ListStudents,
    /// Import students from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export the roster to a CSV file
    Export {
        #[arg(long, default_value = "students_export.csv")]
        out: PathBuf,
    },
    /// Run simulated recognition and record today's attendance
    Capture {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show dashboard statistics
    Stats {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate a markdown attendance report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show or change application settings
    Settings {
        #[arg(long)]
        school_name: Option<String>,
        #[arg(long)]
        principal_name: Option<String>,
        #[arg(long)]
        school_address: Option<String>,
        #[arg(long)]
        recognition_threshold: Option<f64>,
        #[arg(long)]
        anti_spoofing_level: Option<AntiSpoofingLevel>,
        #[arg(long)]
        sms_enabled: Option<bool>,
        #[arg(long)]
        daily_reports: Option<bool>,
        #[arg(long)]
        weekly_reports: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smartattend=info")),
        )
        .init();

    let cli = Cli::parse();
    let store = Store::new(cli.data_dir.unwrap_or_else(Store::default_dir));
    let (mut roster, mut ledger, mut settings) = store.load_all();
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Seed => {
            let samples = [
                ("Asha Verma", "10A-01", "10A", "+919876543210"),
                ("Rohan Gupta", "10A-02", "10A", "+919123456780"),
                ("Meera Iyer", "10A-03", "10A", "+919988776655"),
                ("Kabir Shah", "10A-04", "10A", "+919871234567"),
            ];
            for (name, roll_no, class, phone) in samples {
                match roster.add_student(name, roll_no, class, phone) {
                    Ok(student) => println!("Added {} ({}).", student.name, student.roll_no),
                    Err(err) => println!("Skipped {roll_no}: {err}."),
                }
            }
            persist(&store, &roster, &ledger, &settings);
        }
        Commands::AddStudent {
            name,
            roll_no,
            class,
            phone,
        } => {
            let student = roster.add_student(&name, &roll_no, &class, &phone)?.clone();
            persist(&store, &roster, &ledger, &settings);
            println!(
                "Added {} ({}, {}) with id {}.",
                student.name, student.roll_no, student.class, student.id
            );
        }
        Commands::EditStudent {
            id,
            name,
            roll_no,
            class,
            phone,
        } => {
            let update = StudentUpdate {
                name,
                roll_no,
                class,
                parent_phone: phone,
            };
            let student = roster.update_student(id, update)?.clone();
            persist(&store, &roster, &ledger, &settings);
            println!(
                "Updated student {}: {} ({}, {}), phone {}.",
                student.id, student.name, student.roll_no, student.class, student.parent_phone
            );
        }
        Commands::ListStudents => {
            if roster.is_empty() {
                println!("No students enrolled.");
            } else {
                for student in roster.all() {
                    let rate = stats::student_attendance_rate(&ledger, student.id);
                    println!(
                        "- #{} {} ({}, {}) attendance {:.1}% phone {}",
                        student.id,
                        student.name,
                        student.roll_no,
                        student.class,
                        rate,
                        student.parent_phone
                    );
                }
            }
        }
        Commands::Import { csv } => {
            let report = store::import_students(&mut roster, &csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            persist(&store, &roster, &ledger, &settings);
            println!(
                "Imported {} students from {}.",
                report.imported,
                csv.display()
            );
            for error in &report.errors {
                println!("  {error}");
            }
        }
        Commands::Export { out } => {
            let count = store::export_students(&roster, &out)
                .with_context(|| format!("failed to export to {}", out.display()))?;
            println!("Exported {count} students to {}.", out.display());
        }
        Commands::Capture { date } => {
            if roster.is_empty() {
                println!("No students found. Add students before taking attendance.");
                return Ok(());
            }
            let date = date.unwrap_or(today);
            let mut recognizer = SimulatedRecognizer::new(settings.recognition_threshold);
            let proposal = recognizer.propose_session(&roster).await;
            let session = ledger
                .commit_session(&roster, date, &proposal, "recognition")?
                .clone();
            if settings.sms_enabled {
                LoggedSms.notify_absentees(&session, &roster).await;
            }
            persist(&store, &roster, &ledger, &settings);

            let dashboard = stats::compute(&roster, &ledger, date);
            println!(
                "Attendance saved for {date}: {} present, {} absent ({:.1}%).",
                dashboard.present_today, dashboard.absent_today, dashboard.attendance_rate
            );
        }
        Commands::Stats { date } => {
            let date = date.unwrap_or(today);
            let dashboard = stats::compute(&roster, &ledger, date);
            println!("Attendance for {date}:");
            println!("- Students: {}", roster.len());
            println!("- Present: {}", dashboard.present_today);
            println!("- Absent: {}", dashboard.absent_today);
            println!("- Attendance rate: {:.1}%", dashboard.attendance_rate);
            println!("- Days on record: {}", dashboard.total_days);
            println!("- SMS sent today: {}", dashboard.sms_sent_today);
            println!("7-day trend:");
            for point in &dashboard.seven_day_trend {
                println!(
                    "- {}: {} present, {} absent",
                    point.date, point.present, point.absent
                );
            }
        }
        Commands::Report { out, date } => {
            let date = date.unwrap_or(today);
            let report = report::build_report(&settings, &roster, &ledger, date);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Settings {
            school_name,
            principal_name,
            school_address,
            recognition_threshold,
            anti_spoofing_level,
            sms_enabled,
            daily_reports,
            weekly_reports,
        } => {
            if let Some(threshold) = recognition_threshold {
                anyhow::ensure!(
                    (0.0..=1.0).contains(&threshold),
                    "recognition threshold must be between 0 and 1"
                );
                settings.recognition_threshold = threshold;
            }
            let mut changed = recognition_threshold.is_some();
            for (slot, value) in [
                (&mut settings.school_name, school_name),
                (&mut settings.principal_name, principal_name),
                (&mut settings.school_address, school_address),
            ] {
                if let Some(value) = value {
                    *slot = value;
                    changed = true;
                }
            }
            if let Some(level) = anti_spoofing_level {
                settings.anti_spoofing_level = level;
                changed = true;
            }
            for (slot, value) in [
                (&mut settings.sms_enabled, sms_enabled),
                (&mut settings.daily_reports, daily_reports),
                (&mut settings.weekly_reports, weekly_reports),
            ] {
                if let Some(value) = value {
                    *slot = value;
                    changed = true;
                }
            }
            if changed {
                persist(&store, &roster, &ledger, &settings);
                println!("Settings saved.");
            }
            println!("School: {}", settings.school_name);
            println!("Principal: {}", settings.principal_name);
            println!("Address: {}", settings.school_address);
            println!(
                "Recognition threshold: {:.0}%",
                settings.recognition_threshold * 100.0
            );
            println!("Anti-spoofing level: {:?}", settings.anti_spoofing_level);
            println!("SMS notifications: {}", settings.sms_enabled);
            println!("Daily reports: {}", settings.daily_reports);
            println!("Weekly reports: {}", settings.weekly_reports);
        }
    }

    Ok(())
}

// Write-through after a mutation; a persist failure is a warning, the
// in-memory state stays authoritative until the next successful save.
fn persist(store: &Store, roster: &Roster, ledger: &Ledger, settings: &models::Settings) {
    if let Err(err) = store.save_all(roster, ledger, settings) {
        warn!(error = %err, "failed to persist attendance data, continuing in memory");
    }
}
