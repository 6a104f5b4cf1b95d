use std::fmt::Write;

use chrono::NaiveDate;

use crate::ledger::Ledger;
use crate::models::Settings;
use crate::roster::Roster;
use crate::stats;

const RECENT_ENTRY_LIMIT: usize = 20;

pub fn build_report(
    settings: &Settings,
    roster: &Roster,
    ledger: &Ledger,
    today: NaiveDate,
) -> String {
    let dashboard = stats::compute(roster, ledger, today);
    let mut output = String::new();

    let _ = writeln!(output, "# {} Attendance Report", settings.school_name);
    let _ = writeln!(
        output,
        "Generated for {} ({}, {})",
        today, settings.principal_name, settings.school_address
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Summary");
    let _ = writeln!(
        output,
        "- Present: {} of {} students",
        dashboard.present_today,
        roster.len()
    );
    let _ = writeln!(output, "- Absent: {}", dashboard.absent_today);
    let _ = writeln!(output, "- Attendance rate: {:.1}%", dashboard.attendance_rate);
    let _ = writeln!(output, "- Days on record: {}", dashboard.total_days);

    let _ = writeln!(output);
    let _ = writeln!(output, "## 7-Day Trend");
    for point in &dashboard.seven_day_trend {
        let _ = writeln!(
            output,
            "- {}: {} present, {} absent",
            point.date, point.present, point.absent
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Student Attendance");
    if roster.is_empty() {
        let _ = writeln!(output, "No students enrolled.");
    } else {
        let mut rows: Vec<_> = roster
            .all()
            .iter()
            .map(|student| {
                let records = ledger.records_for_student(student.id);
                let rate = stats::student_attendance_rate(ledger, student.id);
                (student, rate, records.len())
            })
            .collect();
        rows.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        for (student, rate, record_count) in rows {
            let _ = writeln!(
                output,
                "- {} ({}, {}): {:.1}% across {} records",
                student.name, student.roll_no, student.class, rate, record_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Entries");
    let mut recent: Vec<_> = ledger
        .all_sessions()
        .iter()
        .flat_map(|session| {
            session
                .entries
                .iter()
                .map(move |entry| (session.date, &session.method, entry))
        })
        .collect();

    if recent.is_empty() {
        let _ = writeln!(output, "No attendance records found.");
    } else {
        let skip = recent.len().saturating_sub(RECENT_ENTRY_LIMIT);
        recent.drain(..skip);
        for (date, method, entry) in recent.iter().rev() {
            let _ = writeln!(
                output,
                "- {} {}: {} at {} via {}",
                date,
                entry.student_name,
                entry.status.as_str(),
                entry.timestamp.format("%H:%M"),
                method
            );
        }
    }

    output
}
