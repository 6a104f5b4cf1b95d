use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::ledger::Ledger;
use crate::models::{AttendanceStatus, DashboardStats, TrendPoint};
use crate::roster::Roster;

/// Derives the dashboard numbers from roster and ledger snapshots. Pure:
/// `today` is injected by the caller, nothing is cached between calls.
pub fn compute(roster: &Roster, ledger: &Ledger, today: NaiveDate) -> DashboardStats {
    let today_session = ledger.session_for_date(today);

    let present_today = today_session.map_or(0, |session| {
        session
            .entries
            .iter()
            .filter(|e| e.status == AttendanceStatus::Present)
            .count()
    });
    let absent_today = roster.len().saturating_sub(present_today);

    let attendance_rate = if roster.is_empty() {
        0.0
    } else {
        round1(present_today as f64 / roster.len() as f64 * 100.0)
    };

    let distinct_days: HashSet<NaiveDate> =
        ledger.all_sessions().iter().map(|s| s.date).collect();

    DashboardStats {
        present_today,
        absent_today,
        attendance_rate,
        total_days: distinct_days.len(),
        sms_sent_today: today_session.map_or(0, |s| s.entries.len()),
        seven_day_trend: seven_day_trend(ledger, today),
    }
}

/// Exactly 7 points covering today and the 6 preceding days, oldest first.
/// Days without a committed session are zero-filled; counts are the explicit
/// present/absent entries of that day's session.
pub fn seven_day_trend(ledger: &Ledger, today: NaiveDate) -> Vec<TrendPoint> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let (present, absent) = ledger.session_for_date(date).map_or((0, 0), |session| {
                let present = session
                    .entries
                    .iter()
                    .filter(|e| e.status == AttendanceStatus::Present)
                    .count();
                (present, session.entries.len() - present)
            });
            TrendPoint {
                date,
                present,
                absent,
            }
        })
        .collect()
}

/// Historical rate for one student across every session, 0 with no records.
pub fn student_attendance_rate(ledger: &Ledger, student_id: u32) -> f64 {
    let records = ledger.records_for_student(student_id);
    if records.is_empty() {
        return 0.0;
    }
    let present = records
        .iter()
        .filter(|e| e.status == AttendanceStatus::Present)
        .count();
    round1(present as f64 / records.len() as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
