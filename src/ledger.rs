use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::models::{AttendanceEntry, AttendanceSession, AttendanceStatus, ProposedEntry};
use crate::roster::Roster;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("proposed session references unknown student id {0}")]
    UnknownStudent(u32),
}

#[derive(Debug, Default, Clone)]
pub struct Ledger {
    sessions: Vec<AttendanceSession>,
}

impl Ledger {
    pub fn new(sessions: Vec<AttendanceSession>) -> Self {
        Ledger { sessions }
    }

    /// Commits one session for `date`, replacing any prior session for the
    /// same date. Every proposed entry is resolved against the roster before
    /// anything is mutated, so a bad entry rejects the session whole.
    pub fn commit_session(
        &mut self,
        roster: &Roster,
        date: NaiveDate,
        proposed: &[ProposedEntry],
        method: &str,
    ) -> Result<&AttendanceSession, LedgerError> {
        let now = Utc::now();
        let mut entries = Vec::with_capacity(proposed.len());
        for entry in proposed {
            let student = roster
                .find_by_id(entry.student_id)
                .ok_or(LedgerError::UnknownStudent(entry.student_id))?;
            let confidence = match entry.status {
                AttendanceStatus::Present => entry.confidence.clamp(0.0, 100.0),
                AttendanceStatus::Absent => 0.0,
            };
            entries.push(AttendanceEntry {
                student_id: student.id,
                student_name: student.name.clone(),
                status: entry.status,
                timestamp: now,
                confidence,
            });
        }

        self.sessions.retain(|s| s.date != date);
        self.sessions.push(AttendanceSession {
            date,
            entries,
            method: method.to_string(),
            recorded_at: now,
        });
        Ok(&self.sessions[self.sessions.len() - 1])
    }

    pub fn session_for_date(&self, date: NaiveDate) -> Option<&AttendanceSession> {
        self.sessions.iter().find(|s| s.date == date)
    }

    /// Sessions in order of commitment, not date order.
    pub fn all_sessions(&self) -> &[AttendanceSession] {
        &self.sessions
    }

    pub fn records_for_student(&self, student_id: u32) -> Vec<&AttendanceEntry> {
        self.sessions
            .iter()
            .flat_map(|s| s.entries.iter())
            .filter(|e| e.student_id == student_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        let mut roster = Roster::default();
        roster
            .add_student("Asha Verma", "10A-01", "10A", "9876543210")
            .unwrap();
        roster
            .add_student("Rohan Gupta", "10A-02", "10A", "9123456780")
            .unwrap();
        roster
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn present(student_id: u32, confidence: f64) -> ProposedEntry {
        ProposedEntry {
            student_id,
            status: AttendanceStatus::Present,
            confidence,
        }
    }

    fn absent(student_id: u32) -> ProposedEntry {
        ProposedEntry {
            student_id,
            status: AttendanceStatus::Absent,
            confidence: 0.0,
        }
    }

    #[test]
    fn commit_records_session_with_resolved_names() {
        let mut ledger = Ledger::default();
        let session = ledger
            .commit_session(
                &roster(),
                date("2024-01-10"),
                &[present(1, 91.5), absent(2)],
                "recognition",
            )
            .unwrap();

        assert_eq!(session.method, "recognition");
        assert_eq!(session.entries.len(), 2);
        assert_eq!(session.entries[0].student_name, "Asha Verma");
        assert_eq!(session.entries[0].status, AttendanceStatus::Present);

        let found = ledger.session_for_date(date("2024-01-10")).unwrap();
        assert_eq!(found.entries.len(), 2);
    }

    #[test]
    fn unknown_student_aborts_the_whole_commit() {
        let mut ledger = Ledger::default();
        let err = ledger
            .commit_session(
                &roster(),
                date("2024-01-10"),
                &[present(1, 90.0), present(99, 88.0)],
                "recognition",
            )
            .unwrap_err();

        assert_eq!(err, LedgerError::UnknownStudent(99));
        assert!(ledger.session_for_date(date("2024-01-10")).is_none());
        assert!(ledger.all_sessions().is_empty());
    }

    #[test]
    fn same_date_commit_replaces_and_moves_to_end() {
        let mut ledger = Ledger::default();
        let roster = roster();
        ledger
            .commit_session(&roster, date("2024-01-09"), &[present(1, 90.0)], "recognition")
            .unwrap();
        ledger
            .commit_session(&roster, date("2024-01-10"), &[present(1, 90.0)], "recognition")
            .unwrap();
        ledger
            .commit_session(&roster, date("2024-01-09"), &[absent(1), absent(2)], "recognition")
            .unwrap();

        let replaced = ledger.session_for_date(date("2024-01-09")).unwrap();
        assert_eq!(replaced.entries.len(), 2);
        assert_eq!(replaced.entries[0].status, AttendanceStatus::Absent);

        let order: Vec<NaiveDate> = ledger.all_sessions().iter().map(|s| s.date).collect();
        assert_eq!(order, vec![date("2024-01-10"), date("2024-01-09")]);
    }

    #[test]
    fn absent_entries_carry_zero_confidence() {
        let mut ledger = Ledger::default();
        let session = ledger
            .commit_session(
                &roster(),
                date("2024-01-10"),
                &[ProposedEntry {
                    student_id: 2,
                    status: AttendanceStatus::Absent,
                    confidence: 42.0,
                }],
                "recognition",
            )
            .unwrap();
        assert_eq!(session.entries[0].confidence, 0.0);
    }

    #[test]
    fn records_for_student_spans_sessions_in_order() {
        let mut ledger = Ledger::default();
        let roster = roster();
        ledger
            .commit_session(&roster, date("2024-01-09"), &[present(1, 90.0), absent(2)], "recognition")
            .unwrap();
        ledger
            .commit_session(&roster, date("2024-01-10"), &[absent(1)], "recognition")
            .unwrap();

        let records = ledger.records_for_student(1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, AttendanceStatus::Present);
        assert_eq!(records[1].status, AttendanceStatus::Absent);
        assert_eq!(ledger.records_for_student(2).len(), 1);
        assert!(ledger.records_for_student(99).is_empty());
    }
}
