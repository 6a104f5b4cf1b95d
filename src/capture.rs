use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::models::{AttendanceSession, AttendanceStatus, ProposedEntry};
use crate::roster::Roster;

/// Produces a session proposal, one decision per roster student. The real
/// implementation would sit on a recognition pipeline; ours simulates one.
#[allow(async_fn_in_trait)]
pub trait CaptureCollaborator {
    async fn propose_session(&mut self, roster: &Roster) -> Vec<ProposedEntry>;
}

/// Delivers absence notifications for a committed session and reports how
/// many went out.
#[allow(async_fn_in_trait)]
pub trait NotificationCollaborator {
    async fn notify_absentees(&mut self, session: &AttendanceSession, roster: &Roster) -> usize;
}

const RECOGNITION_STAGES: [&str; 5] = [
    "detecting faces",
    "extracting face embeddings",
    "matching with database",
    "calculating confidence scores",
    "applying anti-spoofing checks",
];

const STAGE_DELAY: Duration = Duration::from_millis(600);
const SMS_DELAY: Duration = Duration::from_millis(2000);

pub struct SimulatedRecognizer {
    threshold: f64,
}

impl SimulatedRecognizer {
    pub fn new(threshold: f64) -> Self {
        SimulatedRecognizer { threshold }
    }
}

impl CaptureCollaborator for SimulatedRecognizer {
    async fn propose_session(&mut self, roster: &Roster) -> Vec<ProposedEntry> {
        for stage in RECOGNITION_STAGES {
            info!(stage, "recognition in progress");
            sleep(STAGE_DELAY).await;
        }

        let total = roster.len();
        if total == 0 {
            return Vec::new();
        }

        let mut rng = rand::thread_rng();
        let detected = ((total as f64 * 0.8).floor() as usize).min(total);
        let recognized = detected.saturating_sub(rng.gen_range(0..2)).max(1);
        let base_confidence = 85.0 + rng.gen::<f64>() * 12.0;
        let floor = (self.threshold * 100.0).max(75.0);
        info!(detected, recognized, "recognition complete");

        roster
            .all()
            .iter()
            .enumerate()
            .map(|(index, student)| {
                let present = index < recognized && rng.gen::<f64>() > 0.15;
                let confidence = if present {
                    (base_confidence - rng.gen::<f64>() * 15.0).max(floor)
                } else {
                    0.0
                };
                ProposedEntry {
                    student_id: student.id,
                    status: if present {
                        AttendanceStatus::Present
                    } else {
                        AttendanceStatus::Absent
                    },
                    confidence,
                }
            })
            .collect()
    }
}

/// SMS stub: logs each message instead of calling a delivery provider.
pub struct LoggedSms;

impl NotificationCollaborator for LoggedSms {
    async fn notify_absentees(&mut self, session: &AttendanceSession, roster: &Roster) -> usize {
        let absentees: Vec<_> = session
            .entries
            .iter()
            .filter(|e| e.status == AttendanceStatus::Absent)
            .collect();
        if absentees.is_empty() {
            info!("all students present, no sms notifications needed");
            return 0;
        }

        sleep(SMS_DELAY).await;
        let mut sent = 0;
        for entry in absentees {
            if let Some(student) = roster.find_by_id(entry.student_id) {
                info!(
                    phone = %student.parent_phone,
                    "sms sent: {} was absent on {}",
                    student.name,
                    session.date
                );
                sent += 1;
            }
        }
        info!(sent, "sms notifications sent to parents");
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use chrono::NaiveDate;

    fn roster_of(count: u32) -> Roster {
        let mut roster = Roster::default();
        for i in 1..=count {
            roster
                .add_student(
                    &format!("Student {i}"),
                    &format!("10A-{i:02}"),
                    "10A",
                    &format!("90000000{i:02}"),
                )
                .unwrap();
        }
        roster
    }

    #[tokio::test(start_paused = true)]
    async fn recognizer_decides_every_roster_student() {
        let roster = roster_of(6);
        let mut recognizer = SimulatedRecognizer::new(0.85);
        let proposal = recognizer.propose_session(&roster).await;

        assert_eq!(proposal.len(), 6);
        for entry in &proposal {
            assert!(roster.find_by_id(entry.student_id).is_some());
            match entry.status {
                AttendanceStatus::Present => {
                    assert!(entry.confidence >= 75.0 && entry.confidence < 100.0)
                }
                AttendanceStatus::Absent => assert_eq!(entry.confidence, 0.0),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recognizer_yields_nothing_for_empty_roster() {
        let mut recognizer = SimulatedRecognizer::new(0.85);
        assert!(recognizer.propose_session(&Roster::default()).await.is_empty());
    }

    // Any collaborator can stand in for the recognizer; a scripted one makes
    // the capture-to-commit path deterministic.
    struct FixedCapture(Vec<ProposedEntry>);

    impl CaptureCollaborator for FixedCapture {
        async fn propose_session(&mut self, _roster: &Roster) -> Vec<ProposedEntry> {
            self.0.clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_proposal_commits_and_notifies() {
        let roster = roster_of(3);
        let mut capture = FixedCapture(vec![
            ProposedEntry {
                student_id: 1,
                status: AttendanceStatus::Present,
                confidence: 93.0,
            },
            ProposedEntry {
                student_id: 2,
                status: AttendanceStatus::Absent,
                confidence: 0.0,
            },
            ProposedEntry {
                student_id: 3,
                status: AttendanceStatus::Absent,
                confidence: 0.0,
            },
        ]);

        let proposal = capture.propose_session(&roster).await;
        let mut ledger = Ledger::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let session = ledger
            .commit_session(&roster, date, &proposal, "recognition")
            .unwrap()
            .clone();

        let sent = LoggedSms.notify_absentees(&session, &roster).await;
        assert_eq!(sent, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn no_absentees_means_no_sms() {
        let roster = roster_of(1);
        let mut ledger = Ledger::default();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let session = ledger
            .commit_session(
                &roster,
                date,
                &[ProposedEntry {
                    student_id: 1,
                    status: AttendanceStatus::Present,
                    confidence: 90.0,
                }],
                "recognition",
            )
            .unwrap()
            .clone();

        assert_eq!(LoggedSms.notify_absentees(&session, &roster).await, 0);
    }
}
