use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: u32,
    pub name: String,
    pub roll_no: String,
    pub class: String,
    pub parent_phone: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub student_id: u32,
    pub student_name: String,
    pub status: AttendanceStatus,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
    pub method: String,
    pub recorded_at: DateTime<Utc>,
}

/// Untrusted per-student decision supplied by a capture collaborator.
#[derive(Debug, Clone)]
pub struct ProposedEntry {
    pub student_id: u32,
    pub status: AttendanceStatus,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AntiSpoofingLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub school_name: String,
    pub principal_name: String,
    pub school_address: String,
    pub recognition_threshold: f64,
    pub anti_spoofing_level: AntiSpoofingLevel,
    pub sms_enabled: bool,
    pub daily_reports: bool,
    pub weekly_reports: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            school_name: "School Name".to_string(),
            principal_name: "Principal Name".to_string(),
            school_address: "School Address".to_string(),
            recognition_threshold: 0.85,
            anti_spoofing_level: AntiSpoofingLevel::Medium,
            sms_enabled: true,
            daily_reports: true,
            weekly_reports: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub present: usize,
    pub absent: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub present_today: usize,
    pub absent_today: usize,
    pub attendance_rate: f64,
    pub total_days: usize,
    pub sms_sent_today: usize,
    pub seven_day_trend: Vec<TrendPoint>,
}
