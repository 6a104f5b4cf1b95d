use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::ledger::Ledger;
use crate::models::{AttendanceSession, Settings, Student};
use crate::roster::Roster;

const ROSTER_KEY: &str = "attendance_students";
const LEDGER_KEY: &str = "attendance_records";
const SETTINGS_KEY: &str = "attendance_settings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Write-through persistence for the three storage keys, one JSON file per
/// key under the data directory.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: PathBuf) -> Self {
        Store { data_dir }
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartattend")
    }

    /// Loads all three keys. A missing file is normal (first run); a key
    /// that fails to read or parse is logged and replaced with its default,
    /// leaving the other keys intact.
    pub fn load_all(&self) -> (Roster, Ledger, Settings) {
        let students: Vec<Student> = self.read_key(ROSTER_KEY);
        let sessions: Vec<AttendanceSession> = self.read_key(LEDGER_KEY);
        let settings: Settings = self.read_key(SETTINGS_KEY);
        (Roster::new(students), Ledger::new(sessions), settings)
    }

    pub fn save_all(
        &self,
        roster: &Roster,
        ledger: &Ledger,
        settings: &Settings,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        self.write_key(ROSTER_KEY, roster.all())?;
        self.write_key(LEDGER_KEY, ledger.all_sessions())?;
        self.write_key(SETTINGS_KEY, settings)?;
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    fn read_key<T: Default + DeserializeOwned>(&self, key: &str) -> T {
        let path = self.key_path(key);
        if !path.exists() {
            return T::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(StoreError::from)
            .and_then(|raw| Ok(serde_json::from_str(&raw)?));
        match parsed {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "failed to load saved data, continuing with defaults");
                T::default()
            }
        }
    }

    fn write_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(self.key_path(key), raw)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    name: String,
    roll_no: String,
    class: String,
    parent_phone: String,
}

/// Runs every CSV row through the regular roster validation. Bad rows are
/// skipped and reported one by one; good rows are added in file order.
pub fn import_students(roster: &mut Roster, csv_path: &Path) -> Result<ImportReport, StoreError> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut report = ImportReport::default();

    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        // Header is line 1, so the first data row is line 2.
        let line = index + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                report.errors.push(format!("row {line}: {err}"));
                continue;
            }
        };
        match roster.add_student(&row.name, &row.roll_no, &row.class, &row.parent_phone) {
            Ok(_) => report.imported += 1,
            Err(err) => report.errors.push(format!("row {line}: {err}")),
        }
    }

    Ok(report)
}

pub fn export_students(roster: &Roster, out_path: &Path) -> Result<usize, StoreError> {
    let mut writer = csv::Writer::from_path(out_path)?;
    for student in roster.all() {
        writer.serialize(student)?;
    }
    writer.flush()?;
    Ok(roster.len())
}
