//! Match prediction store: local CRUD over one JSON file.
//!
//! The whole store is a single JSON array of records, loaded and rewritten
//! as one atomic unit (write-to-temp-then-rename). There is no field-level
//! concurrency control — the single-dispatcher execution model is the only
//! writer. Storage failures are swallowed: on read the store degrades to
//! empty, on write the in-memory result still stands and durability is
//! silently lost (e.g. read-only config directories).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted confidence value.
const CONFIDENCE_MAX: u8 = 100;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-layer errors. Only surfaced internally — every public store
/// operation recovers by degrading, per the silent-failure contract.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// ============================================================================
// Records
// ============================================================================

/// A 1X2 pick for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pick {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    Away,
}

impl Pick {
    pub fn label(&self) -> &'static str {
        match self {
            Pick::None => "-",
            Pick::Home => "HOME",
            Pick::Draw => "DRAW",
            Pick::Away => "AWAY",
        }
    }
}

/// One saved match prediction.
///
/// Field names follow the original on-disk shape (camelCase, millisecond
/// timestamps) so existing stores keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchRecord {
    pub id: String,
    pub league: String,
    pub home: String,
    pub away: String,
    /// Kickoff as a millisecond timestamp; `None` when not scheduled.
    pub kickoff: Option<i64>,
    pub pick: Pick,
    pub confidence: Option<u8>,
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Default for MatchRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            league: String::new(),
            home: String::new(),
            away: String::new(),
            kickoff: None,
            pick: Pick::None,
            confidence: None,
            notes: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Partial update applied through [`MatchStore::upsert`].
///
/// `None` fields are retained from the existing record; a patch without an
/// `id` (or with an unknown one) inserts a new record at the front.
#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    pub id: Option<String>,
    pub league: Option<String>,
    pub home: Option<String>,
    pub away: Option<String>,
    pub kickoff: Option<Option<i64>>,
    pub pick: Option<Pick>,
    pub confidence: Option<Option<u8>>,
    pub notes: Option<String>,
}

impl MatchPatch {
    pub fn for_record(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    fn apply(self, record: &mut MatchRecord) {
        if let Some(league) = self.league {
            record.league = league;
        }
        if let Some(home) = self.home {
            record.home = home;
        }
        if let Some(away) = self.away {
            record.away = away;
        }
        if let Some(kickoff) = self.kickoff {
            record.kickoff = kickoff;
        }
        if let Some(pick) = self.pick {
            record.pick = pick;
        }
        if let Some(confidence) = self.confidence {
            record.confidence = confidence;
        }
        if let Some(notes) = self.notes {
            record.notes = notes;
        }
    }
}

/// Starter analysis text offered when a record has no notes yet.
pub fn analysis_template(record: &MatchRecord) -> String {
    let mut out = String::from("Quick read:\n");
    out.push_str(&format!("• Match: {} vs {}\n", record.home, record.away));
    if !record.league.is_empty() {
        out.push_str(&format!("• League: {}\n", record.league));
    }
    if let Some(kickoff) = record.kickoff {
        if let Some(t) = chrono::DateTime::<Utc>::from_timestamp_millis(kickoff) {
            out.push_str(&format!("• Kickoff: {}\n", t.format("%Y-%m-%d %H:%M UTC")));
        }
    }
    out.push_str("\nNotes to consider:\n");
    out.push_str("• Form / injuries / motivation\n");
    out.push_str("• Home advantage, schedule, weather\n");
    out
}

// ============================================================================
// Sanitation
// ============================================================================

/// Sanitize a raw confidence input: digits only, clamped to [0, 100].
/// Empty (after stripping) clears the field.
pub fn sanitize_confidence(raw: &str) -> Option<u8> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).take(3).collect();
    if digits.is_empty() {
        return None;
    }
    let value: u16 = digits.parse().unwrap_or(u16::from(CONFIDENCE_MAX));
    Some(value.min(u16::from(CONFIDENCE_MAX)) as u8)
}

// ============================================================================
// Store
// ============================================================================

/// Process-local counter disambiguating ids generated in the same
/// millisecond.
static ID_SEQ: AtomicU64 = AtomicU64::new(0);

fn generate_id() -> String {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("m_{}_{:04x}", Utc::now().timestamp_millis(), seq)
}

/// JSON-file-backed store of [`MatchRecord`]s.
pub struct MatchStore {
    path: PathBuf,
}

impl MatchStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, most recently created first.
    ///
    /// Missing or corrupt storage yields an empty list, never an error.
    pub fn list(&self) -> Vec<MatchRecord> {
        match self.read() {
            Ok(records) => records,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Match store unreadable, starting empty");
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<MatchRecord> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Insert or patch a record; the whole list is rewritten atomically.
    ///
    /// A patch whose `id` matches an existing record shallow-merges into it
    /// and refreshes `updated_at`. Otherwise a new record is inserted at
    /// the front with a generated id and both timestamps set to now.
    /// Returns the committed record.
    pub fn upsert(&self, patch: MatchPatch) -> MatchRecord {
        let now = Utc::now().timestamp_millis();
        let mut records = self.list();

        let existing = patch
            .id
            .as_deref()
            .and_then(|id| records.iter().position(|r| r.id == id));

        let committed = match existing {
            Some(idx) => {
                patch.apply(&mut records[idx]);
                records[idx].updated_at = now;
                records[idx].clone()
            }
            None => {
                let mut record = MatchRecord {
                    id: patch.id.clone().unwrap_or_else(generate_id),
                    created_at: now,
                    updated_at: now,
                    ..MatchRecord::default()
                };
                patch.apply(&mut record);
                records.insert(0, record.clone());
                record
            }
        };

        self.save(&records);
        committed
    }

    /// Delete the record with the given id; atomic rewrite.
    pub fn remove(&self, id: &str) {
        let mut records = self.list();
        records.retain(|r| r.id != id);
        self.save(&records);
    }

    fn read(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Atomic whole-list rewrite: write a temp file, fsync, rename over the
    /// store. Failures are swallowed — durability degrades silently.
    fn save(&self, records: &[MatchRecord]) {
        if let Err(e) = self.try_save(records) {
            tracing::warn!(path = %self.path.display(), error = %e, "Match store write failed, changes not persisted");
        }
    }

    fn try_save(&self, records: &[MatchRecord]) -> Result<(), StoreError> {
        use std::io::Write;

        let json = serde_json::to_string_pretty(records)?;
        let temp_path = self.path.with_extension(format!(
            "tmp.{:016x}",
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));

        let mut temp = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        if let Err(e) = temp
            .write_all(json.as_bytes())
            .and_then(|_| temp.sync_all())
        {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        drop(temp);

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
