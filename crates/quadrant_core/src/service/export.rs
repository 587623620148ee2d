//! JSON export and import of the task and habit collections.
//!
//! # Responsibility
//! - Produce a versioned document for backup/transfer.
//! - Accept either such a document or a bare task array on import.
//!
//! # Invariants
//! - Import replaces only the collections present in the payload.
//! - A payload carrying neither collection is rejected.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::kv::KvStore;
use crate::model::habit::Habit;
use crate::model::task::Task;
use crate::service::store::{RestorePayload, TaskStore};

/// Current export document version.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Export file contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub format_version: u32,
    /// Unix epoch milliseconds.
    pub exported_at: i64,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

/// Error for export/import boundary operations.
#[derive(Debug)]
pub enum ExportError {
    Json(serde_json::Error),
    UnsupportedVersion(u32),
    Empty,
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid export json: {err}"),
            Self::UnsupportedVersion(version) => write!(
                f,
                "export format version {version} is newer than supported version {EXPORT_FORMAT_VERSION}"
            ),
            Self::Empty => write!(f, "export payload carries neither tasks nor habits"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnsupportedVersion(_) | Self::Empty => None,
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportShape {
    Tasks(Vec<Task>),
    Document(ImportDocument),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportDocument {
    #[serde(default)]
    format_version: Option<u32>,
    #[serde(default)]
    tasks: Option<Vec<Task>>,
    #[serde(default)]
    habits: Option<Vec<Habit>>,
}

/// Parses import text into a restore payload without touching any store.
pub fn parse_import(json: &str) -> Result<RestorePayload, ExportError> {
    let payload = match serde_json::from_str::<ImportShape>(json) {
        Ok(ImportShape::Tasks(tasks)) => RestorePayload {
            tasks: Some(tasks),
            habits: None,
        },
        Ok(ImportShape::Document(doc)) => {
            if let Some(version) = doc.format_version.filter(|v| *v > EXPORT_FORMAT_VERSION) {
                return Err(ExportError::UnsupportedVersion(version));
            }
            RestorePayload {
                tasks: doc.tasks,
                habits: doc.habits,
            }
        }
        // Untagged errors are opaque; re-parse as the shape the input looks like.
        Err(_) if json.trim_start().starts_with('[') => {
            let tasks: Vec<Task> = serde_json::from_str(json)?;
            RestorePayload {
                tasks: Some(tasks),
                habits: None,
            }
        }
        Err(_) => {
            let doc: ImportDocument = serde_json::from_str(json)?;
            RestorePayload {
                tasks: doc.tasks,
                habits: doc.habits,
            }
        }
    };

    if payload.tasks.is_none() && payload.habits.is_none() {
        return Err(ExportError::Empty);
    }
    Ok(payload)
}

impl<K: KvStore> TaskStore<K> {
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument {
            format_version: EXPORT_FORMAT_VERSION,
            exported_at: self.now_ms(),
            tasks: self.tasks().to_vec(),
            habits: self.habits().to_vec(),
        }
    }

    pub fn export_json(&self) -> Result<String, ExportError> {
        let document = self.export_document();
        let json = serde_json::to_string_pretty(&document)?;
        info!(
            "event=export module=export status=ok task_count={} habit_count={} bytes={}",
            document.tasks.len(),
            document.habits.len(),
            json.len()
        );
        Ok(json)
    }

    /// Parses `json` and restores whatever collections it carries.
    pub fn restore_from_json(&mut self, json: &str) -> Result<(), ExportError> {
        let payload = parse_import(json).inspect_err(|err| {
            warn!("event=import module=export status=error error={err}");
        })?;
        self.restore_tasks(payload);
        Ok(())
    }
}
