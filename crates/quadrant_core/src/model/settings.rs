//! Process-wide user settings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::task::{Category, DurationUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "zh" => Some(Self::Zh),
            _ => None,
        }
    }
}

/// Settings snapshot. Every field except `selected_date` has its own slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub hardcore_mode: bool,
    pub ai_mode: bool,
    pub language: Language,
    pub last_duration_unit: DurationUnit,
    /// Day the planner view is focused on; session-only.
    pub selected_date: NaiveDate,
}

impl Settings {
    /// Hardcore mode locks already-triaged tasks for presentation callers.
    /// The store itself never consults this.
    pub fn allows_editing(&self, category: Category) -> bool {
        !self.hardcore_mode || category == Category::Inbox
    }
}
