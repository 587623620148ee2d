//! Slot keys. Each key is an independent durable value.

pub const TASKS: &str = "tasks";
pub const HABITS: &str = "habits";
pub const HARDCORE_MODE: &str = "hardcore_mode";
pub const AI_MODE: &str = "ai_mode";
pub const LANGUAGE: &str = "language";
pub const LAST_DURATION_UNIT: &str = "last_duration_unit";

pub const ALL: [&str; 6] = [
    TASKS,
    HABITS,
    HARDCORE_MODE,
    AI_MODE,
    LANGUAGE,
    LAST_DURATION_UNIT,
];
