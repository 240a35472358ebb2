use std::collections::BTreeMap;

use chrono::prelude::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    // low < medium < high < urgent
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Urgent => 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    Education,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Education => "education",
            Category::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_done: bool,
    pub priority: Priority,
    pub category: Category,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-keyed validation messages, serialized as the 400 response body.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(pub BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field, message.into());
        ValidationErrors(errors)
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Write body for create and full replace. Unknown fields are ignored.
#[derive(Deserialize, Debug, Clone)]
pub struct TaskPayload {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Write body for partial updates; only present fields are validated and applied.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_done: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Whitelisted fields for bulk updates; anything else in the request's
/// `updates` map is dropped during deserialization.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskBulkUpdate {
    #[serde(default)]
    pub is_done: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl TaskBulkUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_done.is_none() && self.priority.is_none() && self.category.is_none()
    }
}

fn validate_title(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Task title cannot be empty.".to_string());
    }
    if trimmed.chars().count() < 3 {
        return Err("Task title must be at least 3 characters long.".to_string());
    }
    if trimmed.chars().count() > 200 {
        return Err("Task title must be at most 200 characters long.".to_string());
    }
    Ok(trimmed.to_string())
}

// A past due date is only acceptable when the same write marks the task done.
fn validate_due_date(
    due_date: Option<DateTime<Utc>>,
    marking_done: bool,
    now: DateTime<Utc>,
) -> Result<(), String> {
    match due_date {
        Some(due) if due < now && !marking_done => {
            Err("Due date cannot be in the past for incomplete tasks.".to_string())
        }
        _ => Ok(()),
    }
}

impl TaskPayload {
    /// Returns the payload with its title trimmed, or the full set of
    /// field errors.
    pub fn validate(mut self, now: DateTime<Utc>) -> Result<TaskPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        match validate_title(&self.title) {
            Ok(trimmed) => self.title = trimmed,
            Err(message) => errors.insert("title", message),
        }
        if let Err(message) = validate_due_date(self.due_date, self.is_done, now) {
            errors.insert("due_date", message);
        }
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}

impl TaskPatch {
    /// Validates only the fields present in the patch. An absent `is_done`
    /// counts as "not being marked done" for the due-date rule.
    pub fn validate(mut self, now: DateTime<Utc>) -> Result<TaskPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(raw) = self.title.take() {
            match validate_title(&raw) {
                Ok(trimmed) => self.title = Some(trimmed),
                Err(message) => errors.insert("title", message),
            }
        }
        let marking_done = self.is_done == Some(true);
        if let Err(message) = validate_due_date(self.due_date, marking_done, now) {
            errors.insert("due_date", message);
        }
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}
