//! Filtering, ordering, pagination and statistics over the task table.
//!
//! Every function takes `now` explicitly so temporal buckets (overdue, today,
//! this week) are deterministic under test.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::prelude::{DateTime, Utc};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::task::{Category, Priority, Task};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    Overdue,
    Today,
    ThisWeek,
}

/// Listing parameters; all optional, combined with logical AND.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskQuery {
    pub is_done: Option<bool>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub due_filter: Option<DueFilter>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TaskPage {
    pub count: usize,
    pub page: usize,
    pub page_size: usize,
    pub results: Vec<Task>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub completion_rate: f64,
    pub overdue_tasks: usize,
    pub priority_stats: BTreeMap<&'static str, usize>,
    pub category_stats: BTreeMap<&'static str, usize>,
}

fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    matches!(task.due_date, Some(due) if due < now) && !task.is_done
}

fn due_within(task: &Task, now: DateTime<Utc>, window: Duration) -> bool {
    matches!(task.due_date, Some(due) if due >= now && due < now + window)
}

fn matches_search(task: &Task, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
        || task.category.as_str().contains(&needle)
}

fn matches(task: &Task, query: &TaskQuery, now: DateTime<Utc>) -> bool {
    if let Some(is_done) = query.is_done {
        if task.is_done != is_done {
            return false;
        }
    }
    if let Some(priority) = query.priority {
        if task.priority != priority {
            return false;
        }
    }
    if let Some(category) = query.category {
        if task.category != category {
            return false;
        }
    }
    if let Some(due_filter) = query.due_filter {
        let hit = match due_filter {
            DueFilter::Overdue => is_overdue(task, now),
            DueFilter::Today => due_within(task, now, Duration::hours(24)),
            DueFilter::ThisWeek => due_within(task, now, Duration::days(7)),
        };
        if !hit {
            return false;
        }
    }
    if let Some(search) = query.search.as_deref() {
        if !search.is_empty() && !matches_search(task, search) {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderKey {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
}

// Unknown ordering values fall back to the default, descending created_at.
fn parse_ordering(raw: Option<&str>) -> (OrderKey, bool) {
    let raw = raw.unwrap_or("-created_at");
    let (field, descending) = match raw.strip_prefix('-') {
        Some(field) => (field, true),
        None => (raw, false),
    };
    let key = match field {
        "created_at" => OrderKey::CreatedAt,
        "updated_at" => OrderKey::UpdatedAt,
        "due_date" => OrderKey::DueDate,
        "priority" => OrderKey::Priority,
        _ => return (OrderKey::CreatedAt, true),
    };
    (key, descending)
}

// Tasks without a due date sort after dated ones ascending, before them
// descending (NULLS LAST).
fn compare_due_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_tasks(tasks: &mut [Task], ordering: Option<&str>) {
    let (key, descending) = parse_ordering(ordering);
    tasks.sort_by(|a, b| {
        let ord = match key {
            OrderKey::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderKey::DueDate => compare_due_dates(a.due_date, b.due_date),
            OrderKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Runs the full listing pipeline: filter, sort, paginate.
pub fn list(tasks: &[Task], query: &TaskQuery, now: DateTime<Utc>) -> TaskPage {
    let mut filtered: Vec<Task> = tasks
        .iter()
        .filter(|task| matches(task, query, now))
        .cloned()
        .collect();
    sort_tasks(&mut filtered, query.ordering.as_deref());

    let count = filtered.len();
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    // page comes from the query string; keep the offset from overflowing
    let offset = (page - 1).saturating_mul(page_size);
    let results = filtered
        .into_iter()
        .skip(offset)
        .take(page_size)
        .collect();

    TaskPage {
        count,
        page,
        page_size,
        results,
    }
}

/// Pending tasks whose due date has passed, ordered by due date ascending.
pub fn overdue(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let mut hits: Vec<Task> = tasks
        .iter()
        .filter(|task| is_overdue(task, now))
        .cloned()
        .collect();
    hits.sort_by(|a, b| compare_due_dates(a.due_date, b.due_date));
    hits
}

/// Pending tasks due within the next 24 hours, ordered by due date ascending.
pub fn due_today(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let mut hits: Vec<Task> = tasks
        .iter()
        .filter(|task| !task.is_done && due_within(task, now, Duration::hours(24)))
        .cloned()
        .collect();
    hits.sort_by(|a, b| compare_due_dates(a.due_date, b.due_date));
    hits
}

pub fn stats(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.is_done).count();
    let completion_rate = if total_tasks == 0 {
        0.0
    } else {
        let rate = completed_tasks as f64 / total_tasks as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    };

    let mut priority_stats = BTreeMap::new();
    for priority in Priority::ALL {
        let count = tasks.iter().filter(|t| t.priority == priority).count();
        priority_stats.insert(priority.as_str(), count);
    }
    let mut category_stats = BTreeMap::new();
    for category in Category::ALL {
        let count = tasks.iter().filter(|t| t.category == category).count();
        category_stats.insert(category.as_str(), count);
    }

    TaskStats {
        total_tasks,
        completed_tasks,
        pending_tasks: total_tasks - completed_tasks,
        completion_rate,
        overdue_tasks: tasks.iter().filter(|t| is_overdue(t, now)).count(),
        priority_stats,
        category_stats,
    }
}
