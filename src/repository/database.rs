use std::sync::{Arc, Mutex};

use chrono::prelude::{DateTime, Utc};

use crate::models::task::{Task, TaskBulkUpdate, TaskPatch, TaskPayload};
use crate::repository::query::{self, TaskPage, TaskQuery, TaskStats};

#[derive(Debug)]
pub enum UpdateError {
    NotFound,
    /// The saved record would have `due_date` earlier than `created_at`.
    DueDatePrecedesCreation,
}

struct TaskTable {
    rows: Vec<Task>,
    next_id: i64,
}

#[derive(Clone)]
pub struct Database {
    table: Arc<Mutex<TaskTable>>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Database {
            table: Arc::new(Mutex::new(TaskTable {
                rows: vec![],
                next_id: 1,
            })),
        }
    }

    pub fn list_tasks(&self, params: &TaskQuery, now: DateTime<Utc>) -> TaskPage {
        let table = self.table.lock().unwrap();
        query::list(&table.rows, params, now)
    }

    pub fn get_task_by_id(&self, id: i64) -> Option<Task> {
        let table = self.table.lock().unwrap();
        table.rows.iter().find(|task| task.id == id).cloned()
    }

    pub fn create_task(&self, payload: TaskPayload, now: DateTime<Utc>) -> Task {
        let mut table = self.table.lock().unwrap();
        let task = Task {
            id: table.next_id,
            title: payload.title,
            description: payload.description,
            is_done: payload.is_done,
            priority: payload.priority,
            category: payload.category,
            due_date: payload.due_date,
            created_at: now,
            updated_at: now,
        };
        table.next_id += 1;
        table.rows.push(task.clone());
        task
    }

    /// Full replace; id and created_at are preserved, updated_at refreshes.
    pub fn update_task_by_id(
        &self,
        id: i64,
        payload: TaskPayload,
        now: DateTime<Utc>,
    ) -> Result<Task, UpdateError> {
        let mut table = self.table.lock().unwrap();
        let index = table
            .rows
            .iter()
            .position(|task| task.id == id)
            .ok_or(UpdateError::NotFound)?;
        let created_at = table.rows[index].created_at;
        if matches!(payload.due_date, Some(due) if due < created_at) {
            return Err(UpdateError::DueDatePrecedesCreation);
        }
        let updated = Task {
            id,
            title: payload.title,
            description: payload.description,
            is_done: payload.is_done,
            priority: payload.priority,
            category: payload.category,
            due_date: payload.due_date,
            created_at,
            updated_at: now,
        };
        table.rows[index] = updated.clone();
        Ok(updated)
    }

    /// Applies only the fields present in the patch.
    pub fn patch_task_by_id(
        &self,
        id: i64,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task, UpdateError> {
        let mut table = self.table.lock().unwrap();
        let index = table
            .rows
            .iter()
            .position(|task| task.id == id)
            .ok_or(UpdateError::NotFound)?;
        let existing = &table.rows[index];
        let due_date = patch.due_date.or(existing.due_date);
        if matches!(due_date, Some(due) if due < existing.created_at) {
            return Err(UpdateError::DueDatePrecedesCreation);
        }
        let updated = Task {
            id,
            title: patch.title.unwrap_or_else(|| existing.title.clone()),
            description: patch.description.or_else(|| existing.description.clone()),
            is_done: patch.is_done.unwrap_or(existing.is_done),
            priority: patch.priority.unwrap_or(existing.priority),
            category: patch.category.unwrap_or(existing.category),
            due_date,
            created_at: existing.created_at,
            updated_at: now,
        };
        table.rows[index] = updated.clone();
        Ok(updated)
    }

    pub fn delete_task_by_id(&self, id: i64) -> Option<Task> {
        let mut table = self.table.lock().unwrap();
        let index = table.rows.iter().position(|task| task.id == id)?;
        Some(table.rows.remove(index))
    }

    pub fn toggle_task(&self, id: i64, now: DateTime<Utc>) -> Option<Task> {
        let mut table = self.table.lock().unwrap();
        let task = table.rows.iter_mut().find(|task| task.id == id)?;
        task.is_done = !task.is_done;
        task.updated_at = now;
        Some(task.clone())
    }

    pub fn set_task_done(&self, id: i64, is_done: bool, now: DateTime<Utc>) -> Option<Task> {
        let mut table = self.table.lock().unwrap();
        let task = table.rows.iter_mut().find(|task| task.id == id)?;
        task.is_done = is_done;
        task.updated_at = now;
        Some(task.clone())
    }

    /// Deletes every matching id; unknown ids are skipped. Returns the number
    /// of records actually removed.
    pub fn bulk_delete(&self, ids: &[i64]) -> usize {
        let mut table = self.table.lock().unwrap();
        let before = table.rows.len();
        table.rows.retain(|task| !ids.contains(&task.id));
        before - table.rows.len()
    }

    /// Applies the whitelisted fields to every matching id. Returns the number
    /// of records updated.
    pub fn bulk_update(&self, ids: &[i64], updates: &TaskBulkUpdate, now: DateTime<Utc>) -> usize {
        let mut table = self.table.lock().unwrap();
        let mut updated = 0;
        for task in table.rows.iter_mut().filter(|task| ids.contains(&task.id)) {
            if let Some(is_done) = updates.is_done {
                task.is_done = is_done;
            }
            if let Some(priority) = updates.priority {
                task.priority = priority;
            }
            if let Some(category) = updates.category {
                task.category = category;
            }
            task.updated_at = now;
            updated += 1;
        }
        updated
    }

    pub fn overdue_tasks(&self, now: DateTime<Utc>) -> Vec<Task> {
        let table = self.table.lock().unwrap();
        query::overdue(&table.rows, now)
    }

    pub fn tasks_due_today(&self, now: DateTime<Utc>) -> Vec<Task> {
        let table = self.table.lock().unwrap();
        query::due_today(&table.rows, now)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> TaskStats {
        let table = self.table.lock().unwrap();
        query::stats(&table.rows, now)
    }
}
