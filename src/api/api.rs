use actix_web::error::InternalError;
use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::task::{TaskBulkUpdate, TaskPatch, TaskPayload, ValidationErrors};
use crate::repository::database::{Database, UpdateError};
use crate::repository::query::TaskQuery;

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn task_not_found() -> HttpResponse {
        HttpResponse::NotFound().json(ErrorResponse {
            error: "Task not found".to_string(),
        })
    }

    fn bad_request(message: &str) -> HttpResponse {
        HttpResponse::BadRequest().json(ErrorResponse {
            error: message.to_string(),
        })
    }
}

fn due_date_before_creation() -> HttpResponse {
    HttpResponse::BadRequest().json(ValidationErrors::single(
        "due_date",
        "Due date cannot be in the past.",
    ))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BulkDeleteResponse {
    pub deleted_count: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BulkUpdateResponse {
    pub updated_count: usize,
}

#[derive(Deserialize, Debug)]
pub struct BulkDeleteRequest {
    pub task_ids: Vec<i64>,
}

#[derive(Deserialize, Debug)]
pub struct BulkUpdateRequest {
    pub task_ids: Vec<i64>,
    #[serde(default)]
    pub updates: TaskBulkUpdate,
}

#[get("/")]
pub async fn list_tasks(db: web::Data<Database>, params: web::Query<TaskQuery>) -> HttpResponse {
    let page = db.list_tasks(&params, Utc::now());
    HttpResponse::Ok().json(page)
}

#[post("/")]
pub async fn create_task(db: web::Data<Database>, payload: web::Json<TaskPayload>) -> HttpResponse {
    let now = Utc::now();
    match payload.into_inner().validate(now) {
        Ok(payload) => HttpResponse::Created().json(db.create_task(payload, now)),
        Err(errors) => HttpResponse::BadRequest().json(errors),
    }
}

#[get("/stats/")]
pub async fn task_stats(db: web::Data<Database>) -> HttpResponse {
    HttpResponse::Ok().json(db.stats(Utc::now()))
}

#[get("/overdue/")]
pub async fn overdue_tasks(db: web::Data<Database>) -> HttpResponse {
    HttpResponse::Ok().json(db.overdue_tasks(Utc::now()))
}

#[get("/due-today/")]
pub async fn tasks_due_today(db: web::Data<Database>) -> HttpResponse {
    HttpResponse::Ok().json(db.tasks_due_today(Utc::now()))
}

#[post("/bulk-delete/")]
pub async fn bulk_delete_tasks(
    db: web::Data<Database>,
    request: web::Json<BulkDeleteRequest>,
) -> HttpResponse {
    if request.task_ids.is_empty() {
        return ErrorResponse::bad_request("task_ids must be a non-empty list.");
    }
    let deleted_count = db.bulk_delete(&request.task_ids);
    HttpResponse::Ok().json(BulkDeleteResponse { deleted_count })
}

#[post("/bulk-update/")]
pub async fn bulk_update_tasks(
    db: web::Data<Database>,
    request: web::Json<BulkUpdateRequest>,
) -> HttpResponse {
    if request.task_ids.is_empty() {
        return ErrorResponse::bad_request("task_ids must be a non-empty list.");
    }
    if request.updates.is_empty() {
        return ErrorResponse::bad_request(
            "updates must contain at least one of: is_done, priority, category.",
        );
    }
    let updated_count = db.bulk_update(&request.task_ids, &request.updates, Utc::now());
    HttpResponse::Ok().json(BulkUpdateResponse { updated_count })
}

#[get("/{id}/")]
pub async fn get_task_by_id(db: web::Data<Database>, id: web::Path<i64>) -> HttpResponse {
    match db.get_task_by_id(*id) {
        Some(task) => HttpResponse::Ok().json(task),
        None => ErrorResponse::task_not_found(),
    }
}

#[put("/{id}/")]
pub async fn update_task_by_id(
    db: web::Data<Database>,
    id: web::Path<i64>,
    payload: web::Json<TaskPayload>,
) -> HttpResponse {
    let now = Utc::now();
    let payload = match payload.into_inner().validate(now) {
        Ok(payload) => payload,
        Err(errors) => return HttpResponse::BadRequest().json(errors),
    };
    match db.update_task_by_id(*id, payload, now) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(UpdateError::NotFound) => ErrorResponse::task_not_found(),
        Err(UpdateError::DueDatePrecedesCreation) => due_date_before_creation(),
    }
}

#[patch("/{id}/")]
pub async fn patch_task_by_id(
    db: web::Data<Database>,
    id: web::Path<i64>,
    patch: web::Json<TaskPatch>,
) -> HttpResponse {
    let now = Utc::now();
    let patch = match patch.into_inner().validate(now) {
        Ok(patch) => patch,
        Err(errors) => return HttpResponse::BadRequest().json(errors),
    };
    match db.patch_task_by_id(*id, patch, now) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(UpdateError::NotFound) => ErrorResponse::task_not_found(),
        Err(UpdateError::DueDatePrecedesCreation) => due_date_before_creation(),
    }
}

#[delete("/{id}/")]
pub async fn delete_task_by_id(db: web::Data<Database>, id: web::Path<i64>) -> HttpResponse {
    match db.delete_task_by_id(*id) {
        Some(task) => HttpResponse::Ok().json(task),
        None => ErrorResponse::task_not_found(),
    }
}

#[patch("/{id}/toggle/")]
pub async fn toggle_task(db: web::Data<Database>, id: web::Path<i64>) -> HttpResponse {
    match db.toggle_task(*id, Utc::now()) {
        Some(task) => HttpResponse::Ok().json(task),
        None => ErrorResponse::task_not_found(),
    }
}

#[post("/{id}/complete/")]
pub async fn mark_task_complete(db: web::Data<Database>, id: web::Path<i64>) -> HttpResponse {
    match db.set_task_done(*id, true, Utc::now()) {
        Some(task) => HttpResponse::Ok().json(task),
        None => ErrorResponse::task_not_found(),
    }
}

#[post("/{id}/incomplete/")]
pub async fn mark_task_incomplete(db: web::Data<Database>, id: web::Path<i64>) -> HttpResponse {
    match db.set_task_done(*id, false, Utc::now()) {
        Some(task) => HttpResponse::Ok().json(task),
        None => ErrorResponse::task_not_found(),
    }
}

// Malformed JSON bodies and invalid query values come back as JSON 400s
// instead of actix's plain-text default.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse {
            error: err.to_string(),
        };
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse {
            error: err.to_string(),
        };
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    // fixed paths must be registered ahead of the /{id}/ routes
    cfg.service(
        web::scope("/tasks")
            .app_data(json_config())
            .app_data(query_config())
            .service(list_tasks)
            .service(create_task)
            .service(task_stats)
            .service(overdue_tasks)
            .service(tasks_due_today)
            .service(bulk_delete_tasks)
            .service(bulk_update_tasks)
            .service(toggle_task)
            .service(mark_task_complete)
            .service(mark_task_incomplete)
            .service(get_task_by_id)
            .service(update_task_by_id)
            .service(patch_task_by_id)
            .service(delete_task_by_id),
    );
}
