use crate::{
    error::AppError,
    models::{
        total_pages, Task, TaskInput, TaskListQuery, TaskPage, TaskSearchPage, TaskSearchQuery,
        TaskUpdate,
    },
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str = "id, title, description, priority, status, due_date, created_at, updated_at";

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (
        page.unwrap_or(DEFAULT_PAGE).max(1),
        limit.unwrap_or(DEFAULT_LIMIT).max(1),
    )
}

/// Creates a new task.
///
/// ## Responses:
/// - `201 Created`: the new `Task` as JSON.
/// - `400 Bad Request`: input validation failed (e.g. empty title).
/// - `401 Unauthorized`: missing or unusable token.
/// - `500 Internal Server Error`: database failure.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner());

    let result = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (id, title, description, priority, status, due_date, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, title, description, priority, status, due_date, created_at, updated_at",
    )
    .bind(task.id)
    .bind(task.title)
    .bind(task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.due_date)
    .bind(task.created_at)
    .bind(task.updated_at)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(result))
}

/// Lists tasks with pagination.
///
/// `page` defaults to 1 and `limit` to 10; both are clamped to at least 1.
/// A page past the end of the collection returns an empty list, not an
/// error. `totalPages` is the ceiling of `totalTasks / limit`.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    query: web::Query<TaskListQuery>,
) -> Result<impl Responder, AppError> {
    let (page, limit) = page_params(query.page, query.limit);

    let total_tasks = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasks")
        .fetch_one(&**pool)
        .await?;

    let tasks = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        TASK_COLUMNS
    ))
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(TaskPage {
        page,
        limit,
        total_tasks,
        total_pages: total_pages(total_tasks, limit),
        tasks,
    }))
}

/// Searches tasks with optional filters, paginated.
///
/// ## Query Parameters:
/// - `title`: case-insensitive containment match.
/// - `status`, `priority`: exact match.
/// - `dueDate`: tasks due on or after the given instant.
/// - `page`, `limit`: pagination, same defaults as the list endpoint.
#[get("/search")]
pub async fn search_tasks(
    pool: web::Data<PgPool>,
    query: web::Query<TaskSearchQuery>,
) -> Result<impl Responder, AppError> {
    let (page, limit) = page_params(query.page, query.limit);

    // Filter conditions are appended dynamically; the two queries below
    // share the same WHERE clause and bind order.
    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;

    if query.title.is_some() {
        conditions.push(format!("title ILIKE ${}", param_count));
        param_count += 1;
    }
    if query.status.is_some() {
        conditions.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if query.priority.is_some() {
        conditions.push(format!("priority = ${}", param_count));
        param_count += 1;
    }
    if query.due_date.is_some() {
        conditions.push(format!("due_date >= ${}", param_count));
        param_count += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(title) = &query.title {
        count_query = count_query.bind(format!("%{}%", title));
    }
    if let Some(status) = &query.status {
        count_query = count_query.bind(status.clone());
    }
    if let Some(priority) = &query.priority {
        count_query = count_query.bind(priority.clone());
    }
    if let Some(due_date) = query.due_date {
        count_query = count_query.bind(due_date);
    }
    let total_items = count_query.fetch_one(&**pool).await?;

    let select_sql = format!(
        "SELECT {} FROM tasks{} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
        TASK_COLUMNS,
        where_clause,
        param_count,
        param_count + 1
    );
    let mut select_query = sqlx::query_as::<_, Task>(&select_sql);
    if let Some(title) = &query.title {
        select_query = select_query.bind(format!("%{}%", title));
    }
    if let Some(status) = &query.status {
        select_query = select_query.bind(status.clone());
    }
    if let Some(priority) = &query.priority {
        select_query = select_query.bind(priority.clone());
    }
    if let Some(due_date) = query.due_date {
        select_query = select_query.bind(due_date);
    }
    let tasks = select_query
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(TaskSearchPage {
        tasks,
        total_items,
        total_pages: total_pages(total_items, limit),
        current_page: page,
        items_per_page: limit,
    }))
}

/// Retrieves a single task by id or title.
///
/// A UUID-shaped key is first tried as an id; when that misses (or the key
/// is not a UUID at all) it falls back to a case-insensitive title match.
///
/// ## Responses:
/// - `200 OK`: the `Task` as JSON.
/// - `404 Not Found`: neither lookup matched.
#[get("/{key}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    key: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let key = key.into_inner();

    let mut task: Option<Task> = None;

    if let Ok(id) = Uuid::parse_str(&key) {
        task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&**pool)
        .await?;
    }

    if task.is_none() {
        task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE title ILIKE $1 ORDER BY created_at DESC LIMIT 1",
            TASK_COLUMNS
        ))
        .bind(&key)
        .fetch_optional(&**pool)
        .await?;
    }

    match task {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Updates an existing task. Omitted fields keep their stored values.
///
/// ## Responses:
/// - `200 OK`: the updated `Task` as JSON.
/// - `400 Bad Request`: input validation failed.
/// - `404 Not Found`: no task with the given id.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_uuid = task_id.into_inner();

    let result = sqlx::query_as::<_, Task>(
        "UPDATE tasks
         SET title = COALESCE($1, title),
             description = COALESCE($2, description),
             priority = COALESCE($3, priority),
             status = COALESCE($4, status),
             due_date = COALESCE($5, due_date),
             updated_at = now()
         WHERE id = $6
         RETURNING id, title, description, priority, status, due_date, created_at, updated_at",
    )
    .bind(&task_data.title)
    .bind(&task_data.description)
    .bind(task_data.priority.clone())
    .bind(task_data.status.clone())
    .bind(task_data.due_date)
    .bind(task_uuid)
    .fetch_optional(&**pool)
    .await?;

    match result {
        Some(task) => Ok(HttpResponse::Ok().json(task)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task by id.
///
/// ## Responses:
/// - `200 OK`: confirmation message.
/// - `404 Not Found`: no task with the given id.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task_uuid = task_id.into_inner();

    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_uuid)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
