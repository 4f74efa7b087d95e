//! 任务管理

use actix_web::{Responder, Result as ActixResult, web};
use tracing::info;

use crate::api::services::error_code::Area;
use crate::api::services::helpers::{
    api_result, created_response, error_from_rewardhub, page_params, paginated_result,
};
use crate::api::services::types::{TaskListQuery, TaskStatusBody};
use crate::api::state::AppState;
use crate::services::{CreateTaskRequest, UpdateTaskRequest};
use crate::storage::TaskFilter;

pub async fn list_tasks(
    state: web::Data<AppState>,
    query: web::Query<TaskListQuery>,
) -> ActixResult<impl Responder> {
    let query = query.into_inner();
    let paging = page_params(query.page, query.page_size);
    let filter = TaskFilter {
        status: query.status,
        category: query.category,
        search: query.search,
        only_open: false,
    };
    Ok(paginated_result(
        state.tasks.list_tasks(filter, paging.0, paging.1).await,
        paging,
        Area::Task,
    ))
}

pub async fn get_task(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> ActixResult<impl Responder> {
    Ok(api_result(state.tasks.get_task(path.into_inner()).await, Area::Task))
}

pub async fn create_task(
    state: web::Data<AppState>,
    body: web::Json<CreateTaskRequest>,
) -> ActixResult<impl Responder> {
    Ok(match state.tasks.create_task(body.into_inner()).await {
        Ok(task) => {
            info!("Admin API: task {} created", task.id);
            created_response(task)
        }
        Err(e) => error_from_rewardhub(&e, Area::Task),
    })
}

pub async fn update_task(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateTaskRequest>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state
            .tasks
            .update_task(path.into_inner(), body.into_inner())
            .await,
        Area::Task,
    ))
}

/// PUT /tasks/{id}/status
pub async fn set_task_status(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<TaskStatusBody>,
) -> ActixResult<impl Responder> {
    Ok(api_result(
        state.tasks.set_status(path.into_inner(), body.status).await,
        Area::Task,
    ))
}
