//! Complaint, task, contract and notification handlers

use axum::{extract::State, Json};

use core_kernel::{ComplaintId, ContractId, NotificationId, Page, TaskId};
use domain_support::{
    Complaint, ComplaintStatus, Contract, ContractStatus, NewComplaint, NewContract,
    NewNotification, NewTask, Notification, StatusChange, Task, TaskStatus,
};

use crate::dto::support::{ComplaintFilter, ContractFilter, NotificationFilter, TaskFilter};
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

// ============================================================================
// Complaints
// ============================================================================

pub async fn create_complaint(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewComplaint>,
) -> ApiResult<Created<Complaint>> {
    Ok(created(state.support.create_complaint(&actor, input).await?))
}

pub async fn list_complaints(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ComplaintFilter>,
) -> ApiResult<Json<Page<Complaint>>> {
    let complaints = state
        .support
        .list_complaints(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(complaints))
}

pub async fn get_complaint(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<ComplaintId>,
) -> ApiResult<Json<ApiResponse<Complaint>>> {
    Ok(ok(state.support.get_complaint(&actor, id).await?))
}

pub async fn change_complaint_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<ComplaintId>,
    ApiJson(change): ApiJson<StatusChange<ComplaintStatus>>,
) -> ApiResult<Json<ApiResponse<Complaint>>> {
    Ok(ok(state.support.change_complaint_status(&actor, id, change).await?))
}

// ============================================================================
// Tasks
// ============================================================================

pub async fn create_task(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewTask>,
) -> ApiResult<Created<Task>> {
    Ok(created(state.support.create_task(&actor, input).await?))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> ApiResult<Json<Page<Task>>> {
    let tasks = state
        .support
        .list_tasks(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    Ok(ok(state.support.get_task(&actor, id).await?))
}

pub async fn change_task_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(change): ApiJson<StatusChange<TaskStatus>>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    Ok(ok(state.support.change_task_status(&actor, id, change).await?))
}

// ============================================================================
// Contracts
// ============================================================================

pub async fn create_contract(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewContract>,
) -> ApiResult<Created<Contract>> {
    Ok(created(state.support.create_contract(&actor, input).await?))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ContractFilter>,
) -> ApiResult<Json<Page<Contract>>> {
    let contracts = state
        .support
        .list_contracts(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(contracts))
}

pub async fn get_contract(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<ContractId>,
) -> ApiResult<Json<ApiResponse<Contract>>> {
    Ok(ok(state.support.get_contract(&actor, id).await?))
}

pub async fn change_contract_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<ContractId>,
    ApiJson(change): ApiJson<StatusChange<ContractStatus>>,
) -> ApiResult<Json<ApiResponse<Contract>>> {
    Ok(ok(state.support.change_contract_status(&actor, id, change).await?))
}

// ============================================================================
// Notifications
// ============================================================================

pub async fn send_notification(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewNotification>,
) -> ApiResult<Created<Notification>> {
    Ok(created(state.support.send_notification(&actor, input).await?))
}

/// The caller's own notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<NotificationFilter>,
) -> ApiResult<Json<Page<Notification>>> {
    let notifications = state
        .support
        .list_notifications(&actor, filter.unread_only, page.request())
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<NotificationId>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    Ok(ok(state.support.mark_notification_read(&actor, id).await?))
}
