//! Payroll handlers

use axum::{extract::State, Json};

use core_kernel::{Page, PayrollId};
use domain_payroll::{NewPayroll, Payroll};

use crate::dto::payroll::PayrollFilter;
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

pub async fn create_payroll(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewPayroll>,
) -> ApiResult<Created<Payroll>> {
    Ok(created(state.payroll.create_payroll(&actor, input).await?))
}

pub async fn list_payrolls(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<PayrollFilter>,
) -> ApiResult<Json<Page<Payroll>>> {
    let payrolls = state
        .payroll
        .list_payrolls(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(payrolls))
}

pub async fn get_payroll(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<PayrollId>,
) -> ApiResult<Json<ApiResponse<Payroll>>> {
    Ok(ok(state.payroll.get_payroll(&actor, id).await?))
}

pub async fn approve_payroll(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<PayrollId>,
) -> ApiResult<Json<ApiResponse<Payroll>>> {
    Ok(ok(state.payroll.approve_payroll(&actor, id).await?))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<PayrollId>,
) -> ApiResult<Json<ApiResponse<Payroll>>> {
    Ok(ok(state.payroll.mark_paid(&actor, id).await?))
}
