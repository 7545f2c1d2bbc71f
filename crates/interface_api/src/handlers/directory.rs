//! Branch, customer, employee and vendor handlers

use axum::{extract::State, Json};

use core_kernel::{BranchId, CustomerId, EmployeeId, Page, VendorId};
use domain_directory::{Branch, Customer, Employee, NewBranch, NewCustomer, NewEmployee, NewVendor, Vendor};

use crate::dto::directory::*;
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

// ============================================================================
// Branches
// ============================================================================

pub async fn create_branch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewBranch>,
) -> ApiResult<Created<Branch>> {
    Ok(created(state.directory.create_branch(&actor, input).await?))
}

pub async fn list_branches(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Branch>>> {
    Ok(Json(state.directory.list_branches(page.request()).await?))
}

pub async fn get_branch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BranchId>,
) -> ApiResult<Json<ApiResponse<Branch>>> {
    Ok(ok(state.directory.get_branch(&actor, id).await?))
}

// ============================================================================
// Customers
// ============================================================================

pub async fn create_customer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewCustomer>,
) -> ApiResult<Created<Customer>> {
    Ok(created(state.directory.create_customer(&actor, input).await?))
}

pub async fn list_customers(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<CustomerFilter>,
) -> ApiResult<Json<Page<Customer>>> {
    let customers = state
        .directory
        .list_customers(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(customers))
}

pub async fn get_customer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<CustomerId>,
) -> ApiResult<Json<ApiResponse<Customer>>> {
    Ok(ok(state.directory.get_customer(&actor, id).await?))
}

/// Lock or unlock a customer
pub async fn set_customer_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(body): ApiJson<CustomerStatusRequest>,
) -> ApiResult<Json<ApiResponse<Customer>>> {
    Ok(ok(state.directory.set_customer_status(&actor, id, body.status).await?))
}

/// Assign or clear a booking package; the package must exist and be active
pub async fn assign_package(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(body): ApiJson<AssignPackageRequest>,
) -> ApiResult<Json<ApiResponse<Customer>>> {
    Ok(ok(state.booking.assign_package(&actor, id, body.package_id).await?))
}

// ============================================================================
// Employees
// ============================================================================

pub async fn create_employee(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewEmployee>,
) -> ApiResult<Created<Employee>> {
    Ok(created(state.directory.create_employee(&actor, input).await?))
}

pub async fn list_employees(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<EmployeeFilter>,
) -> ApiResult<Json<Page<Employee>>> {
    let employees = state
        .directory
        .list_employees(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(employees))
}

pub async fn get_employee(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<EmployeeId>,
) -> ApiResult<Json<ApiResponse<Employee>>> {
    Ok(ok(state.directory.get_employee(&actor, id).await?))
}

// ============================================================================
// Vendors
// ============================================================================

pub async fn create_vendor(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewVendor>,
) -> ApiResult<Created<Vendor>> {
    Ok(created(state.directory.create_vendor(&actor, input).await?))
}

pub async fn list_vendors(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<VendorFilter>,
) -> ApiResult<Json<Page<Vendor>>> {
    let vendors = state
        .directory
        .list_vendors(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(vendors))
}

pub async fn get_vendor(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<VendorId>,
) -> ApiResult<Json<ApiResponse<Vendor>>> {
    Ok(ok(state.directory.get_vendor(&actor, id).await?))
}
