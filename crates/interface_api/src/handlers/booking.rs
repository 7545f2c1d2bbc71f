//! Meeting room, package and booking handlers

use axum::{extract::State, Json};
use chrono::Utc;

use core_kernel::{BookingId, CustomerId, Page, PackageId, RoomId};
use domain_booking::{Booking, BookingRequest, MeetingRoom, NewMeetingRoom, NewPackage, Package, QuotaUsage};

use crate::dto::booking::{AvailabilityParams, BookingFilter, LimitsParams, RoomFilter};
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

// ============================================================================
// Rooms
// ============================================================================

pub async fn create_room(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewMeetingRoom>,
) -> ApiResult<Created<MeetingRoom>> {
    Ok(created(state.booking.create_room(&actor, input).await?))
}

pub async fn list_rooms(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<RoomFilter>,
) -> ApiResult<Json<Page<MeetingRoom>>> {
    let rooms = state
        .booking
        .list_rooms(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(rooms))
}

pub async fn get_room(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    ApiPath(id): ApiPath<RoomId>,
) -> ApiResult<Json<ApiResponse<MeetingRoom>>> {
    Ok(ok(state.booking.get_room(id).await?))
}

/// Active rooms of a branch with no booking overlapping the requested slot
pub async fn available_rooms(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(params): ApiQuery<AvailabilityParams>,
) -> ApiResult<Json<ApiResponse<Vec<MeetingRoom>>>> {
    let branch_id = params
        .branch_id
        .or(actor.branch_id)
        .ok_or_else(|| ApiError::BadRequest("branchId is required".to_string()))?;
    let slot = params.slot()?;
    let rooms = state
        .booking
        .available_rooms(&actor, branch_id, params.date, slot)
        .await?;
    Ok(ok(rooms))
}

// ============================================================================
// Bookings
// ============================================================================

pub async fn book_room(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<BookingRequest>,
) -> ApiResult<Created<Booking>> {
    Ok(created(state.booking.book(&actor, request).await?))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<BookingFilter>,
) -> ApiResult<Json<Page<Booking>>> {
    let bookings = state
        .booking
        .list_bookings(&actor, filter.into_query()?, page.request())
        .await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BookingId>,
) -> ApiResult<Json<ApiResponse<Booking>>> {
    Ok(ok(state.booking.get_booking(&actor, id).await?))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<BookingId>,
) -> ApiResult<Json<ApiResponse<Booking>>> {
    Ok(ok(state.booking.cancel_booking(&actor, id).await?))
}

/// Daily and monthly minutes used and remaining for a customer
pub async fn booking_limits(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiQuery(params): ApiQuery<LimitsParams>,
) -> ApiResult<Json<ApiResponse<QuotaUsage>>> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(ok(state.booking.quota_usage(&actor, customer_id, date).await?))
}

// ============================================================================
// Packages
// ============================================================================

pub async fn create_package(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewPackage>,
) -> ApiResult<Created<Package>> {
    Ok(created(state.booking.create_package(&actor, input).await?))
}

pub async fn list_packages(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Json<Page<Package>>> {
    Ok(Json(state.booking.list_packages(page.request()).await?))
}

pub async fn get_package(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    ApiPath(id): ApiPath<PackageId>,
) -> ApiResult<Json<ApiResponse<Package>>> {
    Ok(ok(state.booking.get_package(id).await?))
}
