//! Invoice and bill handlers
//!
//! `/invoices` and `/bills` share these handlers; the router tags each
//! subtree with its [`DocumentKind`] through a request extension.

use axum::{extract::State, Extension, Json};
use tracing::warn;

use core_kernel::{DocumentId, Page};
use domain_billing::{BillingDocument, DocumentDraft, DocumentKind, Payment, RecordPayment, RecordedPayment};

use crate::dto::billing::{counterparty_field, DocumentFilter};
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

pub async fn create_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiJson(draft): ApiJson<DocumentDraft>,
) -> ApiResult<Created<BillingDocument>> {
    if draft.counterparty.kind() != kind {
        warn!(kind = kind.as_str(), "Document posted with the wrong counterparty");
        return Err(ApiError::BadRequest(format!(
            "{} requires {}",
            kind.label(),
            counterparty_field(kind)
        )));
    }
    Ok(created(state.billing.create_document(&actor, draft).await?))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<DocumentFilter>,
) -> ApiResult<Json<Page<BillingDocument>>> {
    let documents = state
        .billing
        .list_documents(&actor, filter.into_query(kind)?, page.request())
        .await?;
    Ok(Json(documents))
}

pub async fn get_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<ApiResponse<BillingDocument>>> {
    Ok(ok(state.billing.get_document(&actor, kind, id).await?))
}

/// Moves a draft to PENDING
pub async fn issue_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<ApiResponse<BillingDocument>>> {
    Ok(ok(state.billing.issue_document(&actor, kind, id).await?))
}

pub async fn cancel_document(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<ApiResponse<BillingDocument>>> {
    Ok(ok(state.billing.cancel_document(&actor, kind, id).await?))
}

pub async fn record_payment(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<DocumentId>,
    ApiJson(input): ApiJson<RecordPayment>,
) -> ApiResult<Created<RecordedPayment>> {
    Ok(created(state.billing.record_payment(&actor, kind, id, input).await?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(kind): Extension<DocumentKind>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<DocumentId>,
) -> ApiResult<Json<ApiResponse<Vec<Payment>>>> {
    Ok(ok(state.billing.list_payments(&actor, kind, id).await?))
}
