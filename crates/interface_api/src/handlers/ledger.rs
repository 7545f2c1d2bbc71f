//! Chart of accounts and ledger transaction handlers

use axum::{extract::State, Json};

use core_kernel::{AccountId, Page, TransactionId};
use domain_billing::{Account, NewAccount, PostTransaction, Reconciliation, Transaction, TrialBalance};

use crate::dto::billing::{AccountFilter, BranchFilter, SeedAccountsRequest, TransactionFilter};
use crate::dto::{created, ok, ApiResponse, Created, PageParams};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentActor};
use crate::AppState;

// ============================================================================
// Accounts
// ============================================================================

pub async fn create_account(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<NewAccount>,
) -> ApiResult<Created<Account>> {
    Ok(created(state.billing.create_account(&actor, input).await?))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<AccountFilter>,
) -> ApiResult<Json<Page<Account>>> {
    let accounts = state
        .billing
        .list_accounts(&actor, filter.into(), page.request())
        .await?;
    Ok(Json(accounts))
}

pub async fn get_account(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<Json<ApiResponse<Account>>> {
    Ok(ok(state.billing.get_account(&actor, id).await?))
}

/// Creates the default coworking chart of accounts for a branch
pub async fn seed_accounts(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(body): ApiJson<SeedAccountsRequest>,
) -> ApiResult<Created<Vec<Account>>> {
    let accounts = state
        .billing
        .seed_chart_of_accounts(&actor, body.branch_id)
        .await?;
    Ok(created(accounts))
}

pub async fn trial_balance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(filter): ApiQuery<BranchFilter>,
) -> ApiResult<Json<ApiResponse<TrialBalance>>> {
    Ok(ok(state.billing.trial_balance(&actor, filter.branch_id).await?))
}

/// Compares the stored balance with a replay of the account's postings
pub async fn reconcile_account(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<Json<ApiResponse<Reconciliation>>> {
    Ok(ok(state.billing.reconcile_account(&actor, id).await?))
}

// ============================================================================
// Transactions
// ============================================================================

pub async fn post_transaction(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(input): ApiJson<PostTransaction>,
) -> ApiResult<Created<Transaction>> {
    Ok(created(state.billing.post_transaction(&actor, input).await?))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<TransactionFilter>,
) -> ApiResult<Json<Page<Transaction>>> {
    let transactions = state
        .billing
        .list_transactions(&actor, filter.into_query()?, page.request())
        .await?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiPath(id): ApiPath<TransactionId>,
) -> ApiResult<Json<ApiResponse<Transaction>>> {
    Ok(ok(state.billing.get_transaction(&actor, id).await?))
}
