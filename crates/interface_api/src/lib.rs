//! HTTP API Layer
//!
//! This crate provides the REST API for the coworking portal using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for each area of the portal
//! - **Middleware**: Authentication, request ids, timeouts, tracing, audit logging
//! - **DTOs**: Response envelopes and list filters
//! - **Error Handling**: Domain errors mapped onto consistent JSON error bodies
//!
//! Every route under `/api/v1` needs a bearer token; `/health` and
//! `/health/ready` are public.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, config::ApiConfig, AppState, Ports};
//!
//! let state = AppState::new(ApiConfig::default(), Ports::in_memory());
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use domain_billing::DocumentKind;

use crate::handlers::{booking, directory, documents, health, inventory, ledger, payroll, support};
use crate::middleware::{audit_middleware, auth_middleware};

pub use crate::state::{AppState, Ports};

/// Creates the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let account_routes = Router::new()
        .route("/", get(ledger::list_accounts).post(ledger::create_account))
        .route("/seed", post(ledger::seed_accounts))
        .route("/trial-balance", get(ledger::trial_balance))
        .route("/:id", get(ledger::get_account))
        .route("/:id/reconcile", get(ledger::reconcile_account));

    let transaction_routes = Router::new()
        .route("/", get(ledger::list_transactions).post(ledger::post_transaction))
        .route("/:id", get(ledger::get_transaction));

    // Shared by invoices and bills; the kind comes from the nesting
    let document_routes = Router::new()
        .route("/", get(documents::list_documents).post(documents::create_document))
        .route("/:id", get(documents::get_document))
        .route("/:id/issue", post(documents::issue_document))
        .route("/:id/cancel", post(documents::cancel_document))
        .route(
            "/:id/payments",
            get(documents::list_payments).post(documents::record_payment),
        );

    let payroll_routes = Router::new()
        .route("/", get(payroll::list_payrolls).post(payroll::create_payroll))
        .route("/:id", get(payroll::get_payroll))
        .route("/:id/approve", post(payroll::approve_payroll))
        .route("/:id/pay", post(payroll::mark_paid));

    let room_routes = Router::new()
        .route("/", get(booking::list_rooms).post(booking::create_room))
        .route("/available", get(booking::available_rooms))
        .route("/book", post(booking::book_room))
        .route("/bookings", get(booking::list_bookings))
        .route("/bookings/:id", get(booking::get_booking))
        .route(
            "/customer-bookings/booking/:id",
            delete(booking::cancel_booking),
        )
        .route("/limits/:customer_id", get(booking::booking_limits))
        .route("/:id", get(booking::get_room));

    let package_routes = Router::new()
        .route("/", get(booking::list_packages).post(booking::create_package))
        .route("/:id", get(booking::get_package));

    let inventory_routes = Router::new()
        .route("/", get(inventory::list_items).post(inventory::create_item))
        .route(
            "/movements",
            get(inventory::list_movements).post(inventory::record_movement),
        )
        .route(
            "/transfers",
            get(inventory::list_transfers).post(inventory::request_transfer),
        )
        .route("/transfers/:id", get(inventory::get_transfer))
        .route("/transfers/:id/:action", post(inventory::advance_transfer))
        .route(
            "/:id",
            get(inventory::get_item)
                .put(inventory::update_item)
                .delete(inventory::deactivate_item),
        )
        .route("/:id/stock", get(inventory::item_stock));

    let complaint_routes = Router::new()
        .route("/", get(support::list_complaints).post(support::create_complaint))
        .route("/:id", get(support::get_complaint))
        .route("/:id/status", put(support::change_complaint_status));

    let task_routes = Router::new()
        .route("/", get(support::list_tasks).post(support::create_task))
        .route("/:id", get(support::get_task))
        .route("/:id/status", put(support::change_task_status));

    let contract_routes = Router::new()
        .route("/", get(support::list_contracts).post(support::create_contract))
        .route("/:id", get(support::get_contract))
        .route("/:id/status", put(support::change_contract_status));

    let notification_routes = Router::new()
        .route(
            "/",
            get(support::list_notifications).post(support::send_notification),
        )
        .route("/:id/read", post(support::mark_notification_read));

    let branch_routes = Router::new()
        .route("/", get(directory::list_branches).post(directory::create_branch))
        .route("/:id", get(directory::get_branch));

    let customer_routes = Router::new()
        .route("/", get(directory::list_customers).post(directory::create_customer))
        .route("/:id", get(directory::get_customer))
        .route("/:id/status", put(directory::set_customer_status))
        .route("/:id/package", put(directory::assign_package));

    let employee_routes = Router::new()
        .route("/", get(directory::list_employees).post(directory::create_employee))
        .route("/:id", get(directory::get_employee));

    let vendor_routes = Router::new()
        .route("/", get(directory::list_vendors).post(directory::create_vendor))
        .route("/:id", get(directory::get_vendor));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/accounts", account_routes)
        .nest("/transactions", transaction_routes)
        .nest(
            "/invoices",
            document_routes.clone().layer(Extension(DocumentKind::Invoice)),
        )
        .nest("/bills", document_routes.layer(Extension(DocumentKind::Bill)))
        .nest("/payroll", payroll_routes)
        .nest("/meeting-rooms", room_routes)
        .nest("/packages", package_routes)
        .nest("/inventory", inventory_routes)
        .nest("/complaints", complaint_routes)
        .nest("/tasks", task_routes)
        .nest("/contracts", contract_routes)
        .nest("/notifications", notification_routes)
        .nest("/branches", branch_routes)
        .nest("/customers", customer_routes)
        .nest("/employees", employee_routes)
        .nest("/vendors", vendor_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let timeout = state.config.request_timeout();

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
