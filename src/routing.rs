//! Application router configuration mapping the API routes to their handlers.

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::{
    auth::{log_in, log_out, register},
    budget::{get_budget, put_budget, reset_budget},
    endpoints,
    forgot_password::{forgot_password, reset_password, verify_otp},
    logging::logging_middleware,
    profile::{delete_picture, get_profile, update_profile, upload_picture},
    reports::{category_comparison, period_report},
    transaction::{
        create_transaction, delete_transaction, get_transaction, list_transactions,
        recent_transactions, transaction_summary, update_transaction,
    },
    AppState,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(register))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::LOG_OUT, post(log_out))
        .route(endpoints::FORGOT_PASSWORD, post(forgot_password))
        .route(endpoints::VERIFY_OTP, post(verify_otp))
        .route(endpoints::RESET_PASSWORD, post(reset_password))
        .route(endpoints::PROFILE, get(get_profile).put(update_profile))
        .route(
            endpoints::PROFILE_PICTURE,
            post(upload_picture).delete(delete_picture),
        )
        .route(endpoints::BUDGET, get(get_budget).put(put_budget))
        .route(endpoints::BUDGET_RESET, post(reset_budget))
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction).get(list_transactions),
        )
        .route(endpoints::RECENT_TRANSACTIONS, get(recent_transactions))
        .route(endpoints::TRANSACTION_SUMMARY, get(transaction_summary))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route(endpoints::REPORTS, get(period_report))
        .route(endpoints::CATEGORY_COMPARISON, get(category_comparison))
        .nest_service(endpoints::UPLOADS, ServeDir::new("uploads/"))
        .fallback(route_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "route not found",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::app_state::test_state::get_test_state;

    use super::build_router;

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_state()))
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let server = get_test_server();

        let response = server.get("/api/nope").await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["success"], json!(false));
    }

    #[tokio::test]
    async fn register_then_track_spending_end_to_end() {
        let server = get_test_server();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "fullName": "Jane Doe",
                "email": "foo@bar.baz",
                "phone": "021555123",
                "password": "hunter22",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let token = response.json::<Value>()["token"].as_str().unwrap().to_owned();

        server
            .put("/api/budget")
            .authorization_bearer(token.clone())
            .json(&json!({
                "totalBudget": 40000.0,
                "categoryBudgets": [{"category": "Food", "budgetAmount": 14000.0}],
            }))
            .await
            .assert_status_ok();

        server
            .post("/api/transactions")
            .authorization_bearer(token.clone())
            .json(&json!({"category": "Food", "amount": 3000.0, "type": "expense"}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let budget = server
            .get("/api/budget")
            .authorization_bearer(token.clone())
            .await
            .json::<Value>();
        assert_eq!(budget["budget"]["totalSpent"], json!(3000.0));
        assert_eq!(
            budget["budget"]["categoryBudgets"][0]["spentAmount"],
            json!(3000.0)
        );

        let report = server
            .get("/api/reports")
            .authorization_bearer(token)
            .add_query_param("period", "year")
            .await
            .json::<Value>();
        assert_eq!(report["summary"]["totalSpent"], json!(3000.0));
        assert_eq!(report["categoryBreakdown"]["Food"]["total"], json!(3000.0));
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let server = get_test_server();

        server.get("/api/budget").await.assert_status_unauthorized();
        server
            .get("/api/transactions")
            .await
            .assert_status_unauthorized();
        server.get("/api/profile").await.assert_status_unauthorized();
    }
}
