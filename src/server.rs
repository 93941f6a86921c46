// 🌐 HTTP API - axum routes over the view controller
//
// The controller sits behind a mutex; each request runs one action to
// completion and answers with the fresh dashboard plus the notifications
// that action produced.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::controller::{Action, Controller, Dashboard, Notification, NotificationKind};
use crate::currency::CurrencyCode;
use crate::error::ValidationError;
use crate::expense::{ExpenseDraft, ExpenseId};
use crate::month::Month;
use crate::preferences::Theme;
use crate::store::Store;

/// Shared application state
pub struct ApiState<S: Store> {
    controller: Arc<Mutex<Controller<S>>>,
}

impl<S: Store> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        ApiState {
            controller: Arc::clone(&self.controller),
        }
    }
}

impl<S: Store> ApiState<S> {
    pub fn new(controller: Controller<S>) -> Self {
        ApiState {
            controller: Arc::new(Mutex::new(controller)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Controller<S>> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(data: Option<T>, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub dashboard: Dashboard,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    pub code: CurrencyCode,
    pub symbol: &'static str,
    pub rate_to_usd: f64,
}

// ============================================================================
// Request bodies
// ============================================================================

/// Expense form as posted. Fields are loosely typed so that a wrong type
/// ends up as a validation notification instead of a transport error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpenseRequest {
    pub amount: Option<Value>,
    pub currency_code: Option<Value>,
    pub category: Option<Value>,
    pub date: Option<Value>,
    pub note: Option<Value>,
}

impl ExpenseRequest {
    fn into_draft(self) -> ExpenseDraft {
        ExpenseDraft {
            amount: parse_amount(self.amount.as_ref()),
            currency_code: parse_text(self.currency_code),
            category: parse_text(self.category),
            date: parse_text(self.date),
            note: parse_text(self.note),
        }
    }
}

/// Amount may arrive as a number or as the raw text of an input field
#[derive(Debug, Default, Deserialize)]
pub struct BudgetRequest {
    #[serde(default)]
    pub amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MonthRequest {
    pub month: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRequest {
    pub currency_code: String,
}

/// No theme means toggle
#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    #[serde(default)]
    pub theme: Option<String>,
}

fn parse_amount(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_text(raw: Option<Value>) -> Option<String> {
    match raw? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Response helpers
// ============================================================================

fn run<S: Store>(state: &ApiState<S>, action: Action) -> Response {
    let mut controller = state.lock();
    let notifications = controller.handle(action);
    respond(&mut controller, notifications)
}

fn respond<S: Store>(controller: &mut Controller<S>, mut notifications: Vec<Notification>) -> Response {
    notifications.extend(controller.take_notifications());
    let rejected = notifications
        .iter()
        .find(|n| n.kind == NotificationKind::ValidationFailed)
        .map(|n| n.message.clone());

    let result = ActionResult {
        dashboard: controller.dashboard(),
        notifications,
    };

    match rejected {
        Some(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::failed(Some(result), message)),
        )
            .into_response(),
        None => (StatusCode::OK, Json(ApiResponse::ok(result))).into_response(),
    }
}

/// Input that never reached the controller
fn reject<S: Store>(state: &ApiState<S>, err: ValidationError) -> Response {
    debug!("Rejected request field '{}': {}", err.field(), err);
    let mut controller = state.lock();
    respond(&mut controller, vec![Notification::rejected(&err)])
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Selected month, rows and breakdown
async fn get_dashboard<S: Store + Send + 'static>(State(state): State<ApiState<S>>) -> Response {
    let mut controller = state.lock();
    respond(&mut controller, Vec::new())
}

/// GET /api/currencies - Supported currencies with their USD rates
async fn get_currencies() -> impl IntoResponse {
    let list: Vec<CurrencyInfo> = CurrencyCode::ALL
        .iter()
        .map(|&code| CurrencyInfo {
            code,
            symbol: code.symbol(),
            rate_to_usd: code.rate_to_reference(),
        })
        .collect();
    Json(ApiResponse::ok(list))
}

/// POST /api/expenses - Add an expense
async fn add_expense<S: Store + Send + 'static>(
    State(state): State<ApiState<S>>,
    body: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => {
            debug!("Unreadable expense body: {}", e);
            ExpenseRequest::default()
        }
    };
    run(&state, Action::AddExpense(request.into_draft()))
}

/// PUT /api/expenses/:id - Edit (not available)
async fn edit_expense<S: Store + Send + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<i64>,
) -> Response {
    run(&state, Action::EditExpense(ExpenseId(id)))
}

/// PUT /api/budget - Budget of the selected month
async fn set_budget<S: Store + Send + 'static>(
    State(state): State<ApiState<S>>,
    body: Result<Json<BudgetRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(e) => {
            debug!("Unreadable budget body: {}", e);
            BudgetRequest::default()
        }
    };
    let amount = parse_amount(body.amount.as_ref());
    run(&state, Action::SetBudget { amount })
}

/// PUT /api/month - Select a month
async fn change_month<S: Store + Send + 'static>(
    State(state): State<ApiState<S>>,
    Json(body): Json<MonthRequest>,
) -> Response {
    match body.month.parse::<Month>() {
        Ok(month) => run(&state, Action::ChangeMonth(month)),
        Err(e) => reject(&state, e),
    }
}

/// PUT /api/preferences/currency - Primary currency
async fn change_currency<S: Store + Send + 'static>(
    State(state): State<ApiState<S>>,
    Json(body): Json<CurrencyRequest>,
) -> Response {
    match body.currency_code.parse::<CurrencyCode>() {
        Ok(code) => run(&state, Action::ChangePrimaryCurrency(code)),
        Err(e) => reject(&state, e),
    }
}

/// PUT /api/preferences/theme - Set or toggle the theme
async fn change_theme<S: Store + Send + 'static>(
    State(state): State<ApiState<S>>,
    Json(body): Json<ThemeRequest>,
) -> Response {
    match body.theme.as_deref().map(str::parse::<Theme>) {
        None => run(&state, Action::ToggleTheme),
        Some(Ok(theme)) => run(&state, Action::SetTheme(theme)),
        Some(Err(e)) => reject(&state, e),
    }
}

/// POST /api/reset - Clear all data
async fn reset<S: Store + Send + 'static>(State(state): State<ApiState<S>>) -> Response {
    run(&state, Action::ResetAll)
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router<S: Store + Send + 'static>(controller: Controller<S>) -> Router {
    let state = ApiState::new(controller);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard::<S>))
        .route("/currencies", get(get_currencies))
        .route("/expenses", post(add_expense::<S>))
        .route("/expenses/:id", put(edit_expense::<S>))
        .route("/budget", put(set_budget::<S>))
        .route("/month", put(change_month::<S>))
        .route("/preferences/currency", put(change_currency::<S>))
        .route("/preferences/theme", put(change_theme::<S>))
        .route("/reset", post(reset::<S>))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let month: Month = "2024-03".parse().unwrap();
        router(Controller::with_month(MemoryStore::new(), month))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_and_index() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_currencies() {
        let (_, body) = call(&app(), Method::GET, "/api/currencies", None).await;
        let list = body["data"].as_array().unwrap();
        assert_eq!(list.len(), 6);
        assert_eq!(list[1]["code"], "EUR");
        assert_eq!(list[1]["rateToUsd"], 1.08);
    }

    #[tokio::test]
    async fn test_budget_then_overspend() {
        let app = app();
        let (status, body) = call(&app, Method::PUT, "/api/budget", Some(serde_json::json!({"amount": "100"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["notifications"][0]["message"], "Budget set successfully!");
        assert_eq!(body["data"]["dashboard"]["view"]["budget"], 100.0);

        let expense = serde_json::json!({
            "amount": 120, "currencyCode": "USD", "category": "Food", "date": "2024-03-02"
        });
        let (status, body) = call(&app, Method::POST, "/api/expenses", Some(expense)).await;
        assert_eq!(status, StatusCode::OK);
        let kinds: Vec<&str> = body["data"]["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["overBudget", "expenseAdded"]);
        assert_eq!(body["data"]["dashboard"]["isOverBudget"], true);
        assert_eq!(body["data"]["dashboard"]["expenses"][0]["icon"], "🍔");
    }

    #[tokio::test]
    async fn test_validation_failures_are_422() {
        let app = app();
        let (status, body) = call(&app, Method::PUT, "/api/budget", Some(serde_json::json!({"amount": "abc"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Please enter a valid budget amount.");

        let (status, _) = call(&app, Method::PUT, "/api/month", Some(serde_json::json!({"month": "2024-13"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &app,
            Method::PUT,
            "/api/preferences/currency",
            Some(serde_json::json!({"currencyCode": "XYZ"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/expenses",
            Some(serde_json::json!({"amount": 5, "currencyCode": "USD", "date": "2024-03-02"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["data"]["dashboard"]["expenses"].as_array().unwrap().len(), 0);
    }

    fn kinds(body: &Value) -> Vec<&str> {
        body["data"]["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["kind"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_expense_amount_as_text() {
        let app = app();
        let expense = serde_json::json!({
            "amount": " 50 ", "currencyCode": "USD", "category": "Food", "date": "2024-03-02"
        });
        let (status, body) = call(&app, Method::POST, "/api/expenses", Some(expense)).await;
        assert_eq!(status, StatusCode::OK, "numeric text is accepted: {}", body);
        assert_eq!(kinds(&body), vec!["expenseAdded"]);
        assert_eq!(body["data"]["dashboard"]["view"]["spent"], 50.0);
    }

    #[tokio::test]
    async fn test_mistyped_expense_fields_become_notifications() {
        let app = app();
        for amount in [serde_json::json!("abc"), serde_json::json!({}), serde_json::json!(true)] {
            let expense = serde_json::json!({
                "amount": amount, "currencyCode": "USD", "category": "Food", "date": "2024-03-02"
            });
            let (status, body) = call(&app, Method::POST, "/api/expenses", Some(expense)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "amount {}", amount);
            assert_eq!(kinds(&body), vec!["validationFailed"], "amount {}", amount);
            assert_eq!(body["data"]["notifications"][0]["severity"], "warning");
            assert_eq!(body["error"], "Amount must be a number greater than zero.");
            assert!(body["data"]["dashboard"].is_object(), "dashboard still sent");
        }

        // A category sent as an object is missing, not a transport error
        let expense = serde_json::json!({
            "amount": 5, "currencyCode": "USD", "category": {"name": "Food"}, "date": "2024-03-02"
        });
        let (status, body) = call(&app, Method::POST, "/api/expenses", Some(expense)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(kinds(&body), vec!["validationFailed"]);

        let (_, body) = call(&app, Method::GET, "/api/dashboard", None).await;
        assert_eq!(body["data"]["dashboard"]["expenses"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_a_validation_failure() {
        let app = app();
        for uri in ["/api/expenses", "/api/budget"] {
            let method = if uri == "/api/budget" { Method::PUT } else { Method::POST };
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("amount=50"))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(kinds(&body), vec!["validationFailed"], "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_month_currency_theme_and_reset() {
        let app = app();
        let (_, body) = call(&app, Method::PUT, "/api/month", Some(serde_json::json!({"month": "2024-04"}))).await;
        assert_eq!(body["data"]["dashboard"]["monthLabel"], "April 2024");

        let (_, body) = call(
            &app,
            Method::PUT,
            "/api/preferences/currency",
            Some(serde_json::json!({"currencyCode": "gbp"})),
        )
        .await;
        assert_eq!(body["data"]["dashboard"]["currencySymbol"], "£");
        assert_eq!(body["data"]["notifications"][0]["message"], "Primary currency set to GBP");

        let (_, body) = call(&app, Method::PUT, "/api/preferences/theme", Some(serde_json::json!({}))).await;
        assert_eq!(body["data"]["dashboard"]["theme"], "dark");

        let (_, body) = call(&app, Method::POST, "/api/reset", None).await;
        assert_eq!(body["data"]["dashboard"]["currency"], "USD");
        assert_eq!(body["data"]["dashboard"]["theme"], "dark");
        assert_eq!(body["data"]["notifications"][0]["kind"], "dataReset");
    }

    #[tokio::test]
    async fn test_edit_is_disabled() {
        let (status, body) = call(&app(), Method::PUT, "/api/expenses/42", Some(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["notifications"][0]["kind"], "editUnavailable");
    }
}
