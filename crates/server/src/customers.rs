use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use shop_core::{
    ApplicationError, CreateCustomerHandler, CreateCustomerRequest, CreateCustomerResponse,
    InterfaceError,
};
use tracing::{info, warn};
use uuid::Uuid;

pub const CUSTOMERS_PATH: &str = "/v1/customers";
// First controller revision routed here.
pub const LEGACY_CONSUMERS_PATH: &str = "/v1/consumers";

#[derive(Clone)]
pub struct CustomerState {
    handler: Arc<dyn CreateCustomerHandler>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        };
        let body = ApiErrorBody {
            error: self.0.user_message(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(handler: Arc<dyn CreateCustomerHandler>) -> Router {
    Router::new()
        .route(CUSTOMERS_PATH, post(create_customer))
        .route(LEGACY_CONSUMERS_PATH, post(create_customer))
        .with_state(CustomerState { handler })
}

pub async fn create_customer(
    State(state): State<CustomerState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<Json<CreateCustomerResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let Json(request) = payload.map_err(|rejection| {
        let error = classify_rejection(rejection);
        warn!(
            event_name = "api.customer.rejected",
            correlation_id = %correlation_id,
            error = %error,
            "create customer request could not be deserialized"
        );
        ApiError(error.into_interface(correlation_id.clone()))
    })?;

    let response = state.handler.handle(&request);
    info!(
        event_name = "api.customer.created",
        correlation_id = %correlation_id,
        customer_id = %response.id,
        "customer created"
    );

    Ok(Json(response))
}

fn classify_rejection(rejection: JsonRejection) -> ApplicationError {
    match rejection {
        JsonRejection::JsonSyntaxError(error) => ApplicationError::InvalidJson(error.body_text()),
        JsonRejection::JsonDataError(error) => ApplicationError::UnexpectedShape(error.body_text()),
        JsonRejection::MissingJsonContentType(_) => ApplicationError::UnsupportedContentType,
        other => ApplicationError::UnreadableBody(other.body_text()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
        Router,
    };
    use chrono::{DateTime, Local};
    use serde_json::Value;
    use shop_core::{
        CreateCustomerHandler, CreateCustomerRequest, CreateCustomerResponse,
        DefaultCreateCustomerHandler, RandomCustomerIdSource, SystemClock,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::customers::{router, CUSTOMERS_PATH, LEGACY_CONSUMERS_PATH};

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
        inner: DefaultCreateCustomerHandler<SystemClock, RandomCustomerIdSource>,
    }

    impl CreateCustomerHandler for CountingHandler {
        fn handle(&self, request: &CreateCustomerRequest) -> CreateCustomerResponse {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.handle(request)
        }
    }

    fn app() -> Router {
        router(Arc::new(DefaultCreateCustomerHandler::default()))
    }

    fn json_post(path: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("request should build")
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn empty_object_creates_customer() {
        let before = Local::now();
        let (status, body) = send(app(), json_post(CUSTOMERS_PATH, "{}")).await;
        let after = Local::now();

        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().expect("id should be a string");
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok(), "id should be a valid uuid");
        assert_eq!(body["name"], "Diego Lins");
        assert_eq!(body["email"], "diegolins@ibm.com");

        let date = DateTime::parse_from_rfc3339(body["date"].as_str().expect("date string"))
            .expect("date should be rfc3339");
        assert!(before.fixed_offset() <= date && date <= after.fixed_offset());
    }

    #[tokio::test]
    async fn request_content_does_not_change_fixed_fields() {
        let (status, body) = send(
            app(),
            json_post(CUSTOMERS_PATH, r#"{"name":"Maria","email":"maria@example.com","x":1}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Diego Lins");
        assert_eq!(body["email"], "diegolins@ibm.com");
    }

    #[tokio::test]
    async fn legacy_consumers_route_is_served() {
        let (status, body) = send(app(), json_post(LEGACY_CONSUMERS_PATH, "{}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Diego Lins");
    }

    #[tokio::test]
    async fn consecutive_calls_return_distinct_ids() {
        let app = app();
        let mut ids = HashSet::new();
        for _ in 0..200 {
            let (status, body) = send(app.clone(), json_post(CUSTOMERS_PATH, "{}")).await;
            assert_eq!(status, StatusCode::OK);
            ids.insert(body["id"].as_str().expect("id").to_string());
        }
        assert_eq!(ids.len(), 200);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_handler_runs() {
        let handler = Arc::new(CountingHandler::default());
        let app = router(handler.clone());

        let (status, body) = send(app, json_post(CUSTOMERS_PATH, "this is not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("id").is_none(), "error body must not look like a customer");
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_json_shape_is_a_bad_request() {
        let (status, body) = send(app(), json_post(CUSTOMERS_PATH, r#""just a string""#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn json_arrays_are_rejected_before_handler_runs() {
        for body in ["[]", r#"["x", null]"#] {
            let handler = Arc::new(CountingHandler::default());

            let (status, response) =
                send(router(handler.clone()), json_post(CUSTOMERS_PATH, body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body} should be rejected");
            assert!(response.get("id").is_none());
            assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn body_over_default_limit_is_a_bad_request() {
        let handler = Arc::new(CountingHandler::default());
        let oversized = format!(r#"{{"name":"{}"}}"#, "a".repeat(3 * 1024 * 1024));

        let (status, response) =
            send(router(handler.clone()), json_post(CUSTOMERS_PATH, oversized)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(response.get("id").is_none());
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_content_type_is_a_bad_request() {
        let handler = Arc::new(CountingHandler::default());
        let request = Request::builder()
            .method("POST")
            .uri(CUSTOMERS_PATH)
            .body(Body::from("{}"))
            .expect("request should build");

        let (status, _) = send(router(handler.clone()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_call_invokes_handler_exactly_once() {
        let handler = Arc::new(CountingHandler::default());

        let (status, _) = send(router(handler.clone()), json_post(CUSTOMERS_PATH, "{}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_is_not_routed() {
        let request = Request::builder()
            .method("GET")
            .uri(CUSTOMERS_PATH)
            .body(Body::empty())
            .expect("request should build");

        let (status, _) = send(app(), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
