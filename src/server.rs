//! Product Tracker HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/` | Greeting; `?ai=true` asks the model to say hello |
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `{prefix}/products` | List all products |
//! | `GET`    | `{prefix}/products/{id}` | Get one product |
//! | `POST`   | `{prefix}/products` | Create a product (201) |
//! | `PUT`    | `{prefix}/products/{id}` | Update present fields |
//! | `DELETE` | `{prefix}/products/{id}` | Delete a product (204) |
//! | `POST`   | `{prefix}/product-search` | Natural-language search |
//! | `POST`   | `{prefix}/debug/llm-filter` | Show the raw translation of `?user_query=` or a text body |
//!
//! `{prefix}` is `[server].api_prefix`, `/api/v1` by default.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Product not found" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `search_failed` (500),
//! `translation_failed` (500), `internal` (500).
//!
//! # CORS
//!
//! Origins come from `[server].allowed_origins`; `"*"` permits any origin.
//! All methods and headers are permitted.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Config, ServerConfig};
use crate::db;
use crate::llm;
use crate::migrate;
use crate::models::{Product, ProductCreate, ProductList, ProductUpdate};
use crate::search::search_products;
use crate::store::{ProductStore, SqliteStore};
use crate::translate::FilterTranslator;

/// Shared application state for the search and greeting handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub translator: FilterTranslator,
}

/// Starts the HTTP server using the configured database and model.
///
/// Ensures the schema exists and, when `[db].seed` is set, seeds an empty
/// table. Then serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let model = llm::create_model(&config.llm)?;

    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;
    if config.db.seed {
        let inserted = migrate::seed_samples(&pool).await?;
        if inserted > 0 {
            info!(inserted, "seeded sample products");
        }
    }

    let state = AppState {
        store: Arc::new(SqliteStore::new(pool)),
        translator: FilterTranslator::new(Arc::from(model)),
    };

    run_server_with_state(&config.server, state).await
}

/// Starts the HTTP server with an explicit store and translator.
pub async fn run_server_with_state(server: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let model = state.translator.model_name().to_string();
    let app = build_router(server, state)?;

    let listener = tokio::net::TcpListener::bind(&server.bind).await?;
    info!(bind = %server.bind, prefix = %server.api_prefix, model = %model, "server listening");
    println!("Product Tracker API listening on http://{}", server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Assemble the full router: greeting, health, CRUD and search routes.
pub fn build_router(server: &ServerConfig, state: AppState) -> anyhow::Result<Router> {
    let api = product_routes(state.store.clone()).merge(search_routes(state.clone()));

    let root = Router::new()
        .route("/", get(handle_greet))
        .route("/health", get(handle_health))
        .with_state(state);

    let app = if server.api_prefix.is_empty() {
        root.merge(api)
    } else {
        root.nest(&server.api_prefix, api)
    };

    Ok(app
        .layer(cors_layer(&server.allowed_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// CRUD routes over any [`ProductStore`].
///
/// Each API version mounts its own copy; a version that needs different
/// behavior supplies a different store or replaces individual routes.
pub fn product_routes(store: Arc<dyn ProductStore>) -> Router {
    Router::new()
        .route("/products", get(handle_list).post(handle_create))
        .route(
            "/products/{id}",
            get(handle_get).put(handle_update).delete(handle_delete),
        )
        .with_state(store)
}

/// Natural-language search and its diagnostics route.
pub fn search_routes(state: AppState) -> Router {
    Router::new()
        .route("/product-search", post(handle_search))
        .route("/debug/llm-filter", post(handle_debug_filter))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let values = origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(values)))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found() -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: "Product not found".to_string(),
    }
}

fn server_error(code: &'static str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code,
        message: message.into(),
    }
}

fn internal(context: &str, err: anyhow::Error) -> AppError {
    warn!(error = %err, "{}", context);
    server_error("internal", format!("{}: {}", context, err))
}

/// Normalize a path id; anything that is not a UUID is a client error.
fn parse_id(id: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(id)
        .map(|u| u.to_string())
        .map_err(|_| bad_request(format!("invalid product id: {}", id)))
}

// ============ GET / and /health ============

#[derive(Deserialize)]
struct GreetParams {
    #[serde(default)]
    ai: bool,
}

async fn handle_greet(
    State(state): State<AppState>,
    Query(params): Query<GreetParams>,
) -> Json<serde_json::Value> {
    if !params.ai {
        return Json(serde_json::json!({
            "message": "Hello! Product Tracker API is running.",
            "source": "static"
        }));
    }

    match state.translator.model().complete("Say hello", 0.2).await {
        Ok(message) => Json(serde_json::json!({ "message": message, "source": "AI" })),
        Err(e) => Json(serde_json::json!({
            "message": "Hello! (AI unavailable)",
            "source": "fallback",
            "error": e.to_string()
        })),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Product CRUD ============

async fn handle_list(
    State(store): State<Arc<dyn ProductStore>>,
) -> Result<Json<ProductList>, AppError> {
    let products = store
        .get_all()
        .await
        .map_err(|e| internal("Error retrieving products", e))?;
    Ok(Json(ProductList::from(products)))
}

async fn handle_get(
    State(store): State<Arc<dyn ProductStore>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    store
        .get_by_id(&id)
        .await
        .map_err(|e| internal("Error retrieving product", e))?
        .map(Json)
        .ok_or_else(not_found)
}

async fn handle_create(
    State(store): State<Arc<dyn ProductStore>>,
    Json(data): Json<ProductCreate>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    data.validate().map_err(|e| bad_request(e.to_string()))?;
    let product = store
        .create(data)
        .await
        .map_err(|e| internal("Error creating product", e))?;
    info!(id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn handle_update(
    State(store): State<Arc<dyn ProductStore>>,
    Path(id): Path<String>,
    Json(data): Json<ProductUpdate>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    data.validate().map_err(|e| bad_request(e.to_string()))?;
    store
        .update(&id, data)
        .await
        .map_err(|e| internal("Error updating product", e))?
        .map(Json)
        .ok_or_else(not_found)
}

async fn handle_delete(
    State(store): State<Arc<dyn ProductStore>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let deleted = store
        .delete(&id)
        .await
        .map_err(|e| internal("Error deleting product", e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

// ============ Search ============

/// Request body for `POST /product-search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "userQuery", alias = "user_query")]
    pub user_query: String,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<ProductList>, AppError> {
    if req.user_query.trim().is_empty() {
        return Err(bad_request("userQuery must not be empty"));
    }

    match search_products(&state.translator, state.store.as_ref(), &req.user_query).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            warn!(query = %req.user_query, error = %e, "product search failed");
            Err(server_error(
                "search_failed",
                format!("Error searching products: {}", e),
            ))
        }
    }
}

/// Query string for `POST /debug/llm-filter`. A raw text body works too.
#[derive(Debug, Default, Deserialize)]
pub struct DebugFilterParams {
    #[serde(default)]
    pub user_query: Option<String>,
}

async fn handle_debug_filter(
    State(state): State<AppState>,
    Query(params): Query<DebugFilterParams>,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    let query = params.user_query.as_deref().unwrap_or(body.as_str()).trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let translation = state
        .translator
        .translate_verbose(query)
        .await
        .map_err(|e| server_error("translation_failed", e.to_string()))?;

    Ok(Json(serde_json::json!({
        "ai_response": translation.filter,
        "raw": translation.raw,
        "sanitized": translation.sanitized,
    })))
}
