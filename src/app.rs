use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, password_settled_middleware};
use crate::services::{
    AuthService, BuscaService, ComissaoService, IdeiaService, MembroService, ProjetoService, ServiceError,
    SugestaoService,
};

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub ideia: IdeiaService,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, ServiceError> {
        let ideia = IdeiaService::new(config.llm.clone())?;
        Ok(Self { pool, config: Arc::new(config), ideia })
    }

    pub fn comissoes(&self) -> ComissaoService {
        ComissaoService::new(self.pool.clone())
    }

    pub fn projetos(&self) -> ProjetoService {
        ProjetoService::new(self.pool.clone())
    }

    pub fn membros(&self) -> MembroService {
        MembroService::new(self.pool.clone())
    }

    pub fn busca(&self) -> BuscaService {
        BuscaService::new(self.pool.clone(), self.config.max_limit())
    }

    pub fn sugestoes(&self) -> SugestaoService {
        SugestaoService::new(self.pool.clone(), self.config.filter.max_limit)
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.pool.clone(), &self.config)
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(public::auth::login))
        .route("/auth/register", post(public::auth::register))
        .route("/auth/recover", post(public::auth::request_recovery))
        .route("/auth/recover/verify", post(public::auth::verify_recovery))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, buscar, comissoes, find, ideia, membros, projetos, sugestoes};

    // Still reachable by sessions that must change their password
    let session = Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/auth/session", delete(auth::logout));

    let domain = Router::new()
        .route("/api/comissoes", get(comissoes::list).post(comissoes::create))
        .route("/api/comissoes/:id", get(comissoes::show).patch(comissoes::update))
        .route("/api/comissoes/:id/similares", get(comissoes::similar))
        .route("/api/projetos", get(projetos::list).post(projetos::create))
        .route("/api/projetos/estatisticas", get(projetos::stats))
        .route(
            "/api/projetos/:id",
            get(projetos::show).patch(projetos::update).delete(projetos::remove),
        )
        .route("/api/projetos/:id/integracoes", get(projetos::integration_suggestions))
        .route("/api/membros", get(membros::list).post(membros::create))
        .route("/api/buscar", get(buscar::search))
        .route("/api/sugestoes", get(sugestoes::list).post(sugestoes::create))
        .route("/api/sugestoes/compatibilidade", get(sugestoes::by_compatibility))
        .route("/api/sugestoes/tags", get(sugestoes::by_tags))
        .route("/api/sugestoes/estatisticas", get(sugestoes::stats))
        .route(
            "/api/sugestoes/:id",
            get(sugestoes::show).patch(sugestoes::update).delete(sugestoes::deactivate),
        )
        .route("/api/ideia", post(ideia::generate))
        .route("/api/find/:table", post(find::find_post))
        .route_layer(middleware::from_fn(password_settled_middleware));

    session
        .merge(domain)
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new().allow_origin(AllowOrigin::list(allowed)).allow_methods(Any).allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "OAB Comissões API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Committees, projects, members and integration suggestions",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/login, /auth/register, /auth/recover[/verify] (public)",
                "auth": "/api/auth/whoami, /api/auth/password, /api/auth/session (protected)",
                "comissoes": "/api/comissoes[/:id[/similares]] (protected)",
                "projetos": "/api/projetos[/estatisticas|/:id[/integracoes]] (protected)",
                "membros": "/api/membros (protected)",
                "buscar": "/api/buscar?termo= (protected)",
                "sugestoes": "/api/sugestoes[/compatibilidade|/tags|/estatisticas|/:id] (protected)",
                "ideia": "/api/ideia (protected)",
                "find": "/api/find/:table (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "llm_configured": state.ideia.is_configured(),
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{encode_token, Claims};

    fn test_state() -> AppState {
        let mut config = crate::config::test_config();
        config.database.url = "postgres://nobody@127.0.0.1:1/none".to_string();
        config.database.connection_timeout = 1;
        config.llm.api_key = None;
        let pool = DatabaseManager::connect_lazy(&config.database).unwrap();
        AppState::new(pool, config).unwrap()
    }

    fn bearer(require_password_change: bool) -> String {
        let claims = Claims::new(uuid::Uuid::new_v4(), "comissaoteste".into(), None, require_password_change, 1);
        format!("Bearer {}", encode_token(&claims, "unit-test-secret").unwrap())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_is_public() {
        let response = app(test_state())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "OAB Comissões API");
    }

    #[tokio::test]
    async fn api_requires_bearer_token() {
        let response = app(test_state())
            .oneshot(Request::get("/api/comissoes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn pending_password_change_blocks_domain_routes() {
        let response = app(test_state())
            .oneshot(
                Request::get("/api/comissoes")
                    .header("authorization", bearer(true))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Session routes stay open
        let response = app(test_state())
            .oneshot(
                Request::delete("/api/auth/session")
                    .header("authorization", bearer(true))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn blank_search_answers_without_database() {
        let response = app(test_state())
            .oneshot(
                Request::get("/api/buscar?termo=%20%20")
                    .header("authorization", bearer(false))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"], json!([]));
    }

    #[tokio::test]
    async fn find_rejects_users_table_and_bad_filters() {
        let request = |table: &str, body: Value| {
            Request::post(format!("/api/find/{}", table))
                .header("authorization", bearer(false))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        let response = app(test_state()).oneshot(request("usuarios", json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(test_state())
            .oneshot(request("comissoes", json!({ "where": { "nome": { "$regex": "x" } } })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_path_id_is_a_validation_error() {
        let response = app(test_state())
            .oneshot(
                Request::get("/api/projetos/not-a-uuid")
                    .header("authorization", bearer(false))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["field_errors"]["id"], "Invalid id 'not-a-uuid'");
    }
}
