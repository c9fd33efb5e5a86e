/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::auth::{jwt, Actor};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check
/// └── /api/
///     ├── /project                              # GET list, POST create
///     │   └── /:id                              # GET board, PUT, DELETE
///     │       ├── /members                      # GET, POST
///     │       │   └── /:user_id                 # PUT role, DELETE
///     │       └── /activity                     # GET
///     ├── /list                                 # POST create
///     │   ├── /project/:project_id              # GET lists of a project
///     │   └── /:id                              # GET with tasks, PUT, DELETE
///     ├── /task                                 # POST create
///     │   └── /:id                              # GET detail, PUT, DELETE
///     │       ├── /subtasks                     # POST
///     │       │   └── /:subtask_id              # PUT, DELETE
///     │       └── /comments                     # GET, POST
///     │           └── /:comment_id              # DELETE
///     └── /user                                 # GET list, POST create
///         └── /:id                              # GET, PUT, DELETE
///             └── /notifications                # GET (?unread=true)
///                 ├── /read                     # PUT mark all read
///                 └── /:notification_id/read    # PUT mark one read
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Identity (`/api` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route(
            "/:id/members/:user_id",
            put(routes::projects::update_member).delete(routes::projects::remove_member),
        )
        .route("/:id/activity", get(routes::projects::list_activity));

    let list_routes = Router::new()
        .route("/", post(routes::lists::create_list))
        .route("/project/:project_id", get(routes::lists::list_project_lists))
        .route(
            "/:id",
            get(routes::lists::get_list)
                .put(routes::lists::update_list)
                .delete(routes::lists::delete_list),
        );

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/subtasks", post(routes::tasks::create_subtask))
        .route(
            "/:id/subtasks/:subtask_id",
            put(routes::tasks::update_subtask).delete(routes::tasks::delete_subtask),
        )
        .route(
            "/:id/comments",
            get(routes::tasks::list_comments).post(routes::tasks::create_comment),
        )
        .route(
            "/:id/comments/:comment_id",
            axum::routing::delete(routes::tasks::delete_comment),
        );

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/:id",
            get(routes::users::get_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route(
            "/:id/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/:id/notifications/read",
            put(routes::notifications::mark_all_read),
        )
        .route(
            "/:id/notifications/:notification_id/read",
            put(routes::notifications::mark_read),
        );

    let api_routes = Router::new()
        .nest("/project", project_routes)
        .nest("/list", list_routes)
        .nest("/task", task_routes)
        .nest("/user", user_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config.api.cors_origins))
        .with_state(state)
}

/// CORS for the configured origins; `*` anywhere in the list allows any origin
fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Identity middleware layer
///
/// When an identity secret is configured and the request carries
/// `Authorization: Bearer <token>`, the token is validated and the caller's
/// [`Actor`] is put into request extensions. Requests without the header
/// pass through anonymously; a bad token is rejected with 401.
async fn identity_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(secret) = state.config.identity.jwt_secret.as_deref() else {
        return Ok(next.run(req).await);
    };

    let token = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .ok()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned)
                .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?,
        ),
    };

    let Some(token) = token else {
        return Ok(next.run(req).await);
    };

    let claims = jwt::validate_identity_token(&token, secret, &state.config.identity.audience)?;
    let actor = Actor::from(claims);
    tracing::debug!(user_id = %actor.user_id, "Identified caller");

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
