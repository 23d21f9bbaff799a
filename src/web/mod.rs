// 🌐 Web Layer - axum router, shared state, handlers
//
// Pages are rendered on the server. Writes go through POST forms and answer
// with a 303 redirect back to the list they changed.

pub mod auth;
pub mod cache;
pub mod collectibles;
pub mod error;
pub mod html;
pub mod invoices;
pub mod maintenance;

use crate::config::Config;
use crate::db::Database;
use crate::entities::Category;
use crate::error::{DbError, DbResult};
use crate::pagination;
use axum::http::Uri;
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use cache::ViewCache;
pub use error::ApiError;

// ============================================================================
// STATE
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub views: ViewCache,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            views: ViewCache::new(),
        }
    }

    /// Run `f` on the shared connection. Failures are logged here.
    pub fn db<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Connection) -> DbResult<T>,
    {
        self.db.with_conn(f).map_err(|err| {
            self.log_db_error(&err);
            err
        })
    }

    /// Database failures are only logged in development
    pub fn logs_db_errors(&self) -> bool {
        self.config.is_development()
    }

    pub fn log_db_error(&self, err: &DbError) {
        if self.logs_db_errors() {
            tracing::error!(error = %err, detail = ?err.detail(), "database error");
        }
    }

    /// Serve `key` from the view cache, or render and remember it
    pub fn cached<F>(&self, key: &str, render: F) -> Result<Html<String>, ApiError>
    where
        F: FnOnce() -> Result<String, ApiError>,
    {
        if let Some(page) = self.views.get(key) {
            return Ok(Html(page));
        }

        let seen = self.views.generation();
        let page = render()?;
        if !self.views.insert(key, page.clone(), seen) {
            tracing::debug!(key, "view changed while rendering, not cached");
        }
        Ok(Html(page))
    }

    /// A collectible changed: its pages and the overview are stale
    pub fn invalidate_category(&self, category: Category) {
        self.views.invalidate_prefix(&category.path());
        self.views.invalidate_page("/dashboard");
    }

    pub fn invalidate_invoices(&self) {
        self.views.invalidate_prefix("/dashboard/invoices");
        self.views.invalidate_page("/dashboard/customers");
    }
}

/// Cache key for a request: path plus query string
pub fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// `?query=&page=` on every list page. Unparsable pages fall back to 1.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub query: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    pub fn query(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn page(&self) -> i64 {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1);
        pagination::clamp_page(page)
    }
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let mut app = Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(collectibles::overview))
        .nest("/dashboard/invoices", invoices::routes())
        .route("/dashboard/customers", get(invoices::customers))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/seed", get(maintenance::seed))
        .route("/query", get(maintenance::query))
        .route("/api/health", get(maintenance::health));

    for category in Category::ALL {
        app = app.nest(&category.path(), collectibles::routes(category));
    }

    app.nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::Environment;
    use crate::entities::user::create_session;
    use crate::seed::seed_database;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    pub fn test_state(environment: Environment) -> AppState {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| Ok(seed_database(conn).unwrap())).unwrap();
        let config = Config {
            environment,
            ..Config::default()
        };
        AppState::new(db, config)
    }

    /// Cookie header value for a fresh session of the seeded user
    pub fn login_cookie(state: &AppState) -> String {
        let session = state
            .db
            .with_conn(|conn| {
                let user = crate::entities::user::find_by_email(conn, crate::seed::DEFAULT_USER_EMAIL)?.unwrap();
                create_session(conn, &user.id)
            })
            .unwrap();
        format!("{}={}", auth::SESSION_COOKIE, session.token)
    }

    pub async fn get(state: &AppState, uri: &str) -> Response {
        router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn get_with_cookie(state: &AppState, uri: &str, cookie: &str) -> Response {
        router(state.clone())
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn post_form(state: &AppState, uri: &str, body: &str) -> Response {
        router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub fn location(response: &Response) -> &str {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        response.headers().get("location").unwrap().to_str().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::{AppState, ListParams};
    use crate::config::{Config, Environment};
    use crate::entities::collectible::{self, Category, CollectibleStatus, NewCollectible};
    use axum::http::StatusCode;

    #[test]
    fn test_list_params() {
        let params = ListParams {
            query: Some("  pin ".to_string()),
            page: Some("abc".to_string()),
        };
        assert_eq!(params.query(), "pin");
        assert_eq!(params.page(), 1);

        let params = ListParams {
            query: None,
            page: Some("-3".to_string()),
        };
        assert_eq!(params.query(), "");
        assert_eq!(params.page(), 1);
    }

    #[tokio::test]
    async fn test_root_redirects_to_dashboard() {
        let state = test_state(Environment::Test);
        let response = get(&state, "/").await;
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_overview_shows_seeded_total() {
        let state = test_state(Environment::Test);
        let response = get(&state, "/dashboard").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("Collected Progress"));
        assert!(body.contains("87%"));
        assert!(body.contains("Tools Collected"));
        assert!(body.contains("Abilities Collected"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = test_state(Environment::Test);
        let response = get(&state, "/dashboard/nothing-here").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_write_during_render_is_not_cached() {
        let state = test_state(Environment::Test);
        let key = "/dashboard/crests";

        let page = state
            .cached(key, || {
                let rows = state.db(|conn| collectible::count_filtered(conn, Category::Crests, ""))?;
                // Another request saves a crest before this render finishes
                state.db(|conn| {
                    collectible::insert(
                        conn,
                        Category::Crests,
                        &NewCollectible::new("Blason Nuevo", CollectibleStatus::Pending, 1.0),
                    )
                })?;
                state.invalidate_category(Category::Crests);
                Ok(format!("rows={}", rows))
            })
            .unwrap();

        assert_eq!(page.0, "rows=6");
        assert!(state.views.get(key).is_none());

        let page = state
            .cached(key, || {
                let rows = state.db(|conn| collectible::count_filtered(conn, Category::Crests, ""))?;
                Ok(format!("rows={}", rows))
            })
            .unwrap();
        assert_eq!(page.0, "rows=7");
        assert_eq!(state.views.get(key).as_deref(), Some("rows=7"));
    }

    #[test]
    fn test_db_errors_logged_only_in_development() {
        let state = test_state(Environment::Test);
        assert!(!state.logs_db_errors());

        let development = AppState::new(
            state.db.clone(),
            Config {
                environment: Environment::Development,
                ..Config::default()
            },
        );
        assert!(development.logs_db_errors());
    }
}
