// 🔐 Login, logout and the session extractor

use crate::entities::user::{authenticate, create_session, delete_session, find_session_user, User, SESSION_DAYS};
use crate::schema::LoginForm;
use crate::web::{html, ApiError, AppState};
use axum::async_trait;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

pub const SESSION_COOKIE: &str = "silk_session";

const UNAUTHORIZED: &str = "Unauthorized. You must be logged in to access this endpoint.";

/// Session token from the request cookies, if any
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn session_cookie(token: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Only local paths are followed after login
fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/dashboard",
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// The logged-in user. Requests without a live session are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar).ok_or(ApiError::Unauthorized(UNAUTHORIZED))?;
        let user = state.db(|conn| find_session_user(conn, &token))?;
        user.map(CurrentUser).ok_or(ApiError::Unauthorized(UNAUTHORIZED))
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

/// GET /login
pub async fn login_page(Query(params): Query<LoginParams>) -> Html<String> {
    Html(html::login_page(None, "", safe_redirect(params.redirect_to.as_deref())))
}

/// POST /login - check credentials, start a session, set the cookie
pub async fn login(State(state): State<AppState>, jar: CookieJar, Form(form): Form<LoginForm>) -> Response {
    let target = safe_redirect(form.redirect_to.as_deref()).to_string();
    let email = form.email.as_deref().unwrap_or_default();

    let failed = |status: StatusCode, message: &str| {
        (status, Html(html::login_page(Some(message), email, &target))).into_response()
    };

    let Some((email, password)) = form.credentials() else {
        return failed(StatusCode::UNAUTHORIZED, "Invalid credentials.");
    };

    let outcome = state.db(|conn| match authenticate(conn, email, password)? {
        Some(user) => create_session(conn, &user.id).map(Some),
        None => Ok(None),
    });

    match outcome {
        Ok(Some(session)) => {
            tracing::info!(email, "logged in");
            let cookie = session_cookie(session.token, time::Duration::days(SESSION_DAYS));
            (jar.add(cookie), Redirect::to(&target)).into_response()
        }
        Ok(None) => {
            tracing::debug!(email, "login rejected");
            failed(StatusCode::UNAUTHORIZED, "Invalid credentials.")
        }
        Err(_) => failed(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong."),
    }
}

/// POST /logout - drop the session (if any) and clear the cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(token) = session_token(&jar) {
        // A failed delete still clears the cookie; the row expires on its own
        let _ = state.db(|conn| delete_session(conn, &token));
    }

    let expired = session_cookie(String::new(), time::Duration::ZERO);
    (jar.add(expired), Redirect::to("/login")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::web::router;
    use crate::web::test_support::*;
    use axum::body::Body;
    use axum::http::header::{COOKIE, SET_COOKIE};
    use axum::http::{HeaderMap, HeaderValue, Request};
    use tower::ServiceExt;

    #[test]
    fn test_session_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&CookieJar::from_headers(&headers)).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; silk_session=abc123; other=1"));
        assert_eq!(session_token(&CookieJar::from_headers(&headers)).as_deref(), Some("abc123"));

        headers.insert(COOKIE, HeaderValue::from_static("silk_session="));
        assert!(session_token(&CookieJar::from_headers(&headers)).is_none());
    }

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/dashboard/tools")), "/dashboard/tools");
        assert_eq!(safe_redirect(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_redirect(None), "/dashboard");
    }

    #[tokio::test]
    async fn test_login_sets_session_cookie() {
        let state = test_state(Environment::Test);
        let response = post_form(&state, "/login", "email=user%40nextmail.com&password=123456").await;

        assert_eq!(location(&response), "/dashboard");
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("silk_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let state = test_state(Environment::Test);
        let response = post_form(&state, "/login", "email=user%40nextmail.com&password=nope").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Invalid credentials."));
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let state = test_state(Environment::Test);
        let response = post_form(&state, "/logout", "").await;
        assert_eq!(location(&response), "/login");
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("silk_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let state = test_state(Environment::Test);
        let cookie = login_cookie(&state);
        assert_eq!(get_with_cookie(&state, "/query", &cookie).await.status(), StatusCode::OK);

        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");

        assert_eq!(
            get_with_cookie(&state, "/query", &cookie).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
