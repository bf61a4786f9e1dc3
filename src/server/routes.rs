use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap,
    },
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::error::AppError;
use super::state::{AppState, SessionAuth, SESSION_COOKIE, SESSION_TTL};
use crate::auth::{AuthProvider, Credentials};

const FAILURE_REDIRECT: &str = "/";

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

/// Session id from the request's `Cookie` header, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_set_cookie(sid: &str) -> String {
    format!(
        "{SESSION_COOKIE}={sid}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_TTL.as_secs()
    )
}

fn session_clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

pub async fn index_handler() -> impl IntoResponse {
    "Tently auth server"
}

pub async fn google_login_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let nonce = state.sessions.issue_state();
    Redirect::to(&state.provider.authorize_url(&nonce))
}

async fn complete_login(state: &AppState, params: CallbackParams) -> Result<String, AppError> {
    let nonce = params.state.ok_or(AppError::UnknownState)?;
    if !state.sessions.take_state(&nonce) {
        return Err(AppError::UnknownState);
    }
    let code = params.code.ok_or(AppError::MissingCode)?;
    let user = state.provider.exchange(&code).await?;

    let auth = SessionAuth::new(&state.sessions, None);
    auth.login(Credentials::Profile(user))?;
    auth.session_id()
        .ok_or_else(|| AppError::Rejected("session was not created".into()))
}

pub async fn google_callback_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match complete_login(&state, params).await {
        Ok(sid) => (
            AppendHeaders([(SET_COOKIE, session_set_cookie(&sid))]),
            Redirect::to(&state.config.frontend_url),
        )
            .into_response(),
        Err(e) => {
            warn!("Google sign-in failed: {e}");
            Redirect::to(FAILURE_REDIRECT).into_response()
        }
    }
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let auth = SessionAuth::new(&state.sessions, session_cookie(&headers));
    auth.logout()?;
    info!("session ended");
    Ok((
        AppendHeaders([(SET_COOKIE, session_clear_cookie())]),
        Redirect::to(FAILURE_REDIRECT),
    )
        .into_response())
}

pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let auth = SessionAuth::new(&state.sessions, session_cookie(&headers));
    let user = auth.current_user()?.ok_or(AppError::Unauthorized)?;
    Ok(Json(json!({ "user": user })))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header::LOCATION, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::models::User;
    use crate::server::config::{Config, DEFAULT_FRONTEND_URL};
    use crate::server::google::IdentityProvider;
    use crate::server::router;

    struct FakeIdentity;

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        fn authorize_url(&self, state: &str) -> String {
            format!("https://idp.test/consent?state={state}")
        }

        async fn exchange(&self, code: &str) -> Result<User, AppError> {
            if code == "good-code" {
                Ok(User {
                    name: Some("Grace Molero".into()),
                    ..User::with_email("grace@coop.ng")
                })
            } else {
                Err(AppError::Rejected("bad code".into()))
            }
        }
    }

    fn test_app() -> (Arc<AppState>, Router) {
        let state = AppState::new(Config::for_tests(), Arc::new(FakeIdentity));
        (state.clone(), router(state))
    }

    async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(resp: &Response) -> &str {
        resp.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_session_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; tently.sid=abc123; other=1".parse().unwrap());
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc123"));
        headers.insert(COOKIE, "tently.sid=".parse().unwrap());
        assert_eq!(session_cookie(&headers), None);
    }

    #[tokio::test]
    async fn test_google_login_redirects_with_state() {
        let (state, app) = test_app();
        let resp = get(&app, "/auth/google", None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let target = location(&resp).to_string();
        let nonce = target.split("state=").nth(1).unwrap();
        assert!(state.sessions.take_state(nonce));
    }

    #[tokio::test]
    async fn test_callback_sets_cookie_and_me_returns_user() {
        let (state, app) = test_app();
        let nonce = state.sessions.issue_state();
        let resp = get(
            &app,
            &format!("/auth/google/callback?code=good-code&state={nonce}"),
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), DEFAULT_FRONTEND_URL);
        let set_cookie = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("tently.sid="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=86400"));

        let cookie = set_cookie.split(';').next().unwrap().to_string();
        let me = get(&app, "/api/me", Some(&cookie)).await;
        assert_eq!(me.status(), StatusCode::OK);
        let body = json_body(me).await;
        assert_eq!(body["user"]["email"], "grace@coop.ng");
        assert_eq!(body["user"]["name"], "Grace Molero");
    }

    #[tokio::test]
    async fn test_me_without_session_is_401() {
        let (_state, app) = test_app();
        let resp = get(&app, "/api/me", None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await, json!({ "user": null }));

        let resp = get(&app, "/api/me", Some("tently.sid=forged")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_callback_failures_redirect_home() {
        let (state, app) = test_app();

        let resp = get(&app, "/auth/google/callback?code=good-code&state=unknown", None).await;
        assert_eq!(location(&resp), "/");

        let nonce = state.sessions.issue_state();
        let resp = get(&app, &format!("/auth/google/callback?state={nonce}"), None).await;
        assert_eq!(location(&resp), "/");

        let nonce = state.sessions.issue_state();
        let resp = get(
            &app,
            &format!("/auth/google/callback?code=bad&state={nonce}"),
            None,
        )
        .await;
        assert_eq!(location(&resp), "/");
        assert!(resp.headers().get(SET_COOKIE).is_none());
        assert_eq!(state.sessions.len(), 0);
    }

    #[tokio::test]
    async fn test_logout_destroys_session() {
        let (state, app) = test_app();
        let sid = state.sessions.create(User::with_email("grace@coop.ng"));
        let cookie = format!("tently.sid={sid}");

        let resp = get(&app, "/logout", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/");
        let cleared = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(state.sessions.get(&sid).is_none());

        let me = get(&app, "/api/me", Some(&cookie)).await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }
}
