/// Navigation and session endpoints
///
/// # Endpoints
///
/// - `GET /v1/nav?path=/noticias` - Navigation bar with the active link
/// - `GET /v1/session?path=/dashboard` - Settled session and guard redirect

use crate::error::{ApiError, ApiResult};
use axum::{extract::Query, Extension, Json};
use passabola_shared::{
    backend::Identity,
    site::{nav::NavBar, nav::NavModel, routes::Route, Site},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Location the page is rendering
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(default = "home")]
    pub path: String,
}

fn home() -> String {
    Route::Home.path().to_string()
}

/// Session response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub signed_in: bool,

    /// Signed-in user, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,

    /// Page to show instead of `path`, if the session forbids it
    pub redirect: Option<Route>,
}

/// Navigation bar for the page at `path`
pub async fn nav(Query(query): Query<PathQuery>) -> Json<NavModel> {
    Json(NavBar::new(query.path).model())
}

/// Session state once settled, plus where the page at `path` must send the
/// visitor
///
/// # Errors
///
/// - `404 Not Found`: `path` is not a page of the site
pub async fn session(
    Extension(site): Extension<Arc<Site>>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<SessionResponse>> {
    let route = Route::from_path(&query.path)
        .ok_or_else(|| ApiError::NotFound(format!("Página não encontrada: {}", query.path)))?;

    let state = site.session().settled().await;
    let redirect = route.guard(&state);
    let user = state.session().map(|session| session.user.clone());

    Ok(Json(SessionResponse {
        signed_in: user.is_some(),
        user,
        redirect,
    }))
}
