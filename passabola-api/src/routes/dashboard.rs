/// Dashboard endpoint
///
/// ```text
/// GET /v1/dashboard
/// Authorization: Bearer eyJ...
/// ```
///
/// Answers with the settled [`DashboardState`]: `ready`, `missing_profile`,
/// `missing_stats` or `failed`. Without a session the request is refused
/// with `401` and a redirect to `/login`.

use crate::error::{ApiError, ApiResult};
use axum::{Extension, Json};
use passabola_shared::site::{dashboard::DashboardState, Site};
use std::sync::Arc;

pub async fn dashboard(Extension(site): Extension<Arc<Site>>) -> ApiResult<Json<DashboardState>> {
    match site.dashboard_view().load().await {
        DashboardState::Redirect { to } => Err(ApiError::SignInRequired(format!(
            "Entre para ver seu painel ({})",
            to
        ))),
        state => Ok(Json(state)),
    }
}
