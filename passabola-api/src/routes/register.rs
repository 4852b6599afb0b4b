/// Registration endpoints
///
/// # Endpoints
///
/// - `POST /v1/register/player` - Create an account and its player profile
/// - `POST /v1/register/team` - Create a team owned by the signed-in user

use crate::error::ApiResult;
use axum::{http::StatusCode, Extension, Json};
use passabola_shared::site::{player::PlayerForm, team::TeamForm, Site, Submitted};
use std::sync::Arc;

/// Register a player
///
/// # Endpoint
///
/// ```text
/// POST /v1/register/player
/// Content-Type: application/json
///
/// {
///   "email": "jogadora@example.com",
///   "password": "segredo123",
///   "full_name": "Marta Vieira da Silva",
///   "nickname": "Marta",
///   "position": "Atacante",
///   "birth_date": "1986-02-19",
///   "phone": "(11) 91234-5678"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with a success notice and a redirect to `/login`.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Field validation failed
/// - `400 Bad Request`: Signup refused (provider message verbatim)
pub async fn register_player(
    Extension(site): Extension<Arc<Site>>,
    Json(form): Json<PlayerForm>,
) -> ApiResult<(StatusCode, Json<Submitted>)> {
    let submitted = site.player_registration().submit(form).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// Register a team
///
/// # Endpoint
///
/// ```text
/// POST /v1/register/team
/// Authorization: Bearer eyJ...
/// Content-Type: application/json
///
/// {
///   "name": "Pretinhas FC",
///   "founded_year": 2015,
///   "description": "Time de várzea da zona leste"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: No session; the body carries `"redirect": "/login"`
/// - `422 Unprocessable Entity`: Field validation failed
/// - `409 Conflict`: Insert refused as a duplicate
pub async fn register_team(
    Extension(site): Extension<Arc<Site>>,
    Json(form): Json<TeamForm>,
) -> ApiResult<(StatusCode, Json<Submitted>)> {
    let submitted = site.team_registration().submit(form).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}
