/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Sign in and get the session tokens
/// - `POST /v1/auth/logout` - End the session named by the Bearer token

use crate::error::ApiResult;
use axum::{Extension, Json};
use passabola_shared::{
    backend::Session,
    site::{login::LoginForm, Site, Submitted},
};
use serde::Serialize;
use std::sync::Arc;

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub submitted: Submitted,

    /// Tokens to present as `Authorization: Bearer` on later requests
    pub session: Session,
}

/// Sign in with email and password
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "jogadora@example.com",
///   "password": "segredo123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "notice": { "level": "success", "message": "Login realizado com sucesso!" },
///   "redirect": null,
///   "reset_form": false,
///   "session": { "access_token": "eyJ...", "user": { "id": "uuid", ... } }
/// }
/// ```
///
/// The response never redirects; the client asks `GET /v1/session?path=/login`
/// with the new token and follows the guard from there.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Email or password missing
/// - `400 Bad Request`: Credentials refused (provider message verbatim)
pub async fn login(
    Extension(site): Extension<Arc<Site>>,
    Json(form): Json<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let logged_in = site.login_view().submit(form).await?;

    Ok(Json(LoginResponse {
        submitted: logged_in.submitted,
        session: logged_in.session,
    }))
}

/// Sign out
///
/// Answers with a notice and a redirect to the home page.
pub async fn logout(Extension(site): Extension<Arc<Site>>) -> ApiResult<Json<Submitted>> {
    let submitted = site.logout().await?;
    Ok(Json(submitted))
}
