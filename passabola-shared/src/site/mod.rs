/// Page logic of the site
///
/// Each page is a view-model over a [`SiteClient`]: forms validate their
/// input before any remote call, track their request state, and answer with
/// a [`Notice`] for the user plus an optional redirect. Rendering is left to
/// the caller.
///
/// # Pages
///
/// - [`player`]: player registration (account plus profile)
/// - [`team`]: team registration, signed-in users only
/// - [`login`]: sign in and sign out
/// - [`dashboard`]: the signed-in player's statistics
/// - [`news`]: published news, newest first
/// - [`nav`] and [`routes`]: navigation shell and route guards
///
/// # Example
///
/// ```no_run
/// use passabola_shared::backend::memory::MemoryBackend;
/// use passabola_shared::site::{login::LoginForm, Site};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new("dev-secret-key-at-least-32-bytes-long");
/// let site = Site::open(backend.client(), "http://localhost:8080");
///
/// let outcome = site
///     .login_view()
///     .submit(LoginForm {
///         email: "jogadora@example.com".to_string(),
///         password: "segredo123".to_string(),
///     })
///     .await?;
/// println!("{}", outcome.submitted.notice.message);
/// # Ok(())
/// # }
/// ```

pub mod dashboard;
pub mod login;
pub mod nav;
pub mod news;
pub mod player;
pub mod request;
pub mod routes;
pub mod team;

use crate::{
    backend::{BackendError, SiteClient},
    session::SessionContext,
};
use routes::Route;
use serde::Serialize;
use std::sync::Arc;
use validator::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message shown to the user after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// A form field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Flattens derive validation errors, sorted by field
pub(crate) fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Campo inválido".to_string()),
            })
        })
        .collect();

    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Trims a text input, treating blank as absent
pub(crate) fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn remote_message(error: &BackendError, fallback: &str) -> String {
    let message = error.user_message();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Why a form submission did not go through
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// Rejected before any remote call
    #[error("Verifique os campos destacados")]
    Invalid(Vec<FieldError>),

    /// The same form already has a request in flight
    #[error("Aguarde a conclusão do envio anterior")]
    InFlight,

    /// The action needs a session; the user is sent to the login page
    #[error("{0}")]
    NotSignedIn(String),

    /// The identity service accepted the signup but returned no user id
    #[error("Cadastro não retornou um usuário. Tente entrar com seu email e senha.")]
    NoIdentity,

    /// The identity service or table store refused or failed
    #[error("{}", remote_message(.error, .fallback))]
    Remote {
        error: BackendError,
        fallback: &'static str,
    },
}

impl SubmitError {
    pub(crate) fn remote(error: BackendError, fallback: &'static str) -> Self {
        SubmitError::Remote { error, fallback }
    }

    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }

    pub fn redirect(&self) -> Option<Route> {
        match self {
            SubmitError::NotSignedIn(_) => Some(Route::Login),
            _ => None,
        }
    }
}

/// What the page does after a successful submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submitted {
    pub notice: Notice,

    /// Page to navigate to, if any
    pub redirect: Option<Route>,

    /// Whether the form goes back to empty fields
    pub reset_form: bool,
}

/// The site as seen by one client
///
/// Each page exists once per site, so a form submitted again while its
/// first request is in flight is refused with [`SubmitError::InFlight`].
pub struct Site {
    client: SiteClient,
    session: SessionContext,
    player_registration: player::PlayerRegistration,
    team_registration: team::TeamRegistration,
    login_view: login::LoginView,
    dashboard_view: dashboard::DashboardView,
    news_view: news::NewsView,
}

impl Site {
    /// Opens the site for `client` and starts observing its session
    ///
    /// `site_url` is where account confirmation emails send new players.
    /// Must be called from within a Tokio runtime.
    pub fn open(client: SiteClient, site_url: impl Into<String>) -> Self {
        let session = SessionContext::start(Arc::clone(&client.identity));
        let site_url: Arc<str> = Arc::from(site_url.into());

        Self {
            player_registration: player::PlayerRegistration::new(client.clone(), site_url),
            team_registration: team::TeamRegistration::new(
                client.tables.clone(),
                session.clone(),
            ),
            login_view: login::LoginView::new(client.clone(), session.clone()),
            dashboard_view: dashboard::DashboardView::new(client.tables.clone(), session.clone()),
            news_view: news::NewsView::new(client.tables.clone()),
            client,
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn client(&self) -> &SiteClient {
        &self.client
    }

    pub fn player_registration(&self) -> &player::PlayerRegistration {
        &self.player_registration
    }

    pub fn team_registration(&self) -> &team::TeamRegistration {
        &self.team_registration
    }

    pub fn login_view(&self) -> &login::LoginView {
        &self.login_view
    }

    pub fn dashboard_view(&self) -> &dashboard::DashboardView {
        &self.dashboard_view
    }

    pub fn news_view(&self) -> &news::NewsView {
        &self.news_view
    }

    /// Signs out and sends the visitor to the home page
    pub async fn logout(&self) -> Result<Submitted, SubmitError> {
        login::sign_out(self.client.identity.as_ref()).await
    }
}
