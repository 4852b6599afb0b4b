/// Sign in and sign out
///
/// A successful sign-in only reports success. Leaving the login page is up
/// to the route guard, which sees the new session through the session
/// context; the submit handler never navigates.

use super::{
    player::ensure_profile, request::RequestState, request::RequestTracker, routes::Route,
    FieldError, Notice, SubmitError, Submitted,
};
use crate::{
    backend::{IdentityService, Session, SiteClient},
    session::SessionContext,
};
use serde::Deserialize;
use tracing::{info, warn};

const FALLBACK_MESSAGE: &str = "Erro ao fazer login";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email é obrigatório"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Senha é obrigatória"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Outcome of a successful sign-in
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedIn {
    pub submitted: Submitted,
    pub session: Session,
}

/// Login page
pub struct LoginView {
    client: SiteClient,
    session: SessionContext,
    tracker: RequestTracker<Submitted>,
}

impl LoginView {
    pub(crate) fn new(client: SiteClient, session: SessionContext) -> Self {
        Self {
            client,
            session,
            tracker: RequestTracker::new(),
        }
    }

    pub fn state(&self) -> RequestState<Submitted> {
        self.tracker.state()
    }

    /// Where the page sends the visitor given the current session, if anywhere
    pub fn redirect(&self) -> Option<Route> {
        Route::Login.guard(&self.session.current())
    }

    /// Signs in
    ///
    /// Also recreates the player's profile when signup could not write it.
    /// A failed repair is logged and does not fail the sign-in.
    pub async fn submit(&self, form: LoginForm) -> Result<LoggedIn, SubmitError> {
        form.check().map_err(SubmitError::Invalid)?;
        let attempt = self.tracker.begin().ok_or(SubmitError::InFlight)?;

        let session = match self
            .client
            .identity
            .authenticate(form.email.trim(), &form.password)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                let err = SubmitError::remote(e, FALLBACK_MESSAGE);
                attempt.fail(err.to_string());
                return Err(err);
            }
        };

        info!(user_id = %session.user.id, "Signed in");

        if let Err(e) = ensure_profile(self.client.tables.as_ref(), &session.user).await {
            warn!(user_id = %session.user.id, error = %e, "Could not recover missing profile");
        }

        let submitted = Submitted {
            notice: Notice::success("Login realizado com sucesso!"),
            redirect: None,
            reset_form: false,
        };
        attempt.succeed(submitted.clone());

        Ok(LoggedIn { submitted, session })
    }
}

/// Signs out and sends the visitor home
pub async fn sign_out(identity: &dyn IdentityService) -> Result<Submitted, SubmitError> {
    identity
        .sign_out()
        .await
        .map_err(|e| SubmitError::remote(e, "Erro ao sair"))?;

    Ok(Submitted {
        notice: Notice::success("Logout realizado com sucesso!"),
        redirect: Some(Route::Home),
        reset_form: false,
    })
}
