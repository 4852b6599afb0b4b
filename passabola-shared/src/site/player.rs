/// Player registration
///
/// Registration is two dependent writes with no atomicity: the account is
/// created first, then the profile row keyed by the new account's id. The
/// profile fields also travel as account metadata, so when the second write
/// fails the profile can be recreated on the player's next login with
/// [`ensure_profile`].

use super::{
    field_errors, non_blank, request::RequestState, request::RequestTracker, routes::Route,
    FieldError, Notice, SubmitError, Submitted,
};
use crate::{
    backend::{BackendResult, Identity, SiteClient, TableStore},
    models::profile::{NewProfile, Position, Profile},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

const FALLBACK_MESSAGE: &str = "Erro ao realizar cadastro";

/// Player registration form as typed by the user
///
/// Text inputs arrive as strings; blank optional fields are stored as null.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PlayerForm {
    #[validate(email(message = "Informe um email válido"))]
    pub email: String,

    #[validate(length(min = 1, message = "Informe uma senha"))]
    pub password: String,

    #[validate(length(max = 100, message = "Nome deve ter no máximo 100 caracteres"))]
    pub full_name: String,

    #[validate(length(max = 50, message = "Apelido deve ter no máximo 50 caracteres"))]
    pub nickname: String,

    /// One of the [`Position`] names
    pub position: String,

    /// `YYYY-MM-DD`, or blank
    pub birth_date: String,

    pub phone: String,
}

/// Earliest accepted birth date
pub fn earliest_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Profile fields collected at signup
///
/// Stored as the account's metadata and, once the account exists, inserted
/// as the profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub full_name: String,
    pub nickname: Option<String>,
    pub position: Option<Position>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
}

impl ProfileDraft {
    /// Reads a draft back from account metadata
    pub fn from_metadata(metadata: &JsonValue) -> Option<Self> {
        serde_json::from_value(metadata.clone()).ok()
    }

    pub fn into_row(self, id: Uuid) -> NewProfile {
        NewProfile {
            id,
            full_name: self.full_name,
            nickname: self.nickname,
            position: self.position,
            birth_date: self.birth_date,
            phone: self.phone,
        }
    }
}

/// A form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSignup {
    pub email: String,
    pub password: String,
    pub draft: ProfileDraft,
}

impl PlayerForm {
    /// Validates against today's date
    pub fn check(&self) -> Result<PlayerSignup, Vec<FieldError>> {
        self.check_on(Utc::now().date_naive())
    }

    /// Validates with `today` as the latest accepted birth date
    pub fn check_on(&self, today: NaiveDate) -> Result<PlayerSignup, Vec<FieldError>> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        if self.email.trim().is_empty() {
            errors.retain(|e| e.field != "email");
            errors.push(FieldError::new("email", "Email é obrigatório"));
        }

        let full_name = non_blank(&self.full_name);
        if full_name.is_none() {
            errors.push(FieldError::new("full_name", "Nome completo é obrigatório"));
        }

        let position = match self.position.trim() {
            "" => {
                errors.push(FieldError::new("position", "Selecione uma posição"));
                None
            }
            name => match name.parse::<Position>() {
                Ok(position) => Some(position),
                Err(e) => {
                    errors.push(FieldError::new("position", e.to_string()));
                    None
                }
            },
        };

        let birth_date = match non_blank(&self.birth_date) {
            None => None,
            Some(text) => match text.parse::<NaiveDate>() {
                Ok(date) if date < earliest_birth_date() || date > today => {
                    errors.push(FieldError::new(
                        "birth_date",
                        "Data de nascimento fora do intervalo permitido",
                    ));
                    None
                }
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(FieldError::new("birth_date", "Data de nascimento inválida"));
                    None
                }
            },
        };

        match full_name {
            Some(full_name) if errors.is_empty() => Ok(PlayerSignup {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                draft: ProfileDraft {
                    full_name,
                    nickname: non_blank(&self.nickname),
                    position,
                    birth_date,
                    phone: non_blank(&self.phone),
                },
            }),
            _ => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                Err(errors)
            }
        }
    }
}

/// Player registration page
pub struct PlayerRegistration {
    client: SiteClient,
    site_url: Arc<str>,
    tracker: RequestTracker<Submitted>,
}

impl PlayerRegistration {
    pub(crate) fn new(client: SiteClient, site_url: Arc<str>) -> Self {
        Self {
            client,
            site_url,
            tracker: RequestTracker::new(),
        }
    }

    pub fn state(&self) -> RequestState<Submitted> {
        self.tracker.state()
    }

    /// Creates the account and the profile
    ///
    /// On success the player is sent to the login page. Nothing is sent to
    /// the backend when validation fails.
    pub async fn submit(&self, form: PlayerForm) -> Result<Submitted, SubmitError> {
        let signup = form.check().map_err(SubmitError::Invalid)?;
        let attempt = self.tracker.begin().ok_or(SubmitError::InFlight)?;

        match self.register(signup).await {
            Ok(submitted) => {
                attempt.succeed(submitted.clone());
                Ok(submitted)
            }
            Err(e) => {
                attempt.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn register(&self, signup: PlayerSignup) -> Result<Submitted, SubmitError> {
        let metadata = serde_json::to_value(&signup.draft).unwrap_or_default();

        let identity = self
            .client
            .identity
            .create_identity(&signup.email, &signup.password, &self.site_url, metadata)
            .await
            .map_err(|e| {
                debug!(error = %e, "Account creation refused");
                SubmitError::remote(e, FALLBACK_MESSAGE)
            })?
            .ok_or(SubmitError::NoIdentity)?;

        self.client
            .tables
            .insert_profile(signup.draft.into_row(identity.id))
            .await
            .map_err(|e| {
                warn!(
                    user_id = %identity.id,
                    error = %e,
                    "Profile insert failed; it will be retried on next login"
                );
                SubmitError::remote(e, FALLBACK_MESSAGE)
            })?;

        info!(user_id = %identity.id, "Player registered");

        Ok(Submitted {
            notice: Notice::success("Cadastro realizado com sucesso!"),
            redirect: Some(Route::Login),
            reset_form: false,
        })
    }
}

/// Inserts the profile of `identity` if signup left it missing
///
/// Returns the inserted profile, or `None` when the profile already exists
/// or the account carries no profile draft.
pub async fn ensure_profile(
    tables: &dyn TableStore,
    identity: &Identity,
) -> BackendResult<Option<Profile>> {
    if tables.find_profile(identity.id).await?.is_some() {
        return Ok(None);
    }

    let Some(draft) = ProfileDraft::from_metadata(&identity.user_metadata) else {
        debug!(user_id = %identity.id, "No profile and no signup draft to recover from");
        return Ok(None);
    };

    let profile = tables.insert_profile(draft.into_row(identity.id)).await?;
    info!(user_id = %identity.id, "Recovered missing profile from signup metadata");
    Ok(Some(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        memory::{MemoryBackend, Operation},
        BackendError,
    };
    use serde_json::json;

    const SITE_URL: &str = "https://passaabola.example";

    fn backend() -> MemoryBackend {
        MemoryBackend::new("player-test-secret-key-32-bytes-long")
    }

    fn registration(backend: &MemoryBackend) -> PlayerRegistration {
        PlayerRegistration::new(backend.client(), Arc::from(SITE_URL))
    }

    fn form() -> PlayerForm {
        PlayerForm {
            email: "marta@example.com".to_string(),
            password: "segredo123".to_string(),
            full_name: "Marta Vieira da Silva".to_string(),
            nickname: "Marta".to_string(),
            position: "Atacante".to_string(),
            birth_date: "1986-02-19".to_string(),
            phone: "".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_valid_form_builds_draft() {
        let signup = form().check_on(today()).unwrap();

        assert_eq!(signup.draft.position, Some(Position::Atacante));
        assert_eq!(signup.draft.birth_date, NaiveDate::from_ymd_opt(1986, 2, 19));
        assert_eq!(signup.draft.phone, None);
        assert_eq!(signup.draft.nickname.as_deref(), Some("Marta"));
    }

    #[test]
    fn test_required_fields_reported() {
        let errors = PlayerForm::default().check_on(today()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, vec!["email", "full_name", "password", "position"]);
    }

    #[test]
    fn test_birth_date_bounds() {
        let mut early = form();
        early.birth_date = "1899-12-31".to_string();
        assert!(early.check_on(today()).is_err());

        let mut future = form();
        future.birth_date = "2025-06-02".to_string();
        assert!(future.check_on(today()).is_err());

        let mut edge = form();
        edge.birth_date = "1900-01-01".to_string();
        assert!(edge.check_on(today()).is_ok());

        let mut blank = form();
        blank.birth_date = " ".to_string();
        assert_eq!(blank.check_on(today()).unwrap().draft.birth_date, None);
    }

    #[test]
    fn test_unknown_position_rejected() {
        let mut form = form();
        form.position = "Pivô".to_string();

        let errors = form.check_on(today()).unwrap_err();
        assert_eq!(errors[0].field, "position");
    }

    #[tokio::test]
    async fn test_missing_field_makes_no_remote_call() {
        let backend = backend();
        let mut form = form();
        form.full_name = "   ".to_string();

        let result = registration(&backend).submit(form).await;

        assert!(matches!(result, Err(SubmitError::Invalid(_))));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_success_creates_identity_then_profile() {
        let backend = backend();

        let submitted = registration(&backend).submit(form()).await.unwrap();

        assert_eq!(submitted.redirect, Some(Route::Login));
        assert_eq!(submitted.notice.message, "Cadastro realizado com sucesso!");
        assert!(!submitted.reset_form);

        let calls = backend.calls().await;
        let operations: Vec<Operation> = calls.iter().map(|c| c.operation).collect();
        assert_eq!(
            operations,
            vec![Operation::CreateIdentity, Operation::InsertProfile]
        );
        assert_eq!(calls[0].payload["redirect_to"], json!(SITE_URL));
        assert_eq!(calls[1].payload["birth_date"], json!("1986-02-19"));

        let id: Uuid = serde_json::from_value(calls[1].payload["id"].clone()).unwrap();
        let profile = backend.profile(id).await.unwrap();
        assert_eq!(profile.full_name, "Marta Vieira da Silva");
    }

    #[tokio::test]
    async fn test_failed_identity_creation_skips_profile() {
        let backend = backend();
        backend
            .fail_next(
                Operation::CreateIdentity,
                BackendError::Rejected {
                    status: 422,
                    message: "User already registered".to_string(),
                },
            )
            .await;
        let registration = registration(&backend);

        let err = registration.submit(form()).await.unwrap_err();

        assert_eq!(err.notice().message, "User already registered");
        assert_eq!(err.redirect(), None);
        assert_eq!(backend.count(Operation::InsertProfile).await, 0);
        assert_eq!(
            registration.state(),
            RequestState::Failed("User already registered".to_string())
        );
    }

    #[tokio::test]
    async fn test_submit_refused_while_in_flight() {
        let backend = backend();
        let registration = registration(&backend);
        let _pending = registration.tracker.begin().unwrap();

        let result = registration.submit(form()).await;

        assert_eq!(result, Err(SubmitError::InFlight));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_profile_recovers_from_metadata() {
        let backend = backend();
        let draft = form().check_on(today()).unwrap().draft;
        let identity = backend
            .add_user(
                "marta@example.com",
                "segredo123",
                serde_json::to_value(&draft).unwrap(),
            )
            .await
            .unwrap();
        let tables = backend.tables();

        let recovered = ensure_profile(&tables, &identity).await.unwrap();
        assert_eq!(recovered.unwrap().id, identity.id);

        // Second run finds the row and does nothing
        assert!(ensure_profile(&tables, &identity).await.unwrap().is_none());
        assert_eq!(backend.count(Operation::InsertProfile).await, 1);
    }

    #[tokio::test]
    async fn test_ensure_profile_without_draft_does_nothing() {
        let backend = backend();
        let identity = backend
            .add_user("admin@example.com", "segredo123", json!({}))
            .await
            .unwrap();

        let recovered = ensure_profile(&backend.tables(), &identity).await.unwrap();

        assert!(recovered.is_none());
        assert_eq!(backend.count(Operation::InsertProfile).await, 0);
    }
}
