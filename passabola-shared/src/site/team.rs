/// Team registration
///
/// Any signed-in user can register any number of teams; no ownership link is
/// stored. After a successful submission the form is emptied for the next
/// team.

use super::{
    field_errors, non_blank, request::RequestState, request::RequestTracker, FieldError, Notice,
    SubmitError, Submitted,
};
use crate::{
    backend::TableStore,
    models::team::NewTeam,
    session::SessionContext,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Deserializer};
use std::{ops::RangeInclusive, sync::Arc};
use tracing::{debug, info};
use validator::Validate;

const FALLBACK_MESSAGE: &str = "Erro ao cadastrar time";

/// Shown when a visitor without a session submits the form
pub const SIGN_IN_REQUIRED: &str = "Você precisa estar logado para cadastrar um time";

/// Years offered by the founded-year input
///
/// Only a hint for the input; submissions outside it are accepted.
pub fn founded_year_hint() -> RangeInclusive<i32> {
    1900..=Utc::now().year()
}

/// Accepts a JSON string, number or null for a text input
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => String::new(),
        Some(Raw::Text(text)) => text,
        Some(Raw::Integer(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
    })
}

/// Team registration form as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(default)]
pub struct TeamForm {
    #[validate(length(max = 100, message = "Nome deve ter no máximo 100 caracteres"))]
    pub name: String,

    /// Whole year, or blank
    #[serde(deserialize_with = "text_or_number")]
    pub founded_year: String,

    pub description: String,
}

impl TeamForm {
    /// Validates the form and builds the row to insert
    pub fn check(&self) -> Result<NewTeam, Vec<FieldError>> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        let name = non_blank(&self.name);
        if name.is_none() {
            errors.push(FieldError::new("name", "Nome do time é obrigatório"));
        }

        let founded_year = match non_blank(&self.founded_year) {
            None => None,
            Some(text) => match text.parse::<i32>() {
                Ok(year) => {
                    if !founded_year_hint().contains(&year) {
                        debug!(year, "Founded year outside the suggested range");
                    }
                    Some(year)
                }
                Err(_) => {
                    errors.push(FieldError::new(
                        "founded_year",
                        "Ano de fundação deve ser um número inteiro",
                    ));
                    None
                }
            },
        };

        match name {
            Some(name) if errors.is_empty() => Ok(NewTeam {
                name,
                founded_year,
                description: non_blank(&self.description),
            }),
            _ => {
                errors.sort_by(|a, b| a.field.cmp(&b.field));
                Err(errors)
            }
        }
    }
}

/// Team registration page
pub struct TeamRegistration {
    tables: Arc<dyn TableStore>,
    session: SessionContext,
    tracker: RequestTracker<Submitted>,
}

impl TeamRegistration {
    pub(crate) fn new(tables: Arc<dyn TableStore>, session: SessionContext) -> Self {
        Self {
            tables,
            session,
            tracker: RequestTracker::new(),
        }
    }

    pub fn state(&self) -> RequestState<Submitted> {
        self.tracker.state()
    }

    /// Inserts the team
    ///
    /// Without a session nothing is written and the visitor is sent to the
    /// login page.
    pub async fn submit(&self, form: TeamForm) -> Result<Submitted, SubmitError> {
        let team = form.check().map_err(SubmitError::Invalid)?;
        let attempt = self.tracker.begin().ok_or(SubmitError::InFlight)?;

        let state = self.session.settled().await;
        if state.session().is_none() {
            let err = SubmitError::NotSignedIn(SIGN_IN_REQUIRED.to_string());
            attempt.fail(err.to_string());
            return Err(err);
        }

        match self.tables.insert_team(team).await {
            Ok(team) => {
                info!(team_id = %team.id, name = %team.name, "Team registered");

                let submitted = Submitted {
                    notice: Notice::success("Time cadastrado com sucesso!"),
                    redirect: None,
                    reset_form: true,
                };
                attempt.succeed(submitted.clone());
                Ok(submitted)
            }
            Err(e) => {
                let err = SubmitError::remote(e, FALLBACK_MESSAGE);
                attempt.fail(err.to_string());
                Err(err)
            }
        }
    }
}
