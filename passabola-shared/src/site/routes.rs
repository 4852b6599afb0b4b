/// Site routes and their session guards

use crate::session::SessionState;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    News,
    Register,
    Login,
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Home,
        Route::News,
        Route::Register,
        Route::Login,
        Route::Dashboard,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::News => "/noticias",
            Route::Register => "/cadastro",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Resolves a location path, ignoring a trailing slash
    pub fn from_path(path: &str) -> Option<Route> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        Route::ALL.iter().copied().find(|r| r.path() == path)
    }

    /// Where a visitor in `state` must be sent instead of this route
    ///
    /// The dashboard needs a session; the login page is skipped by anyone who
    /// already has one. Nothing redirects while the session is loading.
    pub fn guard(&self, state: &SessionState) -> Option<Route> {
        match (self, state) {
            (_, SessionState::Loading) => None,
            (Route::Dashboard, SessionState::SignedOut) => Some(Route::Login),
            (Route::Login, SessionState::SignedIn(_)) => Some(Route::Dashboard),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}
