//! Login state and the query-then-log workflow of one user.

use tracing::{info, instrument, warn};

use crate::auth::{AuthError, CredentialStore};
use crate::indicators::{FetchError, Indicator, IndicatorClient, Reading};
use crate::query_log::{IndicatorQuery, QueryLog};
use crate::storage::StorageError;
use crate::validation::parse_date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { username: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("you must log in first")]
    NotAuthenticated,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct Session {
    credentials: CredentialStore,
    indicators: IndicatorClient,
    log: QueryLog,
    state: SessionState,
}

impl Session {
    pub fn new(credentials: CredentialStore, indicators: IndicatorClient, log: QueryLog) -> Self {
        Self {
            credentials,
            indicators,
            log,
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    fn require_user(&self) -> Result<&str, SessionError> {
        self.current_user().ok_or_else(|| {
            warn!("operation requires login");
            SessionError::NotAuthenticated
        })
    }

    /// Creates the account. Does not log in.
    pub async fn register(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        self.credentials.register(username, password).await?;
        Ok(())
    }

    /// On failure the previous state is kept.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        self.credentials.login(username, password).await?;
        self.state = SessionState::Authenticated {
            username: username.to_string(),
        };
        Ok(())
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated { username } = &self.state {
            info!(%username, "logged out");
        }
        self.state = SessionState::Anonymous;
    }

    /// Looks up `name` on `date` (`DD-MM-YYYY`, blank for today). Nothing is
    /// logged; see [`Session::confirm_and_log`].
    #[instrument(skip(self))]
    pub async fn query(&self, name: &str, date: &str) -> Result<Reading, SessionError> {
        self.require_user()?;
        let indicator = name
            .parse::<Indicator>()
            .map_err(|_| FetchError::InvalidIndicator(name.to_string()))?;
        let date = parse_date(date).map_err(FetchError::from)?;
        Ok(self.indicators.fetch(indicator, Some(date)).await?)
    }

    /// Persists a reading obtained from [`Session::query`] for the current user.
    pub async fn confirm_and_log(&self, reading: &Reading) -> Result<IndicatorQuery, SessionError> {
        let username = self.require_user()?;
        Ok(self.log.record(username, reading).await?)
    }

    /// Logged queries of the current user, newest first.
    pub async fn history(&self) -> Result<Vec<IndicatorQuery>, SessionError> {
        let username = self.require_user()?;
        Ok(self.log.list_for_user(username).await?)
    }
}
