//! Accounts and sessions.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::place::Region;
use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub email: Option<String>,
    /// Operating regions declared by a local. Empty for travelers and for
    /// locals who serve everywhere.
    #[serde(default)]
    pub regions: Vec<Region>,
}

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub handle: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct JoinUser<'a> {
    pub handle: &'a str,
    pub display_name: &'a str,
    pub email: Option<&'a str>,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
struct Session {
    token: String,
    user: UserProfile,
}

impl UserProfile {
    /// Sign in and persist the bearer token in the client's token store.
    pub async fn login(api: &ApiClient, credentials: &Credentials<'_>) -> Result<Self, ApiError> {
        let session: Session = api.post("/auth/login", credentials).await?;
        api.tokens()
            .set(&session.token)
            .map_err(|e| ApiError::Transport(format!("failed to persist token: {e}")))?;
        api.invalidate(Family::Auth);
        info!(handle = %session.user.handle, "signed in");
        Ok(session.user)
    }

    /// Register a new account. The server signs the user in immediately.
    pub async fn join(api: &ApiClient, data: &JoinUser<'_>) -> Result<Self, ApiError> {
        let session: Session = api.post("/auth/join", data).await?;
        api.tokens()
            .set(&session.token)
            .map_err(|e| ApiError::Transport(format!("failed to persist token: {e}")))?;
        api.invalidate(Family::Auth);
        Ok(session.user)
    }

    /// Profile of the signed-in user.
    pub async fn me(api: &ApiClient) -> Result<Self, ApiError> {
        api.get_cached(Family::Auth, "/auth/me", &[]).await
    }

    /// Drop the stored token. Purely client-side.
    pub fn logout(api: &ApiClient) -> Result<(), ApiError> {
        api.tokens()
            .clear()
            .map_err(|e| ApiError::Transport(format!("failed to clear token: {e}")))?;
        api.invalidate(Family::Auth);
        Ok(())
    }
}
