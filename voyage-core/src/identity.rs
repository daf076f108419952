use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use voyage_shared::Masked;

use crate::models::Role;
use crate::CoreResult;

/// The caller behind a verified session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: Masked<String>,
    #[serde(default)]
    pub role: Role,
    pub avatar: Option<String>,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Resolve a session token to its user. Any failure is an
    /// `Authentication` error.
    async fn verify(&self, token: &str) -> CoreResult<AuthUser>;
}
