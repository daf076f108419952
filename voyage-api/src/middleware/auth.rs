use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};
use voyage_core::identity::{AuthUser, SessionVerifier};
use voyage_core::models::Role;
use voyage_core::{CoreError, CoreResult};
use voyage_shared::Masked;
use voyage_store::{AppwriteClient, StoreError};

use crate::error::AppError;
use crate::state::AppState;

/// Header Appwrite's web SDK uses for session JWTs.
pub const APPWRITE_JWT_HEADER: &str = "x-appwrite-jwt";

// ============================================================================
// Session claims (local HS256 verification)
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
}

/// Verifies HS256 session tokens signed with a shared secret.
pub struct JwtSessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtSessionVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl SessionVerifier for JwtSessionVerifier {
    async fn verify(&self, token: &str) -> CoreResult<AuthUser> {
        let claims = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                CoreError::Authentication("Invalid or expired session token".to_string())
            })?
            .claims;

        let role = match claims.role.as_deref() {
            Some(role) => Role::from_str(role)
                .map_err(|_| CoreError::Authentication(format!("Unknown role '{}'", role)))?,
            None => Role::default(),
        };

        Ok(AuthUser {
            name: claims.name.unwrap_or_default(),
            email: Masked(claims.email.unwrap_or_default()),
            role,
            avatar: None,
            id: claims.sub,
        })
    }
}

// ============================================================================
// Appwrite account verification
// ============================================================================

/// Resolves Appwrite session JWTs through `GET /account`.
pub struct AppwriteSessionVerifier {
    client: AppwriteClient,
}

impl AppwriteSessionVerifier {
    pub fn new(client: AppwriteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionVerifier for AppwriteSessionVerifier {
    async fn verify(&self, token: &str) -> CoreResult<AuthUser> {
        let account = match self.client.get_account(token).await {
            Ok(account) => account,
            Err(StoreError::Appwrite { status, message }) if status == 401 || status == 403 => {
                debug!("Appwrite rejected session: {}", message);
                return Err(CoreError::Authentication("Invalid or expired session token".to_string()));
            }
            Err(e) => {
                warn!("Account lookup failed: {}", e);
                return Err(CoreError::Provider("Identity provider unavailable".to_string()));
            }
        };
        account_to_user(&account)
    }
}

/// Maps an Appwrite account document to the caller. Role and avatar live in `prefs`.
pub fn account_to_user(account: &Value) -> CoreResult<AuthUser> {
    let id = account["$id"]
        .as_str()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::Authentication("Account without id".to_string()))?;

    let role = account["prefs"]["role"]
        .as_str()
        .and_then(|r| Role::from_str(r).ok())
        .unwrap_or_default();

    Ok(AuthUser {
        id: id.to_string(),
        name: account["name"].as_str().unwrap_or_default().to_string(),
        email: Masked(account["email"].as_str().unwrap_or_default().to_string()),
        role,
        avatar: account["prefs"]["avatar"].as_str().map(str::to_string),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Bearer token first, then the Appwrite JWT header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    headers
        .get(APPWRITE_JWT_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token
    let token = session_token(req.headers())
        .ok_or_else(|| AppError::AuthenticationError("Missing session token".to_string()))?;

    // 2. Verify with the identity provider
    let user = state.verifier.verify(&token).await?;

    // 3. Mirror the identity into `users`
    state.users.ensure(&user).await?;

    // 4. Inject the caller
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(secret: &str, role: Option<&str>, exp_offset: i64) -> String {
        let claims = SessionClaims {
            sub: "user_01".to_string(),
            name: Some("Asha".to_string()),
            email: Some("asha@example.com".to_string()),
            role: role.map(str::to_string),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn test_jwt_verifier() {
        let verifier = JwtSessionVerifier::new("dev-secret");

        let user = verifier.verify(&token("dev-secret", Some("admin"), 3600)).await.unwrap();
        assert_eq!(user.id, "user_01");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email.expose(), "asha@example.com");

        let user = verifier.verify(&token("dev-secret", None, 3600)).await.unwrap();
        assert_eq!(user.role, Role::User);

        for bad in [
            token("other-secret", None, 3600),
            token("dev-secret", None, -3600),
            token("dev-secret", Some("root"), 3600),
            "not-a-jwt".to_string(),
        ] {
            let err = verifier.verify(&bad).await.unwrap_err();
            assert!(matches!(err, CoreError::Authentication(_)));
        }
    }

    #[test]
    fn test_account_to_user() {
        let user = account_to_user(&json!({
            "$id": "65f1aa",
            "name": "Ravi",
            "email": "ravi@example.com",
            "emailVerification": true,
            "prefs": {"role": "staff", "avatar": "https://cdn.example.com/r.png"}
        }))
        .unwrap();
        assert_eq!(user.id, "65f1aa");
        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.avatar.as_deref(), Some("https://cdn.example.com/r.png"));

        let user = account_to_user(&json!({"$id": "65f1ab", "prefs": {}})).unwrap();
        assert_eq!(user.role, Role::User);
        assert!(account_to_user(&json!({"name": "nobody"})).is_err());
    }

    #[test]
    fn test_session_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(APPWRITE_JWT_HEADER, HeaderValue::from_static("eyJ.appwrite"));
        assert_eq!(session_token(&headers).as_deref(), Some("eyJ.appwrite"));

        headers.insert("authorization", HeaderValue::from_static("Bearer eyJ.bearer"));
        assert_eq!(session_token(&headers).as_deref(), Some("eyJ.bearer"));
    }
}
