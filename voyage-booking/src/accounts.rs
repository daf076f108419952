use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use voyage_core::identity::AuthUser;
use voyage_core::models::User;
use voyage_core::repository::UserRepository;
use voyage_core::CoreResult;
use voyage_shared::pii::redact_email;

/// Mirrors verified identities into the `users` collection.
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Return the user document for `auth`, creating it on first sight.
    pub async fn ensure(&self, auth: &AuthUser) -> CoreResult<User> {
        if let Some(user) = self.users.get_user(&auth.id).await? {
            return Ok(user);
        }

        let user = User {
            id: auth.id.clone(),
            name: auth.name.clone(),
            email: auth.email.clone(),
            role: auth.role,
            avatar: auth.avatar.clone(),
            created_at: Utc::now(),
        };

        match self.users.create_user(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, email = %redact_email(user.email.expose()), "Created user document");
                Ok(user)
            }
            // Two first requests for the same user can race the insert.
            Err(e) => match self.users.get_user(&auth.id).await? {
                Some(existing) => {
                    debug!(user_id = %auth.id, "User created concurrently");
                    Ok(existing)
                }
                None => Err(e),
            },
        }
    }
}
