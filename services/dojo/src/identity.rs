//! User bootstrap on sign-in, session claims and profile edits.

use crate::error::{Error, Result};
use crate::models::{AccountType, NewUser, ProfileUpdate, User};
use crate::object_store::StoredObject;
use crate::session::SessionKeys;
use crate::store::UserStore;
use crate::upload::{UploadFile, UploadOrchestrator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Identity verified by an OAuth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    /// Provider login (GitHub username), when the provider has one
    pub login: Option<String>,
}

/// Result of a sign-in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedIn {
    pub user: User,
    pub token: String,
}

/// Session view of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub username: String,
    pub account_type: AccountType,
    pub is_verified: bool,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.display_name,
            email: user.email,
            image: user.avatar_url,
            username: user.username,
            account_type: user.account_type,
            is_verified: user.is_verified,
        }
    }
}

/// Username for a new account: provider login, else email prefix, else
/// `user_` and the first 8 characters of the id
pub fn derive_username(identity: &OAuthIdentity) -> String {
    let non_empty = |s: &&str| !s.trim().is_empty();

    identity
        .login
        .as_deref()
        .filter(non_empty)
        .or_else(|| {
            identity
                .email
                .as_deref()
                .and_then(|email| email.split('@').next())
                .filter(non_empty)
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            let id = identity.id.to_string();
            format!("user_{}", &id[..8])
        })
}

pub struct IdentityService {
    users: Arc<dyn UserStore>,
    uploads: Arc<UploadOrchestrator>,
    sessions: SessionKeys,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserStore>,
        uploads: Arc<UploadOrchestrator>,
        sessions: SessionKeys,
    ) -> Self {
        Self {
            users,
            uploads,
            sessions,
        }
    }

    /// Create the user row on first sign-in and issue a session token
    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    pub async fn sign_in(&self, identity: &OAuthIdentity) -> Result<SignedIn> {
        let user = match self.users.get_user(identity.id).await? {
            Some(user) => user,
            None => {
                let email = identity
                    .email
                    .clone()
                    .ok_or_else(|| Error::Validation("Email is required".to_string()))?;

                let user = self
                    .users
                    .insert_user(&NewUser {
                        id: identity.id,
                        email,
                        username: derive_username(identity),
                        display_name: identity.name.clone(),
                        avatar_url: identity.image.clone(),
                        account_type: AccountType::Viewer,
                    })
                    .await?;

                info!(username = %user.username, "New user signed up");
                user
            }
        };

        let token = self.sessions.issue(user.id)?;
        Ok(SignedIn { user, token })
    }

    /// Session claims, read from the store on every call
    pub async fn session_user(&self, user_id: Uuid) -> Result<SessionUser> {
        self.users
            .get_user(user_id)
            .await?
            .map(SessionUser::from)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Apply a partial profile edit; blank strings clear the field
    #[instrument(skip(self, edit))]
    pub async fn update_profile(&self, user_id: Uuid, edit: ProfileUpdate) -> Result<User> {
        let edit = ProfileUpdate {
            display_name: edit.display_name.map(blank_to_empty),
            bio: edit.bio.map(blank_to_empty),
            account_type: edit.account_type,
        };

        self.users
            .update_profile(user_id, &edit)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Store a new avatar and point the profile at it
    pub async fn upload_avatar(&self, user_id: Uuid, file: &UploadFile) -> Result<StoredObject> {
        let stored = self.uploads.upload_avatar(file, user_id).await?;
        self.users.set_avatar_url(user_id, &stored.url).await?;
        Ok(stored)
    }

    pub fn sessions(&self) -> &SessionKeys {
        &self.sessions
    }
}

fn blank_to_empty(value: String) -> String {
    if value.trim().is_empty() {
        String::new()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use crate::object_store::MockObjectStore;
    use crate::store::MockUserStore;
    use chrono::Utc;
    use std::time::Duration;

    fn identity() -> OAuthIdentity {
        OAuthIdentity {
            id: Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap(),
            email: Some("ana@example.com".to_string()),
            name: Some("Ana".to_string()),
            image: None,
            login: Some("ana-gh".to_string()),
        }
    }

    fn user_from(new: &NewUser) -> User {
        User {
            id: new.id,
            username: new.username.clone(),
            email: new.email.clone(),
            display_name: new.display_name.clone(),
            avatar_url: new.avatar_url.clone(),
            bio: None,
            account_type: new.account_type,
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(users: MockUserStore) -> IdentityService {
        let uploads = UploadOrchestrator::new(Arc::new(MockObjectStore::new()), UploadConfig::default());
        IdentityService::new(
            Arc::new(users),
            Arc::new(uploads),
            SessionKeys::new(b"0123456789abcdef0123456789abcdef", Duration::from_secs(60)),
        )
    }

    #[test]
    fn test_username_derivation_order() {
        let mut id = identity();
        assert_eq!(derive_username(&id), "ana-gh");

        id.login = None;
        assert_eq!(derive_username(&id), "ana");

        id.email = None;
        assert_eq!(derive_username(&id), "user_a1b2c3d4");

        id.email = Some("@example.com".to_string());
        assert_eq!(derive_username(&id), "user_a1b2c3d4");
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_viewer() {
        let mut users = MockUserStore::new();
        users.expect_get_user().returning(|_| Ok(None));
        users
            .expect_insert_user()
            .withf(|u| u.username == "ana-gh" && u.account_type == AccountType::Viewer)
            .times(1)
            .returning(|u| Ok(user_from(u)));

        let service = service(users);
        let signed_in = service.sign_in(&identity()).await.unwrap();
        assert_eq!(
            service.sessions().validate(&signed_in.token).unwrap(),
            signed_in.user.id
        );
    }

    #[tokio::test]
    async fn test_returning_user_is_not_recreated() {
        let mut users = MockUserStore::new();
        users.expect_get_user().returning(|id| {
            Ok(Some(user_from(&NewUser {
                id,
                email: "ana@example.com".to_string(),
                username: "ana".to_string(),
                display_name: None,
                avatar_url: None,
                account_type: AccountType::Creator,
            })))
        });
        users.expect_insert_user().never();

        let signed_in = service(users).sign_in(&identity()).await.unwrap();
        assert_eq!(signed_in.user.account_type, AccountType::Creator);
    }

    #[tokio::test]
    async fn test_update_profile_blank_clears_and_absent_is_kept() {
        let mut users = MockUserStore::new();
        users
            .expect_update_profile()
            .withf(|_, edit| {
                edit.display_name.as_deref() == Some("")
                    && edit.bio.as_deref() == Some("hi")
                    && edit.account_type.is_none()
            })
            .times(1)
            .returning(|id, edit| {
                let mut user = user_from(&NewUser {
                    id,
                    email: "ana@example.com".to_string(),
                    username: "ana".to_string(),
                    display_name: None,
                    avatar_url: None,
                    account_type: AccountType::Creator,
                });
                user.bio = edit.bio.clone();
                Ok(Some(user))
            });

        let user = service(users)
            .update_profile(
                Uuid::new_v4(),
                ProfileUpdate {
                    display_name: Some("  ".to_string()),
                    bio: Some("hi".to_string()),
                    account_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.account_type, AccountType::Creator);
    }

    #[test]
    fn test_profile_update_fields_are_optional() {
        let edit: ProfileUpdate = serde_json::from_str(r#"{"bio":"x"}"#).unwrap();
        assert_eq!(edit.display_name, None);
        assert_eq!(edit.account_type, None);
        assert_eq!(edit.bio.as_deref(), Some("x"));
    }
}
