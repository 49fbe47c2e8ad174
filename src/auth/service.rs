//! Registration, login, profile lookup, password reset and token verification.

use std::sync::Arc;
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::token::{Claims, TokenService};
use super::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest};
use crate::error::AppError;
use crate::models::{CurrentUser, NewUser, PublicUser, User, UserRole};
use crate::store::CredentialStore;

// Verified against when the email is unknown, so both login failures cost one bcrypt check.
const DUMMY_PASSWORD: &str = "tasknest-login-timing-placeholder";

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
    dummy_hash: Arc<str>,
}

impl AuthService {
    /// Builds the service. Hashes a placeholder password once at the configured cost.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        bcrypt_cost: u32,
    ) -> Result<Self, AppError> {
        let dummy_hash = hash_password(DUMMY_PASSWORD, bcrypt_cost)?;
        Ok(Self {
            store,
            tokens,
            bcrypt_cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Creates an identity and signs it in.
    ///
    /// Fails with `AppError::Conflict` when the email is already registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        if self.store.find_by_email(&request.email).await?.is_some() {
            log::warn!("registration rejected: email already registered");
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let password_hash = self.hash(request.password).await?;
        let user = self
            .store
            .insert(NewUser {
                id: Uuid::new_v4(),
                email: request.email,
                password_hash,
                role: UserRole::User,
            })
            .await?;

        log::info!("registered user {}", user.id);
        self.authenticated(&user)
    }

    /// Checks the submitted password against the stored hash.
    ///
    /// An unknown email and a wrong password produce the same `AppError::Unauthorized`.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self.store.find_by_email(&request.email).await?;
        let stored_hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let password_matches = self.verify(request.password, stored_hash).await?;

        match user {
            Some(user) if password_matches => {
                log::info!("user {} logged in", user.id);
                self.authenticated(&user)
            }
            _ => {
                log::warn!("rejected login attempt");
                Err(invalid_credentials())
            }
        }
    }

    /// Profile of an already authenticated caller.
    pub async fn current_user(&self, user_id: Uuid) -> Result<CurrentUser, AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(CurrentUser::from(&user))
    }

    /// Replaces the password of the identity registered under `email`.
    ///
    /// Knowing the email is all it takes: there is no proof of the old password and no
    /// out-of-band confirmation. Kept as-is for compatibility with existing clients.
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> Result<MessageResponse, AppError> {
        let user = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let password_hash = self.hash(request.new_password).await?;
        self.store
            .update_password_hash(user.id, &password_hash)
            .await?;

        log::info!("password reset for user {}", user.id);
        Ok(MessageResponse {
            message: "Password reset successfully".to_string(),
        })
    }

    /// Validates a bearer token and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.verify(token)
    }

    fn authenticated(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            access_token: self.tokens.issue(user.id)?,
            user: PublicUser::from(user),
        })
    }

    // bcrypt is CPU bound; keep it off the request workers.
    async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost)).await?
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;

    fn service_with_store() -> (AuthService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let tokens = TokenService::new(b"auth-service-test-secret", 3600);
        let service = AuthService::new(store.clone(), tokens, 4).unwrap();
        (service, store)
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_issues_token_for_new_identity() {
        let (service, store) = service_with_store();

        let response = service
            .register(register_request("a@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(response.user.email, "a@example.com");
        let claims = service.verify_token(&response.access_token).unwrap();
        assert_eq!(claims.sub, response.user.id);

        let stored = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(verify_password("secret1", &stored.password_hash).unwrap());
    }

    #[actix_rt::test]
    async fn test_register_twice_conflicts() {
        let (service, _) = service_with_store();
        service
            .register(register_request("a@example.com", "secret1"))
            .await
            .unwrap();

        let err = service
            .register(register_request("a@example.com", "another"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service_with_store();
        service
            .register(register_request("a@example.com", "secret1"))
            .await
            .unwrap();

        let wrong_password = service
            .login(login_request("a@example.com", "wrong-password"))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(login_request("nobody@example.com", "secret1"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[actix_rt::test]
    async fn test_login_with_correct_password() {
        let (service, _) = service_with_store();
        let registered = service
            .register(register_request("a@example.com", "secret1"))
            .await
            .unwrap();

        let response = service
            .login(login_request("a@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(response.user, registered.user);
    }

    #[actix_rt::test]
    async fn test_current_user() {
        let (service, _) = service_with_store();
        let registered = service
            .register(register_request("a@example.com", "secret1"))
            .await
            .unwrap();

        let me = service.current_user(registered.user.id).await.unwrap();
        assert_eq!(me.email, "a@example.com");

        let err = service.current_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn test_reset_password_replaces_hash() {
        let (service, _) = service_with_store();
        service
            .register(register_request("a@example.com", "secret1"))
            .await
            .unwrap();

        let response = service
            .reset_password(ResetPasswordRequest {
                email: "a@example.com".to_string(),
                new_password: "secret2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.message, "Password reset successfully");

        assert!(service
            .login(login_request("a@example.com", "secret1"))
            .await
            .is_err());
        assert!(service
            .login(login_request("a@example.com", "secret2"))
            .await
            .is_ok());
    }

    #[actix_rt::test]
    async fn test_reset_password_unknown_email() {
        let (service, _) = service_with_store();
        let err = service
            .reset_password(ResetPasswordRequest {
                email: "nobody@example.com".to_string(),
                new_password: "secret2".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
