use crate::data::UserRepository;
use crate::domain::user::{
    normalize_email, LoginUserRequest, NewUser, RegisterUserRequest, UserResponse,
};
use crate::domain::{DomainError, UserId};
use crate::infrastructure::jwt::JwtService;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            DomainError::Internal(format!("Password hashing failed: {}", e))
        })
}

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    pub async fn register(
        &self,
        req: RegisterUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        let req = req.validate()?;
        tracing::debug!("Registering user with email: {}", req.email);

        if self.user_repo.find_by_email(&req.email).await?.is_some() {
            tracing::warn!("Registration failed: email already registered");
            return Err(DomainError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&req.password)?;

        // the unique index still catches a concurrent registration
        let user = self
            .user_repo
            .create(NewUser {
                email: req.email,
                name: req.name,
                password_hash,
            })
            .await?;

        let token = self.jwt_service.generate_token(user.id, &user.email)?;
        tracing::info!("User registered successfully: id={}", user.id);

        Ok((token, UserResponse::from(user)))
    }

    /// Unknown emails and wrong passwords fail identically.
    pub async fn login(
        &self,
        req: LoginUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        let email = normalize_email(&req.email).map_err(|_| DomainError::InvalidCredentials)?;

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            tracing::warn!("Login attempt for unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Invalid password hash format for user {}: {}", user.id, e);
            DomainError::Internal(format!("Invalid password hash: {}", e))
        })?;

        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid password for user {}", user.id);
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.jwt_service.generate_token(user.id, &user.email)?;
        tracing::info!("User logged in successfully: id={}", user.id);

        Ok((token, UserResponse::from(user)))
    }

    pub fn verify_token(&self, token: &str) -> Result<UserId, DomainError> {
        self.jwt_service.verify_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(JwtService::new("auth-service-test-secret-0123456789").unwrap()),
        )
    }

    fn register_req(email: &str, password: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            email: email.into(),
            password: password.into(),
            name: Some("Alice".into()),
        }
    }

    #[tokio::test]
    async fn register_returns_a_token_for_the_new_user() {
        let auth = service();
        let (token, user) = auth
            .register(register_req(" alice@example.com ", "secret1"))
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(auth.verify_token(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service();
        auth.register(register_req("alice@example.com", "secret1"))
            .await
            .unwrap();
        let err = auth
            .register(register_req("alice@example.com", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyRegistered));
    }

    #[tokio::test]
    async fn login_accepts_the_right_password_only() {
        let auth = service();
        auth.register(register_req("alice@example.com", "secret1"))
            .await
            .unwrap();

        let (_, user) = auth
            .login(LoginUserRequest {
                email: "alice@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");

        let wrong = auth
            .login(LoginUserRequest {
                email: "alice@example.com".into(),
                password: "nope-nope".into(),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginUserRequest {
                email: "bob@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, DomainError::InvalidCredentials));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert_ne!(a, b);
    }
}
