// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SalonRepository, UserRepository},
    models::auth::{AuthResponse, Claims, Couturier},
};

/// Gera o hash bcrypt fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    salon_repo: SalonRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, salon_repo: SalonRepository, jwt_secret: String) -> Self {
        Self { user_repo, salon_repo, jwt_secret }
    }

    pub async fn login(&self, code: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_code(code.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.ensure_can_sign_in(&user).await?;
        self.user_repo.touch_last_login(user.id).await?;

        tracing::info!(code = %user.code_couturier, role = ?user.role, "login");

        let token = self.create_token(user.id)?;
        Ok(AuthResponse { token, user })
    }

    /// Resolve o token para o couturier, que precisa continuar ativo.
    pub async fn validate_token(&self, token: &str) -> Result<Couturier, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_for_session(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.ensure_can_sign_in(&user).await?;
        Ok(user)
    }

    async fn ensure_can_sign_in(&self, user: &Couturier) -> Result<(), AppError> {
        if !user.actif {
            return Err(AppError::AccountDisabled);
        }
        if let Some(salon_id) = user.salon_id.as_deref() {
            if !user.is_super_admin() && !self.salon_repo.is_active(salon_id).await? {
                return Err(AppError::SalonDisabled);
            }
        }
        Ok(())
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
