//! Registration, login and session tokens

use super::audit::AuditLog;
use super::mailer::{Notification, Notifier};
use crate::middleware::Claims;
use chrono::{DateTime, Duration, Utc};
use congress_config::MAX_TOKEN_TTL_MINUTES;
use congress_crypto::{encode_qr_payload, generate_qr_code, PasswordHasher};
use congress_models::*;
use congress_storage::{conflicts, StorageBackend};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub const TOKEN_AUDIENCE: &str = "congress-api";

const INVALID_CREDENTIALS: &str = "invalid email or password";
const QR_CODE_ATTEMPTS: usize = 5;

/// Issues and verifies HS256 session tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES)),
        }
    }

    pub fn issue(&self, user: &User) -> CongressResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| CongressError::internal("token expiry out of range"))?;
        let claims = Claims {
            sub: user.id.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            role: user.highest_role().to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CongressError::internal(format!("failed to sign token: {}", e)))?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> CongressResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| CongressError::unauthorized("invalid or expired token"))
    }
}

/// `local@domain.tld` with no whitespace
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct AuthService {
    storage: Arc<dyn StorageBackend>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    min_password_length: usize,
    congress_name: String,
    notifier: Arc<Notifier>,
    audit: Arc<AuditLog>,
}

impl AuthService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
        min_password_length: usize,
        congress_name: String,
        notifier: Arc<Notifier>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            storage,
            tokens,
            hasher,
            min_password_length,
            congress_name,
            notifier,
            audit,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> CongressResult<UserProfile> {
        let user = self
            .create_account(
                request.full_name,
                request.email,
                &request.password,
                request.institution,
                request.phone,
                vec![Role::Participant],
            )
            .await?;

        info!(user_id = %user.id, "User registered");
        self.audit
            .record(
                NewAuditEntry::new("user.registered", "user")
                    .actor(user.id)
                    .entity_id(user.id),
            )
            .await;
        self.notifier
            .notify(Notification {
                to: user.email.clone(),
                subject: format!("Welcome to {}", self.congress_name),
                body: format!(
                    "Hello {},\n\nyour registration is complete. Show this code at the \
                     entrance: {}\n",
                    user.full_name,
                    encode_qr_payload(&user.qr_code)
                ),
            })
            .await;

        Ok(user.profile())
    }

    pub async fn login(&self, request: LoginRequest) -> CongressResult<LoginResponse> {
        let user = self
            .storage
            .find_user_by_email(request.email.trim())
            .await?
            .ok_or_else(|| CongressError::unauthorized(INVALID_CREDENTIALS))?;

        let password_ok = self
            .hasher
            .verify(&request.password, &user.password_hash)
            .map_err(|e| CongressError::internal(format!("stored password hash unusable: {}", e)))?;
        if !password_ok || !user.is_active {
            warn!(user_id = %user.id, active = user.is_active, "Login rejected");
            return Err(CongressError::unauthorized(INVALID_CREDENTIALS));
        }

        let (token, expires_at) = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            expires_at,
            user: user.profile(),
        })
    }

    /// Create the configured super admin unless the email is already taken
    pub async fn ensure_super_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> CongressResult<User> {
        if let Some(existing) = self.storage.find_user_by_email(email).await? {
            if !existing.has_role(Role::SuperAdmin) {
                warn!(user_id = %existing.id, "Bootstrap admin email belongs to a non super admin account");
            }
            return Ok(existing);
        }

        let user = self
            .create_account(
                full_name.to_string(),
                email.to_string(),
                password,
                None,
                None,
                vec![Role::Admin, Role::SuperAdmin],
            )
            .await?;

        info!(user_id = %user.id, email = %user.email, "Bootstrap super admin created");
        self.audit
            .record(
                NewAuditEntry::new("user.bootstrapped", "user")
                    .entity_id(user.id)
                    .details(json!({ "roles": user.roles })),
            )
            .await;
        Ok(user)
    }

    async fn create_account(
        &self,
        full_name: String,
        email: String,
        password: &str,
        institution: Option<String>,
        phone: Option<String>,
        roles: Vec<Role>,
    ) -> CongressResult<User> {
        let full_name = full_name.trim().to_string();
        let email = email.trim().to_lowercase();

        if full_name.is_empty() {
            return Err(CongressError::validation("full_name", "must not be empty"));
        }
        if !is_valid_email(&email) {
            return Err(CongressError::validation("email", "is not a valid address"));
        }
        if password.chars().count() < self.min_password_length {
            return Err(CongressError::validation(
                "password",
                format!("must have at least {} characters", self.min_password_length),
            ));
        }

        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| CongressError::internal(e.to_string()))?;
        let institution = optional_text(institution);
        let phone = optional_text(phone);

        // Retry on a QR code collision
        for _ in 0..QR_CODE_ATTEMPTS {
            let result = self
                .storage
                .create_user(NewUser {
                    full_name: full_name.clone(),
                    email: email.clone(),
                    password_hash: password_hash.clone(),
                    institution: institution.clone(),
                    phone: phone.clone(),
                    qr_code: generate_qr_code(),
                    roles: roles.clone(),
                })
                .await;

            match result {
                Err(CongressError::Conflict { reason }) if reason == conflicts::QR_CODE_TAKEN => {
                    continue
                }
                other => return other,
            }
        }

        Err(CongressError::internal("could not allocate a unique QR code"))
    }
}
