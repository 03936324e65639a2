use crate::services::*;
use anyhow::Context;
use chrono::{DateTime, Utc};
use congress_config::{AppConfig, StorageKind};
use congress_crypto::{PasswordHasher, VerificationSigner};
use congress_storage::{MemoryStorageBackend, PostgresStorageBackend, StorageBackend};
use std::sync::Arc;
use tracing::info;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageBackend>,
    pub tokens: Arc<TokenService>,
    pub notifier: Arc<Notifier>,
    pub audit: Arc<AuditLog>,
    pub permissions: Arc<PermissionService>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub activities: Arc<ActivityService>,
    pub enrollments: Arc<EnrollmentService>,
    pub attendance: Arc<AttendanceService>,
    pub payments: Arc<PaymentService>,
    pub diplomas: Arc<DiplomaService>,
    pub reports: Arc<ReportService>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the state with the storage backend selected by the configuration
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let storage = match config.database.backend {
            StorageKind::Postgres => {
                info!("Using PostgreSQL storage backend");
                let backend = PostgresStorageBackend::new(
                    &config.database.url,
                    config.database.max_connections,
                )
                .await?;
                Arc::new(backend) as Arc<dyn StorageBackend>
            }
            StorageKind::Memory => {
                info!("Using memory storage backend");
                Arc::new(MemoryStorageBackend::new()) as Arc<dyn StorageBackend>
            }
        };

        Self::with_storage(config, storage, Arc::new(Notifier::default()))
    }

    /// Build the state around an existing backend and notifier
    pub fn with_storage(
        config: AppConfig,
        storage: Arc<dyn StorageBackend>,
        notifier: Arc<Notifier>,
    ) -> anyhow::Result<Self> {
        let offset = config.congress.offset().with_context(|| {
            format!(
                "invalid congress UTC offset: {} minutes",
                config.congress.utc_offset_minutes
            )
        })?;
        let hasher = PasswordHasher::new(config.auth.password_iterations)
            .context("invalid password hashing configuration")?;
        let signer = VerificationSigner::new(config.auth.jwt_secret.as_bytes());

        let tokens = Arc::new(TokenService::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl_minutes,
        ));
        let audit = Arc::new(AuditLog::new(storage.clone()));
        let permissions = Arc::new(PermissionService::new(storage.clone(), audit.clone()));

        let auth = Arc::new(AuthService::new(
            storage.clone(),
            tokens.clone(),
            hasher,
            config.auth.min_password_length,
            config.congress.name.clone(),
            notifier.clone(),
            audit.clone(),
        ));
        let users = Arc::new(UserService::new(
            storage.clone(),
            permissions.clone(),
            audit.clone(),
        ));
        let activities = Arc::new(ActivityService::new(
            storage.clone(),
            permissions.clone(),
            audit.clone(),
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            storage.clone(),
            permissions.clone(),
            audit.clone(),
        ));
        let attendance = Arc::new(AttendanceService::new(
            storage.clone(),
            permissions.clone(),
            audit.clone(),
            offset,
        ));
        let payments = Arc::new(PaymentService::new(
            storage.clone(),
            permissions.clone(),
            audit.clone(),
            config.congress.registration_fee_cents,
        ));
        let diplomas = Arc::new(DiplomaService::new(
            storage.clone(),
            permissions.clone(),
            audit.clone(),
            signer,
            notifier.clone(),
        ));
        let reports = Arc::new(ReportService::new(storage.clone(), permissions.clone()));

        Ok(Self {
            config: Arc::new(config),
            storage,
            tokens,
            notifier,
            audit,
            permissions,
            auth,
            users,
            activities,
            enrollments,
            attendance,
            payments,
            diplomas,
            reports,
            started_at: Utc::now(),
        })
    }

    /// Create the configured bootstrap super admin, if any
    pub async fn bootstrap_admin(&self) -> anyhow::Result<()> {
        let Some(admin) = self.config.bootstrap_admin.as_ref() else {
            return Ok(());
        };

        self.auth
            .ensure_super_admin(&admin.email, &admin.password, &admin.full_name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create bootstrap admin: {}", e))?;
        Ok(())
    }
}
