// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        ClientRepository, DashboardRepository, ExpenseRepository, HistoryRepository, LogoRepository,
        OrderRepository, ReminderRepository, SalonRepository, UserRepository,
    },
    services::{
        approval_service::ApprovalService,
        auth::AuthService,
        branding_service::BrandingService,
        client_service::ClientService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        expense_service::ExpenseService,
        order_service::OrderService,
        reminder_service::{LogNotifier, ReminderNotifier, ReminderService},
        salon_service::SalonService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub salon_id_prefix: String,
    pub reminder_lead_days: u64,
    pub reminder_interval: Duration,
    pub fonts_dir: PathBuf,
    pub pdf_storage_dir: Option<PathBuf>,
    pub super_admin: Option<(String, String)>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let super_admin = match (optional("SUPER_ADMIN_CODE"), optional("SUPER_ADMIN_PASSWORD")) {
            (Some(code), Some(password)) => Some((code, password)),
            (None, None) => None,
            _ => anyhow::bail!("SUPER_ADMIN_CODE e SUPER_ADMIN_PASSWORD devem ser definidos juntos"),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            salon_id_prefix: optional("SALON_ID_PREFIX").unwrap_or_else(|| "Jaind".into()),
            reminder_lead_days: parsed("REMINDER_LEAD_DAYS", 2)?,
            reminder_interval: Duration::from_secs(parsed("REMINDER_INTERVAL_SECS", 3600)?),
            fonts_dir: optional("FONTS_DIR").map_or_else(|| PathBuf::from("./fonts"), PathBuf::from),
            pdf_storage_dir: optional("PDF_STORAGE_DIR").map(PathBuf::from),
            super_admin,
        })
    }

    /// Valores padrão com banco e segredo informados; usado nos testes.
    pub fn for_database(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 5,
            salon_id_prefix: "Jaind".into(),
            reminder_lead_days: 2,
            reminder_interval: Duration::from_secs(3600),
            fonts_dir: PathBuf::from("./fonts"),
            pdf_storage_dir: None,
            super_admin: None,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} inválido: {raw}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub salon_service: SalonService,
    pub client_service: ClientService,
    pub order_service: OrderService,
    pub approval_service: ApprovalService,
    pub expense_service: ExpenseService,
    pub branding_service: BrandingService,
    pub reminder_service: ReminderService,
    pub dashboard_service: DashboardService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, settings)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, settings: Settings) -> anyhow::Result<Self> {
        Self::with_notifier(db_pool, settings, Arc::new(LogNotifier))
    }

    pub fn with_notifier(
        db_pool: PgPool,
        settings: Settings,
        notifier: Arc<dyn ReminderNotifier>,
    ) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let salon_repo = SalonRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let history_repo = HistoryRepository::new(db_pool.clone());
        let expense_repo = ExpenseRepository::new(db_pool.clone());
        let logo_repo = LogoRepository::new(db_pool.clone());
        let reminder_repo = ReminderRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(user_repo.clone(), salon_repo.clone(), settings.jwt_secret.clone());
        let user_service = UserService::new(user_repo.clone(), salon_repo.clone());
        let salon_service = SalonService::new(
            salon_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
            settings.salon_id_prefix.clone(),
        );
        let client_service = ClientService::new(client_repo.clone());
        let order_service = OrderService::new(order_repo.clone(), history_repo.clone(), client_repo.clone());
        let approval_service =
            ApprovalService::new(history_repo.clone(), order_repo.clone(), order_service.clone());
        let expense_service = ExpenseService::new(expense_repo, order_repo.clone(), user_repo);
        let branding_service = BrandingService::new(logo_repo.clone());
        let reminder_service = ReminderService::new(
            reminder_repo,
            order_repo.clone(),
            salon_repo.clone(),
            notifier,
            db_pool.clone(),
            settings.reminder_lead_days,
        );
        let dashboard_service = DashboardService::new(dashboard_repo);
        let document_service = DocumentService::new(
            order_service.clone(),
            order_repo,
            client_repo,
            salon_repo,
            logo_repo,
            settings.fonts_dir.clone(),
            settings.pdf_storage_dir.clone(),
        );

        Ok(Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store,
            auth_service,
            user_service,
            salon_service,
            client_service,
            order_service,
            approval_service,
            expense_service,
            branding_service,
            reminder_service,
            dashboard_service,
            document_service,
        })
    }
}
