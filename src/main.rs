// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use atelier::{
    config::{AppState, Settings},
    services::reminder_service::spawn_reminder_loop,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    // Migrações rodam na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some((code, password)) = app_state.settings.super_admin.clone() {
        app_state
            .user_service
            .ensure_super_admin(&app_state.db_pool, &code, &password)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar o super administrador: {e}"))?;
    }

    spawn_reminder_loop(app_state.reminder_service.clone(), app_state.settings.reminder_interval);

    let listener = TcpListener::bind(&app_state.settings.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", app_state.settings.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, atelier::app(app_state))
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}
