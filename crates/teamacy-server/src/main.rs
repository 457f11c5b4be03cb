use std::net::SocketAddr;
use std::sync::Arc;

use teamacy_api::AppStateInner;
use teamacy_api::bootstrap;
use teamacy_api::token::TokenKeys;
use teamacy_db::Database;
use teamacy_mail::AdminNotifier;
use teamacy_mail::resend::ResendTransport;
use teamacy_server::config::Config;
use teamacy_server::router::build_router;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamacy=debug,teamacy_api=debug,teamacy_mail=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database and reset the admin account
    let db = Database::open(&config.db_path)?;
    bootstrap::ensure_admin(&db, &config.admin)?;

    let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_algorithm, config.jwt_expiration_hours)?;

    let notifier = match &config.mail {
        Some(mail) => AdminNotifier::new(
            Arc::new(ResendTransport::new(mail.api_key.clone())?),
            mail.sender.clone(),
            mail.recipient.clone(),
        ),
        None => {
            warn!("RESEND_API_KEY not set, admin email notifications are disabled");
            AdminNotifier::disabled()
        }
    };

    let state = AppStateInner::new(db, tokens, notifier);
    let app = build_router(state, &config.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Teamacy API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
