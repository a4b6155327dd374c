use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use action_api::config::{load_service_config, ServiceConfig};
use action_api::users::{InMemoryUserStore, NewUser, UserStore};
use action_api::{api_mux, debug_mux, ApiMuxConfig};
use anyhow::{anyhow, Context, Result};
use common_auth::{Algorithm, AuthEngine, JwtConfig, KeyStore, ROLE_ADMIN};
use common_observability::Metrics;
use common_web::{mid, shutdown_channel, ShutdownListener};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    mid::install_panic_hook();

    let cfg = load_service_config()?;
    info!(build = %cfg.build, "starting action-api");

    if let Err(err) = run(cfg).await {
        error!(error = ?err, "action-api stopped with an error");
        return Err(err);
    }
    info!("action-api shut down");
    Ok(())
}

async fn run(cfg: ServiceConfig) -> Result<()> {
    let keys = KeyStore::from_pem_dir(&cfg.keys_folder)
        .with_context(|| format!("Failed to load keys from {}", cfg.keys_folder.display()))?;
    info!(folder = %cfg.keys_folder.display(), keys = keys.len(), "signing keys loaded");

    let jwt = JwtConfig::new()
        .with_issuer(cfg.issuer.clone())
        .with_leeway(cfg.leeway_seconds);
    let engine = AuthEngine::with_config(cfg.active_kid.clone(), keys, Algorithm::RS256, jwt)
        .context("Failed to construct auth engine")?;

    let users = Arc::new(InMemoryUserStore::new());
    if let Some(seed) = &cfg.seed_admin {
        let admin = users
            .create(NewUser {
                name: "Administrator".to_string(),
                email: seed.email.clone(),
                role: ROLE_ADMIN.to_string(),
                password: seed.password.clone(),
                password_confirm: seed.password.clone(),
            })
            .await
            .context("Failed to seed admin user")?;
        info!(user_id = %admin.id, email = %admin.email, "seeded admin user");
    }

    let metrics = Metrics::new().context("Failed to register metrics")?;
    let (shutdown, listener) = shutdown_channel();

    let api = api_mux(ApiMuxConfig {
        shutdown,
        metrics: metrics.clone(),
        engine: Arc::new(engine),
        users,
        issuer: cfg.issuer.clone(),
        token_ttl: cfg.token_ttl,
    })
    .map_err(|err| anyhow!("Failed to build routes: {err}"))?;

    let debug_addr = cfg.debug_addr();
    let debug_listener = TcpListener::bind(debug_addr).await?;
    info!("debug listening on {debug_addr}");
    let debug = debug_mux(&cfg.build, metrics);
    tokio::spawn(async move {
        if let Err(err) = axum::serve(debug_listener, debug).await {
            error!(error = %err, "debug listener closed");
        }
    });

    let api_addr = cfg.api_addr();
    let api_listener = TcpListener::bind(api_addr).await?;
    info!("api listening on {api_addr}");

    let (started_tx, started_rx) = oneshot::channel::<()>();
    let server = axum::serve(
        api_listener,
        api.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        wait_for_shutdown(listener).await;
        let _ = started_tx.send(());
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => {
            joined.context("api server task failed")??;
        }
        Ok(()) = started_rx => {
            match tokio::time::timeout(cfg.shutdown_timeout, &mut server).await {
                Ok(joined) => joined.context("api server task failed")??,
                Err(_) => {
                    server.abort();
                    return Err(anyhow!(
                        "could not stop server gracefully within {:?}",
                        cfg.shutdown_timeout
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Resolves on SIGINT, SIGTERM, or a shutdown raised by the request pipeline.
async fn wait_for_shutdown(mut listener: ShutdownListener) {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("shutdown started: interrupt"),
        _ = terminate => info!("shutdown started: terminate"),
        _ = listener.recv() => warn!("shutdown started: request pipeline integrity failure"),
    }
}
