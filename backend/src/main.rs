//! Backend entry-point: configuration, migrations, and server startup.

use std::env;
use std::net::SocketAddr;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use synergysphere::inbound::http::health::HealthState;
use synergysphere::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use synergysphere::server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let jwt_secret = load_jwt_secret()?;

    let mut config = ServerConfig::new(jwt_secret, bind_addr);
    if let Ok(database_url) = env::var("DATABASE_URL") {
        run_pending_migrations(&database_url)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let pool = DbPool::new(PoolConfig::new(&database_url))
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;

    info!(%bind_addr, "server started");
    server.await
}

/// Resolve the shared token-signing secret. Production deployments must set
/// `AUTH_JWT_SECRET` to the secret the identity service signs with; debug
/// builds fall back to an ephemeral secret so local runs work out of the box.
fn load_jwt_secret() -> std::io::Result<String> {
    match env::var("AUTH_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => Ok(secret),
        _ => {
            let allow_dev = env::var("AUTH_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!("using ephemeral token secret (dev only)");
                Ok(Uuid::new_v4().to_string())
            } else {
                Err(std::io::Error::other("AUTH_JWT_SECRET is not set"))
            }
        }
    }
}
