//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::FIXTURE_USER_ID;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};

use crate::inbound::http::configure_api;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::middleware::Trace;
use state_builders::build_http_state;

/// Construct an Actix HTTP server from the given configuration.
///
/// The returned [`Server`] must be awaited to drive the listener. The health
/// state flips to ready once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = build_http_state(&config);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_health_state.clone())
            .app_data(http_state.clone())
            .wrap(Trace)
            .configure(configure_api)
            .service(ready)
            .service(live)
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
