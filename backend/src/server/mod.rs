//! Server construction.

mod config;
mod state_builders;

pub use config::AppSettings;

use state_builders::build_http_state;

use std::time::Duration;

use actix_web::dev::Server;
use actix_web::{HttpServer, web};
use mockable::DefaultEnv;
use tracing::info;

use snippetbox::inbound::http::session_config::{BuildMode, session_settings_from_env};
use snippetbox::inbound::http::session_store::sweep_expired_sessions;
use snippetbox::inbound::http::{AppDependencies, build_app};

const CLIENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const CLIENT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const KEEP_ALIVE: Duration = Duration::from_secs(60);
const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(300);

/// Construct the HTTP server from settings and the process environment.
///
/// # Returns
/// A [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Returns [`std::io::Error`] when the settings are invalid, the store
/// cannot be reached, or binding the socket fails.
pub async fn create_server(settings: AppSettings) -> std::io::Result<Server> {
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let http_state = web::Data::new(
        build_http_state(&settings)
            .await
            .map_err(std::io::Error::other)?,
    );
    actix_web::rt::spawn(sweep_expired_sessions(
        http_state.sessions.clone(),
        SESSION_SWEEP_PERIOD,
    ));
    let deps = AppDependencies {
        http_state,
        key: session.key,
        cookie_secure: session.cookie_secure,
        debug: settings.debug,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .client_request_timeout(CLIENT_REQUEST_TIMEOUT)
        .client_disconnect_timeout(CLIENT_DISCONNECT_TIMEOUT)
        .keep_alive(KEEP_ALIVE)
        .bind(bind_addr)?
        .run();

    info!(%bind_addr, debug = settings.debug, "server listening");
    Ok(server)
}
