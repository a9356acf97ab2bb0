//! Turns a config and a handler set into a running API server.
//!
//! ```text
//! ApiServerConfig::resolve ─▶ handler set present? ─▶ load credentials (basic auth only)
//!        ─▶ decorate protected slots ─▶ catalog::build ─▶ Server::serve
//! ```
//!
//! Each step runs once and in that order. The first failure stops the
//! sequence, so nothing is ever listening with a missing handler or an
//! unreadable credential file.

use std::sync::Arc;

use tracing::info;

use crate::catalog;
use crate::config::ApiServerConfig;
use crate::credentials::{CredentialStore, SecretsDir};
use crate::error::Error;
use crate::handlers::Handlers;
use crate::middleware::basic_auth;
use crate::router::Router;
use crate::server::Server;

/// A provider API server waiting for its handlers.
///
/// ```rust,no_run
/// use faas_bootstrap::{ApiServer, Handlers};
///
/// # async fn run(handlers: Handlers) {
/// let result = ApiServer::from_env()
///     .handlers(handlers)
///     .listen_and_serve()
///     .await;
///
/// if let Err(e) = result {
///     tracing::error!("{e}");
///     std::process::exit(1);
/// }
/// # }
/// ```
pub struct ApiServer {
    config: ApiServerConfig,
    handlers: Option<Handlers>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig) -> Self {
        Self { config, handlers: None }
    }

    /// Resolves the config from the process environment.
    pub fn from_env() -> Self {
        Self::new(ApiServerConfig::from_env())
    }

    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = Some(handlers);
        self
    }

    pub fn config(&self) -> &ApiServerConfig {
        &self.config
    }

    /// Runs every startup step short of binding and returns the finished
    /// route table.
    pub fn into_router(self, store: &impl CredentialStore) -> Result<Router, Error> {
        let mut handlers = self.handlers.ok_or(Error::MissingHandlers)?;

        if self.config.enable_basic_auth {
            let credentials = Arc::new(store.read(&self.config.secret_mount_path)?);
            info!(
                mount = %self.config.secret_mount_path.display(),
                "basic auth enabled for system endpoints"
            );
            handlers = handlers
                .decorate_protected(|slot| basic_auth::decorate(slot, Arc::clone(&credentials)));
        }

        catalog::build(&handlers, &self.config)
    }

    /// Serves the provider API, reading credentials from the secret mount
    /// when basic auth is enabled.
    pub async fn listen_and_serve(self) -> Result<(), Error> {
        self.listen_and_serve_with(&SecretsDir).await
    }

    /// Like [`listen_and_serve`](Self::listen_and_serve) with a custom
    /// credential store.
    pub async fn listen_and_serve_with(self, store: &impl CredentialStore) -> Result<(), Error> {
        let server = Server::from_config(&self.config);
        let router = self.into_router(store)?;
        server.serve(router).await
    }
}
