//! # faas-bootstrap
//!
//! The bootstrap layer of a serverless-function provider API. A provider
//! brings its own handlers (deploy, delete, list, scale, secrets, proxy, …);
//! this crate binds them to the fixed provider route contract, optionally
//! puts the system routes behind basic auth, and runs the HTTP server.
//!
//! ## What it owns
//!
//! - Config resolution from environment-style keys with per-field fallbacks
//!   ([`ApiServerConfig`])
//! - The closed route catalog ([`catalog::CATALOG`]) and its router
//! - Basic-auth decoration of the eight system slots
//! - The accept loop, read/write deadlines, header cap and graceful shutdown
//!
//! Everything behind a handler (talking to Kubernetes, proxying to function
//! containers, storing secrets) belongs to the provider.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use faas_bootstrap::{ApiServer, Handlers, Request, Response, health};
//!
//! #[tokio::main]
//! async fn main() {
//!     let handlers = Handlers::builder()
//!         .function_reader(list)
//!         .deploy_handler(stub)
//!         .delete_handler(stub)
//!         .update_handler(stub)
//!         .replica_reader(stub)
//!         .replica_updater(stub)
//!         .secret_handler(stub)
//!         .function_proxy(stub)
//!         .health(health::healthy)
//!         .info_handler(stub)
//!         .build()
//!         .expect("complete handler set");
//!
//!     if let Err(e) = ApiServer::from_env().handlers(handlers).listen_and_serve().await {
//!         eprintln!("fatal: {e}");
//!         std::process::exit(1);
//!     }
//! }
//!
//! async fn list(_req: Request) -> Response {
//!     Response::json(b"[]".to_vec())
//! }
//!
//! async fn stub(_req: Request) -> Response {
//!     Response::text("not implemented")
//! }
//! ```

mod bootstrap;
mod config;
mod credentials;
mod duration;
mod error;
mod handler;
mod handlers;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod catalog;
pub mod health;
pub mod middleware;

pub use bootstrap::ApiServer;
pub use config::{ApiServerConfig, ConfigSource, OsEnv, ProbeConfig};
pub use credentials::{CredentialStore, Credentials, PASSWORD_FILE, SecretsDir, USER_FILE};
pub use error::Error;
pub use handler::Handler;
pub use handlers::{Handlers, HandlersBuilder, Role};
pub use http::StatusCode;
pub use method::{Method, Methods};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
