//! Unified error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::handlers::Role;

/// The error type returned by the bootstrap's fallible operations.
///
/// Every variant is a startup failure: the caller is expected to log it and
/// terminate the process. Per-request problems (bad credentials, unknown
/// routes, slow clients) are answered with an HTTP response and never show
/// up here. Configuration values that fail to parse are not errors either;
/// they fall back to their defaults.
#[derive(Debug, Error)]
pub enum Error {
    #[error("api handlers are missing")]
    MissingHandlers,

    #[error("api handlers are missing: no {0} was provided")]
    MissingHandler(Role),

    #[error("unable to read basic auth credentials from {}: {source}", .path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("basic auth credential file {} is empty", .0.display())]
    EmptyCredential(PathBuf),

    #[error("route `{path}` already has a handler for {method}")]
    RouteConflict { path: String, method: String },

    #[error("route `{path}` is bound to an empty method set")]
    EmptyMethods { path: String },

    #[error("invalid route `{path}`: {source}")]
    InvalidRoute {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
