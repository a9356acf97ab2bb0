//! Ready-made handler for the [`Role::Health`](crate::Role::Health) slot.
//!
//! Providers whose health depends on nothing but the process being up can
//! plug this in directly:
//!
//! ```rust
//! use faas_bootstrap::{Handlers, health};
//!
//! let builder = Handlers::builder().health(health::healthy);
//! # let _ = builder;
//! ```
//!
//! A provider that must gate on its container runtime or cluster API should
//! supply its own handler instead.

use crate::{Request, Response};

/// Always `200 OK` with body `"OK"`.
pub async fn healthy(_req: Request) -> Response {
    Response::text("OK")
}
