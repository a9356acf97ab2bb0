//! Middleware layer.
//!
//! Middleware here wraps a slot's [`BoxedHandler`](crate::handler::BoxedHandler)
//! in another one with the same signature. Wrapping happens once, while the
//! server boots; the router only ever sees the finished handler.

pub mod basic_auth;
