//! The fixed set of handler slots an embedding provider must fill.
//!
//! A provider (Kubernetes, containerd, a test double) supplies one handler
//! per [`Role`]. The bootstrap never constructs handlers itself; it only
//! validates that the set is complete, wraps the protected ones, and binds
//! them to the route catalog.
//!
//! ```rust
//! use faas_bootstrap::{Handlers, Request, Response};
//!
//! async fn stub(_req: Request) -> Response { Response::text("OK") }
//!
//! let handlers = Handlers::builder()
//!     .function_reader(stub)
//!     .deploy_handler(stub)
//!     .delete_handler(stub)
//!     .update_handler(stub)
//!     .replica_reader(stub)
//!     .replica_updater(stub)
//!     .secret_handler(stub)
//!     .function_proxy(stub)
//!     .health(stub)
//!     .info_handler(stub)
//!     .build()
//!     .unwrap();
//! # let _ = handlers;
//! ```

use std::fmt;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};

/// A named slot in the handler set.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
    FunctionReader,
    DeployHandler,
    DeleteHandler,
    UpdateHandler,
    ReplicaReader,
    ReplicaUpdater,
    SecretHandler,
    FunctionProxy,
    Health,
    InfoHandler,
}

impl Role {
    /// Every role, in declaration order. `ALL[r as usize] == r`.
    pub const ALL: [Role; 10] = [
        Self::FunctionReader,
        Self::DeployHandler,
        Self::DeleteHandler,
        Self::UpdateHandler,
        Self::ReplicaReader,
        Self::ReplicaUpdater,
        Self::SecretHandler,
        Self::FunctionProxy,
        Self::Health,
        Self::InfoHandler,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FunctionReader => "FunctionReader",
            Self::DeployHandler  => "DeployHandler",
            Self::DeleteHandler  => "DeleteHandler",
            Self::UpdateHandler  => "UpdateHandler",
            Self::ReplicaReader  => "ReplicaReader",
            Self::ReplicaUpdater => "ReplicaUpdater",
            Self::SecretHandler  => "SecretHandler",
            Self::FunctionProxy  => "FunctionProxy",
            Self::Health         => "Health",
            Self::InfoHandler    => "InfoHandler",
        }
    }

    /// Whether the slot sits behind basic auth when it is enabled.
    ///
    /// Function invocation and the health probe stay open.
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::FunctionProxy | Self::Health)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// A complete handler set: exactly one handler per [`Role`].
///
/// Only obtainable through [`HandlersBuilder::build`], so holding a
/// `Handlers` proves no slot is empty.
pub struct Handlers {
    slots: Vec<BoxedHandler>,
}

impl Handlers {
    pub fn builder() -> HandlersBuilder {
        HandlersBuilder::default()
    }

    #[doc(hidden)]
    pub fn get(&self, role: Role) -> &BoxedHandler {
        &self.slots[role as usize]
    }

    /// Replaces every protected slot with `wrap(slot)`. Open slots are left
    /// untouched. Runs once per startup, never per request.
    pub(crate) fn decorate_protected(
        mut self,
        wrap: impl Fn(BoxedHandler) -> BoxedHandler,
    ) -> Self {
        for role in Role::ALL.into_iter().filter(|r| r.is_protected()) {
            let slot = &mut self.slots[role as usize];
            *slot = wrap(slot.clone());
        }
        self
    }
}

// ── HandlersBuilder ───────────────────────────────────────────────────────────

/// Collects handlers slot by slot. [`build`](Self::build) rejects an
/// incomplete set.
#[derive(Default)]
pub struct HandlersBuilder {
    slots: [Option<BoxedHandler>; 10],
}

impl HandlersBuilder {
    /// Fills `role` with `handler`, replacing whatever was there.
    pub fn slot(mut self, role: Role, handler: impl Handler) -> Self {
        self.slots[role as usize] = Some(handler.into_boxed_handler());
        self
    }

    pub fn function_reader(self, h: impl Handler) -> Self { self.slot(Role::FunctionReader, h) }
    pub fn deploy_handler(self, h: impl Handler) -> Self { self.slot(Role::DeployHandler, h) }
    pub fn delete_handler(self, h: impl Handler) -> Self { self.slot(Role::DeleteHandler, h) }
    pub fn update_handler(self, h: impl Handler) -> Self { self.slot(Role::UpdateHandler, h) }
    pub fn replica_reader(self, h: impl Handler) -> Self { self.slot(Role::ReplicaReader, h) }
    pub fn replica_updater(self, h: impl Handler) -> Self { self.slot(Role::ReplicaUpdater, h) }
    pub fn secret_handler(self, h: impl Handler) -> Self { self.slot(Role::SecretHandler, h) }
    pub fn function_proxy(self, h: impl Handler) -> Self { self.slot(Role::FunctionProxy, h) }
    pub fn health(self, h: impl Handler) -> Self { self.slot(Role::Health, h) }
    pub fn info_handler(self, h: impl Handler) -> Self { self.slot(Role::InfoHandler, h) }

    /// Fails with [`Error::MissingHandler`] naming the first empty slot.
    pub fn build(mut self) -> Result<Handlers, Error> {
        let mut slots = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let handler = self.slots[role as usize]
                .take()
                .ok_or(Error::MissingHandler(role))?;
            slots.push(handler);
        }
        Ok(Handlers { slots })
    }
}
