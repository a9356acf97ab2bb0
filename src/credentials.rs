//! Basic-auth credentials and the store they are loaded from.
//!
//! Credentials are read once, before the server binds, and never refreshed.
//! A read failure is a startup failure: the bootstrap returns the error and
//! no connection is ever accepted with a half-configured gate.

use std::fmt;
use std::path::Path;

use crate::error::Error;

/// File holding the username, relative to the secret mount path.
pub const USER_FILE: &str = "basic-auth-user";
/// File holding the password, relative to the secret mount path.
pub const PASSWORD_FILE: &str = "basic-auth-password";

/// A username/password pair. `Debug` never prints the password.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reads credentials given a secret mount path.
pub trait CredentialStore {
    fn read(&self, mount_path: &Path) -> Result<Credentials, Error>;
}

/// Credentials mounted as two files, the way Kubernetes and faasd mount
/// secrets: `<mount>/basic-auth-user` and `<mount>/basic-auth-password`.
///
/// Surrounding whitespace (the trailing newline `echo` leaves behind) is
/// trimmed; a file that is empty after trimming is rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecretsDir;

impl CredentialStore for SecretsDir {
    fn read(&self, mount_path: &Path) -> Result<Credentials, Error> {
        let user = read_secret(&mount_path.join(USER_FILE))?;
        let password = read_secret(&mount_path.join(PASSWORD_FILE))?;
        Ok(Credentials { user, password })
    }
}

fn read_secret(path: &Path) -> Result<String, Error> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Credentials {
        path: path.to_path_buf(),
        source,
    })?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::EmptyCredential(path.to_path_buf()));
    }
    Ok(value.to_owned())
}
