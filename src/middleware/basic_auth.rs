//! HTTP basic-auth gate for the protected slots.
//!
//! ```text
//! Authorization: Basic base64(user ":" password)
//! ```
//!
//! A request whose header is missing, malformed, or carries the wrong pair
//! gets `401 Unauthorized` with a `WWW-Authenticate` challenge and never
//! reaches the wrapped handler. The expected credentials never appear in the
//! response or the logs.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use http::StatusCode;
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use tracing::warn;

use crate::credentials::Credentials;
use crate::handler::{BoxedHandler, Guard, guarded};
use crate::request::Request;
use crate::response::Response;

const CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Wraps `inner` so it only runs for requests carrying `credentials`.
pub fn decorate(inner: BoxedHandler, credentials: Arc<Credentials>) -> BoxedHandler {
    guarded(inner, BasicAuth { credentials })
}

struct BasicAuth {
    credentials: Arc<Credentials>,
}

impl Guard for BasicAuth {
    fn admit(&self, req: &Request) -> Result<(), Response> {
        let authorized = req
            .header(AUTHORIZATION.as_str())
            .and_then(parse_basic)
            .is_some_and(|(user, password)| {
                // no short-circuit between the two fields
                let user_ok = constant_time_eq(user.as_bytes(), self.credentials.user.as_bytes());
                let password_ok =
                    constant_time_eq(password.as_bytes(), self.credentials.password.as_bytes());
                user_ok & password_ok
            });

        if authorized {
            return Ok(());
        }

        warn!(method = %req.method(), path = req.path(), "rejected request with invalid credentials");
        Err(unauthorized())
    }
}

fn unauthorized() -> Response {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(WWW_AUTHENTICATE.as_str(), CHALLENGE)
        .text("invalid credentials")
}

/// Splits `Basic <base64>` into its user and password. The scheme name is
/// case-insensitive; the password may itself contain `:`.
fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_owned(), password.to_owned()))
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
