//! HTTP methods and the method sets a route binding accepts.
//!
//! The provider API only ever names the RFC 9110 methods, so that is all the
//! typed enum covers. Anything else on the wire (WebDAV verbs, `PURGE`, custom
//! tokens) can still reach a binding registered with [`Methods::Any`], which is
//! how the function proxy is mounted.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Method sets ───────────────────────────────────────────────────────────────

/// The methods a single route binding answers to.
///
/// An empty `Only` set matches nothing, so the router refuses to bind one.
/// It also refuses two bindings on one path whose sets overlap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Methods {
    /// Every method, including ones [`Method`] does not know.
    Any,
    Only(&'static [Method]),
}

impl Methods {
    /// Whether a request carrying `method` belongs to this binding.
    ///
    /// `None` stands for a method outside the typed enum; only `Any` takes it.
    pub fn allows(self, method: Option<Method>) -> bool {
        match (self, method) {
            (Self::Any, _) => true,
            (Self::Only(set), Some(m)) => set.contains(&m),
            (Self::Only(_), None) => false,
        }
    }

    /// True for an `Only` set with no methods in it.
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Only(set) if set.is_empty())
    }

    /// Returns the first method both sets accept, if any.
    pub(crate) fn overlap(self, other: Methods) -> Option<String> {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => Some("any method".to_owned()),
            (Self::Only(a), Self::Only(b)) => a
                .iter()
                .find(|m| b.contains(m))
                .map(|m| m.as_str().to_owned()),
        }
    }
}

impl fmt::Display for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(set) => {
                for (i, m) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(m.as_str())?;
                }
                Ok(())
            }
        }
    }
}
