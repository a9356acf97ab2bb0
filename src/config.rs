//! API server configuration, resolved from a key/value source.
//!
//! Resolution never fails. Every field reads one key; a value that is
//! present and parses for the field's type wins, anything else (absent,
//! empty, malformed, negative, out of range) falls back to the default.
//!
//! | Type | Accepted | Example |
//! |---|---|---|
//! | bool | `"true"` is true, any other non-empty value is false | `basic_auth=true` |
//! | integer | non-negative base-10 within the field's range | `port=8081` |
//! | duration | whole seconds, or a duration string | `read_timeout=10`, `write_timeout=1m30s` |
//! | string | any non-empty value, verbatim | `image_pull_policy=IfNotPresent` |

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::duration;

/// Smallest header buffer hyper accepts for HTTP/1.
pub(crate) const MIN_HEADER_BYTES: usize = 8 * 1024;

// ── Sources ───────────────────────────────────────────────────────────────────

/// Where configuration values come from.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEnv;

impl ConfigSource for OsEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<const N: usize> ConfigSource for [(&str, &str); N] {
    fn get(&self, key: &str) -> Option<String> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
    }
}

// ── ApiServerConfig ───────────────────────────────────────────────────────────

/// Probe timings handed to function deployments, in seconds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProbeConfig {
    pub initial_delay_seconds: u32,
    pub timeout_seconds: u32,
    pub period_seconds: u32,
}

/// Fully resolved settings for the API server and the functions it deploys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiServerConfig {
    /// TCP port the API listens on.
    pub port: u16,
    /// Mount `/healthz`.
    pub enable_health: bool,
    /// Gate the `/system/*` routes with basic auth.
    pub enable_basic_auth: bool,
    /// Directory holding `basic-auth-user` and `basic-auth-password`.
    pub secret_mount_path: PathBuf,
    /// Probe functions over HTTP instead of the lock file.
    pub http_probe: bool,
    pub set_non_root_user: bool,
    pub readiness_probe: ProbeConfig,
    pub liveness_probe: ProbeConfig,
    /// Deadline for reading a request, headers and body.
    pub read_timeout: Duration,
    /// Deadline for a handler to produce its response.
    pub write_timeout: Duration,
    pub image_pull_policy: String,
    /// Port function containers listen on.
    pub function_port: u16,
    /// Cap on request header size.
    pub max_header_bytes: usize,
}

impl ApiServerConfig {
    /// Resolves the config from the process environment.
    pub fn from_env() -> Self {
        Self::resolve(&OsEnv)
    }

    /// Resolves every field from `source`, falling back per field.
    pub fn resolve(source: &impl ConfigSource) -> Self {
        let r = Resolver(source);

        let cfg = Self {
            port: r.int("port", 8080),
            enable_health: r.bool("enable_health", true),
            enable_basic_auth: r.bool("basic_auth", false),
            secret_mount_path: r.string("secret_mount_path", "/var/openfaas/secrets/").into(),
            http_probe: r.bool("http_probe", false),
            set_non_root_user: r.bool("set_nonroot_user", false),
            readiness_probe: ProbeConfig {
                initial_delay_seconds: r.int("readiness_probe_initial_delay_seconds", 3),
                timeout_seconds: r.int("readiness_probe_timeout_seconds", 1),
                period_seconds: r.int("readiness_probe_period_seconds", 10),
            },
            liveness_probe: ProbeConfig {
                initial_delay_seconds: r.int("liveness_probe_initial_delay_seconds", 3),
                timeout_seconds: r.int("liveness_probe_timeout_seconds", 1),
                period_seconds: r.int("liveness_probe_period_seconds", 10),
            },
            read_timeout: r.duration("read_timeout", Duration::from_secs(10)),
            write_timeout: r.duration("write_timeout", Duration::from_secs(10)),
            image_pull_policy: r.string("image_pull_policy", "Always"),
            function_port: r.int("function_port", 8080),
            max_header_bytes: r.int("max_header_bytes", 1 << 20),
        };

        debug!(
            port = cfg.port,
            basic_auth = cfg.enable_basic_auth,
            health = cfg.enable_health,
            read_timeout = ?cfg.read_timeout,
            write_timeout = ?cfg.write_timeout,
            "config resolved"
        );
        cfg
    }
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        const UNSET: [(&str, &str); 0] = [];
        Self::resolve(&UNSET)
    }
}

// ── Typed parsing ─────────────────────────────────────────────────────────────

struct Resolver<'a, S: ?Sized>(&'a S);

impl<S: ConfigSource + ?Sized> Resolver<'_, S> {
    /// Present and non-empty, or `None`.
    fn raw(&self, key: &str) -> Option<String> {
        self.0.get(key).filter(|v| !v.is_empty())
    }

    fn bool(&self, key: &str, fallback: bool) -> bool {
        self.raw(key).map_or(fallback, |v| v == "true")
    }

    fn int<T: TryFrom<i64>>(&self, key: &str, fallback: T) -> T {
        self.raw(key)
            .and_then(|v| parse_non_negative(&v))
            .and_then(|n| T::try_from(n).ok())
            .unwrap_or(fallback)
    }

    fn duration(&self, key: &str, fallback: Duration) -> Duration {
        self.raw(key)
            .and_then(|v| {
                parse_non_negative(&v)
                    .and_then(|secs| u64::try_from(secs).ok())
                    .map(Duration::from_secs)
                    .or_else(|| duration::parse(&v))
            })
            .unwrap_or(fallback)
    }

    fn string(&self, key: &str, fallback: &str) -> String {
        self.raw(key).unwrap_or_else(|| fallback.to_owned())
    }
}

fn parse_non_negative(v: &str) -> Option<i64> {
    v.parse::<i64>().ok().filter(|n| *n >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_gives_documented_defaults() {
        let cfg = ApiServerConfig::resolve(&HashMap::<String, String>::new());

        assert_eq!(cfg.port, 8080);
        assert!(cfg.enable_health);
        assert!(!cfg.enable_basic_auth);
        assert_eq!(cfg.secret_mount_path, PathBuf::from("/var/openfaas/secrets/"));
        assert!(!cfg.http_probe);
        assert!(!cfg.set_non_root_user);
        let probe = ProbeConfig { initial_delay_seconds: 3, timeout_seconds: 1, period_seconds: 10 };
        assert_eq!(cfg.readiness_probe, probe);
        assert_eq!(cfg.liveness_probe, probe);
        assert_eq!(cfg.read_timeout, Duration::from_secs(10));
        assert_eq!(cfg.write_timeout, Duration::from_secs(10));
        assert_eq!(cfg.image_pull_policy, "Always");
        assert_eq!(cfg.function_port, 8080);
        assert_eq!(cfg.max_header_bytes, 1 << 20);
        assert_eq!(cfg, ApiServerConfig::default());
    }

    #[test]
    fn bools_are_true_only_for_lowercase_true() {
        for key in ["basic_auth", "http_probe", "set_nonroot_user"] {
            assert!(Resolver(&[(key, "true")]).bool(key, false));
            assert!(!Resolver(&[(key, "TRUE")]).bool(key, true));
            assert!(!Resolver(&[(key, "1")]).bool(key, true));
            assert!(Resolver(&[(key, "")]).bool(key, true));
        }

        let cfg = ApiServerConfig::resolve(&[("enable_health", "yes"), ("basic_auth", "true")]);
        assert!(!cfg.enable_health);
        assert!(cfg.enable_basic_auth);
    }

    #[test]
    fn negative_integers_fall_back() {
        let cfg = ApiServerConfig::resolve(&[
            ("port", "-1"),
            ("readiness_probe_period_seconds", "-30"),
            ("liveness_probe_timeout_seconds", "-0"),
            ("function_port", "-8081"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.readiness_probe.period_seconds, 10);
        assert_eq!(cfg.liveness_probe.timeout_seconds, 0);
        assert_eq!(cfg.function_port, 8080);
    }

    #[test]
    fn integers_outside_field_range_fall_back() {
        let cfg = ApiServerConfig::resolve(&[("port", "70000"), ("function_port", "3000")]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.function_port, 3000);
    }

    #[test]
    fn malformed_integers_fall_back() {
        let cfg = ApiServerConfig::resolve(&[("port", "80a"), ("readiness_probe_initial_delay_seconds", "2.5")]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.readiness_probe.initial_delay_seconds, 3);
    }

    #[test]
    fn durations_accept_seconds_or_strings() {
        let cases = [
            ("10", Duration::from_secs(10)),
            ("2m", Duration::from_secs(120)),
            ("1m30s", Duration::from_secs(90)),
            ("abc", Duration::from_secs(10)),
            ("-5", Duration::from_secs(10)),
            ("", Duration::from_secs(10)),
        ];
        for (raw, want) in cases {
            let cfg = ApiServerConfig::resolve(&[("read_timeout", raw), ("write_timeout", raw)]);
            assert_eq!(cfg.read_timeout, want, "{raw:?}");
            assert_eq!(cfg.write_timeout, want, "{raw:?}");
        }
    }

    #[test]
    fn strings_are_verbatim() {
        let cfg = ApiServerConfig::resolve(&[
            ("image_pull_policy", " IfNotPresent"),
            ("secret_mount_path", "/run/secrets"),
        ]);
        assert_eq!(cfg.image_pull_policy, " IfNotPresent");
        assert_eq!(cfg.secret_mount_path, PathBuf::from("/run/secrets"));
    }

    #[test]
    fn hash_map_source() {
        let mut env = HashMap::new();
        env.insert("port".to_owned(), "9090".to_owned());
        env.insert("max_header_bytes".to_owned(), "65536".to_owned());
        let cfg = ApiServerConfig::resolve(&env);
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.max_header_bytes, 65536);
    }
}
