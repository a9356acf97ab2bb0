//! The provider API surface: every route, its methods and its slot.
//!
//! | Path | Methods | Slot | Protected |
//! |---|---|---|---|
//! | `/system/functions` | GET | FunctionReader | yes |
//! | `/system/functions` | POST | DeployHandler | yes |
//! | `/system/functions` | DELETE | DeleteHandler | yes |
//! | `/system/functions` | PUT | UpdateHandler | yes |
//! | `/system/function/{name}` | GET | ReplicaReader | yes |
//! | `/system/scale-function/{name}` | POST | ReplicaUpdater | yes |
//! | `/system/info` | GET | InfoHandler | yes |
//! | `/system/secrets` | GET, PUT, POST, DELETE | SecretHandler | yes |
//! | `/function/{name}` | any | FunctionProxy | no |
//! | `/function/{name}/` | any | FunctionProxy | no |
//! | `/function/{name}/{*params}` | any | FunctionProxy | no |
//! | `/healthz` | GET | Health | no |
//!
//! The proxy is mounted three times so invocation works with or without a
//! sub-path. `/healthz` is skipped when health is disabled.

use crate::config::ApiServerConfig;
use crate::error::Error;
use crate::handlers::{Handlers, Role};
use crate::method::{Method, Methods};
use crate::router::Router;

/// One row of the catalog.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub methods: Methods,
    pub role: Role,
    /// Mirrors `role.is_protected()`; kept on the row so the table reads
    /// the same as the published contract.
    pub protected: bool,
}

const fn entry(path: &'static str, methods: Methods, role: Role, protected: bool) -> RouteEntry {
    RouteEntry { path, methods, role, protected }
}

const GET: Methods = Methods::Only(&[Method::Get]);
const POST: Methods = Methods::Only(&[Method::Post]);
const PUT: Methods = Methods::Only(&[Method::Put]);
const DELETE: Methods = Methods::Only(&[Method::Delete]);
const SECRETS: Methods = Methods::Only(&[Method::Get, Method::Put, Method::Post, Method::Delete]);

pub const HEALTH_PATH: &str = "/healthz";

/// Every route the provider API exposes, in registration order.
pub const CATALOG: [RouteEntry; 12] = [
    // System endpoints
    entry("/system/functions", GET, Role::FunctionReader, true),
    entry("/system/functions", POST, Role::DeployHandler, true),
    entry("/system/functions", DELETE, Role::DeleteHandler, true),
    entry("/system/functions", PUT, Role::UpdateHandler, true),
    entry("/system/function/{name}", GET, Role::ReplicaReader, true),
    entry("/system/scale-function/{name}", POST, Role::ReplicaUpdater, true),
    entry("/system/info", GET, Role::InfoHandler, true),
    entry("/system/secrets", SECRETS, Role::SecretHandler, true),
    // Open endpoints
    entry("/function/{name}", Methods::Any, Role::FunctionProxy, false),
    entry("/function/{name}/", Methods::Any, Role::FunctionProxy, false),
    entry("/function/{name}/{*params}", Methods::Any, Role::FunctionProxy, false),
    entry(HEALTH_PATH, GET, Role::Health, false),
];

/// Binds every catalog entry to its slot in `handlers`.
///
/// `handlers` is expected to be decorated already when basic auth is on;
/// this step only wires paths to slots.
pub fn build(handlers: &Handlers, config: &ApiServerConfig) -> Result<Router, Error> {
    let mut router = Router::new();
    for route in CATALOG {
        if route.path == HEALTH_PATH && !config.enable_health {
            continue;
        }
        router.bind(route.methods, route.path, handlers.get(route.role).clone())?;
    }
    Ok(router)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::request::Request;
    use crate::response::Response;

    fn handlers() -> Handlers {
        Role::ALL.into_iter().fold(Handlers::builder(), |b, role| {
            b.slot(role, move |req: Request| async move {
                let rest = req.param("params").map(|p| format!(" {p}")).unwrap_or_default();
                Response::text(format!("{role}{rest}"))
            })
        })
        .build()
        .unwrap()
    }

    async fn dispatch(router: &Router, method: &str, path: &str) -> (StatusCode, String) {
        let req = http::Request::builder().method(method).uri(path).body(Bytes::new()).unwrap();
        let res = router.call(Request::from_http(req)).await;
        (res.status_code(), String::from_utf8_lossy(res.body()).into_owned())
    }

    #[test]
    fn protected_flag_matches_role() {
        for route in CATALOG {
            assert_eq!(route.protected, route.role.is_protected(), "{}", route.path);
        }
    }

    #[test]
    fn every_role_is_reachable() {
        for role in Role::ALL {
            assert!(CATALOG.iter().any(|r| r.role == role), "{role}");
        }
    }

    #[tokio::test]
    async fn routes_dispatch_to_their_slots() {
        let router = build(&handlers(), &ApiServerConfig::default()).unwrap();

        let cases = [
            ("GET", "/system/functions", "FunctionReader"),
            ("POST", "/system/functions", "DeployHandler"),
            ("DELETE", "/system/functions", "DeleteHandler"),
            ("PUT", "/system/functions", "UpdateHandler"),
            ("GET", "/system/function/figlet", "ReplicaReader"),
            ("POST", "/system/scale-function/figlet", "ReplicaUpdater"),
            ("GET", "/system/info", "InfoHandler"),
            ("GET", "/system/secrets", "SecretHandler"),
            ("PUT", "/system/secrets", "SecretHandler"),
            ("POST", "/system/secrets", "SecretHandler"),
            ("DELETE", "/system/secrets", "SecretHandler"),
            ("GET", "/healthz", "Health"),
            ("GET", "/function/foo", "FunctionProxy"),
            ("POST", "/function/foo/", "FunctionProxy"),
            ("PATCH", "/function/foo/bar/baz", "FunctionProxy bar/baz"),
        ];
        for (method, path, want) in cases {
            assert_eq!(dispatch(&router, method, path).await, (StatusCode::OK, want.to_owned()), "{method} {path}");
        }
    }

    #[tokio::test]
    async fn method_constraints_hold() {
        let router = build(&handlers(), &ApiServerConfig::default()).unwrap();

        assert_eq!(dispatch(&router, "PATCH", "/system/functions").await.0, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(dispatch(&router, "POST", "/system/info").await.0, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(dispatch(&router, "GET", "/system/scale-function/figlet").await.0, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(dispatch(&router, "POST", "/healthz").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn health_is_absent_when_disabled() {
        let config = ApiServerConfig { enable_health: false, ..ApiServerConfig::default() };
        let router = build(&handlers(), &config).unwrap();

        assert_eq!(dispatch(&router, "GET", "/healthz").await.0, StatusCode::NOT_FOUND);
        assert_eq!(dispatch(&router, "GET", "/system/info").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let router = build(&handlers(), &ApiServerConfig::default()).unwrap();
        assert_eq!(dispatch(&router, "GET", "/system/functions/").await.0, StatusCode::NOT_FOUND);
        assert_eq!(dispatch(&router, "GET", "/function/bad.name").await.0, StatusCode::NOT_FOUND);
        assert_eq!(dispatch(&router, "GET", "/").await.0, StatusCode::NOT_FOUND);
    }
}
