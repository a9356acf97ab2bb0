//! Radix-tree request router.
//!
//! One tree over path patterns; each pattern owns a small list of
//! method-disjoint bindings. That is what lets `/system/functions` send GET,
//! POST, PUT and DELETE to four different slots while `/function/{name}`
//! takes every method. Built once at startup by [`catalog::build`]; there is
//! no way to add routes to a running server.
//!
//! [`catalog::build`]: crate::catalog::build

use std::collections::HashMap;
use std::sync::Arc;

use http::StatusCode;
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::method::{Method, Methods};
use crate::request::Request;
use crate::response::Response;

/// Path parameter holding a function name.
pub(crate) const NAME_PARAM: &str = "name";

/// The provider route table.
pub struct Router {
    tree: MatchitRouter<usize>,
    endpoints: Vec<Endpoint>,
    by_pattern: HashMap<String, usize>,
}

struct Endpoint {
    bindings: Vec<(Methods, BoxedHandler)>,
}

pub(crate) enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed(String),
    NotFound,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self {
            tree: MatchitRouter::new(),
            endpoints: Vec::new(),
            by_pattern: HashMap::new(),
        }
    }

    /// Binds `handler` to `methods` on `path`.
    ///
    /// Path parameters use `{name}` and a trailing `{*rest}` catch-all. A
    /// second binding on the same pattern must not share any method with
    /// the first, and no binding may have an empty method set.
    pub(crate) fn bind(
        &mut self,
        methods: Methods,
        path: &str,
        handler: BoxedHandler,
    ) -> Result<(), Error> {
        if methods.is_empty() {
            return Err(Error::EmptyMethods { path: path.to_owned() });
        }

        let idx = match self.by_pattern.get(path) {
            Some(&idx) => idx,
            None => {
                let idx = self.endpoints.len();
                self.tree
                    .insert(path, idx)
                    .map_err(|source| Error::InvalidRoute { path: path.to_owned(), source })?;
                self.endpoints.push(Endpoint { bindings: Vec::new() });
                self.by_pattern.insert(path.to_owned(), idx);
                idx
            }
        };

        let endpoint = &mut self.endpoints[idx];
        if let Some(method) = endpoint.bindings.iter().find_map(|(m, _)| m.overlap(methods)) {
            return Err(Error::RouteConflict { path: path.to_owned(), method });
        }
        endpoint.bindings.push((methods, handler));
        debug!(%methods, path, "route bound");
        Ok(())
    }

    pub(crate) fn lookup(&self, method: &http::Method, path: &str) -> Lookup {
        let Ok(matched) = self.tree.at(path) else {
            return Lookup::NotFound;
        };
        let params: HashMap<String, String> = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        if params.get(NAME_PARAM).is_some_and(|name| !is_function_name(name)) {
            return Lookup::NotFound;
        }

        let endpoint = &self.endpoints[*matched.value];
        let method = method.as_str().parse::<Method>().ok();
        match endpoint.bindings.iter().find(|(m, _)| m.allows(method)) {
            Some((_, handler)) => Lookup::Found(Arc::clone(handler), params),
            None => Lookup::MethodNotAllowed(
                endpoint.bindings.iter()
                    .map(|(m, _)| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }

    /// Routes one request and runs the bound handler.
    ///
    /// No matching path is `404`; a matching path without a binding for the
    /// request method is `405` with an `Allow` header.
    pub async fn call(&self, req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Lookup::Found(handler, params) => handler.call(req.with_params(params)).await,
            Lookup::MethodNotAllowed(allow) => Response::builder()
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .header("allow", &allow)
                .no_body(),
            Lookup::NotFound => Response::status(StatusCode::NOT_FOUND),
        }
    }
}

/// `[-a-zA-Z_0-9]+`
fn is_function_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::handler::Handler;

    fn tagged(tag: &'static str) -> BoxedHandler {
        (move |req: Request| async move {
            let rest = req.param("params").unwrap_or("-").to_owned();
            Response::text(format!("{tag} {rest}"))
        })
        .into_boxed_handler()
    }

    fn request(method: &str, path: &str) -> Request {
        let req = http::Request::builder().method(method).uri(path).body(Bytes::new()).unwrap();
        Request::from_http(req)
    }

    async fn body(router: &Router, method: &str, path: &str) -> (StatusCode, String) {
        let res = router.call(request(method, path)).await;
        (res.status_code(), String::from_utf8_lossy(res.body()).into_owned())
    }

    #[tokio::test]
    async fn same_path_different_methods() {
        let mut router = Router::new();
        router.bind(Methods::Only(&[Method::Get]), "/items", tagged("list")).unwrap();
        router.bind(Methods::Only(&[Method::Post]), "/items", tagged("create")).unwrap();

        assert_eq!(body(&router, "GET", "/items").await.1, "list -");
        assert_eq!(body(&router, "POST", "/items").await.1, "create -");

        let res = router.call(request("PATCH", "/items")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET, POST"));
    }

    #[test]
    fn overlapping_methods_are_a_conflict() {
        let mut router = Router::new();
        router.bind(Methods::Only(&[Method::Get, Method::Put]), "/x", tagged("a")).unwrap();
        let err = router.bind(Methods::Only(&[Method::Put]), "/x", tagged("b")).unwrap_err();
        assert!(matches!(err, Error::RouteConflict { ref method, .. } if method == "PUT"));

        let err = router.bind(Methods::Any, "/x", tagged("c")).unwrap_err();
        assert!(matches!(err, Error::RouteConflict { .. }));
    }

    #[tokio::test]
    async fn empty_method_set_is_refused() {
        let mut router = Router::new();
        let err = router.bind(Methods::Only(&[]), "/idle", tagged("idle")).unwrap_err();
        assert!(matches!(err, Error::EmptyMethods { ref path } if path == "/idle"));

        // nothing was registered, so the path is still unknown
        assert_eq!(body(&router, "GET", "/idle").await.0, StatusCode::NOT_FOUND);
        router.bind(Methods::Only(&[Method::Get]), "/idle", tagged("idle")).unwrap();
        assert_eq!(body(&router, "GET", "/idle").await.1, "idle -");
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        let mut router = Router::new();
        let err = router.bind(Methods::Any, "/a/{*rest}/b", tagged("a")).unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }

    #[tokio::test]
    async fn catch_all_and_trailing_slash() {
        let mut router = Router::new();
        for path in ["/function/{name}", "/function/{name}/", "/function/{name}/{*params}"] {
            router.bind(Methods::Any, path, tagged("proxy")).unwrap();
        }

        assert_eq!(body(&router, "GET", "/function/foo").await.1, "proxy -");
        assert_eq!(body(&router, "POST", "/function/foo/").await.1, "proxy -");
        assert_eq!(body(&router, "PURGE", "/function/foo/bar/baz").await.1, "proxy bar/baz");
    }

    #[tokio::test]
    async fn function_names_are_constrained() {
        let mut router = Router::new();
        router.bind(Methods::Only(&[Method::Get]), "/system/function/{name}", tagged("r")).unwrap();

        assert_eq!(body(&router, "GET", "/system/function/my-fn_2").await.0, StatusCode::OK);
        assert_eq!(body(&router, "GET", "/system/function/my.fn").await.0, StatusCode::NOT_FOUND);
        assert_eq!(body(&router, "GET", "/system/function/").await.0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn function_name_charset() {
        assert!(is_function_name("nodeinfo-2_A"));
        assert!(!is_function_name(""));
        assert!(!is_function_name("a b"));
        assert!(!is_function_name("café"));
    }
}
