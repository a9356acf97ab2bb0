//! A provider with in-memory stub handlers, for poking at the route table.
//!
//! Run with:
//!   RUST_LOG=debug port=8081 cargo run --example stub_provider
//!
//! Try:
//!   curl http://localhost:8081/system/functions
//!   curl -X POST http://localhost:8081/system/functions -d '{"service":"figlet"}'
//!   curl http://localhost:8081/function/figlet/some/path?q=1
//!   curl http://localhost:8081/healthz
//!
//! With `basic_auth=true secret_mount_path=/tmp/secrets`, put the user and
//! password in `/tmp/secrets/basic-auth-user` and
//! `/tmp/secrets/basic-auth-password` and pass `-u user:password` to curl.

use faas_bootstrap::{ApiServer, Handlers, Request, Response, StatusCode, health};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let handlers = match Handlers::builder()
        .function_reader(list_functions)
        .deploy_handler(accepted)
        .delete_handler(accepted)
        .update_handler(accepted)
        .replica_reader(replicas)
        .replica_updater(accepted)
        .secret_handler(secrets)
        .function_proxy(proxy)
        .health(health::healthy)
        .info_handler(system_info)
        .build()
    {
        Ok(h) => h,
        Err(e) => fatal(e),
    };

    let server = ApiServer::from_env().handlers(handlers);
    info!(port = server.config().port, "starting stub provider");

    if let Err(e) = server.listen_and_serve().await {
        fatal(e);
    }
}

fn fatal(e: faas_bootstrap::Error) -> ! {
    error!("{e}");
    std::process::exit(1);
}

// GET /system/functions
async fn list_functions(_req: Request) -> Response {
    Response::json(br#"[{"name":"figlet","replicas":1}]"#.to_vec())
}

// POST|PUT|DELETE /system/functions, POST /system/scale-function/{name}
async fn accepted(_req: Request) -> Response {
    Response::status(StatusCode::ACCEPTED)
}

// GET /system/function/{name}
async fn replicas(req: Request) -> Response {
    let name = req.param("name").unwrap_or_default();
    Response::json(format!(r#"{{"name":"{name}","replicas":1,"availableReplicas":1}}"#).into_bytes())
}

// GET|PUT|POST|DELETE /system/secrets
async fn secrets(req: Request) -> Response {
    match req.method().as_str() {
        "GET" => Response::json(b"[]".to_vec()),
        _ => Response::status(StatusCode::ACCEPTED),
    }
}

// /function/{name}[/{*params}]: echoes what a real proxy would forward
async fn proxy(req: Request) -> Response {
    let name = req.param("name").unwrap_or_default();
    let rest = req.param("params").unwrap_or_default();
    Response::text(format!("{} {name} /{rest} ({} bytes)\n", req.method(), req.body().len()))
}

// GET /system/info
async fn system_info(_req: Request) -> Response {
    Response::json(br#"{"provider":{"provider":"stub","orchestration":"none"}}"#.to_vec())
}
