use crate::gate;
use crate::http_api::{build_response, gate_request, internal_error};
use anyhow::{Context as AnyhowContext, Result};
use axum::{
    http::{HeaderMap, Method, Uri},
    response::Response,
    Router,
};
use clientlib_engine::Engine;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Router answering every path through the delivery gate.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap| {
        let engine = engine.clone();
        async move { handle(engine, method, uri, headers).await }
    })
}

async fn handle(engine: Arc<Engine>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let request = gate_request(method, &uri, &headers);
    // the tree does blocking reads
    let outcome = tokio::task::spawn_blocking(move || gate::respond(&engine, &request)).await;
    match outcome {
        Ok(response) => {
            log::debug!("{} {}", response.status.as_u16(), uri.path());
            build_response(response)
        }
        Err(err) => {
            log::error!("Gate task failed for {}: {err}", uri.path());
            internal_error()
        }
    }
}

/// Serve the gate on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, engine: Arc<Engine>) -> Result<()> {
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

/// Resolve `bind` and refuse non-loopback addresses unless `public` is set.
pub(crate) async fn guarded_bind_addrs(bind: &str, public: bool) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve bind address: {bind}"))?
        .collect();
    if addrs.is_empty() {
        anyhow::bail!("Bind address resolved to no socket address: {bind}")
    }
    if !public && addrs.iter().any(|addr| !addr.ip().is_loopback()) {
        anyhow::bail!("Refusing to bind to non-loopback address without --public: {bind}")
    }
    Ok(addrs)
}
