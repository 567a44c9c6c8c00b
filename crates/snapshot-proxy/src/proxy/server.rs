//! ProxyServer struct and main run loop.
//!
//! Hosts a [`ProxyController`] behind an HTTP/1.1 listener. Requests that
//! aren't proxy paths go to a minimal pass-through stage that serves
//! `GET /metrics` and answers everything else with 404.

use super::controller::{Interception, ProxyController};
use crate::config::Config;
use crate::metrics::collect_metrics;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Helper function to create a JSON error response.
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

pub struct ProxyServer {
    port: u16,
    controller: ProxyController,
}

impl ProxyServer {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        Ok(Self {
            port: config.listen.port,
            controller: ProxyController::from_config(config)?,
        })
    }

    /// Bind the configured port and serve until the listener fails.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on http://{}", addr);
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!(
            "Serving proxy requests with the {} snapshot cache",
            self.controller.cache().name()
        );
        let server = Arc::new(self);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move { server.handle(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(
                        "Error serving HTTP connection from {}: {}",
                        remote_addr, err
                    );
                }
            });
        }
    }

    async fn handle(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        match self.controller.intercept(req).await {
            Interception::Handled(response) => Ok(response),
            Interception::PassThrough(req) => Ok(pass_through(&req)),
        }
    }
}

/// Stage for requests that aren't proxied.
fn pass_through<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    if req.method() == Method::GET && req.uri().path() == "/metrics" {
        let mut response = Response::new(Full::new(Bytes::from(collect_metrics())));
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
        );
        return response;
    }
    error_response(StatusCode::NOT_FOUND, "Not Found")
}
