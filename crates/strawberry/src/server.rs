//! Debug HTTP server.
//!
//! Serves a schema for local development:
//! - `POST <path>`: GraphQL queries and mutations as JSON
//! - `GET <path>`: GraphiQL
//! - `GET /health`: health check
//!
//! ```ignore
//! use strawberry::server::{DebugServer, ServerConfig};
//!
//! DebugServer::new(schema)
//!     .config(ServerConfig::new().port(4000))
//!     .listen()
//!     .await?;
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use strawberry_runtime::{Context, GraphQLError, Request, Response, Schema};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Debug server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// GraphQL endpoint path.
    pub path: String,
    /// Serve GraphiQL on `GET <path>`.
    pub graphiql: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            path: "/graphql".to_string(),
            graphiql: true,
        }
    }
}

impl ServerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the endpoint path. A missing leading `/` is added.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    #[must_use]
    pub fn graphiql(mut self, enabled: bool) -> Self {
        self.graphiql = enabled;
        self
    }

    /// Returns the `host:port` address to bind.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Debug server failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// A schema served over HTTP/1.
pub struct DebugServer {
    schema: Arc<Schema>,
    config: ServerConfig,
}

impl std::fmt::Debug for DebugServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DebugServer {
    /// Creates a new server with the default config.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            config: ServerConfig::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and serves until an accept fails.
    pub async fn listen(self) -> Result<(), ServerError> {
        let addr = self.config.addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    /// Serves connections from `listener`, one task per connection.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("Listening on http://{}{}", addr, self.config.path);
            if self.config.graphiql {
                info!("GraphiQL: http://{}{}", addr, self.config.path);
            }
        }

        let server = Arc::new(self);
        loop {
            let (stream, remote) = listener.accept().await.map_err(ServerError::Accept)?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let server = Arc::clone(&server);
                    async move { Ok::<_, Infallible>(server.route(req).await) }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    if err.is_incomplete_message() {
                        debug!(%remote, "connection closed early");
                    } else {
                        error!(%remote, "Connection error: {:?}", err);
                    }
                }
            });
        }
    }

    async fn route(&self, req: hyper::Request<Incoming>) -> hyper::Response<BoxBody> {
        let (parts, body) = req.into_parts();
        let body = if parts.method == Method::POST {
            match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    warn!("failed to read request body: {}", err);
                    return error_response(StatusCode::BAD_REQUEST, "Failed to read body");
                }
            }
        } else {
            Bytes::new()
        };
        self.handle(&parts.method, parts.uri.path(), body).await
    }

    /// Answers a request whose body has already been read.
    pub(crate) async fn handle(
        &self,
        method: &Method,
        path: &str,
        body: Bytes,
    ) -> hyper::Response<BoxBody> {
        debug!(%method, path, "request");
        let endpoint = self.config.path.as_str();
        match (method, path) {
            (&Method::GET, "/health") => respond(
                StatusCode::OK,
                "application/json",
                r#"{"status":"healthy"}"#,
            ),
            (&Method::POST, p) if p == endpoint => self.execute(&body).await,
            (&Method::GET, p) if p == endpoint && self.config.graphiql => respond(
                StatusCode::OK,
                "text/html; charset=utf-8",
                graphiql_html(endpoint),
            ),
            (&Method::OPTIONS, p) if p == endpoint => {
                let mut response = respond(StatusCode::OK, "text/plain", "");
                let headers = response.headers_mut();
                headers.insert(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static("GET, POST, OPTIONS"),
                );
                headers.insert(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("Content-Type, Authorization"),
                );
                response
            }
            _ => respond(
                StatusCode::NOT_FOUND,
                "application/json",
                r#"{"error":"Not Found"}"#,
            ),
        }
    }

    async fn execute(&self, body: &[u8]) -> hyper::Response<BoxBody> {
        let request: Request = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {err}"));
            }
        };

        debug!(
            "Executing query: {}",
            request.query.chars().take(100).collect::<String>()
        );
        let response = self.schema.execute(request, Context::new()).await;
        json_response(StatusCode::OK, &response)
    }
}

fn full<T: Into<Bytes>>(chunk: T) -> BoxBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> hyper::Response<BoxBody> {
    let mut response = hyper::Response::new(full(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, data: &T) -> hyper::Response<BoxBody> {
    match serde_json::to_vec(data) {
        Ok(body) => respond(status, "application/json", body),
        Err(err) => {
            error!("failed to serialize response: {}", err);
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                r#"{"errors":[{"message":"Internal server error"}]}"#,
            )
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> hyper::Response<BoxBody> {
    json_response(status, &Response::errors(vec![GraphQLError::new(message)]))
}

fn graphiql_html(endpoint: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <title>Strawberry GraphiQL</title>
    <style>
        body {{ height: 100%; margin: 0; width: 100%; overflow: hidden; }}
        #graphiql {{ height: 100vh; }}
    </style>
    <link rel="stylesheet" href="https://unpkg.com/graphiql@3/graphiql.min.css" />
    <script crossorigin src="https://unpkg.com/react@18/umd/react.production.min.js"></script>
    <script crossorigin src="https://unpkg.com/react-dom@18/umd/react-dom.production.min.js"></script>
    <script crossorigin src="https://unpkg.com/graphiql@3/graphiql.min.js"></script>
</head>
<body>
    <div id="graphiql">Loading...</div>
    <script>
        const fetcher = GraphiQL.createFetcher({{ url: "{endpoint}" }});
        ReactDOM.createRoot(document.getElementById("graphiql")).render(
            React.createElement(GraphiQL, {{ fetcher, defaultEditorToolsVisibility: true }})
        );
    </script>
</body>
</html>"#
    )
}
