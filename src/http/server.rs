//! HTTP server setup for the Axum transport.
//!
//! # Responsibilities
//! - Create the Axum Router with one catch-all echo handler
//! - Route GET, POST, PUT and DELETE on every path to that handler
//! - Feed the framework's request head and body frames into `echo::Connection`
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - hyper owns the connection, so one state machine runs per request
//! - hyper normalizes header names to lowercase; use the raw transport when
//!   the received casing matters
//! - Malformed heads are answered by hyper itself before reaching the handler

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{ConnectionSettings, EchoConfig};
use crate::echo::{
    Connection, ConnectionError, EchoResponse, HeaderList, RequestHead, ResponseSink,
};

/// HTTP server backed by Axum.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &EchoConfig) -> Self {
        Self {
            router: Self::build_router(config.connection_settings()),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(settings: ConnectionSettings) -> Router {
        let methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE);

        Router::new()
            .route("/", on(methods, echo_handler))
            .route("/{*path}", on(methods, echo_handler))
            .with_state(settings)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Holds the response the state machine writes so it can be returned to Axum.
#[derive(Default)]
struct CapturedResponse(Option<EchoResponse>);

impl ResponseSink for CapturedResponse {
    async fn write(&mut self, response: EchoResponse) -> std::io::Result<()> {
        self.0 = Some(response);
        Ok(())
    }
}

async fn echo_handler(
    State(settings): State<ConnectionSettings>,
    request: Request<Body>,
) -> Result<Response, ConnectionError> {
    let origin = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let (parts, body) = request.into_parts();
    let headers: HeaderList = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
        .collect();
    let head = RequestHead::new(parts.method.as_str(), parts.uri.to_string(), headers);

    let mut conn = Connection::new(origin, settings.max_body_bytes);
    conn.on_head(head)?;

    let mut frames = body.into_data_stream();
    loop {
        let next = match settings.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, frames.next()).await {
                Ok(next) => next,
                Err(_) => {
                    conn.on_transport_error();
                    return Err(ConnectionError::IdleTimeout(limit.as_secs()));
                }
            },
            None => frames.next().await,
        };

        match next {
            Some(Ok(chunk)) => conn.on_body_chunk(&chunk)?,
            Some(Err(e)) => {
                conn.on_transport_error();
                return Err(ConnectionError::Transport(std::io::Error::other(e)));
            }
            None => break,
        }
    }

    conn.on_end()?;
    let mut sink = CapturedResponse::default();
    conn.respond(&mut sink).await?;
    conn.finish(false);

    Ok(sink
        .0
        .map(IntoResponse::into_response)
        .unwrap_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}

impl IntoResponse for EchoResponse {
    fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder.body(Body::from(self.body)).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }
}

/// Hyper has to answer something; the request is still abandoned and the
/// connection closed.
impl IntoResponse for ConnectionError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConnectionError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ConnectionError::IdleTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        };

        if self.is_abandoned() {
            tracing::debug!(error = %self, "Request abandoned");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        let mut response = status.into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}
