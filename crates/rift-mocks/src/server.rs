//! Mock HTTP server.
//!
//! Every request is handed to the router published by [`Mocks`] at the time
//! it arrives; requests no route answers get a 404.

use crate::handlers::{MockRequest, Outcome};
use crate::mocks::Mocks;
use crate::response::{error_response, not_found};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// HTTP server exposing the mocks
pub struct MockServer {
    addr: SocketAddr,
    mocks: Arc<Mocks>,
}

impl MockServer {
    pub fn new(addr: SocketAddr, mocks: Arc<Mocks>) -> Self {
        Self { addr, mocks }
    }

    /// Bind and serve until the task is dropped.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Mock server listening on http://{}", self.addr);
        serve(listener, self.mocks).await
    }
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, mocks: Arc<Mocks>) -> Result<(), anyhow::Error> {
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Mock server accept error: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let mocks = Arc::clone(&mocks);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let mocks = Arc::clone(&mocks);
                async move { handle_mock_request(req, mocks).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Mock server connection error: {}", e);
            }
        });
    }
}

/// Handle a request to the mock server
pub async fn handle_mock_request(
    req: Request<Incoming>,
    mocks: Arc<Mocks>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!("Error reading request body: {}", e);
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                "Request body could not be read",
            ));
        }
    };

    let request = MockRequest::from_parts(&parts, body);
    debug!("Request received: {} {}", request.method, request.path);

    match mocks.dispatch(request).await {
        Outcome::Respond(response) => Ok(response),
        Outcome::Next => {
            debug!("No route matched {} {}", parts.method, parts.uri.path());
            Ok(not_found())
        }
    }
}
