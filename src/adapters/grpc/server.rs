//! gRPC server for the tessera.Lease API.
//!
//! This module provides the tonic server that serves lease requests. It
//! uses the proto module for wire-format encoding compatible with any
//! standard gRPC client; requests are routed by URI path through a custom
//! tonic `Service` implementation rather than generated code.

use super::errors::to_status;
use super::proto;
use super::service::LeaseRpcService;
use crate::core::error::{LeaseError, LeaseResult};
use crate::lease::worker::LeaseHandle;
use bytes::{BufMut, Bytes, BytesMut};
use http_body_util::BodyExt;
use prost::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tonic::codegen::http::{header, StatusCode};
use tonic::Status;

/// Decode a gRPC message from body bytes (strips the 5-byte frame header).
#[allow(clippy::result_large_err)]
fn decode_grpc_message<M: Message + Default>(body: &Bytes) -> Result<M, Status> {
    if body.len() < 5 {
        return Err(Status::invalid_argument("gRPC message too short"));
    }

    let _compressed = body[0];
    let len = u32::from_be_bytes([body[1], body[2], body[3], body[4]]) as usize;

    if body.len() < 5 + len {
        return Err(Status::invalid_argument(format!(
            "gRPC message truncated: expected {} bytes, got {}",
            len,
            body.len() - 5
        )));
    }

    let msg_bytes = &body[5..5 + len];
    M::decode(msg_bytes).map_err(|e| Status::invalid_argument(format!("decode error: {}", e)))
}

/// Encode a gRPC message to bytes (adds the 5-byte frame header).
fn encode_grpc_message<M: Message>(msg: &M) -> Bytes {
    let encoded = msg.encode_to_vec();
    let len = encoded.len() as u32;

    let mut buf = BytesMut::with_capacity(5 + encoded.len());
    buf.put_u8(0); // not compressed
    buf.put_u32(len);
    buf.put_slice(&encoded);
    buf.freeze()
}

/// A gRPC body that includes trailers with grpc-status.
struct GrpcBody {
    data: Option<Bytes>,
    trailers_sent: bool,
}

impl http_body::Body for GrpcBody {
    type Data = Bytes;
    type Error = Status;

    fn poll_frame(
        mut self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        if let Some(data) = self.data.take() {
            return std::task::Poll::Ready(Some(Ok(http_body::Frame::data(data))));
        }
        if !self.trailers_sent {
            self.trailers_sent = true;
            let mut trailers = tonic::codegen::http::HeaderMap::new();
            trailers.insert("grpc-status", "0".parse().expect("static header value"));
            return std::task::Poll::Ready(Some(Ok(http_body::Frame::trailers(trailers))));
        }
        std::task::Poll::Ready(None)
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none() && self.trailers_sent
    }
}

/// Build a gRPC response with proper headers and trailers.
fn grpc_response(body: Bytes) -> tonic::codegen::http::Response<tonic::body::BoxBody> {
    use tonic::body::BoxBody;

    let grpc_body = GrpcBody {
        data: Some(body),
        trailers_sent: false,
    };

    tonic::codegen::http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/grpc")
        .body(BoxBody::new(grpc_body))
        .expect("static response parts")
}

/// Build a gRPC error response.
fn grpc_error_response(status: Status) -> tonic::codegen::http::Response<tonic::body::BoxBody> {
    status.into_http()
}

/// gRPC server for the tessera.Lease API.
pub struct LeaseGrpcServer {
    /// Bind address.
    bind_addr: SocketAddr,
    /// Shared RPC service.
    service: Arc<LeaseRpcService>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl LeaseGrpcServer {
    /// Create a new gRPC server over a worker handle.
    pub fn new(bind_addr: SocketAddr, handle: LeaseHandle, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            bind_addr,
            service: Arc::new(LeaseRpcService::new(handle)),
            shutdown_rx,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Get the shared RPC service.
    pub fn service(&self) -> &Arc<LeaseRpcService> {
        &self.service
    }

    /// Run the gRPC server until the shutdown signal flips.
    pub async fn run(self) -> LeaseResult<()> {
        use tonic::transport::Server;

        let addr = self.bind_addr;
        let mut shutdown_rx = self.shutdown_rx.clone();

        tracing::info!(%addr, "starting lease gRPC server");

        let router = Server::builder().add_service(LeaseServer::new(self.service.clone()));

        router
            .serve_with_shutdown(addr, async move {
                loop {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                tracing::info!("gRPC server shutting down");
            })
            .await
            .map_err(|e| LeaseError::Internal {
                message: format!("gRPC server error: {}", e),
            })?;

        Ok(())
    }
}

// ============================================================================
// Tonic Service Wrapper
// ============================================================================

/// Wrapper exposing LeaseRpcService through tonic's server machinery.
#[derive(Clone)]
pub struct LeaseServer {
    inner: Arc<LeaseRpcService>,
}

impl LeaseServer {
    pub fn new(inner: Arc<LeaseRpcService>) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for LeaseServer {
    const NAME: &'static str = "tessera.Lease";
}

impl<B> tonic::codegen::Service<tonic::codegen::http::Request<B>> for LeaseServer
where
    B: tonic::codegen::Body + Send + 'static,
    B::Data: Into<Bytes> + Send,
    B::Error: Into<tonic::codegen::StdError> + Send + 'static,
{
    type Response = tonic::codegen::http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: tonic::codegen::http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();
        let path = req.uri().path().to_string();

        Box::pin(async move {
            // Read body frames; a unary call is complete once the framed
            // message length is satisfied or trailers arrive.
            let body = req.into_body();
            let mut data = BytesMut::new();
            let mut pinned_body = std::pin::pin!(body);

            loop {
                match pinned_body.as_mut().frame().await {
                    Some(Ok(frame)) => {
                        if frame.is_data() {
                            if let Ok(chunk) = frame.into_data() {
                                let chunk_bytes: Bytes = chunk.into();
                                data.extend_from_slice(&chunk_bytes);
                                if data.len() >= 5 {
                                    let msg_len =
                                        u32::from_be_bytes([data[1], data[2], data[3], data[4]])
                                            as usize;
                                    if data.len() >= 5 + msg_len {
                                        break;
                                    }
                                }
                            }
                        } else if frame.is_trailers() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("error reading body frame: {}", e.into());
                        return Ok(grpc_error_response(Status::internal(
                            "failed to read request body",
                        )));
                    }
                    None => break,
                }
            }

            let collected = data.freeze();
            tracing::debug!(path = %path, body_len = collected.len(), "handling lease request");

            let response = match path.as_str() {
                "/tessera.Lease/Rent" => {
                    match decode_grpc_message::<proto::RentRequest>(&collected) {
                        Ok(req) => match inner.rent(req).await {
                            Ok(resp) => grpc_response(encode_grpc_message(&resp)),
                            Err(e) => grpc_error_response(to_status(&e)),
                        },
                        Err(status) => grpc_error_response(status),
                    }
                }
                "/tessera.Lease/Relet" => {
                    match decode_grpc_message::<proto::ReletRequest>(&collected) {
                        Ok(req) => {
                            tracing::debug!(ticket = req.ticket, "Relet request");
                            match inner.relet(req).await {
                                Ok(resp) => grpc_response(encode_grpc_message(&resp)),
                                Err(e) => grpc_error_response(to_status(&e)),
                            }
                        }
                        Err(status) => grpc_error_response(status),
                    }
                }
                "/tessera.Lease/Return" => {
                    match decode_grpc_message::<proto::ReturnRequest>(&collected) {
                        Ok(req) => {
                            tracing::debug!(ticket = req.ticket, "Return request");
                            match inner.return_ticket(req).await {
                                Ok(resp) => grpc_response(encode_grpc_message(&resp)),
                                Err(e) => grpc_error_response(to_status(&e)),
                            }
                        }
                        Err(status) => grpc_error_response(status),
                    }
                }
                _ => {
                    tracing::warn!(path = %path, "unknown Lease method");
                    grpc_error_response(Status::unimplemented(format!("Unknown method: {}", path)))
                }
            };

            Ok(response)
        })
    }
}
