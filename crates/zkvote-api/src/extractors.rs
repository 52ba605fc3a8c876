//! # Request Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and unwrap it with
//! [`extract_json`], so malformed bodies produce the same error shape as
//! every other failure.

use std::net::{IpAddr, SocketAddr};

use axum::extract::rejection::JsonRejection;
use axum::extract::ConnectInfo;
use axum::http::Extensions;
use axum::Json;

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Peer address, when the server was started with connect info.
pub fn client_ip(extensions: &Extensions) -> Option<IpAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_reads_connect_info() {
        let mut ext = Extensions::new();
        assert_eq!(client_ip(&ext), None);
        let addr: SocketAddr = "203.0.113.7:4000".parse().unwrap();
        ext.insert(ConnectInfo(addr));
        assert_eq!(client_ip(&ext), Some(addr.ip()));
    }
}
