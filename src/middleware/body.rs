//! Body buffering shared by the body parser and the stream-based bridge.
use axum::body::{Body, Bytes};
use http_body_util::BodyExt;

use crate::error::AppError;

/// Drain `body` frame by frame, failing once more than `limit` bytes arrive.
///
/// Trailers are ignored. A client that stops sending simply keeps this future
/// pending; timeouts belong to the outer `TimeoutLayer`.
pub async fn read_capped(mut body: Body, limit: usize) -> Result<Bytes, AppError> {
    let mut buf: Vec<u8> = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|err| {
            tracing::warn!(error = %err, "failed to read request body");
            AppError::bad_request("INVALID_BODY", "failed to read request body")
        })?;

        if let Ok(data) = frame.into_data() {
            if buf.len() + data.len() > limit {
                tracing::warn!(limit, "request body too large");
                return Err(AppError::PayloadTooLarge { limit });
            }
            buf.extend_from_slice(&data);
        }
    }

    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_whole_body_within_limit() {
        let bytes = read_capped(Body::from("hello"), 5).await.unwrap();
        assert_eq!(&bytes[..], b"hello");

        let bytes = read_capped(Body::empty(), 0).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn rejects_body_over_limit() {
        let err = read_capped(Body::from("hello!"), 5).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { limit: 5 }));
    }

    #[tokio::test]
    async fn collects_multiple_chunks() {
        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![Ok("ab"), Ok("cd"), Ok("e")];
        let body = Body::from_stream(futures::stream::iter(chunks));
        let bytes = read_capped(body, 16).await.unwrap();
        assert_eq!(&bytes[..], b"abcde");

        let chunks: Vec<Result<&'static str, std::io::Error>> = vec![Ok("abc"), Ok("def")];
        let body = Body::from_stream(futures::stream::iter(chunks));
        assert!(read_capped(body, 4).await.is_err());
    }
}
