//! Materializing a body stream into memory.

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};

use crate::BoxError;

/// Read an entire body into memory.
///
/// A missing body reads as no bytes. The body is consumed and dropped
/// before this returns, whether or not the read succeeded, so any
/// underlying connection resources are released. Nothing is returned
/// from a failed read: partial data is discarded.
///
/// Only data frames are collected. Trailer frames on the stream are
/// not part of the returned bytes.
pub async fn read_all<B>(body: Option<B>) -> Result<Bytes, BoxError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    read_to_limit(body, None).await
}

/// Read an entire body into memory, failing once more than `limit`
/// bytes have been read.
///
/// See [`read_all`] for how the body is consumed.
pub async fn read_to_limit<B>(body: Option<B>, limit: Option<usize>) -> Result<Bytes, BoxError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let Some(body) = body else {
        return Ok(Bytes::new());
    };

    let collected = match limit {
        Some(limit) => Limited::new(body, limit).collect().await,
        None => body.collect().await.map_err(Into::into),
    }?;

    let data = collected.to_bytes();
    tracing::trace!(len = data.len(), "read body into memory");
    Ok(data)
}
