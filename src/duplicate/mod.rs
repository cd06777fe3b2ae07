//! Duplicating requests and responses.
//!
//! A message body is a one-shot stream. Duplicating a message reads that
//! stream into memory once, then installs fresh streams over the same
//! bytes on both the original message and its copy, so that each can be
//! read independently afterwards.
//!
//! [`Duplicator`] carries the settings used while duplicating. The free
//! functions [`duplicate_request`] and [`duplicate_response`] use the
//! default settings.

use bytes::Bytes;

use crate::body::{read_to_limit, Body, Request, Response};
use crate::BoxError;

pub use self::response::OriginRequest;
use crate::error::{Error, PartialRequest};

mod request;
mod response;

/// A copy of a message, along with the body bytes it was given.
#[derive(Debug)]
pub struct Duplicate<T> {
    /// The independent copy of the original message.
    pub copy: T,

    /// The bytes installed as the body of the copy, or `None` if the
    /// original had no body.
    pub body: Option<Bytes>,
}

impl<T> Duplicate<T> {
    /// Split into the copy and its body bytes.
    pub fn into_parts(self) -> (T, Option<Bytes>) {
        (self.copy, self.body)
    }
}

/// Duplicates requests and responses.
///
/// ```
/// # use mimeo::{Body, Duplicator};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let duplicator = Duplicator::new().with_body_limit(64 * 1024);
///
/// let mut req = http::Request::post("http://example.com/").body(Body::full("hello"))?;
/// let dup = duplicator.request(&mut req, None).await?;
/// assert_eq!(dup.body.as_deref(), Some(&b"hello"[..]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Duplicator {
    body_limit: Option<usize>,
}

impl Duplicator {
    /// Create a duplicator with no limit on body size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail to read any body larger than `limit` bytes.
    ///
    /// Bodies are held in memory while duplicating, so this bounds the
    /// memory used by each duplication.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// The maximum body size, if any.
    pub fn body_limit(&self) -> Option<usize> {
        self.body_limit
    }

    /// Fail early when a body is already known to be over the limit.
    fn check_limit(&self, body: &Body) -> Result<(), Error> {
        use http_body::Body as _;

        if let Some(limit) = self.body_limit {
            let size = body.size_hint().lower();
            if size > limit as u64 {
                tracing::debug!(size, limit, "body is over the size limit, not reading it");
                return Err(Error::TooLarge { size, limit });
            }
        }
        Ok(())
    }

    async fn materialize(&self, body: Body) -> Result<Bytes, BoxError> {
        read_to_limit(Some(body), self.body_limit).await
    }
}

/// Duplicate a request with the default [`Duplicator`].
///
/// A missing request produces no copy. See [`Duplicator::request`].
pub async fn duplicate_request(
    original: Option<&mut Request>,
    body: Option<Bytes>,
) -> Result<Option<Duplicate<Request>>, PartialRequest> {
    match original {
        Some(original) => Duplicator::default()
            .request(original, body)
            .await
            .map(Some),
        None => Ok(None),
    }
}

/// Duplicate a response with the default [`Duplicator`].
///
/// A missing response produces no copy. See [`Duplicator::response`].
pub async fn duplicate_response(
    original: Option<&mut Response>,
    body: Option<Bytes>,
) -> Result<Option<Duplicate<Response>>, Error> {
    match original {
        Some(original) => Duplicator::default()
            .response(original, body)
            .await
            .map(Some),
        None => Ok(None),
    }
}
