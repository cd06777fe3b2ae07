//! Errors from duplicating messages.

use crate::body::Request;
use crate::BoxError;

/// A body could not be read while duplicating a message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Reading a body produced by a [`Regenerator`](crate::Regenerator) failed.
    ///
    /// The original message was not touched.
    #[error("reading regenerated body: {0}")]
    Read(#[source] BoxError),

    /// Reading the original message's own body failed.
    ///
    /// The body stream of the original message has been consumed and
    /// cannot be restored. The original message is left with an
    /// [empty](crate::Body::empty) body.
    #[error("reading body, original body consumed: {0}")]
    Consumed(#[source] BoxError),

    /// The original message's body is known to be larger than the
    /// [limit](crate::Duplicator::with_body_limit), so it was not read.
    ///
    /// The original message was not touched.
    #[error("body of at least {size} bytes is over the limit of {limit} bytes")]
    TooLarge {
        /// The smallest size the body can have.
        size: u64,
        /// The configured limit.
        limit: usize,
    },
}

impl Error {
    /// Was the original message's body lost to this error?
    pub fn is_consumed(&self) -> bool {
        matches!(self, Error::Consumed(_))
    }
}

/// A request was copied, but its body could not be.
///
/// The copy is still usable: it has the method, URI, headers, trailers
/// and extensions of the original request and an empty body.
#[derive(Debug, thiserror::Error)]
#[error("request copied without body: {error}")]
pub struct PartialRequest {
    copy: Box<Request>,
    #[source]
    error: Error,
}

impl PartialRequest {
    pub(crate) fn new(copy: Request, error: Error) -> Self {
        Self {
            copy: Box::new(copy),
            error,
        }
    }

    /// The request copy, without a body.
    pub fn copy(&self) -> &Request {
        &self.copy
    }

    /// The reason the body could not be copied.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Take the request copy, discarding the error.
    pub fn into_copy(self) -> Request {
        *self.copy
    }

    /// Split into the request copy and the error.
    pub fn into_parts(self) -> (Request, Error) {
        (*self.copy, self.error)
    }
}
