use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::Body;

/// A factory for fresh copies of a message body.
///
/// Retry logic uses a regenerator to resend a request after the original
/// body has been sent. Each call to [`Regenerator::body`] produces a new,
/// independently readable [`Body`]. Regenerators live in the message
/// [extensions](http::Extensions), so they travel with the request:
///
/// ```
/// # use mimeo::{Body, Regenerator};
/// let mut req = http::Request::new(Body::full("hello"));
/// req.extensions_mut().insert(Regenerator::from_bytes("hello".into()));
///
/// let body = req.extensions().get::<Regenerator>().map(Regenerator::body);
/// assert!(body.is_some());
/// ```
#[derive(Clone)]
pub struct Regenerator {
    factory: Arc<dyn Fn() -> Body + Send + Sync>,
}

impl Regenerator {
    /// Create a regenerator from a function which builds a new body each time it is called.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Body + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Create a regenerator which replays the given bytes.
    pub fn from_bytes(data: Bytes) -> Self {
        Self::new(move || Body::full(data.clone()))
    }

    /// Produce a fresh body.
    pub fn body(&self) -> Body {
        (self.factory)()
    }
}

impl fmt::Debug for Regenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Regenerator").finish()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Regenerator: Clone, Send, Sync);

    #[tokio::test]
    async fn each_body_is_independent() {
        let regenerator = Regenerator::from_bytes(Bytes::from_static(b"hello"));

        let first = regenerator.body();
        let second = regenerator.clone().body();

        let first = first.collect().await.unwrap().to_bytes();
        let second = second.collect().await.unwrap().to_bytes();
        let third = regenerator.body().collect().await.unwrap().to_bytes();

        assert_eq!(first, Bytes::from_static(b"hello"));
        assert_eq!(second, first);
        assert_eq!(third, first);
    }
}
