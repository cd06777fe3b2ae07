use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use super::request::{clone_request_head, install};
use super::{Duplicate, Duplicator};
use crate::body::{Body, Request, Response};
use crate::error::{Error, PartialRequest};
use crate::headers::{copy_headers, copy_trailers};

/// The request which produced a response.
///
/// Store this in the response [extensions](http::Extensions) to keep the
/// request around for logging or diagnostics. Clones of an `OriginRequest`
/// refer to the same request. [`Duplicator::response`] gives the response
/// copy its own `OriginRequest`, holding a copy of the request.
#[derive(Debug, Clone)]
pub struct OriginRequest {
    inner: Arc<Mutex<Option<Request>>>,
}

impl OriginRequest {
    /// Wrap a request.
    pub fn new(request: Request) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(request))),
        }
    }

    /// Take the request out, leaving nothing in its place.
    pub fn take(&self) -> Option<Request> {
        self.inner.lock().take()
    }

    /// Put a request in, returning the previous one if present.
    pub fn replace(&self, request: Request) -> Option<Request> {
        self.inner.lock().replace(request)
    }

    /// Is a request currently held?
    pub fn is_present(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Run a function with access to the request.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&mut Request>) -> R,
    {
        f(self.inner.lock().as_mut())
    }
}

impl Duplicator {
    /// Duplicate a response.
    ///
    /// The copy gets its own header and trailer maps, a clone of the
    /// original's extensions, and a body over the same bytes as the
    /// original.
    ///
    /// The [`OriginRequest`] of the original, if any, is duplicated with
    /// [`Duplicator::request`]. That is best-effort: the request body may
    /// already have been sent, so a failure there is logged and the copy
    /// holds whatever part of the request could be copied. The original
    /// request stays in its [`OriginRequest`] throughout; if this future is
    /// dropped while the request body is being read, the request keeps its
    /// head and is left with an empty body.
    ///
    /// When `body` is provided (even if empty) it becomes the body of the
    /// copy and the original body is not read. Otherwise the original body
    /// is read into memory and replaced with a fresh body over the same
    /// bytes. A failure to read the original body fails the whole
    /// duplication, and leaves the original with an empty body. A body
    /// already known to be over the [limit](Duplicator::with_body_limit)
    /// fails the duplication without being read.
    pub async fn response(
        &self,
        original: &mut Response,
        body: Option<Bytes>,
    ) -> Result<Duplicate<Response>, Error> {
        let mut copy = clone_response_head(original);

        if let Some(origin) = original.extensions().get::<OriginRequest>().cloned() {
            if let Some(origin) = self.origin_request(&origin).await {
                copy.extensions_mut().insert(origin);
            }
        }

        let data = if let Some(data) = body {
            tracing::trace!(len = data.len(), "copying response with provided body");
            data
        } else if !original.body().is_empty() {
            self.check_limit(original.body())?;
            tracing::trace!("copying response body from original stream");
            let stream = std::mem::take(original.body_mut());
            let data = self.materialize(stream).await.map_err(|error| {
                tracing::debug!(%error, "failed to read response body, original is consumed");
                Error::Consumed(error)
            })?;
            *original.body_mut() = Body::full(data.clone());
            data
        } else {
            tracing::trace!("copying response without body");
            return Ok(Duplicate { copy, body: None });
        };

        *copy.body_mut() = Body::full(data.clone());
        Ok(Duplicate {
            copy,
            body: Some(data),
        })
    }

    /// Copy the request held by `origin`.
    ///
    /// The request stays in `origin` throughout. Only its body stream is
    /// moved out while it is read, and the lock is not held while reading.
    async fn origin_request(&self, origin: &OriginRequest) -> Option<OriginRequest> {
        let (copy, source) = origin.with(|request| {
            let request = request?;
            let copy = clone_request_head(request);
            Some((copy, self.request_source(request, None)))
        })?;

        let result = match source {
            Ok(source) => {
                let restore = source.is_original();
                let result = self.read_request_body(copy, source).await;
                if let (true, Ok(Duplicate { body: Some(data), .. })) = (restore, &result) {
                    origin.with(|request| {
                        if let Some(request) = request {
                            install(request, data.clone());
                        }
                    });
                }
                result
            }
            Err(error) => Err(PartialRequest::new(copy, error)),
        };

        let copy = match result {
            Ok(duplicate) => duplicate.copy,
            Err(partial) => {
                tracing::debug!(error = %partial.error(), "ignoring failure to copy origin request body");
                partial.into_copy()
            }
        };

        Some(OriginRequest::new(copy))
    }
}

/// Everything but the body: status, version, headers, trailers and extensions.
///
/// The original's [`OriginRequest`] is not carried over; it is shared and
/// must be duplicated separately.
fn clone_response_head(original: &Response) -> Response {
    let mut copy = Response::new(Body::empty());
    *copy.status_mut() = original.status();
    *copy.version_mut() = original.version();
    *copy.headers_mut() = copy_headers(Some(original.headers())).unwrap_or_default();
    *copy.extensions_mut() = original.extensions().clone();

    copy.extensions_mut().remove::<OriginRequest>();
    copy_trailers(original.extensions(), copy.extensions_mut());
    copy
}

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;
    use http::{HeaderValue, StatusCode};
    use http_body_util::BodyExt;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{Regenerator, Trailers};

    assert_impl_all!(OriginRequest: Clone, Send, Sync);

    async fn read(body: Body) -> Bytes {
        body.collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn copies_response_head() {
        let mut original = http::Response::builder()
            .status(StatusCode::CREATED)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::full("created"))
            .unwrap();
        original
            .extensions_mut()
            .insert(Trailers::new(http::HeaderMap::new()));

        let dup = Duplicator::new()
            .response(&mut original, None)
            .await
            .unwrap();
        let mut copy = dup.copy;

        assert_eq!(copy.status(), StatusCode::CREATED);
        assert_eq!(copy.headers(), original.headers());
        assert_eq!(
            copy.extensions().get::<Trailers>(),
            Some(&Trailers::default())
        );

        copy.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(original.headers()[CONTENT_TYPE], "text/plain");

        assert_eq!(dup.body, Some(Bytes::from_static(b"created")));
        assert_eq!(read(copy.into_body()).await, Bytes::from_static(b"created"));
        assert_eq!(
            read(original.into_body()).await,
            Bytes::from_static(b"created")
        );
    }

    #[tokio::test]
    async fn provided_empty_body_is_used() {
        let mut original = Response::new(Body::full("ignored"));

        let dup = Duplicator::new()
            .response(&mut original, Some(Bytes::new()))
            .await
            .unwrap();

        assert_eq!(dup.body, Some(Bytes::new()));
        assert_eq!(read(dup.copy.into_body()).await, Bytes::new());
        assert_eq!(
            read(original.into_body()).await,
            Bytes::from_static(b"ignored")
        );
    }

    #[tokio::test]
    async fn no_body_on_either_side() {
        let mut original = Response::new(Body::empty());

        let dup = Duplicator::new()
            .response(&mut original, None)
            .await
            .unwrap();

        assert!(dup.body.is_none());
        assert!(dup.copy.body().is_empty());
        assert!(original.body().is_empty());
    }

    #[tokio::test]
    async fn origin_request_is_duplicated() {
        let request = http::Request::post("http://example.com/")
            .body(Body::full("ping"))
            .unwrap();
        let origin = OriginRequest::new(request);

        let mut original = Response::new(Body::full("pong"));
        original.extensions_mut().insert(origin.clone());

        let dup = Duplicator::new()
            .response(&mut original, None)
            .await
            .unwrap();

        let copied = dup.copy.extensions().get::<OriginRequest>().unwrap();
        let copied = copied.take().unwrap();
        assert_eq!(copied.uri(), "http://example.com/");
        assert!(copied.extensions().get::<Regenerator>().is_some());
        assert_eq!(read(copied.into_body()).await, Bytes::from_static(b"ping"));

        // The original request was put back, with a readable body.
        let restored = origin.take().unwrap();
        assert_eq!(read(restored.into_body()).await, Bytes::from_static(b"ping"));
    }

    #[tokio::test]
    async fn taken_origin_request_is_skipped() {
        let origin = OriginRequest::new(Request::new(Body::empty()));
        origin.take();

        let mut original = Response::new(Body::empty());
        original.extensions_mut().insert(origin);

        let dup = Duplicator::new()
            .response(&mut original, None)
            .await
            .unwrap();
        assert!(dup.copy.extensions().get::<OriginRequest>().is_none());
    }

    #[tokio::test]
    async fn oversized_response_is_left_in_place() {
        let mut original = Response::new(Body::full("0123456789"));

        let err = Duplicator::new()
            .with_body_limit(4)
            .response(&mut original, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TooLarge { size: 10, limit: 4 }));
        assert_eq!(
            read(original.into_body()).await,
            Bytes::from_static(b"0123456789")
        );
    }

    #[tokio::test]
    async fn oversized_origin_request_keeps_its_body() {
        let request = http::Request::post("http://example.com/")
            .body(Body::full("0123456789"))
            .unwrap();
        let origin = OriginRequest::new(request);

        let mut original = Response::new(Body::full("ok"));
        original.extensions_mut().insert(origin.clone());

        let dup = Duplicator::new()
            .with_body_limit(4)
            .response(&mut original, None)
            .await
            .unwrap();

        let copied = dup.copy.extensions().get::<OriginRequest>().unwrap();
        assert!(copied.with(|req| req.unwrap().body().is_empty()));

        let restored = origin.take().unwrap();
        assert_eq!(
            read(restored.into_body()).await,
            Bytes::from_static(b"0123456789")
        );
    }

    #[test]
    fn origin_request_with() {
        let origin = OriginRequest::new(Request::new(Body::empty()));
        let method = origin.with(|req| req.map(|req| req.method().clone()));
        assert_eq!(method, Some(http::Method::GET));

        origin.take();
        assert!(!origin.is_present());
        assert!(origin.with(|req| req.is_none()));
    }
}
