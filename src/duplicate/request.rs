use bytes::Bytes;

use super::{Duplicate, Duplicator};
use crate::body::{Body, Regenerator, Request};
use crate::error::{Error, PartialRequest};
use crate::headers::{copy_headers, copy_trailers};

/// Where the body of a request copy comes from.
#[derive(Debug)]
pub(super) enum Source {
    /// Bytes provided by the caller.
    Provided(Bytes),
    /// A regenerator of the original request.
    Regenerated(Regenerator),
    /// The body stream of the original request, which must be restored once read.
    Original(Body),
    /// No body at all.
    Absent,
}

impl Source {
    pub(super) fn is_original(&self) -> bool {
        matches!(self, Source::Original(_))
    }
}

impl Duplicator {
    /// Duplicate a request.
    ///
    /// The copy gets its own header and trailer maps, a clone of the
    /// original's extensions, and a body over the same bytes as the
    /// original. The copy also gets a [`Regenerator`] for those bytes.
    ///
    /// The body bytes are found from, in order of preference:
    ///
    /// 1. `body`, if it is non-empty. The original body is not read.
    /// 2. The [`Regenerator`] of the original request. The original body is not read.
    /// 3. The original body. It is read into memory and replaced with a fresh
    ///    body over the same bytes, and the original gets a [`Regenerator`] too.
    ///
    /// If the original has an [empty](Body::empty) body and no regenerator,
    /// so does the copy.
    ///
    /// If reading a body fails, the error still carries a copy of the
    /// request, without a body. When the original body itself failed, the
    /// original is left with an empty body (see [`Error::Consumed`]). The
    /// same happens if this future is dropped while the original body is
    /// being read. A body already known to be over the
    /// [limit](Duplicator::with_body_limit) is not read at all
    /// (see [`Error::TooLarge`]).
    pub async fn request(
        &self,
        original: &mut Request,
        body: Option<Bytes>,
    ) -> Result<Duplicate<Request>, PartialRequest> {
        let copy = clone_request_head(original);
        let source = match self.request_source(original, body) {
            Ok(source) => source,
            Err(error) => return Err(PartialRequest::new(copy, error)),
        };

        let restore = source.is_original();
        let result = self.read_request_body(copy, source).await;
        if let (true, Ok(Duplicate { body: Some(data), .. })) = (restore, &result) {
            install(original, data.clone());
        }
        result
    }

    /// Pick the body source for a copy of `original`.
    ///
    /// Moves the original body stream out of the request when it is the
    /// source; nothing else about the request changes.
    pub(super) fn request_source(
        &self,
        original: &mut Request,
        body: Option<Bytes>,
    ) -> Result<Source, Error> {
        if let Some(data) = body.filter(|data| !data.is_empty()) {
            tracing::trace!(len = data.len(), "copying request with provided body");
            return Ok(Source::Provided(data));
        }

        if let Some(regenerator) = original.extensions().get::<Regenerator>().cloned() {
            tracing::trace!("copying request body from regenerator");
            return Ok(Source::Regenerated(regenerator));
        }

        if original.body().is_empty() {
            tracing::trace!("copying request without body");
            return Ok(Source::Absent);
        }

        self.check_limit(original.body())?;
        tracing::trace!("copying request body from original stream");
        Ok(Source::Original(std::mem::take(original.body_mut())))
    }

    /// Read the body from `source` and install it on `copy`.
    pub(super) async fn read_request_body(
        &self,
        mut copy: Request,
        source: Source,
    ) -> Result<Duplicate<Request>, PartialRequest> {
        let data = match source {
            Source::Provided(data) => data,
            Source::Regenerated(regenerator) => {
                match self.materialize(regenerator.body()).await {
                    Ok(data) => data,
                    Err(error) => {
                        tracing::debug!(%error, "failed to read regenerated request body");
                        return Err(PartialRequest::new(copy, Error::Read(error)));
                    }
                }
            }
            Source::Original(stream) => match self.materialize(stream).await {
                Ok(data) => data,
                Err(error) => {
                    tracing::debug!(%error, "failed to read request body, original is consumed");
                    return Err(PartialRequest::new(copy, Error::Consumed(error)));
                }
            },
            Source::Absent => return Ok(Duplicate { copy, body: None }),
        };

        install(&mut copy, data.clone());
        Ok(Duplicate {
            copy,
            body: Some(data),
        })
    }
}

/// Everything but the body: method, URI, version, headers, trailers and extensions.
///
/// Extensions are cloned, so handles stored there (cancellation, tracing
/// context) are shared with the original. The original's regenerator is
/// not carried over; the copy only gets one once it has a body.
pub(super) fn clone_request_head(original: &Request) -> Request {
    let mut copy = Request::new(Body::empty());
    *copy.method_mut() = original.method().clone();
    *copy.uri_mut() = original.uri().clone();
    *copy.version_mut() = original.version();
    *copy.headers_mut() = copy_headers(Some(original.headers())).unwrap_or_default();
    *copy.extensions_mut() = original.extensions().clone();

    copy.extensions_mut().remove::<Regenerator>();
    copy_trailers(original.extensions(), copy.extensions_mut());
    copy
}

/// Give a request a fresh body over `data`, and a regenerator for more.
pub(super) fn install(req: &mut Request, data: Bytes) {
    *req.body_mut() = Body::full(data.clone());
    req.extensions_mut().insert(Regenerator::from_bytes(data));
}
