//! Header and trailer maps.

use http::HeaderMap;

/// Trailer fields which accompany a message.
///
/// Stored in the message [extensions](http::Extensions). A message without
/// a `Trailers` extension has no trailer at all, which is distinct from a
/// message which declares an empty trailer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trailers(HeaderMap);

impl Trailers {
    /// Wrap a header map as a message trailer.
    pub fn new(headers: HeaderMap) -> Self {
        Self(headers)
    }

    /// The trailer fields.
    pub fn headers(&self) -> &HeaderMap {
        &self.0
    }

    /// Mutable access to the trailer fields.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.0
    }

    /// Unwrap the trailer fields.
    pub fn into_inner(self) -> HeaderMap {
        self.0
    }
}

impl From<HeaderMap> for Trailers {
    fn from(headers: HeaderMap) -> Self {
        Self(headers)
    }
}

/// Copy a header map into new storage.
///
/// Every field keeps all of its values, in their original order. A missing
/// map stays missing rather than becoming an empty one.
pub fn copy_headers(headers: Option<&HeaderMap>) -> Option<HeaderMap> {
    let headers = headers?;

    let mut copy = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        copy.append(name.clone(), value.clone());
    }
    Some(copy)
}

/// Copy the [`Trailers`] out of one set of extensions and into another,
/// removing any trailers from `dst` if `src` has none.
pub(crate) fn copy_trailers(src: &http::Extensions, dst: &mut http::Extensions) {
    match copy_headers(src.get::<Trailers>().map(Trailers::headers)) {
        Some(trailers) => {
            dst.insert(Trailers::new(trailers));
        }
        None => {
            dst.remove::<Trailers>();
        }
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ACCEPT, SET_COOKIE};
    use http::HeaderValue;

    use super::*;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        headers
    }

    #[test]
    fn missing_stays_missing() {
        assert_eq!(copy_headers(None), None);
    }

    #[test]
    fn empty_stays_empty() {
        let copy = copy_headers(Some(&HeaderMap::new())).unwrap();
        assert!(copy.is_empty());
    }

    #[test]
    fn copy_keeps_values_in_order() {
        let original = headers();
        let copy = copy_headers(Some(&original)).unwrap();

        assert_eq!(copy, original);
        let cookies: Vec<_> = copy.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
    }

    #[test]
    fn copy_is_independent() {
        let mut original = headers();
        let mut copy = copy_headers(Some(&original)).unwrap();

        copy.append(SET_COOKIE, HeaderValue::from_static("c=3"));
        copy.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert_eq!(original, headers());

        original.remove(SET_COOKIE);
        assert_eq!(copy.get_all(SET_COOKIE).iter().count(), 3);
    }

    #[test]
    fn trailers_follow_presence() {
        let mut src = http::Extensions::new();
        let mut dst = http::Extensions::new();
        dst.insert(Trailers::new(headers()));

        copy_trailers(&src, &mut dst);
        assert!(dst.get::<Trailers>().is_none());

        src.insert(Trailers::default());
        copy_trailers(&src, &mut dst);
        assert_eq!(dst.get::<Trailers>(), Some(&Trailers::default()));
    }
}
