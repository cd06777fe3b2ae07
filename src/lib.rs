//! Mimeo
//!
//! Duplicate in-flight HTTP requests and responses.
//!
//! A message body is a stream which can only be read once. Middleware
//! which wants to look at a body (to log it, send it to a second
//! destination, or retry a request) has to read it into memory and then
//! put a fresh stream back in its place. This crate does that for
//! [`http::Request`] and [`http::Response`] messages using [`Body`]:
//!
//! ```
//! # use http_body_util::BodyExt;
//! # use mimeo::{duplicate_request, Body, Regenerator};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut req = http::Request::post("http://example.com/")
//!     .body(Body::full("hello"))
//!     .unwrap();
//!
//! let dup = duplicate_request(Some(&mut req), None).await.unwrap().unwrap();
//!
//! // The copy can be resent as many times as needed.
//! let regenerator = dup.copy.extensions().get::<Regenerator>().unwrap();
//! let resent = regenerator.body().collect().await.unwrap().to_bytes();
//! assert_eq!(resent, "hello");
//!
//! // And the original is still readable.
//! let original = req.into_body().collect().await.unwrap().to_bytes();
//! assert_eq!(original, "hello");
//! # }
//! ```
//!
//! Header and trailer maps are copied into new storage, so the copy and
//! the original can be modified independently. Trailers live in the
//! message extensions as [`Trailers`], and a response may carry the
//! request that produced it as an [`OriginRequest`].
//!
//! Bodies are held entirely in memory while duplicating. Use
//! [`Duplicator::with_body_limit`] to bound that.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod body;
pub use body::{read_all, read_to_limit, Body, Regenerator};
pub mod duplicate;
pub use duplicate::{duplicate_request, duplicate_response, Duplicate, Duplicator, OriginRequest};
pub mod error;
pub use error::{Error, PartialRequest};
pub mod headers;
pub use headers::{copy_headers, Trailers};

/// A boxed error, as produced by reading a [`Body`].
pub type BoxError = Box<dyn std::error::Error + Sync + std::marker::Send + 'static>;
