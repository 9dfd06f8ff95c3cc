//! HTTP caching support
//!
//! ETag generation, precondition evaluation and the conditional response
//! builder used by the presentation routes.

mod conditional;
mod etag;
mod response;

pub use conditional::{evaluate, Disposition};
pub use etag::generate_etag;
pub use response::{conditional_response, http_date, Representation};
