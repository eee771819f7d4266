//! Request and response handles passed through plugin chains.
//!
//! These are deliberately thin: the router only needs the method, the path,
//! a place to put matched parameters, and a way to write status, headers and
//! a body. Body parsing, cookies and sessions belong to the layers built on
//! top of the router.

mod request;
mod response;

pub use request::{ParamVec, Request, MAX_INLINE_PARAMS};
pub use response::Response;
