//! uni-request-spec
//!
//! Plain request/response data, the error type, HTTP status helpers and the
//! body transforms shared by every uni-request crate. Nothing in here performs
//! I/O; the runtime crate drives these types through a transport.
#![deny(unsafe_code)]

pub mod error;
pub mod status;
pub mod transform;
pub mod types;
pub mod url;

pub use error::{ErrorKind, RequestError};
pub use status::{
    HTTP_STATUS, HttpStatus, is_client_error_status, is_redirect_status, is_server_error_status,
    is_success_status, status_code,
};
pub use transform::{coerce_to_string, transform_request, transform_response};
pub use types::*;
pub use url::{is_absolute_url, resolve_url};
