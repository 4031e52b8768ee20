//! HTTP status codes and class predicates.

/// Canonical status codes by name.
#[derive(Debug, Clone, Copy)]
pub struct HttpStatus;

impl HttpStatus {
    pub const CONTINUE: u16 = 100;
    pub const SWITCHING_PROTOCOLS: u16 = 101;
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const ACCEPTED: u16 = 202;
    pub const NO_CONTENT: u16 = 204;
    pub const PARTIAL_CONTENT: u16 = 206;
    pub const MOVED_PERMANENTLY: u16 = 301;
    pub const FOUND: u16 = 302;
    pub const SEE_OTHER: u16 = 303;
    pub const NOT_MODIFIED: u16 = 304;
    pub const TEMPORARY_REDIRECT: u16 = 307;
    pub const PERMANENT_REDIRECT: u16 = 308;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const REQUEST_TIMEOUT: u16 = 408;
    pub const CONFLICT: u16 = 409;
    pub const GONE: u16 = 410;
    pub const PAYLOAD_TOO_LARGE: u16 = 413;
    pub const UNSUPPORTED_MEDIA_TYPE: u16 = 415;
    pub const UNPROCESSABLE_ENTITY: u16 = 422;
    pub const TOO_MANY_REQUESTS: u16 = 429;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const NOT_IMPLEMENTED: u16 = 501;
    pub const BAD_GATEWAY: u16 = 502;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
    pub const GATEWAY_TIMEOUT: u16 = 504;
}

/// Name → code table of every [`HttpStatus`] constant.
pub const HTTP_STATUS: &[(&str, u16)] = &[
    ("CONTINUE", HttpStatus::CONTINUE),
    ("SWITCHING_PROTOCOLS", HttpStatus::SWITCHING_PROTOCOLS),
    ("OK", HttpStatus::OK),
    ("CREATED", HttpStatus::CREATED),
    ("ACCEPTED", HttpStatus::ACCEPTED),
    ("NO_CONTENT", HttpStatus::NO_CONTENT),
    ("PARTIAL_CONTENT", HttpStatus::PARTIAL_CONTENT),
    ("MOVED_PERMANENTLY", HttpStatus::MOVED_PERMANENTLY),
    ("FOUND", HttpStatus::FOUND),
    ("SEE_OTHER", HttpStatus::SEE_OTHER),
    ("NOT_MODIFIED", HttpStatus::NOT_MODIFIED),
    ("TEMPORARY_REDIRECT", HttpStatus::TEMPORARY_REDIRECT),
    ("PERMANENT_REDIRECT", HttpStatus::PERMANENT_REDIRECT),
    ("BAD_REQUEST", HttpStatus::BAD_REQUEST),
    ("UNAUTHORIZED", HttpStatus::UNAUTHORIZED),
    ("FORBIDDEN", HttpStatus::FORBIDDEN),
    ("NOT_FOUND", HttpStatus::NOT_FOUND),
    ("METHOD_NOT_ALLOWED", HttpStatus::METHOD_NOT_ALLOWED),
    ("REQUEST_TIMEOUT", HttpStatus::REQUEST_TIMEOUT),
    ("CONFLICT", HttpStatus::CONFLICT),
    ("GONE", HttpStatus::GONE),
    ("PAYLOAD_TOO_LARGE", HttpStatus::PAYLOAD_TOO_LARGE),
    ("UNSUPPORTED_MEDIA_TYPE", HttpStatus::UNSUPPORTED_MEDIA_TYPE),
    ("UNPROCESSABLE_ENTITY", HttpStatus::UNPROCESSABLE_ENTITY),
    ("TOO_MANY_REQUESTS", HttpStatus::TOO_MANY_REQUESTS),
    ("INTERNAL_SERVER_ERROR", HttpStatus::INTERNAL_SERVER_ERROR),
    ("NOT_IMPLEMENTED", HttpStatus::NOT_IMPLEMENTED),
    ("BAD_GATEWAY", HttpStatus::BAD_GATEWAY),
    ("SERVICE_UNAVAILABLE", HttpStatus::SERVICE_UNAVAILABLE),
    ("GATEWAY_TIMEOUT", HttpStatus::GATEWAY_TIMEOUT),
];

/// Look up a code by its canonical name (`"NOT_FOUND"` → `404`).
pub fn status_code(name: &str) -> Option<u16> {
    HTTP_STATUS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, code)| *code)
}

/// 2xx
pub const fn is_success_status(code: u16) -> bool {
    code >= 200 && code < 300
}

/// 3xx
pub const fn is_redirect_status(code: u16) -> bool {
    code >= 300 && code < 400
}

/// 4xx
pub const fn is_client_error_status(code: u16) -> bool {
    code >= 400 && code < 500
}

/// 5xx
pub const fn is_server_error_status(code: u16) -> bool {
    code >= 500 && code < 600
}
