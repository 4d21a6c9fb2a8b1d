//! Status codes and the error record handed to the error callback.

/// Response status codes the server knows how to phrase. The discriminant is
/// the position in the status table and is stable across releases; embedders
/// may persist it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HttpStatusCode {
    Ok,
    Continue,
    BadRequest,
    Forbidden,
    NotFound,
    LengthRequired,
    UriTooLong,
    HeaderFieldsTooLarge,
    ServerFault,
    NotImplemented,
    VersionNotSupported,
}

impl HttpStatusCode {
    /// The three ASCII digits sent on the status line.
    pub fn code(self) -> &'static str {
        match self {
            HttpStatusCode::Ok => "200",
            HttpStatusCode::Continue => "100",
            HttpStatusCode::BadRequest => "400",
            HttpStatusCode::Forbidden => "403",
            HttpStatusCode::NotFound => "404",
            HttpStatusCode::LengthRequired => "411",
            HttpStatusCode::UriTooLong => "414",
            HttpStatusCode::HeaderFieldsTooLarge => "431",
            HttpStatusCode::ServerFault => "500",
            HttpStatusCode::NotImplemented => "501",
            HttpStatusCode::VersionNotSupported => "505",
        }
    }

    /// The reason phrase sent after the digits.
    pub fn reason(self) -> &'static str {
        match self {
            HttpStatusCode::Ok => "OK",
            HttpStatusCode::Continue => "Continue",
            HttpStatusCode::BadRequest => "Bad Request",
            HttpStatusCode::Forbidden => "Forbidden",
            HttpStatusCode::NotFound => "Not Found",
            HttpStatusCode::LengthRequired => "Length Required",
            HttpStatusCode::UriTooLong => "Request-URI Too Long",
            HttpStatusCode::HeaderFieldsTooLarge => "Request Header Fields Too Large",
            HttpStatusCode::ServerFault => "Server fault",
            HttpStatusCode::NotImplemented => "Not Implemented",
            HttpStatusCode::VersionNotSupported => "Version not supported",
        }
    }
}

/// Why a request was rejected. Passed to the error callback; the embedder
/// typically phrases a response from `status` and closes the transport.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ErrorInfo {
    pub status: HttpStatusCode,
}

// Tests

#[test]
fn status_line_fragments() {
    assert_eq!("200", HttpStatusCode::Ok.code());
    assert_eq!("OK", HttpStatusCode::Ok.reason());
    assert_eq!("431", HttpStatusCode::HeaderFieldsTooLarge.code());
    assert_eq!(
        "Request Header Fields Too Large",
        HttpStatusCode::HeaderFieldsTooLarge.reason()
    );
    assert_eq!("505", HttpStatusCode::VersionNotSupported.code());
}
