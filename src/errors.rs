use crate::{
    http::{
        response::{Handled, Response},
        types::{ContentType, StatusCode},
    },
    limits::ReqLimits,
};
use std::{fmt, io};
use thiserror::Error;

/// Everything that can go wrong while serving one connection.
///
/// Only some kinds ever reach the client. [`MalformedQuery`] and
/// [`InvalidNumericParameter`] are recovered where they occur by falling back
/// to parameter defaults, and [`UpstreamFetchFailure`] degrades to an empty
/// payload. See [`ErrorKind::respond`] for the kinds that are rendered.
///
/// [`MalformedQuery`]: ErrorKind::MalformedQuery
/// [`InvalidNumericParameter`]: ErrorKind::InvalidNumericParameter
/// [`UpstreamFetchFailure`]: ErrorKind::UpstreamFetchFailure
#[derive(Debug, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Illegal request: no GET")]
    NoRequestLine,
    #[error("Request headers exceed {0} bytes")]
    HeadersTooLarge(usize),

    #[error("Malformed query string")]
    MalformedQuery,
    #[error("Parameter `{name}` is not an integer: {value:?}")]
    InvalidNumericParameter { name: String, value: String },
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Upstream request failed: {0}")]
    UpstreamFetchFailure(String),
    #[error("{0}")]
    FieldExtractionFailure(String),

    #[error("{0}")]
    Io(IoError),
}

impl ErrorKind {
    /// Status code used when the error is rendered for the client.
    pub(crate) const fn status(&self) -> StatusCode {
        match self {
            Self::NoRequestLine
            | Self::MalformedQuery
            | Self::InvalidNumericParameter { .. }
            | Self::MissingParameter(_)
            | Self::FieldExtractionFailure(_) => StatusCode::BadRequest,
            Self::HeadersTooLarge(_) => StatusCode::RequestHeaderFieldsTooLarge,
            Self::FileNotFound(_) => StatusCode::NotFound,
            Self::UpstreamFetchFailure(_) | Self::Io(_) => StatusCode::InternalServerError,
        }
    }

    /// Writes the client-facing response for this error.
    pub(crate) fn respond(&self, response: &mut Response) -> Handled {
        let response = response.status(self.status()).content_type(ContentType::Html);

        match self {
            Self::NoRequestLine | Self::HeadersTooLarge(_) => {
                response.body(format!("<html>{self}</html>"))
            }
            Self::FieldExtractionFailure(message) => response.body(format!(
                "Error parsing the JSON response from GitHub API: {message}"
            )),
            Self::FileNotFound(_) | Self::MissingParameter(_) => response.body(self.to_string()),
            _ => response.body(format!("<html>ERROR: {self}</html>")),
        }
    }

    pub(crate) fn headers_too_large(limits: &ReqLimits) -> Self {
        Self::HeadersTooLarge(limits.header_bytes)
    }
}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoError(err))
    }
}

#[derive(Debug)]
pub struct IoError(pub(crate) io::Error);

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{limits::RespLimits, tools::*};

    fn render(err: ErrorKind) -> String {
        let mut resp = Response::new(&RespLimits::default());
        err.respond(&mut resp);
        str_op(resp.buffer()).to_owned()
    }

    #[test]
    fn illegal_request() {
        assert_eq!(
            render(ErrorKind::NoRequestLine),
            "HTTP/1.1 400 Bad Request\n\
             Content-Type: text/html; charset=utf-8\n\
             \n\
             <html>Illegal request: no GET</html>"
        );
    }

    #[test]
    fn file_not_found_echoes_path() {
        let body = render(ErrorKind::FileNotFound("docs/missing.txt".into()));

        assert!(body.starts_with("HTTP/1.1 404 Not Found\n"));
        assert!(body.ends_with("\n\nFile not found: docs/missing.txt"));
    }

    #[test]
    fn extraction_failure() {
        let body = render(ErrorKind::FieldExtractionFailure("field `id` is missing".into()));

        assert!(body.starts_with("HTTP/1.1 400 Bad Request\n"));
        assert!(body.ends_with(
            "Error parsing the JSON response from GitHub API: field `id` is missing"
        ));
    }

    #[test]
    fn io_fault_wraps_message() {
        let err = ErrorKind::from(io::Error::new(io::ErrorKind::NotFound, "root.html is gone"));
        let body = render(err);

        assert!(body.starts_with("HTTP/1.1 500 Internal Server Error\n"));
        assert!(body.ends_with("<html>ERROR: root.html is gone</html>"));
    }

    #[test]
    fn io_errors_compare_by_kind() {
        assert_eq!(
            ErrorKind::from(io::Error::new(io::ErrorKind::TimedOut, "a")),
            ErrorKind::from(io::Error::new(io::ErrorKind::TimedOut, "b")),
        );
        assert_ne!(
            ErrorKind::from(io::Error::new(io::ErrorKind::TimedOut, "a")),
            ErrorKind::NoRequestLine,
        );
    }
}
