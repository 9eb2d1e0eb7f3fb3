//! Core HTTP protocol types

// METHOD

/// HTTP request methods understood by the request parser
///
/// Only `GET` is served. Any other verb leaves the request line
/// unrecognized, which the connection answers as an illegal request.
///
/// # References
///
/// - [RFC 9110, Section 9.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-9.3.1)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// GET method - transfer a current representation of the target resource
    #[default]
    Get,
}

impl Method {
    /// Recognizes the method token at the start of a request line.
    ///
    /// Returns the method and the index of the space that follows it.
    #[inline(always)]
    pub(crate) fn from_line(src: &[u8]) -> Option<(Self, usize)> {
        match src {
            [b'G', b'E', b'T', b' ', ..] => Some((Method::Get, 3)),
            _ => None,
        }
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes produced by the server
        ///
        /// Represents the subset of
        /// [RFC 9110](https://datatracker.ietf.org/doc/html/rfc9110#section-15)
        /// status codes that the handlers and the connection driver emit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            // Returns the status line as bytes (e.g., `b"HTTP/1.1 200 OK\n"`).
            #[inline]
            pub(crate) const fn to_first_line(&self) -> &'static [u8] {
                match self { $(
                    StatusCode::$name => concat!("HTTP/1.1 ", $num, " ", $str, "\n").as_bytes(),
                )+ }
            }

            /// Returns the numeric code.
            #[inline]
            pub const fn as_u16(&self) -> u16 {
                *self as u16
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    Ok = (200, "OK");

    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BadRequest = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NotFound = (404, "Not Found");
    /// [[RFC6585, Section 5](https://datatracker.ietf.org/doc/html/rfc6585#section-5)]
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");

    /// [[RFC9110, Section 15.6.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1)]
    InternalServerError = (500, "Internal Server Error");
    /// [[RFC9110, Section 15.6.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.4)]
    ServiceUnavailable = (503, "Service Unavailable");
}

// CONTENT_TYPE

/// Media types a response can declare in its single `Content-Type` header.
///
/// Every type is sent with `charset=utf-8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `text/html`
    Html,
    /// `application/json`
    Json,
}

impl ContentType {
    // Returns the full header line, e.g. `b"Content-Type: text/html; charset=utf-8\n"`.
    #[inline]
    pub(crate) const fn to_header_line(&self) -> &'static [u8] {
        match self {
            ContentType::Html => b"Content-Type: text/html; charset=utf-8\n",
            ContentType::Json => b"Content-Type: application/json; charset=utf-8\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_token() {
        #[rustfmt::skip]
        let cases: [(&[u8], Option<(Method, usize)>); 5] = [
            (b"GET / HTTP/1.1", Some((Method::Get, 3))),
            (b"GET ",           Some((Method::Get, 3))),
            (b"GET/ HTTP/1.1",  None),
            (b"POST / HTTP/1.1", None),
            (b"get / HTTP/1.1", None),
        ];

        for (line, expected) in cases {
            assert_eq!(Method::from_line(line), expected);
        }
    }

    #[test]
    fn status_lines() {
        assert_eq!(StatusCode::Ok.to_first_line(), b"HTTP/1.1 200 OK\n");
        assert_eq!(
            StatusCode::NotFound.to_first_line(),
            b"HTTP/1.1 404 Not Found\n"
        );
        assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    }

    #[test]
    fn content_type_lines() {
        assert_eq!(
            ContentType::Json.to_header_line(),
            b"Content-Type: application/json; charset=utf-8\n"
        );
    }
}
