//! Literal HTTP response assembly.

use crate::{
    http::types::{ContentType, StatusCode},
    limits::RespLimits,
    BodyWriter, WriteBuffer,
};
use std::borrow::Cow;

/// HTTP response builder for constructing server responses.
///
/// Every response has the same shape: a status line, exactly one
/// `Content-Type` header and a blank line, followed by the body. All lines
/// end with a bare `\n`. There is no `Content-Length` and no `Connection`
/// header because the server closes the connection after every response.
///
/// Build responses by chaining methods in strict order:
/// [`status()`](Response::status) -> [`content_type()`](Response::content_type)
/// -> any body method. [`empty()`](Response::empty) is the only exception and
/// must be called on a clean response.
///
/// Instances are created by the server and passed to
/// [`Handler::handle`](crate::Handler::handle).
///
/// # Examples
/// ```
/// use fun_web::{ContentType, Handled, Request, Response, StatusCode};
///
/// // In your implementation `Handler`
/// async fn handle(_req: &Request, resp: &mut Response) -> Handled {
///     resp.status(StatusCode::Ok)
///         .content_type(ContentType::Html)
///         .body("<h1>Hello World</h1>")
/// }
/// ```
///
/// # Panics
/// All methods perform ordering checks in `debug` mode that panic on
/// violations. In `release` mode these checks are omitted and a misordered
/// chain produces a malformed response.
#[derive(Debug)]
pub struct Response {
    buffer: Vec<u8>,
    state: ResponseState,
}

/// Proof that a response was finalized.
///
/// Returned only by the finalizing methods of [`Response`], so a handler
/// cannot return without producing a response.
#[doc(hidden)]
pub struct Handled(());

#[derive(Debug, Clone, Copy, PartialEq)]
enum ResponseState {
    Clean,
    Status,
    Headers,
    Complete,
}

impl Response {
    #[inline(always)]
    pub(crate) fn new(limits: &RespLimits) -> Self {
        Self {
            buffer: Vec::with_capacity(limits.default_capacity),
            state: ResponseState::Clean,
        }
    }

    #[inline(always)]
    pub(crate) fn reset(&mut self, limits: &RespLimits) {
        if self.buffer.capacity() > limits.max_capacity {
            self.buffer = Vec::with_capacity(limits.default_capacity);
        } else {
            self.buffer.clear();
        }

        self.state = ResponseState::Clean;
    }

    #[inline(always)]
    pub(crate) fn buffer(&self) -> &Vec<u8> {
        &self.buffer
    }

    #[inline(always)]
    pub(crate) fn is_complete(&self) -> bool {
        self.state == ResponseState::Complete
    }
}

impl Response {
    /// Writes the status line (e.g. `HTTP/1.1 200 OK\n`).
    ///
    /// # Panics
    /// In debug mode, if not called first or called more than once.
    #[inline]
    #[track_caller]
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        debug_assert!(
            self.state == ResponseState::Clean,
            "Must be first and called only once"
        );

        self.buffer.extend_from_slice(status.to_first_line());
        self.state = ResponseState::Status;
        self
    }

    /// Writes the single `Content-Type` header, always with `charset=utf-8`.
    ///
    /// # Panics
    /// In debug mode, if not called exactly once right after `status()`.
    #[inline]
    #[track_caller]
    pub fn content_type(&mut self, content_type: ContentType) -> &mut Self {
        debug_assert!(
            self.state == ResponseState::Status,
            "Must be called once, after status() and before any body method"
        );

        self.buffer.extend_from_slice(content_type.to_header_line());
        self.state = ResponseState::Headers;
        self
    }

    /// Terminates the header block and writes the body.
    ///
    /// # Examples
    /// ```
    /// use fun_web::{ContentType, Response, StatusCode};
    ///
    /// # fun_web::run_test(|_, resp| {
    /// resp.status(StatusCode::Ok)
    ///     .content_type(ContentType::Html)
    ///     .body("Result is: 12")
    /// # });
    /// ```
    #[inline]
    #[track_caller]
    pub fn body<T: WriteBuffer>(&mut self, data: T) -> Handled {
        debug_assert!(
            self.state == ResponseState::Headers,
            "Must be called after status() and content_type()"
        );

        self.buffer.push(b'\n');
        data.write_to(&mut self.buffer);
        self.end()
    }

    /// Terminates the header block and lets `f` write the body piecewise.
    ///
    /// [`BodyWriter`] also implements [`std::io::Write`], so `write!` works.
    ///
    /// # Examples
    /// ```
    /// use fun_web::{ContentType, Response, StatusCode};
    /// use std::io::Write;
    ///
    /// # fun_web::run_test(|_, resp| {
    /// resp.status(StatusCode::Ok)
    ///     .content_type(ContentType::Html)
    ///     .body_with(|body| {
    ///         body.write("ID: ");
    ///         let _ = write!(body, "{}<br>", 42);
    ///     })
    /// # });
    /// ```
    #[inline]
    #[track_caller]
    pub fn body_with<F: FnOnce(&mut BodyWriter)>(&mut self, f: F) -> Handled {
        debug_assert!(
            self.state == ResponseState::Headers,
            "Must be called after status() and content_type()"
        );

        self.buffer.push(b'\n');
        f(&mut BodyWriter(&mut self.buffer));
        self.end()
    }

    /// Finalizes the response without writing a single byte.
    ///
    /// Used for targets no route matches: the client sees the connection
    /// close with nothing sent.
    #[inline]
    #[track_caller]
    pub fn empty(&mut self) -> Handled {
        debug_assert!(
            self.state == ResponseState::Clean,
            "An empty response must not be started"
        );

        self.end()
    }
}

impl Response {
    #[inline(always)]
    fn end(&mut self) -> Handled {
        self.state = ResponseState::Complete;
        Handled(())
    }

    #[inline]
    const fn number_to_bytes(mut n: u128) -> ([u8; 39], usize) {
        let mut buffer = [b'0'; 39];
        let mut i = 39;

        if n == 0 {
            return (buffer, 38);
        }

        while n > 0 {
            i -= 1;
            buffer[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }

        (buffer, i)
    }
}

pub mod write {
    use super::*;

    /// Body writer handed to [`Response::body_with`].
    #[derive(Debug)]
    pub struct BodyWriter<'a>(pub(crate) &'a mut Vec<u8>);

    impl BodyWriter<'_> {
        /// Appends any [`WriteBuffer`] value to the body.
        #[inline]
        pub fn write<T: WriteBuffer>(&mut self, value: T) {
            value.write_to(self.0);
        }
    }

    impl std::io::Write for BodyWriter<'_> {
        #[inline]
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        #[inline]
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Values that can be appended to a response body without going through
    /// `format!`.
    ///
    /// Integers are written in decimal, strings and byte slices verbatim.
    pub trait WriteBuffer {
        fn write_to(&self, buffer: &mut Vec<u8>);
    }

    macro_rules! impl_write_buffer {
        (bytes, $conn:expr => $($t:ty),*) => {
            $(impl WriteBuffer for $t {
                #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                    let closure = $conn;
                    closure(self, buffer);
                }
            })*
        };
        (number($type:ty), $conn:expr => $($t:ty),*) => {
            $(impl WriteBuffer for $t {
                #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                    $conn(*self as $type, buffer);
                }
            })*
        };
    }

    impl<T: WriteBuffer> WriteBuffer for &T {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            T::write_to(*self, buffer);
        }
    }
    impl<T: WriteBuffer> WriteBuffer for &mut T {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            T::write_to(*self, buffer);
        }
    }
    impl_write_buffer! {
        bytes, |value: &str, buffer: &mut Vec<u8>| {
            buffer.extend_from_slice(value.as_bytes());
        } => &str, String, Box<str>, Cow<'_, str>
    }
    impl_write_buffer! {
        bytes, |value: &[u8], buffer: &mut Vec<u8>| {
            buffer.extend_from_slice(value);
        } => &[u8], Vec<u8>, Box<[u8]>, Cow<'_, [u8]>
    }
    impl<const N: usize> WriteBuffer for [u8; N] {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self);
        }
    }
    impl_write_buffer! {
        number(u128), impl_write_buffer_u128 => u8, u16, u32, u64, u128, usize
    }
    impl_write_buffer! {
        number(i128), impl_write_buffer_i128 => i8, i16, i32, i64, i128, isize
    }
    impl WriteBuffer for char {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            let mut buf = [0u8; 4];
            buffer.extend_from_slice(self.encode_utf8(&mut buf).as_bytes());
        }
    }

    #[inline(always)]
    fn impl_write_buffer_u128(value: u128, buffer: &mut Vec<u8>) {
        let (arr, start) = Response::number_to_bytes(value);
        buffer.extend_from_slice(&arr[start..]);
    }

    #[inline(always)]
    fn impl_write_buffer_i128(value: i128, buffer: &mut Vec<u8>) {
        if value < 0 {
            buffer.push(b'-');
        }
        let abs = value.unsigned_abs();

        let (arr, start) = Response::number_to_bytes(abs);
        buffer.extend_from_slice(&arr[start..]);
    }
}

#[cfg(test)]
mod status_tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn basic() {
        let cases = [
            (StatusCode::Ok, "HTTP/1.1 200 OK\n"),
            (StatusCode::NotFound, "HTTP/1.1 404 Not Found\n"),
            (StatusCode::BadRequest, "HTTP/1.1 400 Bad Request\n"),
            (
                StatusCode::ServiceUnavailable,
                "HTTP/1.1 503 Service Unavailable\n",
            ),
        ];

        for (status, result) in cases {
            let mut resp = Response::new(&RespLimits::default());

            assert!(resp.buffer.is_empty());
            assert_eq!(resp.state, ResponseState::Clean);

            resp.status(status);
            assert_eq!(str_op(&resp.buffer), result);
            assert_eq!(resp.state, ResponseState::Status);
        }
    }

    #[test]
    #[should_panic(expected = "Must be first and called only once")]
    fn double_call() {
        Response::new(&RespLimits::default())
            .status(StatusCode::Ok)
            .status(StatusCode::NotFound);
    }
}


#[cfg(test)]
mod body_tests {
    use super::*;
    use crate::tools::*;

    macro_rules! test_body {
        ($method:ident, $(($data:expr, $result:expr);)*) => {
        #[test] fn $method() {$(
            let mut resp = Response::new(&RespLimits::default());

            resp.status(StatusCode::Ok)
                .content_type(ContentType::Html)
                .$method($data);

            assert_eq!(
                str_op(&resp.buffer),
                format!(
                    "HTTP/1.1 200 OK\nContent-Type: text/html; charset=utf-8\n\n{}",
                    $result
                )
            );
            assert_eq!(resp.state, ResponseState::Complete);
        )*}};
    }

    test_body! {body,
        ("Result is: 12", "Result is: 12");
        (String::from("<html>ok</html>"), "<html>ok</html>");
        (-1234, "-1234");
        (0u8, "0");
        (i32::MIN, "-2147483648");
        (vec![35, 33, 43], "#!+");
        ('é', "é");
        ("", "");
    }

    test_body! {body_with,
        (|buf: &mut BodyWriter| buf.write("qwe"), "qwe");
        (|buf: &mut BodyWriter| { buf.write("ID: "); buf.write(42u64); }, "ID: 42");
        (
            |buf: &mut BodyWriter| {
                use std::io::Write;
                let _ = write!(buf, "{}<br>{}", "*", "**");
            },
            "*<br>**"
        );
    }

    #[test]
    #[should_panic(expected = "Must be called after status() and content_type()")]
    fn body_before_status() {
        Response::new(&RespLimits::default()).body("Name");
    }

    #[test]
    #[should_panic(expected = "Must be called after status() and content_type()")]
    fn body_without_content_type() {
        Response::new(&RespLimits::default())
            .status(StatusCode::Ok)
            .body("Name");
    }

    #[test]
    #[should_panic(expected = "Must be called after status() and content_type()")]
    fn body_with_double_call() {
        let mut resp = Response::new(&RespLimits::default());
        resp.status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body_with(|_| {});
        resp.body_with(|_| {});
    }
}

#[cfg(test)]
mod empty_tests {
    use super::*;

    #[test]
    fn writes_nothing() {
        let mut resp = Response::new(&RespLimits::default());

        resp.empty();
        assert!(resp.buffer.is_empty());
        assert!(resp.is_complete());
    }

    #[test]
    #[should_panic(expected = "An empty response must not be started")]
    fn after_status() {
        Response::new(&RespLimits::default())
            .status(StatusCode::Ok)
            .empty();
    }

    #[test]
    fn reset_reuses_or_shrinks() {
        let limits = RespLimits {
            default_capacity: 16,
            max_capacity: 64,
        };
        let mut resp = Response::new(&limits);

        resp.status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body("x".repeat(8));
        resp.reset(&limits);
        assert!(resp.buffer.is_empty());
        assert_eq!(resp.state, ResponseState::Clean);

        resp.status(StatusCode::Ok)
            .content_type(ContentType::Html)
            .body("x".repeat(256));
        resp.reset(&limits);
        assert!(resp.buffer.capacity() <= 64);
    }
}
