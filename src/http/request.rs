use crate::{errors::ErrorKind, limits::ReqLimits, Method};
use memchr::memchr;
use std::{borrow::Cow, io, time::Duration};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt},
    time::sleep,
};

/// The request as seen by a handler: the target of the `GET` line and
/// nothing else.
///
/// The single leading `/` of the wire target is removed, so `GET / HTTP/1.1`
/// yields the empty target and `GET /multiply?num1=3 HTTP/1.1` yields
/// `multiply?num1=3`. Header fields and bodies are never retained.
///
/// # Examples
/// ```
/// use fun_web::{Handled, Request, Response};
///
/// async fn handle(req: &Request, resp: &mut Response) -> Handled {
///     match req.target().strip_prefix("file/") {
///         Some(path) => todo!("serve {path}"),
///         None => resp.empty(),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Request {
    method: Method,
    target: String,
}

impl Request {
    #[inline(always)]
    pub(crate) fn reset(&mut self) {
        self.method = Method::Get;
        self.target.clear();
    }

    /// Creates a request for an already extracted target.
    #[inline]
    pub fn from_target<T: Into<String>>(target: T) -> Self {
        Self {
            method: Method::Get,
            target: target.into(),
        }
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the target without its leading `/`.
    #[inline(always)]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Extracts the target from a `GET` request line.
///
/// The target is everything strictly between the first space and the next
/// one, minus a single leading `/`. Returns `None` for any other method,
/// when the second space is missing or when nothing lies between the spaces.
pub(crate) fn parse_request_line(line: &str) -> Option<(Method, &str)> {
    let (method, method_end) = Method::from_line(line.as_bytes())?;

    let rest = &line[method_end + 1..];
    let target_end = memchr(b' ', rest.as_bytes())?;
    let target = &rest[..target_end];
    if target.is_empty() {
        return None;
    }

    Some((method, target.strip_prefix('/').unwrap_or(target)))
}

//

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ParseState {
    /// No `GET` line seen yet.
    AwaitRequestLine,
    /// The target is known; remaining lines are read and dropped.
    HeaderSkip,
}

/// Line-oriented reader for the request head.
///
/// Reads one line at a time until the blank line that ends the headers (or
/// end of stream). The first line that starts with `GET ` supplies the
/// target; every other line is discarded.
#[derive(Debug)]
pub(crate) struct Parser {
    line: Vec<u8>,
    consumed: usize,
    pub(crate) state: ParseState,
}

impl Parser {
    #[inline(always)]
    pub(crate) fn new() -> Self {
        Self {
            line: Vec::with_capacity(256),
            consumed: 0,
            state: ParseState::AwaitRequestLine,
        }
    }

    #[inline]
    pub(crate) fn reset(&mut self) {
        self.line.clear();
        self.consumed = 0;
        self.state = ParseState::AwaitRequestLine;
    }

    /// Reads the request head from `reader` into `request`.
    ///
    /// # Errors
    /// - [`ErrorKind::NoRequestLine`] if the head ended without a `GET` line
    /// - [`ErrorKind::HeadersTooLarge`] if the head exceeds
    ///   [`ReqLimits::header_bytes`]
    /// - [`ErrorKind::Io`] on socket errors and read timeouts
    pub(crate) async fn parse<R: AsyncBufRead + Unpin>(
        &mut self,
        reader: &mut R,
        request: &mut Request,
        limits: &ReqLimits,
        read_timeout: Duration,
    ) -> Result<(), ErrorKind> {
        while self.read_line(reader, limits, read_timeout).await? {
            let line = decode_line(&self.line);
            if line.is_empty() {
                break;
            }

            match self.state {
                ParseState::AwaitRequestLine => {
                    if let Some((method, target)) = parse_request_line(&line) {
                        tracing::debug!(line = %line, "Request line");

                        request.method = method;
                        request.target.push_str(target);
                        self.state = ParseState::HeaderSkip;
                    } else {
                        tracing::trace!(line = %line, "Skipping line before request line");
                    }
                }
                ParseState::HeaderSkip => tracing::trace!(line = %line, "Skipping header"),
            }
        }

        match self.state {
            ParseState::HeaderSkip => Ok(()),
            ParseState::AwaitRequestLine => Err(ErrorKind::NoRequestLine),
        }
    }

    /// Reads the next line into `self.line`, terminator stripped.
    ///
    /// Returns `false` at end of stream.
    async fn read_line<R: AsyncBufRead + Unpin>(
        &mut self,
        reader: &mut R,
        limits: &ReqLimits,
        read_timeout: Duration,
    ) -> Result<bool, ErrorKind> {
        self.line.clear();

        let budget = limits.header_bytes.saturating_sub(self.consumed);
        if budget == 0 {
            return Err(ErrorKind::headers_too_large(limits));
        }

        let mut limited = (&mut *reader).take(budget as u64);
        let n = tokio::select! {
            biased;

            read_result = limited.read_until(b'\n', &mut self.line) => read_result?,
            _ = sleep(read_timeout) => {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout").into());
            }
        };
        self.consumed += n;

        match self.line.last() {
            None => Ok(false),
            Some(b'\n') => {
                self.line.pop();
                if self.line.last() == Some(&b'\r') {
                    self.line.pop();
                }
                Ok(true)
            }
            Some(_) if n == budget => Err(ErrorKind::headers_too_large(limits)),
            // Stream ended mid-line
            Some(_) => Ok(true),
        }
    }
}

#[inline]
fn decode_line(bytes: &[u8]) -> Cow<'_, str> {
    match simdutf8::basic::from_utf8(bytes) {
        Ok(line) => Cow::Borrowed(line),
        Err(_) => String::from_utf8_lossy(bytes),
    }
}
