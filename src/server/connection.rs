use crate::{
    errors::ErrorKind,
    http::{
        request::{ParseState, Parser, Request},
        response::Response,
    },
    limits::{ConnLimits, Limits, ReqLimits, RespLimits},
    server::server_impl::Handler,
};
use std::{io, sync::Arc};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Where a connection is in its single request/response exchange.
///
/// Stages only move forward. A parse failure jumps straight from reading
/// to [`BuildResponse`](Stage::BuildResponse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Stage {
    AwaitRequestLine,
    HeaderSkip,
    Dispatch,
    BuildResponse,
    Terminal,
}

impl From<ParseState> for Stage {
    #[inline]
    fn from(state: ParseState) -> Self {
        match state {
            ParseState::AwaitRequestLine => Stage::AwaitRequestLine,
            ParseState::HeaderSkip => Stage::HeaderSkip,
        }
    }
}

/// One request, one response, then close.
///
/// Instances are reused: a worker (or the sequential loop) owns one and
/// calls [`run`](HttpConnection::run) for every accepted stream.
pub(crate) struct HttpConnection<H: Handler> {
    handler: Arc<H>,

    stage: Stage,
    parser: Parser,
    request: Request,
    response: Response,

    conn_limits: ConnLimits,
    req_limits: ReqLimits,
    resp_limits: RespLimits,
}

impl<H: Handler> HttpConnection<H> {
    #[inline]
    pub(crate) fn new(handler: Arc<H>, limits: &Limits) -> Self {
        Self {
            handler,

            stage: Stage::AwaitRequestLine,
            parser: Parser::new(),
            request: Request::default(),
            response: Response::new(&limits.response),

            conn_limits: limits.connection.clone(),
            req_limits: limits.request.clone(),
            resp_limits: limits.response.clone(),
        }
    }

    #[inline]
    fn reset(&mut self) {
        self.stage = Stage::AwaitRequestLine;
        self.parser.reset();
        self.request.reset();
        self.response.reset(&self.resp_limits);
    }

    #[inline(always)]
    fn advance(&mut self, next: Stage) {
        debug_assert!(next >= self.stage, "{:?} -> {next:?}", self.stage);

        tracing::trace!(from = ?self.stage, to = ?next, "Stage");
        self.stage = next;
    }
}

impl<H: Handler> HttpConnection<H> {
    /// Serves exactly one request on `stream` and shuts its write side down.
    ///
    /// Socket failures (including read and write timeouts) are returned;
    /// everything else is answered on the stream.
    pub(crate) async fn run<S>(&mut self, stream: &mut S) -> Result<(), io::Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.reset();

        let result = self.impl_run(stream).await;
        self.advance(Stage::Terminal);

        result
    }

    #[inline(always)]
    async fn impl_run<S>(&mut self, stream: &mut S) -> Result<(), io::Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut reader = BufReader::new(stream);

        let parsed = self
            .parser
            .parse(
                &mut reader,
                &mut self.request,
                &self.req_limits,
                self.conn_limits.socket_read_timeout,
            )
            .await;
        self.advance(self.parser.state.into());

        match parsed {
            Ok(()) => {
                self.advance(Stage::Dispatch);
                self.handler.handle(&self.request, &mut self.response).await;
            }
            Err(ErrorKind::Io(err)) => return Err(err.0),
            Err(err) => {
                tracing::debug!(error = %err, "Rejecting request");
                err.respond(&mut self.response);
            }
        }

        self.advance(Stage::BuildResponse);
        self.conn_limits
            .write_bytes(reader.get_mut(), self.response.buffer())
            .await
    }
}

pub(crate) mod writer {
    use crate::limits::ConnLimits;
    use std::io;
    use tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        time::timeout,
    };

    impl ConnLimits {
        /// Writes the whole response, then closes the write side, all within
        /// the socket write timeout.
        #[inline(always)]
        pub(crate) async fn write_bytes<S: AsyncWrite + Unpin>(
            &self,
            stream: &mut S,
            response: &[u8],
        ) -> Result<(), io::Error> {
            timeout(self.socket_write_timeout, async {
                stream.write_all(response).await?;
                stream.shutdown().await
            })
            .await?
        }
    }
}
