use crate::{
    http::{
        request::Request,
        response::{Handled, Response},
        types::{ContentType, StatusCode},
    },
    limits::{
        Concurrency, ConnLimits, Limits, ReqLimits, RespLimits, ServerLimits, WaitStrategy,
    },
    server::connection::HttpConnection,
};
use crossbeam::queue::SegQueue;
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    future::Future,
    io,
    marker::{Send, Sync},
    net::SocketAddr,
    sync::Arc,
};
use tokio::{
    net::{TcpListener, TcpStream},
    task::yield_now,
    time::sleep as tokio_sleep,
};
use tracing::Instrument;

/// Trait for handling HTTP requests.
///
/// Called once per connection, after the request head has been read. The
/// handler must finalize the response: the [`Handled`] token can only be
/// obtained from one of the finalizing methods of [`Response`].
///
/// # Examples
/// ```
/// use fun_web::{ContentType, Handled, Handler, Request, Response, StatusCode};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     async fn handle(&self, req: &Request, resp: &mut Response) -> Handled {
///         match req.target() {
///             "hello" => resp
///                 .status(StatusCode::Ok)
///                 .content_type(ContentType::Html)
///                 .body("<h1>Hello</h1>"),
///             _ => resp.empty(),
///         }
///     }
/// }
/// ```
pub trait Handler
where
    Self: Sync + Send + 'static,
{
    fn handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> impl Future<Output = Handled> + Send;
}

/// Binds a listening socket with `SO_REUSEADDR` and the configured backlog.
///
/// Must be called from within a Tokio runtime.
pub fn bind(addr: SocketAddr, limits: &ServerLimits) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(limits.backlog)?;

    TcpListener::from_std(socket.into())
}

/// HTTP server that accepts connections and serves one request on each.
///
/// # Connection scheduling
///
/// With [`Concurrency::Sequential`] (the default) the accept loop serves every
/// connection itself before accepting the next one. With
/// [`Concurrency::Workers`] accepted streams are pushed onto a lock-free queue
/// drained by a fixed number of worker tasks; when more than
/// [`ServerLimits::max_pending_connections`] are waiting, the stream goes to a
/// second queue whose task answers `503 Service Unavailable`.
///
/// # Examples
/// ```no_run
/// use fun_web::{limits::{Concurrency, Limits, ServerLimits}, Server};
/// # fun_web::impt_default_handler!{MyHandler}
///
/// #[tokio::main]
/// async fn main() {
///     let limits = Limits {
///         server: ServerLimits {
///             concurrency: Concurrency::Workers(4),
///             ..ServerLimits::default()
///         },
///         ..Limits::default()
///     };
///
///     Server::builder()
///         .listener(fun_web::bind("127.0.0.1:9000".parse().unwrap(), &limits.server).unwrap())
///         .handler(MyHandler)
///         .limits(limits)
///         .build()
///         .launch()
///         .await;
/// }
/// ```
pub struct Server<H: Handler> {
    listener: TcpListener,
    mode: Mode<H>,
}

enum Mode<H: Handler> {
    Sequential(HttpConnection<H>),
    Workers {
        stream_queue: TcpQueue,
        error_queue: TcpQueue,
        max_pending: usize,
    },
}

impl<H: Handler> Server<H> {
    /// Creates a new server builder.
    #[inline]
    pub fn builder() -> ServerBuilder<H> {
        ServerBuilder {
            listener: None,
            handler: None,
            limits: Limits::default(),
        }
    }

    /// Address the listener is bound to.
    #[inline]
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop forever.
    ///
    /// Accept errors are logged and skipped; nothing a single connection
    /// does can stop the loop.
    pub async fn launch(mut self) {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!(%addr, "Listening");
        }

        loop {
            let (mut stream, addr) = match self.listener.accept().await {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(error = %err, "Accept failed");
                    continue;
                }
            };

            match &mut self.mode {
                Mode::Sequential(conn) => serve(conn, &mut stream, addr).await,
                Mode::Workers {
                    stream_queue,
                    error_queue,
                    max_pending,
                } => match stream_queue.len() < *max_pending {
                    true => stream_queue.push((stream, addr)),
                    false => {
                        tracing::warn!(peer = %addr, "Pending queue full, answering 503");
                        error_queue.push((stream, addr))
                    }
                },
            }
        }
    }

    #[inline]
    async fn get_stream(queue: &TcpQueue, wait: &WaitStrategy) -> (TcpStream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            match wait {
                WaitStrategy::Yield => yield_now().await,
                WaitStrategy::Sleep(time) => tokio_sleep(*time).await,
            }
        }
    }
}

async fn serve<H: Handler>(conn: &mut HttpConnection<H>, stream: &mut TcpStream, addr: SocketAddr) {
    let span = tracing::debug_span!("conn", peer = %addr);

    if let Err(err) = conn.run(stream).instrument(span).await {
        tracing::debug!(peer = %addr, error = %err, "Connection dropped");
    }
}

/// Builder for configuring and creating [`Server`] instances.
///
/// `listener` and `handler` are required; every limit has a default.
pub struct ServerBuilder<H: Handler> {
    listener: Option<TcpListener>,
    handler: Option<Arc<H>>,
    limits: Limits,
}

impl<H: Handler> ServerBuilder<H> {
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    #[inline(always)]
    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Replaces every limit at once.
    #[inline(always)]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.limits.server = limits;
        self
    }

    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.limits.connection = limits;
        self
    }

    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.limits.request = limits;
        self
    }

    #[inline(always)]
    pub fn response_limits(mut self, limits: RespLimits) -> Self {
        self.limits.response = limits;
        self
    }

    /// Creates the server, spawning the worker tasks if any.
    ///
    /// # Panics
    /// - If `listener` or `handler` was not set
    /// - If called outside a Tokio runtime with [`Concurrency::Workers`]
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server<H> {
        let listener = self
            .listener
            .expect("The `listener` method must be called to create");
        let handler = self
            .handler
            .expect("The `handler` method must be called to create");
        let limits = self.limits;

        let mode = match limits.server.concurrency {
            Concurrency::Sequential => Mode::Sequential(HttpConnection::new(handler, &limits)),
            Concurrency::Workers(count) => {
                let stream_queue = Arc::new(SegQueue::new());
                let error_queue = Arc::new(SegQueue::new());

                for _ in 0..count {
                    Self::spawn_worker(&stream_queue, &limits, &handler);
                }
                Self::spawn_alarmist(&error_queue, &limits);

                Mode::Workers {
                    stream_queue,
                    error_queue,
                    max_pending: limits.server.max_pending_connections,
                }
            }
        };

        Server { listener, mode }
    }

    #[inline]
    fn spawn_worker(queue: &TcpQueue, limits: &Limits, handler: &Arc<H>) {
        let queue = queue.clone();
        let wait = limits.server.wait_strategy.clone();
        let mut conn = HttpConnection::new(handler.clone(), limits);

        tokio::spawn(async move {
            loop {
                let (mut stream, addr) = Server::<H>::get_stream(&queue, &wait).await;
                serve(&mut conn, &mut stream, addr).await;
            }
        });
    }

    #[inline]
    fn spawn_alarmist(queue: &TcpQueue, limits: &Limits) {
        let queue = queue.clone();
        let wait = limits.server.wait_strategy.clone();
        let conn_limits = limits.connection.clone();
        let busy = service_unavailable(&limits.response);

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = Server::<H>::get_stream(&queue, &wait).await;

                let _ = conn_limits.write_bytes(&mut stream, busy.buffer()).await;
            }
        });
    }
}

fn service_unavailable(limits: &RespLimits) -> Response {
    let mut response = Response::new(limits);
    response
        .status(StatusCode::ServiceUnavailable)
        .content_type(ContentType::Html)
        .body("<html>ERROR: Service Unavailable</html>");
    response
}

type TcpQueue = Arc<SegQueue<(TcpStream, SocketAddr)>>;
