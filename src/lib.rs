//! fun_web - a small hand-parsed HTTP/1.1 server with a fixed route table
//!
//! Each accepted connection carries exactly one request: the request line is
//! read, the headers are skipped, the target is matched against an ordered
//! route table and the response is assembled literally before the socket is
//! closed.
//!
//! # Endpoints
//!
//! | Target                          | Response                                           |
//! |---------------------------------|----------------------------------------------------|
//! | `/`                             | `root.html` with a listing of the static directory |
//! | `/json` (any case)              | a randomly picked image card as JSON               |
//! | `/random` (any case)            | `index.html`                                       |
//! | `.../file/<path>`               | raw bytes of `<path>`, or 404                      |
//! | `...multiply?num1=..&num2=..`   | the product of two integers                        |
//! | `...github?query=<path>`        | a few fields of a GitHub REST payload              |
//! | `...circle?howMany=..&radius=..`| ASCII circles of shrinking radius                  |
//! | `...triangle?howMany=..&length=..` | ASCII triangles of shrinking side               |
//!
//! The routes are tried in this order and the first match wins (see
//! [`router`]).
//!
//! Any other target gets an empty response: the connection is closed without
//! a single byte written.
//!
//! # Examples
//!
//! Serving the application:
//! ```no_run
//! use fun_web::{config::Config, handlers::App, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     Server::builder()
//!         .listener(fun_web::bind(config.listen, &config.limits.server)?)
//!         .handler(App::from_config(&config)?)
//!         .limits(config.limits.clone())
//!         .build()
//!         .launch()
//!         .await;
//!     Ok(())
//! }
//! ```
//! A custom handler on the same server:
//! ```no_run
//! use fun_web::{ContentType, Handled, Handler, Request, Response, Server, StatusCode};
//!
//! struct MyHandler;
//!
//! impl Handler for MyHandler {
//!     async fn handle(&self, req: &Request, resp: &mut Response) -> Handled {
//!         match req.target().strip_prefix("echo/") {
//!             Some(text) => resp
//!                 .status(StatusCode::Ok)
//!                 .content_type(ContentType::Html)
//!                 .body(text),
//!             None => resp.empty(),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let limits = fun_web::limits::ServerLimits::default();
//!
//!     Server::builder()
//!         .listener(fun_web::bind("127.0.0.1:8080".parse().unwrap(), &limits).unwrap())
//!         .handler(MyHandler)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```

pub(crate) mod http {
    pub mod query;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub mod config;
pub(crate) mod errors;
pub mod handlers;
pub mod limits;
pub mod router;

pub use crate::{
    errors::{ErrorKind, IoError},
    http::{
        query,
        request::Request,
        response::{
            write::{BodyWriter, WriteBuffer},
            Handled, Response,
        },
        types::{ContentType, Method, StatusCode},
    },
    server::server_impl::{bind, Handler, Server, ServerBuilder},
};

#[doc(hidden)]
pub fn run_test<F: FnOnce(&Request, &mut Response) -> Handled>(f: F) {
    f(
        &Request::default(),
        &mut Response::new(&crate::limits::RespLimits::default()),
    );
}

#[doc(hidden)]
#[macro_export]
macro_rules! impt_default_handler {
    ($name:ident) => {
        use fun_web::{ContentType, Handled, Handler, Request, Response, StatusCode};
        struct $name;

        impl Handler for $name {
            async fn handle(&self, _: &Request, resp: &mut Response) -> Handled {
                resp.status(StatusCode::Ok)
                    .content_type(ContentType::Html)
                    .body("Hello world!")
            }
        }
    };
}
