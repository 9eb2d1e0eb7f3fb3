//! Endpoint logic behind the route table.

pub mod github;
pub mod images;
pub mod pages;
pub mod shapes;

use crate::{
    config::{Config, ConfigError},
    errors::ErrorKind,
    http::{
        query::Query,
        request::Request,
        response::{Handled, Response},
        types::{ContentType, StatusCode},
    },
    limits::ShapeLimits,
    router::{self, Endpoint},
    Handler,
};
use github::{Fetch, FieldExtractor, HttpFetcher, RepoSummary, SubstringExtractor};
use images::{ImageCard, ImagePicker, ThreadRngPicker};
use pages::Pages;
use std::io;

/// The application: routes every request and runs the matched endpoint.
///
/// # Examples
/// ```no_run
/// use fun_web::{config::Config, handlers::App, Server};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
///
/// Server::builder()
///     .listener(fun_web::bind(config.listen, &config.limits.server)?)
///     .handler(App::from_config(&config)?)
///     .limits(config.limits.clone())
///     .build()
///     .launch()
///     .await;
/// # Ok(())
/// # }
/// ```
pub struct App<F: Fetch = HttpFetcher> {
    pages: Pages,
    api_base: String,
    fetcher: F,
    extractor: Box<dyn FieldExtractor>,
    picker: Box<dyn ImagePicker>,
    shapes: ShapeLimits,
}

impl App<HttpFetcher> {
    /// Builds the application with the real GitHub client.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let fetcher = HttpFetcher::new(&config.github)?;

        Ok(App::new(
            Pages::new(&config.www_dir, &config.file_root),
            &config.github.api_base,
            fetcher,
        )
        .shape_limits(config.limits.shapes.clone()))
    }
}

impl<F: Fetch> App<F> {
    pub fn new(pages: Pages, api_base: &str, fetcher: F) -> Self {
        Self {
            pages,
            api_base: api_base.to_owned(),
            fetcher,
            extractor: Box::new(SubstringExtractor),
            picker: Box::new(ThreadRngPicker),
            shapes: ShapeLimits::default(),
        }
    }

    pub fn picker<P: ImagePicker>(mut self, picker: P) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn extractor<X: FieldExtractor>(mut self, extractor: X) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn shape_limits(mut self, limits: ShapeLimits) -> Self {
        self.shapes = limits;
        self
    }
}

impl<F: Fetch> Handler for App<F> {
    async fn handle(&self, request: &Request, response: &mut Response) -> Handled {
        let Some((endpoint, rest)) = router::route_target(request.target()) else {
            tracing::debug!(path = request.target(), "No route, sending nothing");
            return response.empty();
        };

        tracing::debug!(?endpoint, "Dispatching");

        match self.dispatch(endpoint, &rest, response).await {
            Ok(handled) => handled,
            Err(err) => {
                let status = err.status();
                match status {
                    StatusCode::InternalServerError => tracing::error!(
                        ?endpoint,
                        status = status.as_u16(),
                        error = %err,
                        "Endpoint failed"
                    ),
                    _ => tracing::debug!(
                        ?endpoint,
                        status = status.as_u16(),
                        error = %err,
                        "Endpoint rejected request"
                    ),
                }
                err.respond(response)
            }
        }
    }
}

impl<F: Fetch> App<F> {
    // Nothing is written to `response` before the body is fully computed, so
    // an error can still be rendered in its place.
    async fn dispatch(
        &self,
        endpoint: Endpoint,
        rest: &str,
        response: &mut Response,
    ) -> Result<Handled, ErrorKind> {
        match endpoint {
            Endpoint::Root => {
                let page = self.pages.root().await?;
                Ok(html(response, StatusCode::Ok).body(page))
            }
            Endpoint::Random => {
                let page = self.pages.random().await?;
                Ok(html(response, StatusCode::Ok).body(page))
            }
            Endpoint::Json => {
                let card = ImageCard::pick(self.picker.as_ref());
                let body = serde_json::to_vec(&card).map_err(io::Error::from)?;

                Ok(response
                    .status(StatusCode::Ok)
                    .content_type(ContentType::Json)
                    .body(body))
            }
            Endpoint::File => {
                let bytes = self.pages.file(rest).await?;
                Ok(html(response, StatusCode::Ok).body(bytes))
            }
            Endpoint::Multiply => {
                let params = Query::decode_or_default(rest);
                let num1: i32 = params.parse_or("num1", 1);
                let num2: i32 = params.parse_or("num2", 1);

                Ok(html(response, StatusCode::Ok).body_with(|body| {
                    body.write("Result is: ");
                    body.write(num1.wrapping_mul(num2));
                }))
            }
            Endpoint::Github => {
                let summary = self.github(rest).await?;
                Ok(html(response, StatusCode::Ok).body(summary))
            }
            Endpoint::Circle => Ok(self.shape_series(response, rest, "radius", shapes::draw_circle)),
            Endpoint::Triangle => Ok(self.shape_series(
                response,
                rest,
                "length",
                shapes::draw_triangle,
            )),
        }
    }

    async fn github(&self, rest: &str) -> Result<String, ErrorKind> {
        let params = Query::decode_or_default(rest);
        let query = params
            .get("query")
            .ok_or(ErrorKind::MissingParameter("query"))?;

        let url = format!("{}{}", self.api_base, query);
        let payload = self.fetcher.fetch(&url).await.unwrap_or_else(|err| {
            tracing::warn!(url = %url, error = %err, "GitHub request failed, continuing with empty payload");
            String::new()
        });

        let summary = RepoSummary::extract(self.extractor.as_ref(), &payload)?;
        Ok(summary.to_string())
    }

    fn shape_series(
        &self,
        response: &mut Response,
        rest: &str,
        size_param: &str,
        draw: fn(i32) -> String,
    ) -> Handled {
        let params = Query::decode_or_default(rest);
        let how_many: i32 = params.parse_or("howMany", 1);
        let size: i32 = params.parse_or(size_param, 1);

        let art = shapes::render_series(draw, how_many, size, &self.shapes);

        html(response, StatusCode::Ok).body_with(|body| {
            body.write("Result is: ");
            body.write(art);
        })
    }
}

#[inline]
fn html(response: &mut Response, status: StatusCode) -> &mut Response {
    response.status(status).content_type(ContentType::Html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{limits::RespLimits, tools::*};
    use images::FixedPicker;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Canned upstream: records the requested URLs and answers with a fixed
    /// payload, or fails when there is none.
    #[derive(Clone, Default)]
    struct CannedFetch {
        payload: Option<&'static str>,
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl Fetch for CannedFetch {
        async fn fetch(&self, url: &str) -> Result<String, ErrorKind> {
            self.urls.lock().unwrap().push(url.to_owned());
            self.payload
                .map(str::to_owned)
                .ok_or_else(|| ErrorKind::UpstreamFetchFailure("connection refused".into()))
        }
    }

    const PAYLOAD: &str = r#"[{"id":7,"name":"demo","full_name":"me/demo","owner":{"login":"me"}}]"#;

    fn app(payload: Option<&'static str>) -> (App<CannedFetch>, CannedFetch, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let www = dir.path().join("www");
        std::fs::create_dir(&www).unwrap();
        std::fs::write(www.join("root.html"), "<ul>${links}</ul>").unwrap();
        std::fs::write(www.join("index.html"), "<html>index</html>").unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello file").unwrap();

        let fetch = CannedFetch {
            payload,
            ..CannedFetch::default()
        };
        let app = App::new(
            Pages::new(&www, dir.path()),
            "https://api.example/",
            fetch.clone(),
        )
        .picker(FixedPicker(1));

        (app, fetch, dir)
    }

    async fn get(app: &App<CannedFetch>, target: &str) -> String {
        let mut resp = Response::new(&RespLimits::default());
        app.handle(&Request::from_target(target), &mut resp).await;

        assert!(resp.is_complete());
        str_op(resp.buffer()).to_owned()
    }

    fn ok_html(body: &str) -> String {
        format!("HTTP/1.1 200 OK\nContent-Type: text/html; charset=utf-8\n\n{body}")
    }

    #[tokio::test]
    async fn multiply() {
        let (app, ..) = app(None);

        #[rustfmt::skip]
        let cases = [
            ("multiply?num1=3&num2=4",              "Result is: 12"),
            ("multiply?num1=x&num2=4",              "Result is: 4"),
            ("multiply?num2=5",                     "Result is: 5"),
            ("multiply?",                           "Result is: 1"),
            ("multiply?num1=-3&num2=4",             "Result is: -12"),
            ("multiply?num1=2147483647&num2=2",     "Result is: -2"),
            ("multiply?num1=3&broken",              "Result is: 1"),
            ("multiply?num1=%33&num2=%34",          "Result is: 12"),
            ("xmultiply?num1=2&num2=3",             "Result is: 3"),
        ];

        for (target, body) in cases {
            assert_eq!(get(&app, target).await, ok_html(body), "target: {target}");
        }
    }

    #[tokio::test]
    async fn shapes() {
        let (app, ..) = app(None);

        assert_eq!(
            get(&app, "triangle?howMany=2&length=3").await,
            ok_html("Result is: *<br>**<br>***<br>\n*<br>**<br>\n")
        );
        assert_eq!(
            get(&app, "circle?howMany=3&radius=5").await,
            ok_html(&format!(
                "Result is: {}\n{}\n{}\n",
                shapes::draw_circle(5),
                shapes::draw_circle(4),
                shapes::draw_circle(3)
            ))
        );
        assert_eq!(
            get(&app, "circle?").await,
            ok_html("Result is:  * <br>***<br> * <br>\n")
        );
    }

    #[tokio::test]
    async fn json() {
        let (app, ..) = app(None);

        assert_eq!(
            get(&app, "JSON").await,
            "HTTP/1.1 200 OK\nContent-Type: application/json; charset=utf-8\n\n\
             {\"header\":\"bread\",\"image\":\"https://iili.io/Jj9MWG.jpg\"}"
        );
    }

    #[tokio::test]
    async fn pages() {
        let (app, _, dir) = app(None);

        assert_eq!(
            get(&app, "").await,
            ok_html("<ul><ul>\n<li>index.html</li><li>root.html</li></ul>\n</ul>")
        );
        assert_eq!(get(&app, "random").await, ok_html("<html>index</html>"));
        assert_eq!(get(&app, "file/hello.txt").await, ok_html("hello file"));
        assert_eq!(get(&app, "file/file/hello.txt").await, ok_html("hello file"));
        assert_eq!(
            get(&app, "x/file/hello.txt").await,
            "HTTP/1.1 404 Not Found\nContent-Type: text/html; charset=utf-8\n\n\
             File not found: x/hello.txt"
        );
        assert_eq!(
            get(&app, "file/doesnotexist.txt").await,
            "HTTP/1.1 404 Not Found\nContent-Type: text/html; charset=utf-8\n\n\
             File not found: doesnotexist.txt"
        );

        std::fs::remove_file(dir.path().join("www/root.html")).unwrap();
        let fault = get(&app, "").await;
        assert!(fault.starts_with("HTTP/1.1 500 Internal Server Error\n"));
        assert!(fault.contains("\n\n<html>ERROR: "));
    }

    #[tokio::test]
    async fn github() {
        let (app, fetch, _dir) = app(Some(PAYLOAD));

        assert_eq!(
            get(&app, "github?query=users/me/repos").await,
            ok_html(
                "Full Name: me/demo<br>Repository Name: demo<br>ID: 7<br>\
                 Login Name: me<br>Owner Name: demo<br>"
            )
        );
        assert_eq!(
            fetch.urls.lock().unwrap().as_slice(),
            ["https://api.example/users/me/repos"]
        );
    }

    #[tokio::test]
    async fn github_failures() {
        let (app, fetch, _dir) = app(None);

        assert_eq!(
            get(&app, "github?query=users/me/repos").await,
            "HTTP/1.1 400 Bad Request\nContent-Type: text/html; charset=utf-8\n\n\
             Error parsing the JSON response from GitHub API: field `full_name` is missing"
        );
        assert_eq!(
            get(&app, "github?q=users").await,
            "HTTP/1.1 400 Bad Request\nContent-Type: text/html; charset=utf-8\n\n\
             Missing required parameter: query"
        );
        assert_eq!(fetch.urls.lock().unwrap().len(), 1);
    }

    /// Fixed field values, whatever the payload.
    struct KeyEcho;

    impl FieldExtractor for KeyEcho {
        fn string_field<'a>(&self, _: &'a str, key: &str) -> Result<&'a str, ErrorKind> {
            match key {
                "full_name" => Ok("FULL"),
                "name" => Ok("NAME"),
                "login" => Ok("LOGIN"),
                _ => Err(ErrorKind::FieldExtractionFailure(format!("field `{key}` is missing"))),
            }
        }

        fn integer_field(&self, _: &str, _: &str) -> Result<u64, ErrorKind> {
            Ok(99)
        }
    }

    #[tokio::test]
    async fn custom_extractor() {
        let (app, ..) = app(None);
        let app = app.extractor(KeyEcho);

        assert_eq!(
            get(&app, "github?query=anything").await,
            ok_html(
                "Full Name: FULL<br>Repository Name: NAME<br>ID: 99<br>\
                 Login Name: LOGIN<br>Owner Name: NAME<br>"
            )
        );
    }

    #[tokio::test]
    async fn no_route_is_empty() {
        let (app, ..) = app(Some(PAYLOAD));

        for target in ["json?x=1", "favicon.ico", "kiss?x=1", "/"] {
            assert_eq!(get(&app, target).await, "", "target: {target}");
        }
    }
}
