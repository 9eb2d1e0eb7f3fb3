//! Ordered route table.
//!
//! Targets are matched against [`ROUTES`] top to bottom and the first
//! matching predicate wins. There is no path normalization: the predicates
//! look at the raw target (without its leading `/`), so `json?x=1` is not
//! the `json` endpoint while `x/file/y` is the file endpoint.
//!
//! The parameter string handed to an endpoint is the target with every
//! occurrence of its marker removed, so text before the marker is kept:
//! `a/file/b` reads the file `a/b`.

use std::borrow::Cow;

/// How a route recognizes a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The target is the empty string.
    Empty,
    /// The target equals the literal, ignoring ASCII case.
    EqualsIgnoreCase(&'static str),
    /// The target contains the literal anywhere.
    Contains(&'static str),
}

impl Predicate {
    /// Tests the target. On a match returns the parameter string handed to
    /// the endpoint: the target with every occurrence of the literal removed
    /// for [`Contains`](Predicate::Contains), the empty string otherwise.
    #[inline]
    pub fn matches<'a>(&self, target: &'a str) -> Option<Cow<'a, str>> {
        match *self {
            Predicate::Empty => target.is_empty().then_some(Cow::Borrowed("")),
            Predicate::EqualsIgnoreCase(literal) => target
                .eq_ignore_ascii_case(literal)
                .then_some(Cow::Borrowed("")),
            Predicate::Contains(literal) => target
                .contains(literal)
                .then(|| Cow::Owned(target.replace(literal, ""))),
        }
    }
}

/// Endpoints a target can be dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Root,
    Json,
    Random,
    File,
    Multiply,
    Github,
    Circle,
    Triangle,
}

/// A predicate paired with the endpoint it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub predicate: Predicate,
    pub endpoint: Endpoint,
}

const fn route(predicate: Predicate, endpoint: Endpoint) -> Route {
    Route {
        predicate,
        endpoint,
    }
}

/// The route table, in precedence order.
pub static ROUTES: &[Route] = &[
    route(Predicate::Empty, Endpoint::Root),
    route(Predicate::EqualsIgnoreCase("json"), Endpoint::Json),
    route(Predicate::EqualsIgnoreCase("random"), Endpoint::Random),
    route(Predicate::Contains("file/"), Endpoint::File),
    route(Predicate::Contains("multiply?"), Endpoint::Multiply),
    route(Predicate::Contains("github?"), Endpoint::Github),
    route(Predicate::Contains("circle?"), Endpoint::Circle),
    route(Predicate::Contains("triangle?"), Endpoint::Triangle),
];

/// Routes a target through [`ROUTES`].
///
/// # Examples
/// ```
/// use fun_web::router::{self, Endpoint};
///
/// assert_eq!(router::route_target("JSON"), Some((Endpoint::Json, "".into())));
/// assert_eq!(
///     router::route_target("multiply?num1=3&num2=4"),
///     Some((Endpoint::Multiply, "num1=3&num2=4".into()))
/// );
/// assert_eq!(router::route_target("favicon.ico"), None);
/// ```
pub fn route_target(target: &str) -> Option<(Endpoint, Cow<'_, str>)> {
    ROUTES.iter().find_map(|route| {
        route
            .predicate
            .matches(target)
            .map(|remainder| (route.endpoint, remainder))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routed(target: &str) -> Option<(Endpoint, String)> {
        route_target(target).map(|(endpoint, params)| (endpoint, params.into_owned()))
    }

    #[test]
    fn table() {
        #[rustfmt::skip]
        let cases = [
            ("",                                    Some((Endpoint::Root, ""))),
            ("json",                                Some((Endpoint::Json, ""))),
            ("JsOn",                                Some((Endpoint::Json, ""))),
            ("random",                              Some((Endpoint::Random, ""))),
            ("RANDOM",                              Some((Endpoint::Random, ""))),
            ("file/www/root.html",                  Some((Endpoint::File, "www/root.html"))),
            ("a/file/b",                            Some((Endpoint::File, "a/b"))),
            ("multiply?num1=3&num2=4",              Some((Endpoint::Multiply, "num1=3&num2=4"))),
            ("github?query=users/x/repos",          Some((Endpoint::Github, "query=users/x/repos"))),
            ("circle?howMany=3&radius=5",           Some((Endpoint::Circle, "howMany=3&radius=5"))),
            ("triangle?howMany=2&length=3",         Some((Endpoint::Triangle, "howMany=2&length=3"))),
            ("circle?",                             Some((Endpoint::Circle, ""))),
            ("xmultiply?num1=2&num2=3",             Some((Endpoint::Multiply, "xnum1=2&num2=3"))),

            ("json?x=1",                            None),
            ("json/",                               None),
            ("randomly",                            None),
            ("multiply",                            None),
            ("file",                                None),
            ("kiss?name=x",                         None),
            ("index.html",                          None),
            ("/",                                   None),
        ];

        for (target, expected) in cases {
            let expected = expected.map(|(endpoint, params)| (endpoint, params.to_owned()));
            assert_eq!(routed(target), expected, "target: {target:?}");
        }
    }

    #[test]
    fn first_match_wins() {
        #[rustfmt::skip]
        let cases = [
            ("file/multiply?num1=2",        Endpoint::File),
            ("multiply?x=file/",            Endpoint::File),
            ("multiply?q=github?",          Endpoint::Multiply),
            ("github?q=circle?",            Endpoint::Github),
            ("triangle?circle?",            Endpoint::Circle),
        ];

        for (target, expected) in cases {
            assert_eq!(
                route_target(target).map(|(endpoint, _)| endpoint),
                Some(expected),
                "target: {target:?}"
            );
        }
    }

    #[test]
    fn every_marker_occurrence_is_removed() {
        #[rustfmt::skip]
        let cases = [
            ("circle?howMany=1&x=circle?",  Endpoint::Circle,   "howMany=1&x="),
            ("file/file/a.txt",             Endpoint::File,     "a.txt"),
            ("docs/file/notes.txt",         Endpoint::File,     "docs/notes.txt"),
            ("xmultiply?num1=2&num2=3",     Endpoint::Multiply, "xnum1=2&num2=3"),
        ];

        for (target, endpoint, params) in cases {
            assert_eq!(
                routed(target),
                Some((endpoint, params.to_owned())),
                "target: {target:?}"
            );
        }
    }

    #[test]
    fn table_order() {
        let endpoints: Vec<Endpoint> = ROUTES.iter().map(|r| r.endpoint).collect();

        assert_eq!(
            endpoints,
            [
                Endpoint::Root,
                Endpoint::Json,
                Endpoint::Random,
                Endpoint::File,
                Endpoint::Multiply,
                Endpoint::Github,
                Endpoint::Circle,
                Endpoint::Triangle,
            ]
        );
    }
}
