use super::Router;
use crate::config::RouterConfig;
use crate::context::{Request, Response};
use crate::error::{MatchError, RouteError};
use http::{Method, StatusCode};

fn echo(tag: &'static str) -> impl Fn(&mut Request, &mut Response) + Send + Sync + 'static {
    move |req: &mut Request, resp: &mut Response| {
        resp.body.push_str(tag);
        for (name, value) in req.params() {
            resp.body.push_str(&format!(" {name}={value}"));
        }
    }
}

fn send(router: &Router, method: Method, target: &str) -> Response {
    let mut req = Request::new(method, target);
    let mut resp = Response::new();
    router.dispatch(&mut req, &mut resp);
    resp
}

fn lenient() -> Router {
    Router::new(RouterConfig {
        strict: false,
        ..RouterConfig::default()
    })
}

#[test]
fn test_constrained_wildcard_scenario() {
    for strict in [true, false] {
        let router = Router::new(RouterConfig {
            strict,
            ..RouterConfig::default()
        });
        router.get("/path/{id: ^[0-9]+$}/handler", echo("h")).unwrap();

        let resp = send(&router, Method::GET, "/path/42/handler");
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, "h id=42");

        let resp = send(&router, Method::GET, "/path/abc/handler");
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.body, "Not Found.");

        let resp = send(&router, Method::GET, "/path/42/handler/");
        if strict {
            assert_eq!(resp.status, StatusCode::NOT_FOUND);
        } else {
            assert_eq!(resp.status, StatusCode::MOVED_PERMANENTLY);
            assert_eq!(resp.location(), Some("/path/42/handler"));
        }
    }
}

#[test]
fn test_trailing_slash_redirect_adds_slash() {
    let router = lenient();
    router.get("/docs/", echo("d")).unwrap();
    let resp = send(&router, Method::GET, "/docs?page=2");
    assert_eq!(resp.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.location(), Some("/docs/?page=2"));
}

#[test]
fn test_unclean_path_redirects() {
    let router = Router::default();
    router.get("/a/b", echo("ab")).unwrap();
    let resp = send(&router, Method::GET, "/a//x/../b?q=1");
    assert_eq!(resp.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.location(), Some("/a/b?q=1"));
}

#[test]
fn test_unclean_path_matched_in_place_without_redirect() {
    let router = Router::new(RouterConfig {
        redirect_fixed_path: false,
        ..RouterConfig::default()
    });
    router.get("/a/b", echo("ab")).unwrap();
    let resp = send(&router, Method::GET, "/a/./b");
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ab");
}

#[test]
fn test_method_not_implemented() {
    let router = Router::default();
    router.get("/items", echo("list")).unwrap();
    let resp = send(&router, Method::POST, "/items");
    assert_eq!(resp.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(resp.body, "Not Implemented.");
    assert_eq!(
        router.resolve(&Method::POST, "/items").unwrap_err(),
        MatchError::MethodNotImplemented
    );
}

#[test]
fn test_custom_not_found_handler() {
    let router = Router::default();
    router.not_found(|req: &mut Request, resp: &mut Response| {
        resp.text(StatusCode::NOT_FOUND, &format!("nothing at {}", req.path));
    });
    let resp = send(&router, Method::GET, "/missing");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body, "nothing at /missing");
}

#[test]
fn test_root_route() {
    let router = Router::default();
    router.get("/", echo("root")).unwrap();
    assert_eq!(send(&router, Method::GET, "/").body, "root");
    assert_eq!(send(&router, Method::GET, "").status, StatusCode::MOVED_PERMANENTLY);
}

#[test]
fn test_catch_all_absorbs_rest() {
    let router = Router::default();
    router.get("/static/^", echo("files")).unwrap();
    router.get("/static/logo.png", echo("logo")).unwrap();
    assert_eq!(send(&router, Method::GET, "/static/css/site.css").body, "files");
    assert_eq!(send(&router, Method::GET, "/static/logo.png").body, "logo");
}

#[test]
fn test_segments_after_catch_all_are_dropped() {
    let router = Router::default();
    let endpoint = router.get("/files/^/ignored", echo("f")).unwrap();
    assert_eq!(endpoint.path(), "/files/^");
    assert_eq!(send(&router, Method::GET, "/files/a/b").body, "f");
}

#[test]
fn test_reserved_token_rejected() {
    let router = Router::default();
    let err = router.get("/files/*", echo("x")).unwrap_err();
    assert!(matches!(err, RouteError::ReservedToken { .. }));
    assert!(router.routes().is_empty());
}

#[test]
fn test_bad_pattern_rejected_without_side_effects() {
    let router = Router::default();
    router.get("/ok", echo("ok")).unwrap();
    let err = router.get("/bad/{id: [0-9}", echo("x")).unwrap_err();
    assert!(matches!(err, RouteError::PatternCompile { .. }));
    assert_eq!(router.routes().len(), 1);
}

#[test]
fn test_wildcard_conflict_rejected() {
    let router = Router::default();
    router.get("/users/{id}", echo("u")).unwrap();
    let err = router.get("/users/{name}/posts", echo("p")).unwrap_err();
    assert!(matches!(err, RouteError::WildcardConflict { .. }));
    assert_eq!(send(&router, Method::GET, "/users/7").body, "u id=7");
}

#[test]
fn test_resolve_reports_template_and_group() {
    let router = Router::default();
    router
        .group("/orgs/{org}")
        .unwrap()
        .get("/members/{user}", echo("m"))
        .unwrap();
    let found = router.resolve(&Method::GET, "/orgs/acme/members/ann").unwrap();
    assert_eq!(found.path, "/orgs/{org}/members/{user}");
    assert_eq!(found.group, "/orgs/{org}");
    assert_eq!(found.param("org"), Some("acme"));
    assert_eq!(found.param("user"), Some("ann"));
    assert!(found.chain().has_terminal());
}

#[test]
fn test_routes_listing_is_breadth_first() {
    let router = Router::default();
    router.get("/b/deep/path", echo("3")).unwrap();
    router.get("/a", echo("1")).unwrap();
    router.post("/a", echo("1p")).unwrap();
    router.get("/b", echo("2")).unwrap();
    let listed: Vec<(String, String)> = router
        .routes()
        .into_iter()
        .map(|r| (r.method.to_string(), r.path))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("GET".to_string(), "/a".to_string()),
            ("POST".to_string(), "/a".to_string()),
            ("GET".to_string(), "/b".to_string()),
            ("GET".to_string(), "/b/deep/path".to_string()),
        ]
    );
}
