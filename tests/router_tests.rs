use chainroute::{MatchError, Request, Response, RouteError, Router, RouterConfig};
use http::{Method, StatusCode};

fn named(name: &'static str) -> impl Fn(&mut Request, &mut Response) + Send + Sync + 'static {
    move |_req: &mut Request, resp: &mut Response| resp.body.push_str(name)
}

fn verb_zoo() -> Router {
    let router = Router::default();
    router.get("/", named("root_handler")).unwrap();
    router.get("/zoo/animals", named("get_animals")).unwrap();
    router.post("/zoo/animals", named("create_animal")).unwrap();
    router.get("/zoo/animals/{id}", named("get_animal")).unwrap();
    router.put("/zoo/animals/{id}", named("update_animal")).unwrap();
    router.patch("/zoo/animals/{id}", named("patch_animal")).unwrap();
    router.delete("/zoo/animals/{id}", named("delete_animal")).unwrap();
    router.head("/zoo/health", named("health_check")).unwrap();
    router.options("/zoo/health", named("supported_ops")).unwrap();
    router
}

fn call(router: &Router, method: Method, target: &str) -> (StatusCode, String) {
    let mut req = Request::new(method, target);
    let mut resp = Response::new();
    router.dispatch(&mut req, &mut resp);
    (resp.status, resp.body)
}

#[test]
fn test_verb_routes() {
    let router = verb_zoo();
    let cases = [
        (Method::GET, "/", "root_handler"),
        (Method::GET, "/zoo/animals", "get_animals"),
        (Method::POST, "/zoo/animals", "create_animal"),
        (Method::GET, "/zoo/animals/1", "get_animal"),
        (Method::PUT, "/zoo/animals/1", "update_animal"),
        (Method::PATCH, "/zoo/animals/1", "patch_animal"),
        (Method::DELETE, "/zoo/animals/1", "delete_animal"),
        (Method::HEAD, "/zoo/health", "health_check"),
        (Method::OPTIONS, "/zoo/health", "supported_ops"),
    ];
    for (method, path, expected) in cases {
        let (status, body) = call(&router, method.clone(), path);
        assert_eq!(status, StatusCode::OK, "{method} {path}");
        assert_eq!(body, expected, "{method} {path}");
    }
}

#[test]
fn test_unknown_path_and_method() {
    let router = verb_zoo();
    assert_eq!(
        call(&router, Method::GET, "/zoo/unknown/x"),
        (StatusCode::NOT_FOUND, "Not Found.".to_string())
    );
    assert_eq!(
        call(&router, Method::DELETE, "/zoo/animals"),
        (StatusCode::NOT_IMPLEMENTED, "Not Implemented.".to_string())
    );
}

#[test]
fn test_literal_beats_wildcard_beats_catch_all() {
    let router = Router::default();
    router.get("/users/me", named("me")).unwrap();
    router.get("/users/{id}", named("by_id")).unwrap();
    router.get("/users/^", named("rest")).unwrap();

    assert_eq!(call(&router, Method::GET, "/users/me").1, "me");
    assert_eq!(call(&router, Method::GET, "/users/42").1, "by_id");
    assert_eq!(call(&router, Method::GET, "/users/42/avatar").1, "rest");
}

#[test]
fn test_no_backtracking_after_literal_step() {
    let router = Router::default();
    router.get("/a/b/c", named("abc")).unwrap();
    router.get("/a/{x}/d", named("xd")).unwrap();
    // "b" commits the walk to the literal branch, which has no "d".
    assert_eq!(call(&router, Method::GET, "/a/b/d").0, StatusCode::NOT_FOUND);
    assert_eq!(call(&router, Method::GET, "/a/z/d").1, "xd");
}

#[test]
fn test_regex_constraint_is_anchored() {
    let router = Router::default();
    router.get("/n/{n: [0-9]+}", named("num")).unwrap();
    assert_eq!(call(&router, Method::GET, "/n/123").1, "num");
    assert_eq!(call(&router, Method::GET, "/n/12a").0, StatusCode::NOT_FOUND);
}

#[test]
fn test_wildcard_does_not_match_empty_segment() {
    let router = Router::new(RouterConfig {
        strict: false,
        ..RouterConfig::default()
    });
    router.get("/items/{id}", named("item")).unwrap();
    router.get("/items", named("list")).unwrap();
    let mut req = Request::new(Method::GET, "/items/");
    let mut resp = Response::new();
    router.dispatch(&mut req, &mut resp);
    assert_eq!(resp.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.location(), Some("/items"));
}

#[test]
fn test_params_visible_to_handler() {
    let router = Router::default();
    router
        .get("/orgs/{org}/repos/{repo}", |req: &mut Request, resp: &mut Response| {
            let org = req.param("org").unwrap_or_default().to_string();
            let repo = req.param("repo").unwrap_or_default().to_string();
            resp.body = format!("{org}/{repo}");
        })
        .unwrap();
    assert_eq!(call(&router, Method::GET, "/orgs/rust-lang/repos/rust?x=1").1, "rust-lang/rust");
}

#[test]
fn test_reregistration_replaces_handler() {
    let router = Router::default();
    router.get("/v", named("one")).unwrap();
    router.get("/v", named("two")).unwrap();
    assert_eq!(call(&router, Method::GET, "/v").1, "two");
    assert_eq!(router.routes().len(), 1);
}

#[test]
fn test_registration_errors() {
    let router = Router::default();
    assert!(matches!(
        router.get("/a/*", named("x")),
        Err(RouteError::ReservedToken { .. })
    ));
    assert!(matches!(
        router.get("/a/{id", named("x")),
        Err(RouteError::InvalidTemplate { .. })
    ));
    assert!(matches!(
        router.get("/a/{id: (}", named("x")),
        Err(RouteError::PatternCompile { .. })
    ));
    let err = router.get("/a/{id: (}", named("x")).unwrap_err();
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().contains("{id: (}"));
}

#[test]
fn test_resolve_does_not_run_handler() {
    let router = verb_zoo();
    let found = router.resolve(&Method::GET, "/zoo/animals/9").unwrap();
    assert_eq!(found.path, "/zoo/animals/{id}");
    assert_eq!(found.param("id"), Some("9"));
    assert_eq!(
        router.resolve(&Method::GET, "/zoo/animals/9/").unwrap_err(),
        MatchError::RedirectSlash
    );
    assert_eq!(
        router.resolve(&Method::GET, "/nothing").unwrap_err(),
        MatchError::NotFound
    );
}

#[test]
fn test_catch_all_covers_paths_after_wildcard_descent() {
    let router = Router::default();
    router
        .get("/files/{name}/meta", |req: &mut Request, resp: &mut Response| {
            resp.body = format!("meta:{}", req.param("name").unwrap_or_default());
        })
        .unwrap();
    router
        .get("/files/^", |req: &mut Request, resp: &mut Response| {
            resp.body = format!("rest:{}", req.params().len());
        })
        .unwrap();

    assert_eq!(call(&router, Method::GET, "/files/a/meta").1, "meta:a");
    assert_eq!(call(&router, Method::GET, "/files/a/b/c").1, "rest:0");
    assert_eq!(call(&router, Method::GET, "/files/a").1, "rest:0");

    // Same shape once the routes live in a group.
    router.group("/files").unwrap();
    assert_eq!(call(&router, Method::GET, "/files/a/other").1, "rest:0");
    assert_eq!(call(&router, Method::GET, "/files/a/meta").1, "meta:a");
}
