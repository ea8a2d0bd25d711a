//! Integration tests for single routes
//!
//! Template compilation, path parsing, URL generation and the helpers around
//! them, one route at a time.

use pretty_assertions::assert_eq;
use rhtmx_routing::{Params, Route, RouteOptions, Value, METHOD_KEY};
use rstest::rstest;

fn route(template: &str, defaults: Params) -> Route {
    Route::new(template, defaults, RouteOptions::new())
}

fn controller_action(controller: &str, action: &str) -> Params {
    Params::new()
        .with("controller", controller)
        .with("action", action)
}

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_compile_with_id_constraint() {
    let route = Route::new(
        "/:controller/:action/:id",
        Params::new().with("plugin", Value::Null),
        RouteOptions::new().with_pattern("id", "[0-9]+"),
    );
    let compiled = route.compile().unwrap();

    assert!(compiled.is_match("/posts/view/1"));
    assert!(compiled.is_match("/posts/view/922"));
    assert!(!compiled.is_match("/posts/edit/name-of-post"));
    assert!(!compiled.is_match("/posts/edit/4/other:param"));
    assert_eq!(compiled.keys(), ["controller", "action", "id"]);
}

#[rstest]
#[case("/posts/:id-:title", "/posts/1-name-of-article", true)]
#[case("/posts/:id-:title", "/posts/13-name-of-article", true)]
#[case("/posts/:id-:title", "/posts/11", false)]
#[case("/posts/:id-:title", "/posts/11!nameofarticle", false)]
#[case("/posts/:id::title", "/posts/1::name-of-article", true)]
#[case("/posts/:id::title", "/posts/11!nameofarticle", false)]
#[case("/posts/:id::title", "/posts/11", false)]
#[case("/posts/:id.:title", "/posts/1.name-of-article", true)]
#[case("/posts/:id.:title", "/posts/1-name-of-article", false)]
fn test_compile_custom_delimiters(#[case] template: &str, #[case] path: &str, #[case] expected: bool) {
    let route = Route::new(
        template,
        controller_action("posts", "view"),
        RouteOptions::new().with_pattern("id", r"[\d]+"),
    );
    assert_eq!(route.compile().unwrap().is_match(path), expected);
}

#[test]
fn test_adjacent_placeholders_split_at_first_separator() {
    let route = route("/posts/:id-:title", controller_action("posts", "view"));
    let params = route.parse("/posts/1-name-of-article", None).unwrap();

    assert_eq!(params.text("id"), Some("1"));
    assert_eq!(params.text("title"), Some("name-of-article"));
}

#[test]
fn test_compile_greedy_tolerates_trailing_slash() {
    let route = route("/pages/*", controller_action("pages", "display"));
    let compiled = route.compile().unwrap();

    assert!(compiled.is_match("/pages"));
    assert!(compiled.is_match("/pages/"));
    assert!(compiled.is_match("/pages/about/team"));
    assert!(!compiled.is_match("/page"));
}

#[test]
fn test_compile_only_once() {
    let route = route("/:controller/:action", Params::new());
    assert!(!route.is_compiled());

    route.parse("/posts/index", None);
    assert!(route.is_compiled());
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_root_with_positional_default() {
    let route = route("/", controller_action("pages", "display").with_pass("home"));

    let params = route.parse("/", None).unwrap();
    assert_eq!(params, controller_action("pages", "display").with_pass("home"));
    assert_eq!(route.parse("/about", None), None);
}

#[test]
fn test_parse_greedy_segments() {
    let route = route("/:controller/:action/*", Params::new().with("plugin", Value::Null));

    let params = route.parse("/posts/view/1/2/", None).unwrap();
    assert_eq!(
        params,
        controller_action("posts", "view").with_pass("1").with_pass("2")
    );

    let params = route.parse("/posts/view", None).unwrap();
    assert!(params.pass().is_empty());
}

#[test]
fn test_parse_decodes_segments() {
    let route = route("/pages/*", controller_action("pages", "display"));

    let params = route.parse("/pages/word%20space/%E2%88%82", None).unwrap();
    assert_eq!(params.pass(), ["word space".to_string(), "∂".to_string()]);
}

#[test]
fn test_parse_trailing_is_not_split() {
    let route = route("/posts/:action/**", Params::new().with("controller", "posts"));

    let params = route.parse("/posts/index/http://example.com", None).unwrap();
    assert_eq!(params.action(), Some("index"));
    assert_eq!(params.pass(), ["http://example.com".to_string()]);

    let params = route.parse("/posts/index/a/b/c/", None).unwrap();
    assert_eq!(params.pass(), ["a/b/c".to_string()]);
}

#[test]
fn test_parse_trailing_utf8() {
    let route = route("/category/**", controller_action("categories", "index"));

    let params = route
        .parse("/category/%D9%85%D9%88%D8%A8%D8%A7%DB%8C%D9%84", None)
        .unwrap();
    assert_eq!(params.pass(), ["موبایل".to_string()]);
}

#[test]
fn test_parse_pass_option_moves_named_values() {
    let route = Route::new(
        "/:controller/:action/:slug/*",
        Params::new(),
        RouteOptions::new().with_pass(["slug"]),
    );

    let params = route.parse("/posts/view/my-title/extra", None).unwrap();
    assert_eq!(params.get("slug"), None);
    assert_eq!(
        params.pass(),
        ["my-title".to_string(), "extra".to_string()]
    );
}

#[test]
fn test_parse_pass_option_keeps_declared_order() {
    let route = Route::new(
        "/:year/:month/:slug",
        controller_action("posts", "view"),
        RouteOptions::new().with_pass(["month", "year"]),
    );

    let params = route.parse("/2012/04/launch", None).unwrap();
    assert_eq!(params.pass(), ["04".to_string(), "2012".to_string()]);
    assert_eq!(params.text("slug"), Some("launch"));
}

#[test]
fn test_parse_optional_leading_element() {
    let route = Route::new(
        "/:extra/page/:slug/*",
        controller_action("pages", "view").with("extra", Value::Null),
        RouteOptions::new()
            .with_pattern("extra", "[a-z1-9_]*")
            .with_pattern("slug", "[a-z1-9_]+")
            .with_pattern("action", "view"),
    );

    let params = route.parse("/some_extra/page/this_is_the_slug", None).unwrap();
    assert_eq!(params.text("extra"), Some("some_extra"));
    assert_eq!(params.text("slug"), Some("this_is_the_slug"));

    let params = route.parse("/page/this_is_the_slug", None).unwrap();
    assert_eq!(params.get("extra"), None);
    assert_eq!(params.text("slug"), Some("this_is_the_slug"));
}

#[test]
fn test_parse_method_constraint() {
    let route = route(
        "/posts",
        controller_action("posts", "add").with(METHOD_KEY, "POST"),
    );

    assert_eq!(route.parse("/posts", Some("GET")), None);
    let params = route.parse("/posts", Some("POST")).unwrap();
    assert_eq!(params.text(METHOD_KEY), Some("POST"));
}

// ============================================================================
// Matching (URL generation)
// ============================================================================

#[test]
fn test_match_basic() {
    let route = route("/:controller/:action/:id", Params::new().with("plugin", Value::Null));

    let url = controller_action("posts", "view").with("plugin", Value::Null);
    assert_eq!(route.match_url(&url), None);

    let url = url.with("id", 1);
    assert_eq!(route.match_url(&url).as_deref(), Some("/posts/view/1"));
}

#[test]
fn test_match_positional_defaults() {
    let route = route("/", controller_action("pages", "display").with_pass("home"));

    let home = controller_action("pages", "display").with_pass("home");
    assert_eq!(route.match_url(&home).as_deref(), Some("/"));

    let about = controller_action("pages", "display").with_pass("about");
    assert_eq!(route.match_url(&about), None);
}

#[test]
fn test_match_greedy_route() {
    let route = route("/pages/*", controller_action("pages", "display"));

    let url = controller_action("pages", "display").with_pass("home");
    assert_eq!(route.match_url(&url).as_deref(), Some("/pages/home"));

    let url = controller_action("pages", "display").with_pass("about");
    assert_eq!(route.match_url(&url).as_deref(), Some("/pages/about"));
}

#[test]
fn test_match_default_mismatch() {
    let route = route("/blog/:action", Params::new().with("controller", "posts"));

    assert_eq!(
        route.match_url(&controller_action("posts", "view")).as_deref(),
        Some("/blog/view")
    );
    assert_eq!(route.match_url(&controller_action("nodes", "view")), None);
}

#[test]
fn test_match_prefixed_route() {
    let route = route(
        "/admin/subscriptions/:action/*",
        Params::new()
            .with("controller", "subscribe")
            .with("admin", true)
            .with("prefix", "admin"),
    );
    let url = controller_action("subscribe", "edit")
        .with("admin", true)
        .with_pass(1);

    assert_eq!(
        route.match_url(&url).as_deref(),
        Some("/admin/subscriptions/edit/1")
    );
}

#[test]
fn test_match_custom_separator() {
    let route = route("/:controller/:action-:id", Params::new());
    let url = controller_action("posts", "view").with("id", 1);

    assert_eq!(route.match_url(&url).as_deref(), Some("/posts/view-1"));
}

#[test]
fn test_match_checks_constraints() {
    let route = Route::new(
        "/:lang/:controller/:action/:id",
        Params::new().with("controller", "testing4"),
        RouteOptions::new()
            .with_pattern("id", "[0-9]+")
            .with_pattern("lang", "[a-z]{3}"),
    );

    let url = controller_action("testing4", "index")
        .with("lang", "eng")
        .with("id", 1);
    assert_eq!(route.match_url(&url).as_deref(), Some("/eng/testing4/index/1"));

    let url = controller_action("testing4", "index")
        .with("lang", "english")
        .with("id", 1);
    assert_eq!(route.match_url(&url), None);
}

#[test]
fn test_match_non_greedy_rejects_extra_arguments() {
    let route = route("/:controller/:action", Params::new().with("plugin", Value::Null));

    let url = controller_action("posts", "view").with_pass(0);
    assert_eq!(route.match_url(&url), None);

    let url = controller_action("posts", "view").with("page", 2);
    assert_eq!(route.match_url(&url), None);

    let url = controller_action("posts", "view").with("admin", false);
    assert_eq!(route.match_url(&url).as_deref(), Some("/posts/view"));
}

#[test]
fn test_match_rejects_empty_required_key() {
    let route = route("/:controller/:action", Params::new());

    let url = controller_action("posts", "");
    assert_eq!(route.match_url(&url), None);
    assert_eq!(route.parse("/posts/", None), None);
}

#[test]
fn test_match_prefix_default_without_flag() {
    let route = route(
        "/admin/:controller",
        Params::new()
            .with("prefix", "admin")
            .with("plugin", Value::Null)
            .with("action", "index"),
    );

    let parsed = Params::new()
        .with("prefix", "admin")
        .with("controller", "posts")
        .with("action", "admin_index");
    assert_eq!(route.match_url(&parsed).as_deref(), Some("/admin/posts"));

    let flagged = controller_action("posts", "index").with("admin", true);
    assert_eq!(route.match_url(&flagged).as_deref(), Some("/admin/posts"));

    assert_eq!(route.match_url(&controller_action("posts", "index")), None);

    let other_prefix = controller_action("posts", "index").with("prefix", "manager");
    assert_eq!(route.match_url(&other_prefix), None);
}

#[test]
fn test_match_skips_empty_pass_values() {
    let route = route("/:controller/:action/*", Params::new());
    let url = controller_action("posts", "view")
        .with_pass("a")
        .with_pass("")
        .with_pass("b");

    let path = route.match_url(&url).unwrap();
    assert_eq!(path, "/posts/view/a/b");
    assert_eq!(route.parse(&path, None).unwrap().pass(), ["a".to_string(), "b".to_string()]);
}

#[test]
fn test_match_optional_element_left_out() {
    let route = Route::new(
        "/:extra/page/:slug/*",
        controller_action("pages", "view").with("extra", Value::Null),
        RouteOptions::new()
            .with_pattern("extra", "[a-z1-9_]*")
            .with_pattern("slug", "[a-z1-9_]+"),
    );

    let url = controller_action("pages", "view").with("slug", "home");
    assert_eq!(route.match_url(&url).as_deref(), Some("/page/home"));

    let url = url.with("extra", "special");
    assert_eq!(route.match_url(&url).as_deref(), Some("/special/page/home"));
}

#[test]
fn test_match_encodes_values() {
    let route = route("/:controller/:action/*", Params::new());
    let url = controller_action("posts", "view").with_pass("word space");

    assert_eq!(
        route.match_url(&url).as_deref(),
        Some("/posts/view/word%20space")
    );
}

#[test]
fn test_match_trailing_keeps_slashes() {
    let route = route("/pages/**", controller_action("pages", "display"));
    let url = controller_action("pages", "display").with_pass("test/ spaces/漢字/la†în");

    assert_eq!(
        route.match_url(&url).as_deref(),
        Some("/pages/test/%20spaces/%E6%BC%A2%E5%AD%97/la%E2%80%A0%C3%AEn")
    );
}

#[test]
fn test_match_pass_option_reads_positional_values() {
    let route = Route::new(
        "/:controller/:action/:slug",
        Params::new(),
        RouteOptions::new().with_pass(["slug"]),
    );
    let url = controller_action("posts", "view").with_pass("my-title");

    assert_eq!(route.match_url(&url).as_deref(), Some("/posts/view/my-title"));
}

// ============================================================================
// Round trips
// ============================================================================

#[rstest]
#[case("/:controller/:action/*", Params::new(), "/posts/view/1/2")]
#[case("/pages/*", controller_action("pages", "display"), "/pages/about/team")]
#[case("/pages/*", controller_action("pages", "display"), "/pages/word%20space")]
#[case("/posts/:id-:title", controller_action("posts", "view"), "/posts/1-name-of-article")]
#[case("/docs/**", controller_action("docs", "show"), "/docs/guide/intro")]
#[case("/", controller_action("pages", "display").with_pass("home"), "/")]
fn test_parse_then_match_round_trip(
    #[case] template: &str,
    #[case] defaults: Params,
    #[case] path: &str,
) {
    let route = route(template, defaults);
    let params = route.parse(path, None).unwrap();

    assert_eq!(route.match_url(&params).as_deref(), Some(path));
}

#[test]
fn test_pass_option_round_trip() {
    let route = Route::new(
        "/:controller/:action/:slug/*",
        Params::new(),
        RouteOptions::new().with_pass(["slug"]),
    );
    let params = route.parse("/posts/view/my-title/2", None).unwrap();

    assert_eq!(
        route.match_url(&params).as_deref(),
        Some("/posts/view/my-title/2")
    );
}

// ============================================================================
// Persistence and names
// ============================================================================

#[test]
fn test_persist_params() {
    let route = Route::new(
        "/:lang/:color/blog/:action",
        Params::new().with("controller", "posts"),
        RouteOptions::new().with_persist(["lang", "color"]),
    );
    let current = Params::new().with("lang", "en").with("color", "blue");

    let url = route.persist_params(controller_action("posts", "index"), &current);
    assert_eq!(url.text("lang"), Some("en"));
    assert_eq!(url.text("color"), Some("blue"));
    assert_eq!(route.match_url(&url).as_deref(), Some("/en/blue/blog/index"));

    let url = route.persist_params(
        controller_action("posts", "index").with("color", "red"),
        &current,
    );
    assert_eq!(url.text("lang"), Some("en"));
    assert_eq!(url.text("color"), Some("red"));
}

#[rstest]
#[case("/:controller/:action", Params::new().with("plugin", Value::Null), "_controller:_action")]
#[case("/posts/view", controller_action("posts", "view").with("plugin", Value::Null), "posts:view")]
#[case("/blog/:action", Params::new().with("plugin", "Blog").with("controller", "Posts"), "blog.posts:_action")]
#[case("/:plugin/:controller/:action", Params::new(), "_plugin._controller:_action")]
fn test_generated_names(#[case] template: &str, #[case] defaults: Params, #[case] expected: &str) {
    assert_eq!(route(template, defaults).name(), expected);
}

#[test]
fn test_explicit_name() {
    let route = Route::new(
        "/articles/:action",
        Params::new().with("controller", "posts"),
        RouteOptions::new().with_name("Articles"),
    );
    assert_eq!(route.name(), "Articles");
}
