use super::*;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Request;

#[test]
fn test_parse_params_keeps_repeats_and_decodes() {
    let mut params = ParamMap::new();
    parse_params("key=this&key=that&q=a%20b+c&blank=&=empty", &mut params);

    assert_eq!(params["key"], vec!["this", "that"]);
    assert_eq!(params["q"], vec!["a b c"]);
    assert_eq!(params["blank"], vec![""]);
    assert_eq!(params[""], vec!["empty"]);
}

#[test]
fn test_parse_params_bare_key_has_no_values() {
    let mut params = ParamMap::new();
    parse_params("flag&other=1", &mut params);
    assert_eq!(params["flag"], Vec::<String>::new());
    assert_eq!(params["other"], vec!["1"]);

    // A later occurrence with a value still appends
    parse_params("flag=on", &mut params);
    assert_eq!(params["flag"], vec!["on"]);
}

#[test]
fn test_header_values_absent_vs_present() {
    let req = CapturedRequest::new("GET", "/")
        .with_header("Some-Header", "foo")
        .with_header("Some-Header", "bar");

    assert_eq!(req.header_values("Some-Header"), Some(vec!["foo", "bar"]));
    // Lookup is case-insensitive
    assert_eq!(req.header_values("some-header"), Some(vec!["foo", "bar"]));
    assert_eq!(req.header_values("Cache-Control"), None);
}

#[test]
fn test_header_present_with_empty_value() {
    let req = CapturedRequest::new("GET", "/").with_header("X-Empty", "");
    assert_eq!(req.header_values("X-Empty"), Some(vec![""]));
}

#[test]
fn test_body_text_errors() {
    let bad_utf8 = CapturedRequest::new("POST", "/").with_body(vec![0xff, 0xfe]);
    assert_eq!(bad_utf8.body_text(), Err(BodyError::NotUtf8));

    let failed = CapturedRequest::new("POST", "/")
        .with_body_error(BodyError::Read("connection reset".to_string()));
    assert!(matches!(failed.body_text(), Err(BodyError::Read(_))));
}

#[tokio::test]
async fn test_from_request_captures_query_headers_and_body() {
    let req = Request::builder()
        .method("PUT")
        .uri("/orders/7?expand=items&expand=customer")
        .header("Content-Type", "application/json")
        .header("X-Trace", "abc")
        .body(Full::new(Bytes::from_static(br#"{"qty":2}"#)))
        .unwrap();

    let captured = CapturedRequest::from_request(req).await;

    assert_eq!(captured.method(), "PUT");
    assert_eq!(captured.path_info(), "/orders/7");
    assert_eq!(captured.query(), Some("expand=items&expand=customer"));
    assert_eq!(captured.params()["expand"], vec!["items", "customer"]);
    assert_eq!(captured.content_type(), Some("application/json"));
    assert_eq!(captured.header_values("x-trace"), Some(vec!["abc"]));
    assert_eq!(captured.body_text(), Ok(r#"{"qty":2}"#));
}

#[tokio::test]
async fn test_from_request_decodes_path() {
    let req = Request::builder()
        .method("GET")
        .uri("/files/my%20doc/a+b%2Fc")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let captured = CapturedRequest::from_request(req).await;
    assert_eq!(captured.path_info(), "/files/my doc/a+b/c");
}

#[tokio::test]
async fn test_from_request_keeps_undecodable_path() {
    let req = Request::builder()
        .method("GET")
        .uri("/bytes/%FF")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let captured = CapturedRequest::from_request(req).await;
    assert_eq!(captured.path_info(), "/bytes/%FF");
}

#[tokio::test]
async fn test_from_request_merges_form_fields() {
    let req = Request::builder()
        .method("POST")
        .uri("/login?next=%2Fhome")
        .header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
        .body(Full::new(Bytes::from_static(b"user=jo&scope=a&scope=b")))
        .unwrap();

    let captured = CapturedRequest::from_request(req).await;

    assert_eq!(captured.params()["next"], vec!["/home"]);
    assert_eq!(captured.params()["user"], vec!["jo"]);
    assert_eq!(captured.params()["scope"], vec!["a", "b"]);
    // The body stays readable as text after form parsing
    assert_eq!(captured.body_text(), Ok("user=jo&scope=a&scope=b"));
}

#[test]
fn test_summary_serializes() {
    let req = CapturedRequest::new("GET", "/things")
        .with_query("a=1")
        .with_header("Accept", "text/plain");
    let summary = req.summary();

    assert_eq!(summary.to_string(), "GET /things?a=1");
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["method"], "GET");
    assert_eq!(json["params"]["a"][0], "1");
    assert_eq!(json["headers"]["accept"][0], "text/plain");
    assert!(json.get("body").is_none());
}
