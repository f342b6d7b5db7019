use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn call(
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), Box<dyn std::error::Error>> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };
    let response = xmlform_api::router().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    if !status.is_success() {
        return Err(format!("{uri} answered {status}: {}", String::from_utf8_lossy(&bytes)).into());
    }
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn test_health() -> TestResult {
    let (status, body) = call("GET", "/api/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn test_kinds_lists_every_content_kind() -> TestResult {
    let (_, body) = call("GET", "/api/kinds", None).await?;
    let kinds = body.as_array().ok_or("expected an array")?;
    assert_eq!(kinds.len(), 9);
    assert!(kinds.contains(&json!("email")));
    Ok(())
}

#[tokio::test]
async fn test_document_builds_view() -> TestResult {
    let (status, body) = call(
        "POST",
        "/api/document",
        Some(json!({"xml": "<person><name>Ada</name><email>ada@example.com</email></person>"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["document"]["root"]["label"], "Person");
    let html = body["data"]["html"].as_str().ok_or("missing html")?;
    assert!(html.contains("type=\"email\""));
    Ok(())
}

#[tokio::test]
async fn test_document_invalid_xml_gives_placeholder() -> TestResult {
    let (_, body) = call("POST", "/api/document", Some(json!({"xml": "<a><b></a>"}))).await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["document"]["root"], Value::Null);
    let notice = body["data"]["document"]["notice"].as_str().ok_or("missing notice")?;
    assert!(notice.starts_with("Invalid document"));
    Ok(())
}

#[tokio::test]
async fn test_edit_then_save() -> TestResult {
    let (status, built) = call(
        "POST",
        "/api/document",
        Some(json!({"xml": "<ticket><title>Broken</title><state>open</state></ticket>"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let document = built["data"]["document"].clone();
    let title = &document["root"]["content"]["children"][0];
    assert_eq!(title["source_tag"], "title");
    let title_id = title["id"].as_u64().ok_or("title has no id")?;

    let (status, edited) = call(
        "POST",
        "/api/edit",
        Some(json!({
            "document": document,
            "command": {"command": "commit_field", "id": title_id, "value": "Fixed"}
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["status"], "ok");

    let (status, saved) = call(
        "POST",
        "/api/save",
        Some(json!({"document": edited["data"]["document"]})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["status"], "ok");
    let content = saved["content"].as_str().ok_or("missing content")?;
    assert!(content.contains("<title>Fixed</title>"));
    assert!(content.contains("<state>open</state>"));
    Ok(())
}

#[tokio::test]
async fn test_edit_cell_of_single_child_table() -> TestResult {
    let (_, built) = call(
        "POST",
        "/api/document",
        Some(json!({"xml": "<ticket><title>Broken</title></ticket>"})),
    )
    .await?;
    let document = built["data"]["document"].clone();
    assert_eq!(document["root"]["content"]["type"], "table");
    let table_id = document["root"]["id"].as_u64().ok_or("root has no id")?;

    let (_, edited) = call(
        "POST",
        "/api/edit",
        Some(json!({
            "document": document,
            "command": {"command": "commit_cell", "table": table_id, "row": 0, "column": 0, "value": "Fixed"}
        })),
    )
    .await?;
    assert_eq!(edited["status"], "ok");
    let (_, saved) = call(
        "POST",
        "/api/save",
        Some(json!({"document": edited["data"]["document"]})),
    )
    .await?;
    let content = saved["content"].as_str().ok_or("missing content")?;
    assert!(content.contains("<title>Fixed</title>"));
    Ok(())
}

#[tokio::test]
async fn test_edit_uses_request_threshold() -> TestResult {
    let options = json!({"paragraph_threshold": 5});
    let (_, built) = call(
        "POST",
        "/api/document",
        Some(json!({"xml": "<note><body>hi</body><by>me</by></note>", "options": options})),
    )
    .await?;
    let document = built["data"]["document"].clone();
    let body_id = document["root"]["content"]["children"][0]["id"]
        .as_u64()
        .ok_or("body has no id")?;

    let (_, edited) = call(
        "POST",
        "/api/edit",
        Some(json!({
            "document": document,
            "command": {"command": "commit_field", "id": body_id, "value": "longer text"},
            "options": options
        })),
    )
    .await?;
    let editor = &edited["data"]["document"]["root"]["content"]["children"][0]["content"]["editor"];
    assert_eq!(editor["hint"], "paragraph");
    Ok(())
}

#[tokio::test]
async fn test_edit_reports_unknown_node() -> TestResult {
    let (_, built) = call("POST", "/api/document", Some(json!({"xml": "<a><b>1</b></a>"}))).await?;
    let (_, edited) = call(
        "POST",
        "/api/edit",
        Some(json!({
            "document": built["data"]["document"],
            "command": {"command": "commit_field", "id": 99, "value": "x"}
        })),
    )
    .await?;
    assert_eq!(edited["status"], "err");
    Ok(())
}

#[tokio::test]
async fn test_save_placeholder_is_rejected() -> TestResult {
    let (_, saved) = call(
        "POST",
        "/api/save",
        Some(json!({"document": {"root": null, "notice": "Invalid document"}})),
    )
    .await?;
    assert_eq!(saved["status"], "error");
    Ok(())
}

#[tokio::test]
async fn test_classify() -> TestResult {
    let (_, body) = call("POST", "/api/classify", Some(json!({"text": "https://example.com"}))).await?;
    assert_eq!(body, json!({"kind": "url", "input_hint": "url"}));
    Ok(())
}
