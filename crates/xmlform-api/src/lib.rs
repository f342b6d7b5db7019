#![forbid(unsafe_code)]

use axum::{routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use xmlform::{
    classify, render_html, render_source, to_xml_string, Command, ContentKind, Document,
    EditorState, SchemaIndex, TranscodeOptions,
};

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub xml: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub options: TranscodeOptions,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub document: Document,
    pub command: Command,
    #[serde(default)]
    pub options: TranscodeOptions,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub document: Document,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    Ok { data: serde_json::Value },
    Err { error: String },
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub kind: ContentKind,
    pub input_hint: &'static str,
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/kinds", get(kinds))
        .route("/api/document", post(document))
        .route("/api/edit", post(edit))
        .route("/api/save", post(save))
        .route("/api/classify", post(classify_text))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn kinds() -> Json<Vec<&'static str>> {
    Json(ContentKind::ALL.iter().map(|kind| kind.name()).collect())
}

/// Forward transcode. Unparsable XML still answers `ok` with the invalid
/// document placeholder, whose notice carries the parse error.
async fn document(Json(payload): Json<DocumentRequest>) -> Json<ApiResponse> {
    let schema = payload
        .schema
        .as_deref()
        .map_or_else(SchemaIndex::empty, SchemaIndex::build);
    let doc = render_source(&payload.xml, &schema, &payload.options);
    debug!(
        fields = schema.len(),
        placeholder = doc.is_placeholder(),
        "document built"
    );
    Json(document_response(&doc))
}

async fn edit(Json(payload): Json<EditRequest>) -> Json<ApiResponse> {
    let mut editor = EditorState::new(payload.document)
        .with_paragraph_threshold(payload.options.paragraph_threshold);
    match editor.apply(payload.command) {
        Ok(()) => Json(document_response(editor.document())),
        Err(err) => Json(ApiResponse::Err {
            error: err.to_string(),
        }),
    }
}

async fn save(Json(payload): Json<SaveRequest>) -> Json<SaveResponse> {
    match to_xml_string(&payload.document) {
        Ok(content) => Json(SaveResponse {
            status: "ok",
            content,
        }),
        Err(err) => {
            warn!(%err, "save rejected");
            Json(SaveResponse {
                status: "error",
                content: err.to_string(),
            })
        }
    }
}

async fn classify_text(Json(payload): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    let kind = classify(&payload.text);
    Json(ClassifyResponse {
        kind,
        input_hint: kind.input_hint(),
    })
}

fn document_response(doc: &Document) -> ApiResponse {
    let html = render_html(doc);
    match serde_json::to_value(doc) {
        Ok(document) => ApiResponse::Ok {
            data: serde_json::json!({ "document": document, "html": html }),
        },
        Err(err) => ApiResponse::Err {
            error: err.to_string(),
        },
    }
}
