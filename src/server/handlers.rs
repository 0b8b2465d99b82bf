use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::chat::{session_reply, ChatReply, UserType};
use crate::edit::save_edited;
use crate::error::SlidepressError;
use crate::export::{export, ExportFormat};
use crate::pipeline::attempt::ConversionAttempt;
use crate::server::state::AppState;
use crate::workspace::slide_urls;

// ── Response bodies ──────────────────────────────────────────────────────

/// `{ok, ...}` envelope shared by every `/api` action.
#[derive(Debug, Default, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_cmds: Option<Vec<ConversionAttempt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmds: Option<Vec<ConversionAttempt>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
}

impl ActionResponse {
    fn success() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

impl From<SlidepressError> for ActionResponse {
    fn from(err: SlidepressError) -> Self {
        let cmds = err.attempts().map(<[ConversionAttempt]>::to_vec);
        Self {
            cmds,
            ..Self::failure(err.to_string())
        }
    }
}

/// Action errors keep HTTP 200; clients branch on `ok`.
fn action_result(result: Result<ActionResponse, SlidepressError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Action failed");
            Json(ActionResponse::from(e)).into_response()
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ── /api?action=… ────────────────────────────────────────────────────────

struct UploadPart {
    file_name: String,
    bytes: Bytes,
}

/// Query, form, and multipart fields merged into one view.
#[derive(Default)]
struct ActionParams {
    fields: HashMap<String, String>,
    upload: Option<UploadPart>,
}

impl ActionParams {
    fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[tracing::instrument(skip_all, fields(action = tracing::field::Empty))]
pub async fn api_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    request: Request,
) -> Response {
    let mut params = match read_body(&state, request).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    // Body fields win over query fields.
    for (k, v) in query {
        params.fields.entry(k).or_insert(v);
    }

    let action = params.get("action").unwrap_or_default().to_string();
    tracing::Span::current().record("action", action.as_str());

    match action.as_str() {
        "upload" => action_result(upload(&state, params.upload).await),
        "list_slides" => action_result(list_slides(&state, &params).await),
        "save_edited" => action_result(save(&state, &params).await),
        "export_zip" => action_result(export_action(&state, &params, ExportFormat::Zip).await),
        "export_pptx" => action_result(export_action(&state, &params, ExportFormat::Pptx).await),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse::failure("Unknown action")),
        )
            .into_response(),
    }
}

/// Give `/api` clients the `{ok:false}` envelope when the body limit
/// rejects a request up front from its Content-Length.
pub async fn upload_limit_envelope(request: Request, next: Next) -> Response {
    let is_api = request.uri().path() == "/api";
    let response = next.run(request).await;
    if is_api && response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Request body exceeds the upload limit");
        return Json(ActionResponse::from(SlidepressError::NoUpload)).into_response();
    }
    response
}

async fn read_body(state: &AppState, request: Request) -> Result<ActionParams, Response> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut params = ActionParams::default();
    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| bad_request(e.to_string()))?;
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(f)) => f,
                Ok(None) => break,
                Err(e) => {
                    // Truncated uploads, and oversized ones sent without a
                    // Content-Length, surface here.
                    tracing::warn!(error = %e, "Failed to read multipart");
                    return Err(Json(ActionResponse::from(SlidepressError::NoUpload)).into_response());
                }
            };
            let name = field.name().unwrap_or_default().to_string();
            if name == "ppt" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::warn!(error = %e, "Failed to read upload bytes");
                    Json(ActionResponse::from(SlidepressError::NoUpload)).into_response()
                })?;
                tracing::debug!(file_name = %file_name, bytes = bytes.len(), "Upload received");
                params.upload = Some(UploadPart { file_name, bytes });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(e.to_string()))?;
                params.fields.insert(name, text);
            }
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, state)
            .await
            .map_err(|e| bad_request(e.to_string()))?;
        params.fields = fields;
    }
    Ok(params)
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ActionResponse::failure(message))).into_response()
}

async fn upload(
    state: &AppState,
    part: Option<UploadPart>,
) -> Result<ActionResponse, SlidepressError> {
    let part = part.ok_or(SlidepressError::NoUpload)?;
    let deck = state
        .workspace
        .store_upload(&part.file_name, &part.bytes)
        .await?;
    let output = state
        .workspace
        .convert_upload(&deck, &state.pipeline)
        .await?;

    Ok(ActionResponse {
        upload: Some(deck.stored_name),
        slides: Some(slide_urls(&deck.folder, &output.slides.names)),
        debug_cmds: Some(output.attempts),
        ..ActionResponse::success()
    })
}

async fn list_slides(
    state: &AppState,
    params: &ActionParams,
) -> Result<ActionResponse, SlidepressError> {
    let folder = params.get("folder").unwrap_or_default();
    let slides = state
        .workspace
        .list_slides(folder, state.pipeline.slide_order)
        .await?;
    Ok(ActionResponse {
        slides: Some(slides),
        ..ActionResponse::success()
    })
}

async fn save(state: &AppState, params: &ActionParams) -> Result<ActionResponse, SlidepressError> {
    let saved = save_edited(
        &state.workspace,
        params.get("img"),
        params.get("orig"),
        params.get("folder"),
    )
    .await?;
    Ok(ActionResponse {
        path: Some(saved.web_path),
        ..ActionResponse::success()
    })
}

async fn export_action(
    state: &AppState,
    params: &ActionParams,
    format: ExportFormat,
) -> Result<ActionResponse, SlidepressError> {
    let folder = params.get("folder").unwrap_or_default();
    let artifact = export(&state.workspace, folder, format, state.pipeline.slide_order).await?;
    Ok(ActionResponse {
        download: Some(artifact.web_path),
        ..ActionResponse::success()
    })
}

// ── Chat ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub reply: String,
}

pub async fn text_handler(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Response {
    let text = body.map(|Json(b)| b.text).unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "no text provided".to_string(),
            }),
        )
            .into_response();
    }
    let reply = state.qa.best_answer(text);
    Json(TextResponse { reply }).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
}

pub async fn chat_handler(Json(req): Json<ChatRequest>) -> Json<ChatReply> {
    tracing::debug!(session_id = ?req.session_id, "Chat message");
    Json(session_reply(
        &req.message,
        UserType::parse(req.user_type.as_deref()),
    ))
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub status: &'static str,
    pub qa_pairs_loaded: usize,
    pub version: &'static str,
}

pub async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        status: "running",
        qa_pairs_loaded: state.qa.len(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}
