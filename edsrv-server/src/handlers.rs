//! Request handlers for the edit-server endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use edsrv_core::{EditFile, Editor, EdsrvError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, field, info_span, Instrument, Span};

use crate::router::{AppState, ROOT_PATH, STATUS_PATH};
use crate::HttpResponse;

/// Stages an edit request goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStage {
    Received,
    Editing,
    ReadingResult,
    RemovingFile,
    Responded,
}

impl fmt::Display for EditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditStage::Received => "received",
            EditStage::Editing => "editing",
            EditStage::ReadingResult => "reading-result",
            EditStage::RemovingFile => "removing-file",
            EditStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// An edit request that could not be completed
#[derive(Debug)]
pub struct EditFailure {
    pub stage: EditStage,
    pub error: EdsrvError,
}

impl IntoResponse for EditFailure {
    fn into_response(self) -> Response {
        HttpResponse::error(StatusCode::INTERNAL_SERVER_ERROR, &self.error.to_string())
            .into_response()
    }
}

/// Handles `GET /status`, describing the editor configuration in use
pub async fn status(State(state): State<AppState>) -> HttpResponse {
    debug!(endpoint = STATUS_PATH, "edit-server is running!");
    HttpResponse::text(status_body(state.editor.as_ref()))
}

/// Body of the status response
pub fn status_body(editor: &dyn Editor) -> String {
    format!(
        "editor='{}', tmpDir='{}'",
        editor.command(),
        editor.tmp_dir().display()
    )
}

/// Handles `POST /`, the request body is edited and sent back
///
/// The edit runs on its own task: a client going away does not interrupt the
/// editor, and the temporary file is still cleaned up once it exits.
pub async fn edit(State(state): State<AppState>, body: Bytes) -> Response {
    let span = info_span!(
        "edit",
        endpoint = ROOT_PATH,
        length = body.len(),
        file = field::Empty,
        size = field::Empty,
        written = field::Empty
    );

    let editor = Arc::clone(&state.editor);
    let task_span = span.clone();
    let task = tokio::spawn(
        async move { run_edit(editor.as_ref(), &body, &task_span).await }
            .instrument(span.clone()),
    );

    match task.await {
        Ok(Ok(payload)) => HttpResponse::text(payload).into_response(),
        Ok(Err(failure)) => failure.into_response(),
        Err(e) => {
            error!(parent: &span, error = %e, "edit task did not complete");
            HttpResponse::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                .into_response()
        }
    }
}

/// Runs one edit request from the received payload to the edited bytes
///
/// Exactly one file is created through `editor`; once the editor succeeded
/// the file is removed whether or not reading it back worked.
pub async fn run_edit(
    editor: &dyn Editor,
    payload: &[u8],
    span: &Span,
) -> Result<Vec<u8>, EditFailure> {
    debug!(parent: span, stage = %EditStage::Received, "edit request received");

    debug!(parent: span, stage = %EditStage::Editing, "handing payload to editor");
    let file = editor.edit(payload, span).await.map_err(|e| {
        error!(parent: span, stage = %EditStage::Editing, error = %e, "edit failed");
        EditFailure {
            stage: EditStage::Editing,
            error: e,
        }
    })?;

    let result = file.read().await;
    match &result {
        Ok(edited) => {
            span.record("written", edited.len());
            debug!(parent: span, stage = %EditStage::ReadingResult, "reading edited file");
        }
        Err(e) => {
            error!(parent: span, stage = %EditStage::ReadingResult, error = %e, "unable to read edited file");
        }
    }

    remove_file(file.as_ref(), span).await;

    let edited = result.map_err(|e| EditFailure {
        stage: EditStage::ReadingResult,
        error: e,
    })?;
    debug!(parent: span, stage = %EditStage::Responded, "all done!");
    Ok(edited)
}

/// Best-effort removal, failures are only logged
async fn remove_file(file: &dyn EditFile, span: &Span) {
    match file.remove().await {
        Ok(()) => debug!(parent: span, stage = %EditStage::RemovingFile, "temporary file removed"),
        Err(e) => error!(
            parent: span,
            stage = %EditStage::RemovingFile,
            error = %e,
            "unable to remove temporary file"
        ),
    }
}
