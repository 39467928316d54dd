//! Thin HTTP surface over the stores.
//!
//! Form posts redirect back to `/home`; the dashboard itself is served as
//! JSON for whatever front end renders it.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::abbreviations::AbbreviationRegistry;
use crate::error::{QaError, QaResult};
use crate::models::{AbbreviationKind, DivisionRoster, NewProspective, NewScribe};
use crate::prospective::ProspectiveStore;
use crate::query::{Dashboard, QueryLayer};
use crate::scribes::ScribeStore;

#[derive(Clone)]
pub struct AppState {
    pub registry: AbbreviationRegistry,
    pub scribes: ScribeStore,
    pub prospective: ProspectiveStore,
    pub query: QueryLayer,
}

impl IntoResponse for QaError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            QaError::DuplicateEntry(_) => (StatusCode::CONFLICT, "DUPLICATE_ENTRY"),
            QaError::AlreadyMember { .. } => (StatusCode::CONFLICT, "ALREADY_MEMBER"),
            QaError::NotMember { .. } => (StatusCode::CONFLICT, "NOT_MEMBER"),
            QaError::AlreadyFinalized { .. } => (StatusCode::CONFLICT, "ALREADY_FINALIZED"),
            QaError::UnassociatedDivision { .. } => (StatusCode::CONFLICT, "UNASSOCIATED_DIVISION"),
            QaError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            QaError::Validation(_) | QaError::Csv(_) | QaError::Json(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            QaError::Database(_) | QaError::Migration(_) | QaError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProspectiveForm {
    #[serde(rename = "qaf-scribe")]
    pub scribe: String,
    #[serde(rename = "qaf-date")]
    pub date: String,
    #[serde(rename = "qaf-division")]
    pub division: String,
    #[serde(rename = "qaf-assessor")]
    pub assessor: String,
    #[serde(rename = "qaf-provider")]
    pub provider: String,
    #[serde(rename = "qaf-comments", default)]
    pub comments: String,
}

#[derive(Debug, Deserialize)]
pub struct NewScribeForm {
    pub scribe: String,
    pub division: String,
    #[serde(default)]
    pub qa_track: String,
    #[serde(default)]
    pub solo_date: String,
    #[serde(default)]
    pub training_score: String,
}

#[derive(Debug, Deserialize)]
pub struct DivisionRequest {
    pub division: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/home") }))
        .route("/home", get(home))
        .route("/submit_prospective", post(submit_prospective))
        .route("/add_new_scribe", post(add_new_scribe))
        .route(
            "/get_scribes_providers_per_division",
            post(scribes_providers_per_division),
        )
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn home(State(state): State<AppState>) -> QaResult<Json<Dashboard>> {
    Ok(Json(state.query.dashboard().await?))
}

async fn submit_prospective(
    State(state): State<AppState>,
    Form(form): Form<ProspectiveForm>,
) -> QaResult<Redirect> {
    let date = parse_form_date(&form.date)?.ok_or_else(|| {
        QaError::Validation("a date is required for a prospective QA".to_string())
    })?;

    state
        .prospective
        .add(NewProspective {
            scribe: form.scribe,
            date,
            division: form.division,
            assessor: form.assessor,
            provider: form.provider,
            comments: form.comments,
        })
        .await?;

    Ok(Redirect::to("/home"))
}

async fn add_new_scribe(
    State(state): State<AppState>,
    Form(form): Form<NewScribeForm>,
) -> QaResult<Redirect> {
    let solo_date = parse_form_date(&form.solo_date)?;

    state
        .scribes
        .register(NewScribe {
            name: form.scribe,
            division: form.division,
            qa_track: non_empty(form.qa_track),
            solo_date,
            training_score: non_empty(form.training_score),
        })
        .await?;

    Ok(Redirect::to("/home"))
}

async fn scribes_providers_per_division(
    State(state): State<AppState>,
    Json(request): Json<DivisionRequest>,
) -> QaResult<Json<DivisionRoster>> {
    let short_code = state
        .registry
        .resolve_to_short(&request.division, AbbreviationKind::Division)
        .await?;

    Ok(Json(state.query.roster_for_division(&short_code).await?))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_form_date(raw: &str) -> QaResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| QaError::Validation(format!("expected a YYYY-MM-DD date, got '{raw}'")))
}
