use crate::infra::{deserialize_optional_date, parse_role, run_blocking, start_of_day, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use personeltak::error::AppError;
use personeltak::report::{build_report, scores_csv};
use personeltak::scoring::{EvaluationRow, RunResult};
use personeltak::workbook::{record_evaluation, NewEvaluation};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) asof: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluationRequest {
    pub(crate) sicil: String,
    pub(crate) rol: String,
    pub(crate) po: u32,
    pub(crate) puan: f64,
    #[serde(default, rename = "not")]
    pub(crate) note: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) tarih: Option<NaiveDate>,
}

/// Request problems answer 400; everything else keeps the library's status mapping.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    App(AppError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::App(err) => err.into_response(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/report", get(report_endpoint))
        .route("/api/v1/report/scores.csv", get(scores_csv_endpoint))
        .route("/api/v1/evaluations", post(record_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn report_endpoint(
    Extension(state): Extension<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<RunResult>, ApiError> {
    let asof = resolve_asof(&state, query)?;
    Ok(Json(load_report(&state, asof).await?))
}

pub(crate) async fn scores_csv_endpoint(
    Extension(state): Extension<AppState>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let asof = resolve_asof(&state, query)?;
    let result = load_report(&state, asof).await?;
    let body = scores_csv(&result).map_err(AppError::from)?;
    let disposition = format!("attachment; filename=\"rapor_{}_Skorlar.csv\"", result.week);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub(crate) async fn record_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EvaluationRow>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let role = parse_role(&request.rol).map_err(ApiError::BadRequest)?;
    let tz = state.config.scoring.timezone;
    let timestamp = request
        .tarih
        .map(|date| start_of_day(date, tz))
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let evaluation = NewEvaluation {
        sicil: request.sicil,
        role,
        po: request.po,
        score: request.puan,
        timestamp,
        note: request.note,
    };
    let config = state.config.clone();
    let workbook = state.workbook.clone();
    let row = run_blocking(move || {
        record_evaluation(&workbook, &evaluation, tz, config.storage.lock_timeout)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

fn resolve_asof(
    state: &AppState,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Option<DateTime<Tz>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    query
        .asof
        .map(|date| start_of_day(date, state.config.scoring.timezone))
        .transpose()
        .map_err(ApiError::BadRequest)
}

async fn load_report(
    state: &AppState,
    asof: Option<DateTime<Tz>>,
) -> Result<RunResult, AppError> {
    let config = state.config.clone();
    let workbook = state.workbook.clone();
    run_blocking(move || build_report(&workbook, &config, asof)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use personeltak::config::AppConfig;
    use personeltak::workbook::WorkbookLock;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn write_workbook(dir: &Path) {
        fs::write(
            dir.join("Kriterler.csv"),
            "Po,Değerlendirme,Period,PuanMax,Personel,Yönetici\n1,Temizlik,Haftalık,5,x,x\n",
        )
        .expect("criteria");
        fs::write(dir.join("Calisanlar.csv"), "Sicil,AdSoyad\n1001,Ayşe Yılmaz\n")
            .expect("employees");
        fs::write(
            dir.join("Degerlendirmeler.csv"),
            "Sicil,Po,Rol,Puan,Tarih,HaftaYili,Not\n1001,1,Personel,4,2024-03-06 10:00:00,,\n",
        )
        .expect("evaluations");
    }

    fn app(workbook: &Path, ready: bool) -> Router {
        let mut config = AppConfig::default();
        config.storage.lock_timeout = Duration::from_millis(100);
        router(AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            config: Arc::new(config),
            workbook: Arc::new(workbook.to_path_buf()),
        })
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_and_readiness_report_status() {
        let dir = tempfile::tempdir().expect("tempdir");

        let response = app(dir.path(), true)
            .oneshot(get_request("/health"))
            .await
            .expect("health responds");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(dir.path(), false)
            .oneshot(get_request("/ready"))
            .await
            .expect("ready responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn report_endpoint_scores_the_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());

        let response = app(dir.path(), true)
            .oneshot(get_request("/api/v1/report?asof=2024-03-10"))
            .await
            .expect("report responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["week"], "2024-W10");
        assert_eq!(body["scores"][0]["Sicil"], "1001");
        assert_eq!(body["scores"][0]["ToplamSkor"], 80.0);
        assert_eq!(body["missing"][0]["Eksik_Roller"], "Yönetici");
    }

    #[tokio::test]
    async fn malformed_asof_is_a_bad_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());

        let response = app(dir.path(), true)
            .oneshot(get_request("/api/v1/report?asof=10.03.2024"))
            .await
            .expect("report responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scores_csv_is_served_as_attachment() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());

        let response = app(dir.path(), true)
            .oneshot(get_request("/api/v1/report/scores.csv?asof=2024-03-10"))
            .await
            .expect("csv responds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"rapor_2024-W10_Skorlar.csv\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8");
        assert!(text.contains("1001,Ayşe Yılmaz,,,80.0,2024-W10"));
    }

    #[tokio::test]
    async fn recorded_evaluation_returns_created_and_shows_up_in_the_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());

        let response = app(dir.path(), true)
            .oneshot(post_json(
                "/api/v1/evaluations",
                r#"{"sicil": "1001", "rol": "Yönetici", "po": 1, "puan": 5, "tarih": "2024-03-07"}"#,
            ))
            .await
            .expect("record responds");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["HaftaYili"], "2024-W10");

        let response = app(dir.path(), true)
            .oneshot(get_request("/api/v1/report?asof=2024-03-10"))
            .await
            .expect("report responds");
        let body = json_body(response).await;
        assert_eq!(body["missing"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn invalid_evaluations_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());

        let response = app(dir.path(), true)
            .oneshot(post_json(
                "/api/v1/evaluations",
                r#"{"sicil": "1001", "rol": "Müdür", "po": 1, "puan": 3}"#,
            ))
            .await
            .expect("record responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(dir.path(), true)
            .oneshot(post_json("/api/v1/evaluations", r#"{"sicil": "1001""#))
            .await
            .expect("record responds");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(dir.path(), true)
            .oneshot(post_json(
                "/api/v1/evaluations",
                r#"{"sicil": "1001", "rol": "Personel", "po": 1, "puan": -2}"#,
            ))
            .await
            .expect("record responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn held_lock_maps_to_service_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());
        let _held = WorkbookLock::acquire(dir.path(), Duration::ZERO).expect("lock");

        let response = app(dir.path(), true)
            .oneshot(get_request("/api/v1/report"))
            .await
            .expect("report responds");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn structural_errors_map_to_unprocessable_entity() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_workbook(dir.path());
        fs::remove_file(dir.path().join("Kriterler.csv")).expect("remove criteria");

        let response = app(dir.path(), true)
            .oneshot(get_request("/api/v1/report"))
            .await
            .expect("report responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
