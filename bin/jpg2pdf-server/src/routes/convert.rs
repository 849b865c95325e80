//! Upload, status and download endpoints.
//!
//! The conversion runs inline with the upload request on the blocking pool;
//! the response carries the final outcome of the job.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use jpg2pdf_core::{naming, ConversionJob, ConversionKind, ValidationError};
use tracing::{debug, error, info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::JobStore;
use crate::error::ServerError;
use crate::schemas::convert::{JobStatusResponse, UploadForm, UploadResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(upload, job_status, download),
    components(schemas(UploadForm, UploadResponse, JobStatusResponse))
)]
pub struct ConvertApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload/", post(upload))
        .route("/upload", post(upload))
        .route("/status/{id}/", get(job_status))
        .route("/status/{id}", get(job_status))
        .route("/download/{id}/", get(download))
        .route("/download/{id}", get(download))
}

/// Fields read from the multipart body.
struct UploadParts {
    file_name: String,
    bytes: Vec<u8>,
    conversion_type: Option<String>,
}

async fn read_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<UploadParts, ServerError> {
    let policy = state.config.upload_policy();
    let mut parts = UploadParts {
        file_name: String::new(),
        bytes: Vec::new(),
        conversion_type: None,
    };
    let mut saw_file = false;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                saw_file = true;
                parts.file_name = field.file_name().unwrap_or_default().to_owned();
                parts.bytes.clear();
                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read file chunk: {e}"))
                })? {
                    policy.check_size((parts.bytes.len() + chunk.len()) as u64)?;
                    parts.bytes.extend_from_slice(&chunk);
                }
            }
            Some("conversion_type") => {
                let value = field.text().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read conversion_type: {e}"))
                })?;
                parts.conversion_type = Some(value);
            }
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    if !saw_file {
        return Err(ValidationError::Missing.into());
    }
    Ok(parts)
}

fn parse_kind(raw: Option<&str>) -> Result<ConversionKind, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ConversionKind::default()),
        Some(value) => value
            .parse()
            .map_err(|_| ValidationError::UnknownKind(value.to_owned())),
    }
}

/// Upload a file and convert it.
///
/// The job record is created only after the upload passes validation.
#[utoipa::path(
    post,
    path = "/upload/",
    tag = "convert",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Conversion completed", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unsupported upload, or unknown conversion type"),
        (status = 500, description = "Storage or conversion failure; the job is marked failed"),
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let parts = read_upload(&state, &mut multipart).await?;
    let extension = state
        .config
        .upload_policy()
        .validate(&parts.file_name, &parts.bytes)?;
    let kind = parse_kind(parts.conversion_type.as_deref())?;

    let mut job = ConversionJob::new(kind, parts.file_name, parts.bytes.len() as u64, Utc::now());
    state.store.insert_job(&job).await?;
    info!(
        job_id = %job.id,
        conversion_type = %kind,
        file_name = %job.original_filename,
        size_bytes = job.file_size,
        "created conversion job"
    );

    let stored_name = naming::upload_file_name(job.id, &extension);
    let input = match state.media.save_upload(&stored_name, &parts.bytes).await {
        Ok(path) => path,
        Err(e) => {
            if let Err(db) = state.store.delete_job(job.id).await {
                warn!(job_id = %job.id, error = %db, "failed to roll back job after storage failure");
            }
            return Err(ServerError::Storage(e.to_string()));
        }
    };
    drop(parts.bytes);

    job.start()?;
    state.store.save_job_state(&job).await?;

    match run_conversion(&state, &job, input.clone()).await {
        Ok(output) => {
            let name = output
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| ServerError::Internal("conversion output has no file name".into()))?;
            job.complete(name, Utc::now())?;
            state.store.save_job_state(&job).await?;
            info!(job_id = %job.id, converted = ?job.converted_filename, "conversion completed");
            Ok(Json(UploadResponse::from(&job)))
        }
        Err(message) => {
            error!(job_id = %job.id, error = %message, "conversion failed");
            job.fail(message.clone())?;
            state.store.save_job_state(&job).await?;
            state.media.remove_upload(&input).await;
            Err(ServerError::Conversion(message))
        }
    }
}

/// Run the conversion on the blocking pool. A panicking routine is reported
/// like any other conversion failure.
async fn run_conversion(
    state: &AppState,
    job: &ConversionJob,
    input: PathBuf,
) -> Result<PathBuf, String> {
    let kind = job.conversion_type;
    let job_id = job.id;
    let output_dir = state.media.converted_dir();
    match tokio::task::spawn_blocking(move || jpg2pdf_core::convert(kind, &input, &output_dir, job_id)).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("conversion task aborted: {e}")),
    }
}

async fn find_job(state: &AppState, id: &str) -> Result<ConversionJob, ServerError> {
    let not_found = || ServerError::NotFound("Job not found".into());
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    state.store.get_job(id).await?.ok_or_else(not_found)
}

/// Current state of a job.
#[utoipa::path(
    get,
    path = "/status/{id}/",
    tag = "convert",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job found", body = JobStatusResponse),
        (status = 404, description = "Job not found"),
    )
)]
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, ServerError> {
    let job = find_job(&state, &id).await?;
    Ok(Json(job.into()))
}

/// Download the converted file of a completed job.
#[utoipa::path(
    get,
    path = "/download/{id}/",
    tag = "convert",
    params(("id" = String, Path, description = "Job id")),
    responses(
        (status = 200, description = "Converted file as an attachment"),
        (status = 404, description = "Job unknown, not completed, or file missing"),
    )
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let job = find_job(&state, &id).await?;
    let name = match &job.converted_filename {
        Some(name) if job.is_downloadable() => name.clone(),
        _ => return Err(ServerError::NotFound("File not ready or conversion failed".into())),
    };

    let path = state.media.converted_path(&name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!(job_id = %job.id, path = %path.display(), "converted file missing");
            return Err(ServerError::NotFound("File not found".into()));
        }
        Err(e) => return Err(ServerError::Internal(format!("failed to read {}: {e}", path.display()))),
    };

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    info!(job_id = %job.id, file = %name, size_bytes = bytes.len(), "serving download");
    Response::builder()
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\""))
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::routes::test_support::{
        app, image_bytes, json_body, state, state_with, upload_request, Part,
    };
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use image::ImageFormat;
    use crate::error::STORAGE_MESSAGE;
    use jpg2pdf_core::JobStatus;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    async fn get(state: &Arc<AppState>, uri: &str) -> Response {
        app(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn job_count(state: &AppState) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversion_jobs")
            .fetch_one(state.store.pool())
            .await
            .unwrap();
        count
    }

    fn dir_is_empty(path: &std::path::Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn every_accepted_image_converts_and_downloads() {
        let (state, _dir) = state().await;
        let cases = [
            ("photo.jpg", ImageFormat::Jpeg, "jpg_to_pdf", "application/pdf"),
            ("photo.JPEG", ImageFormat::Jpeg, "resize_image", "image/jpeg"),
            ("scan.png", ImageFormat::Png, "png_to_pdf", "application/pdf"),
            ("scan.png", ImageFormat::Png, "resize_image", "image/png"),
            ("anim.gif", ImageFormat::Gif, "compress_image", "image/jpeg"),
            ("old.bmp", ImageFormat::Bmp, "jpg_to_pdf", "application/pdf"),
            ("new.webp", ImageFormat::WebP, "resize_image", "image/jpeg"),
        ];

        for (file_name, format, kind, mime) in cases {
            let bytes = image_bytes(format, 40, 30);
            let response = app(&state)
                .oneshot(upload_request(&[
                    ("conversion_type", None, kind.as_bytes()),
                    ("file", Some(file_name), bytes.as_slice()),
                ]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{file_name} {kind}");
            let body = json_body(response).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["original_filename"], file_name);
            let id = body["job_id"].as_str().unwrap().to_owned();
            assert_eq!(body["download_url"], format!("/download/{id}/"));

            let status = json_body(get(&state, &format!("/status/{id}/")).await).await;
            assert_eq!(status["status"], "completed");
            assert_eq!(status["conversion_type"], kind);
            assert_eq!(status["file_size"], bytes.len() as u64);

            let download = get(&state, &format!("/download/{id}")).await;
            assert_eq!(download.status(), StatusCode::OK);
            let headers = download.headers().clone();
            assert_eq!(headers[header::CONTENT_TYPE], mime, "{file_name} {kind}");
            let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
            assert!(disposition.starts_with("attachment; filename=\""));
            let content = download.into_body().collect().await.unwrap().to_bytes();
            assert!(!content.is_empty());
            assert_eq!(headers[header::CONTENT_LENGTH], content.len().to_string().as_str());
        }
    }

    #[tokio::test]
    async fn conversion_type_defaults_to_jpg_to_pdf() {
        let (state, _dir) = state().await;
        let bytes = image_bytes(ImageFormat::Jpeg, 10, 10);
        let response = app(&state)
            .oneshot(upload_request(&[("file", Some("a.jpg"), bytes.as_slice())]))
            .await
            .unwrap();
        let body = json_body(response).await;
        let converted = body["converted_filename"].as_str().unwrap();
        assert!(converted.ends_with("_converted.pdf"));
    }

    #[tokio::test]
    async fn rejected_uploads_create_no_job() {
        let (state, dir) = state().await;
        let jpeg = image_bytes(ImageFormat::Jpeg, 8, 8);
        let unsupported = "Unsupported file type. Please upload JPG, PNG, GIF, BMP, WebP or PDF files.";
        let cases: Vec<(Vec<Part<'_>>, &str)> = vec![
            (vec![("conversion_type", None, b"jpg_to_pdf".as_slice())], "No file uploaded"),
            (vec![("file", Some("empty.jpg"), b"".as_slice())], "No file uploaded"),
            (vec![("file", Some("notes.txt"), b"plain text".as_slice())], unsupported),
            (vec![("file", Some("fake.png"), b"MZ\x90\x00 not an image".as_slice())], unsupported),
            (
                vec![
                    ("conversion_type", None, b"jpg_to_docx".as_slice()),
                    ("file", Some("a.jpg"), jpeg.as_slice()),
                ],
                "Unsupported conversion type: jpg_to_docx",
            ),
        ];

        for (parts, message) in cases {
            let response = app(&state).oneshot(upload_request(&parts)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{message}");
            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], message);
        }
        assert_eq!(job_count(&state).await, 0);
        assert!(dir_is_empty(&dir.path().join("uploads")));
    }

    #[tokio::test]
    async fn oversized_uploads_are_refused_before_conversion() {
        let (state, dir) = state_with(|c| c.max_upload_mb = 1).await;
        let mut bytes = image_bytes(ImageFormat::Png, 4, 4);
        bytes.resize(1024 * 1024 + 1, 0);

        let response = app(&state)
            .oneshot(upload_request(&[("file", Some("huge.png"), bytes.as_slice())]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "File too large. Maximum size is 1MB.");
        assert_eq!(job_count(&state).await, 0);
        assert!(dir_is_empty(&dir.path().join("converted")));
    }

    #[tokio::test]
    #[traced_test]
    async fn storage_failure_rolls_back_the_job() {
        let (state, dir) = state().await;
        let uploads = dir.path().join("uploads");
        std::fs::remove_dir(&uploads).unwrap();
        std::fs::write(&uploads, b"not a directory").unwrap();

        let bytes = image_bytes(ImageFormat::Jpeg, 8, 8);
        let response = app(&state)
            .oneshot(upload_request(&[("file", Some("a.jpg"), bytes.as_slice())]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], STORAGE_MESSAGE);
        assert_eq!(job_count(&state).await, 0);
        assert!(dir_is_empty(&dir.path().join("converted")));
        assert!(logs_contain("created conversion job"));
    }

    #[tokio::test]
    async fn pdf_to_jpg_marks_the_job_failed() {
        let (state, dir) = state().await;
        let response = app(&state)
            .oneshot(upload_request(&[
                ("conversion_type", None, b"pdf_to_jpg".as_slice()),
                ("file", Some("doc.pdf"), b"%PDF-1.4\n%%EOF\n".as_slice()),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"],
            "Conversion failed: Unsupported conversion type: pdf_to_jpg"
        );

        let (id,): (String,) = sqlx::query_as("SELECT id FROM conversion_jobs")
            .fetch_one(state.store.pool())
            .await
            .unwrap();
        let job = state.store.get_job(Uuid::parse_str(&id).unwrap()).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error_message.unwrap().contains("pdf_to_jpg"));
        // The stored upload is removed with the failure.
        assert!(dir_is_empty(&dir.path().join("uploads")));

        let download = get(&state, &format!("/download/{id}/")).await;
        assert_eq!(download.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn corrupt_images_fail_with_the_routine_name() {
        let (state, _dir) = state().await;
        let mut bytes = image_bytes(ImageFormat::Png, 16, 16);
        bytes.truncate(40);
        let response = app(&state)
            .oneshot(upload_request(&[
                ("conversion_type", None, b"resize_image".as_slice()),
                ("file", Some("broken.png"), bytes.as_slice()),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = json_body(response).await["error"].as_str().unwrap().to_owned();
        assert!(error.starts_with("Conversion failed: Failed to resize image: "), "{error}");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_404() {
        let (state, _dir) = state().await;
        for uri in [
            format!("/status/{}/", Uuid::new_v4()),
            "/status/not-a-uuid/".to_owned(),
            format!("/download/{}/", Uuid::new_v4()),
            "/download/42".to_owned(),
        ] {
            let response = get(&state, &uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
        let body = json_body(get(&state, "/status/not-a-uuid").await).await;
        assert_eq!(body["error"], "Job not found");
    }

    #[tokio::test]
    async fn downloads_need_a_completed_job_and_its_file() {
        let (state, _dir) = state().await;

        let pending = ConversionJob::new(ConversionKind::JpgToPdf, "a.jpg", 1, Utc::now());
        state.store.insert_job(&pending).await.unwrap();
        let response = get(&state, &format!("/download/{}/", pending.id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Completed on record, but the file is gone from disk.
        let mut done = ConversionJob::new(ConversionKind::JpgToPdf, "b.jpg", 1, Utc::now());
        state.store.insert_job(&done).await.unwrap();
        done.start().unwrap();
        done.complete(naming::pdf_output(done.id), Utc::now()).unwrap();
        state.store.save_job_state(&done).await.unwrap();
        let response = get(&state, &format!("/download/{}/", done.id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "File not found");
    }
}
