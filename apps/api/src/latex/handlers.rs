//! Axum route handlers for the LaTeX API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::latex::compiler::LatexCompiler;
use crate::latex::delivery::{finalize, FinalizedOutput};
use crate::latex::render::{
    convert_pdf_to_latex, generate_cover_letter_latex, resume_latex, ConversionError,
    CoverLetterRequest,
};
use crate::latex::validation::{extract_metadata, validate, LatexMetadata, ValidationResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterBody {
    #[serde(flatten)]
    pub letter: CoverLetterRequest,
    pub resume_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BothRequest {
    pub resume_content: String,
    pub cover_letter_content: String,
    pub company: String,
    #[serde(default)]
    pub hiring_manager: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexSourceRequest {
    pub latex_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub original_resume: String,
    pub tailored_resume: String,
    pub cover_letter: String,
}

#[derive(Debug, Serialize)]
pub struct LatexDocument {
    pub latex: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BothResponse {
    pub resume: LatexDocument,
    pub cover_letter: LatexDocument,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub validation: ValidationResult,
    pub metadata: LatexMetadata,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub content: String,
    pub validation: ValidationResult,
    pub metadata: LatexMetadata,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct CompiledPdf {
    /// Base64-encoded PDF bytes.
    pub pdf: String,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct SelfTestResponse {
    pub local: bool,
    pub container: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn stamped(prefix: &str, extension: &str) -> String {
    format!("{prefix}_{}.{extension}", Utc::now().timestamp_millis())
}

fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// An uploaded file pulled out of a multipart body.
struct Upload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Reads the `file` field of a multipart request; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::Validation("No file uploaded".to_string()))
}

fn is_pdf(upload: &Upload) -> bool {
    let declared = upload
        .content_type
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();
    declared.contains("application/pdf") || upload.bytes.starts_with(b"%PDF-")
}

async fn validate_and_compile(
    compiler: &LatexCompiler,
    latex: &str,
    prefix: &str,
) -> Result<Json<CompiledPdf>, AppError> {
    require_non_empty(latex, "latexContent")?;

    let validation = validate(latex);
    if !validation.is_valid {
        return Err(AppError::Validation(format!(
            "LaTeX validation failed: {}",
            validation.errors.join(", ")
        )));
    }

    let pdf = compiler.compile(latex).await?;
    Ok(Json(CompiledPdf {
        pdf: STANDARD.encode(&pdf),
        filename: stamped(prefix, "pdf"),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/latex/resume
///
/// Plain resume text is parsed and rendered; LaTeX passes through unchanged.
pub async fn handle_resume(Json(request): Json<ResumeRequest>) -> Result<Json<LatexDocument>, AppError> {
    require_non_empty(&request.content, "content")?;

    Ok(Json(LatexDocument {
        latex: resume_latex(&request.content),
        filename: stamped("resume", "tex"),
    }))
}

/// POST /api/v1/latex/cover-letter
pub async fn handle_cover_letter(
    Json(request): Json<CoverLetterBody>,
) -> Result<Json<LatexDocument>, AppError> {
    require_non_empty(&request.letter.content, "content")?;

    Ok(Json(LatexDocument {
        latex: generate_cover_letter_latex(&request.letter, &request.resume_content),
        filename: stamped("cover_letter", "tex"),
    }))
}

/// POST /api/v1/latex/both
pub async fn handle_both(Json(request): Json<BothRequest>) -> Result<Json<BothResponse>, AppError> {
    require_non_empty(&request.resume_content, "resumeContent")?;
    require_non_empty(&request.cover_letter_content, "coverLetterContent")?;

    let letter = CoverLetterRequest {
        content: request.cover_letter_content,
        company: request.company,
        hiring_manager: request.hiring_manager,
    };

    Ok(Json(BothResponse {
        resume: LatexDocument {
            latex: resume_latex(&request.resume_content),
            filename: stamped("resume", "tex"),
        },
        cover_letter: LatexDocument {
            latex: generate_cover_letter_latex(&letter, &request.resume_content),
            filename: stamped("cover_letter", "tex"),
        },
    }))
}

/// POST /api/v1/latex/validate
pub async fn handle_validate(Json(request): Json<LatexSourceRequest>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        validation: validate(&request.latex_content),
        metadata: extract_metadata(&request.latex_content),
    })
}

/// POST /api/v1/latex/upload
///
/// Accepts a multipart `.tex` file and reports its validation and metadata.
pub async fn handle_upload(multipart: Multipart) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    if !upload.filename.to_ascii_lowercase().ends_with(".tex") {
        return Err(AppError::Validation("File must be a .tex file".to_string()));
    }

    let content = String::from_utf8(upload.bytes)
        .map_err(|_| AppError::Validation("File must be UTF-8 text".to_string()))?;

    Ok(Json(UploadResponse {
        validation: validate(&content),
        metadata: extract_metadata(&content),
        content,
        filename: upload.filename,
    }))
}

/// POST /api/v1/latex/convert-pdf
///
/// Extracts the text of a multipart PDF upload and renders it as a LaTeX resume.
pub async fn handle_convert_pdf(multipart: Multipart) -> Result<Json<LatexDocument>, AppError> {
    let upload = read_upload(multipart).await?;
    if !is_pdf(&upload) {
        return Err(AppError::Validation("File must be a PDF".to_string()));
    }

    let stem = upload
        .filename
        .strip_suffix(".pdf")
        .unwrap_or(&upload.filename)
        .to_string();
    let bytes = upload.bytes;

    // PDF text extraction is CPU-bound and may panic on malformed input.
    let latex = match tokio::task::spawn_blocking(move || convert_pdf_to_latex(&bytes)).await {
        Ok(result) => result?,
        Err(e) if e.is_panic() => {
            let reason = "PDF parser crashed on this file".to_string();
            return Err(ConversionError::Extract(reason).into());
        }
        Err(e) => {
            let err = anyhow::Error::new(e).context("PDF conversion task failed");
            return Err(AppError::Internal(err));
        }
    };

    info!("Converted PDF upload '{}' to LaTeX", upload.filename);
    Ok(Json(LatexDocument {
        latex,
        filename: stamped(&format!("converted_{stem}"), "tex"),
    }))
}

/// POST /api/v1/latex/compile
///
/// Validates, then compiles with the host toolchain.
pub async fn handle_compile(
    State(state): State<AppState>,
    Json(request): Json<LatexSourceRequest>,
) -> Result<Json<CompiledPdf>, AppError> {
    validate_and_compile(&state.local, &request.latex_content, "compiled").await
}

/// POST /api/v1/latex/compile/container
pub async fn handle_compile_container(
    State(state): State<AppState>,
    Json(request): Json<LatexSourceRequest>,
) -> Result<Json<CompiledPdf>, AppError> {
    validate_and_compile(&state.container, &request.latex_content, "compiled").await
}

/// POST /api/v1/latex/compile/self-test
pub async fn handle_self_test(State(state): State<AppState>) -> Json<SelfTestResponse> {
    let (local, container) = tokio::join!(state.local.self_test(), state.container.self_test());
    Json(SelfTestResponse { local, container })
}

/// POST /api/v1/latex/finalize
///
/// Compiles tailored output when the original resume was LaTeX; otherwise,
/// or when compilation fails, returns the text unchanged.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Json(request): Json<FinalizeRequest>,
) -> Result<Json<FinalizedOutput>, AppError> {
    require_non_empty(&request.original_resume, "originalResume")?;

    let output = finalize(
        &state.container,
        &request.original_resume,
        &request.tailored_resume,
        &request.cover_letter,
    )
    .await;
    Ok(Json(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamped_filename() {
        let name = stamped("resume", "tex");
        assert!(name.starts_with("resume_"));
        assert!(name.ends_with(".tex"));
        assert!(name["resume_".len()..name.len() - 4].parse::<i64>().is_ok());
    }

    #[test]
    fn test_pdf_detection() {
        let by_type = Upload {
            filename: "cv".to_string(),
            content_type: Some("Application/PDF".to_string()),
            bytes: Vec::new(),
        };
        let by_magic = Upload {
            filename: "cv.bin".to_string(),
            content_type: None,
            bytes: b"%PDF-1.7 ...".to_vec(),
        };
        let neither = Upload {
            filename: "cv.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: b"hello".to_vec(),
        };
        assert!(is_pdf(&by_type));
        assert!(is_pdf(&by_magic));
        assert!(!is_pdf(&neither));
    }

    #[test]
    fn test_cover_letter_body_flattens_letter_fields() {
        let body: CoverLetterBody = serde_json::from_value(serde_json::json!({
            "content": "Hello.",
            "company": "Acme",
            "hiringManager": "Sam",
            "resumeContent": "Jane Doe"
        }))
        .unwrap();
        assert_eq!(body.letter.company, "Acme");
        assert_eq!(body.letter.hiring_manager.as_deref(), Some("Sam"));
        assert_eq!(body.resume_content, "Jane Doe");
    }
}
