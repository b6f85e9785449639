//! Turns an uploaded report file into plain text.
//!
//! Text files are read directly. PDFs are read from their embedded text layer
//! first. Only when that layer is missing or blank (scanned lab reports) are
//! the pages rendered to images and read back with a vision model.

use anyhow::anyhow;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use pdf2image::{PDF, Pages};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ConsultError, Result};
use crate::llm::OpenRouterVision;
use crate::models::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Pdf,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt") => Ok(ReportFormat::Text),
            Some("pdf") => Ok(ReportFormat::Pdf),
            _ => Err(ConsultError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

pub struct ReportExtractor {
    vision: OpenRouterVision,
}

impl ReportExtractor {
    pub fn new(vision: OpenRouterVision) -> Self {
        Self { vision }
    }

    pub async fn extract(&self, path: &Path) -> Result<Report> {
        let format = ReportFormat::from_path(path)?;
        info!(path = %path.display(), ?format, "Extracting report text");

        let text = match format {
            ReportFormat::Text => read_text_report(path).await?,
            ReportFormat::Pdf => self
                .read_pdf_report(path)
                .await
                .map_err(|e| ConsultError::Extraction(e.to_string()))?,
        };

        let report = Report::new(text);
        if report.is_blank() {
            warn!(path = %path.display(), "No text extracted from report");
            return Err(ConsultError::Extraction(
                "No text could be extracted from the report".to_string(),
            ));
        }

        info!(chars = report.as_str().len(), "Report text extracted");
        Ok(report)
    }

    async fn read_pdf_report(&self, path: &Path) -> anyhow::Result<String> {
        match read_pdf_text_layer(path.to_path_buf()).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(chars = text.len(), "PDF text layer extracted");
                return Ok(text);
            }
            Ok(_) => info!("PDF has no text layer, falling back to OCR"),
            Err(e) => warn!(error = %e, "PDF text layer unreadable, falling back to OCR"),
        }
        self.ocr_pdf_pages(path).await
    }

    async fn ocr_pdf_pages(&self, path: &Path) -> anyhow::Result<String> {
        let images = render_pdf_pages(path.to_path_buf()).await?;
        if images.is_empty() {
            return Err(anyhow!("No pages rendered from PDF"));
        }

        let pages = images
            .iter()
            .map(image_to_base64)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let instruction = format!(
            "You are an expert medical document OCR system. I'm providing you with {} pages of a medical test report. \
            Extract ALL text from these pages with perfect accuracy, preserving test names, values, units and reference ranges.

            Start each page with '=== Page X ===' as a header, then the extracted text.

            Return ONLY the extracted text without any commentary or explanations.",
            pages.len()
        );

        let text = self.vision.read_pages(&instruction, &pages).await?;
        info!(pages = pages.len(), chars = text.len(), "PDF OCR completed");
        Ok(text)
    }
}

pub async fn read_text_report(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConsultError::Extraction(format!("Failed to read {}: {}", path.display(), e)))
}

async fn read_pdf_text_layer(path: PathBuf) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| anyhow!("Failed to read PDF {}: {}", path.display(), e))?;

    // pdf-extract panics on some malformed files; the join error covers that.
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| anyhow!("Failed to extract PDF text: {}", e))
    })
    .await?
}

async fn render_pdf_pages(path: PathBuf) -> anyhow::Result<Vec<DynamicImage>> {
    if !tokio::fs::try_exists(&path).await? {
        return Err(anyhow!("PDF file not found: {}", path.display()));
    }

    let images = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<DynamicImage>> {
        let pdf = PDF::from_file(&path).map_err(|e| anyhow!("Failed to load PDF: {}", e))?;
        pdf.render(Pages::All, None)
            .map_err(|e| anyhow!("Failed to render PDF pages: {}", e))
    })
    .await??;

    info!(pages = images.len(), "Rendered PDF pages");
    Ok(images)
}

fn image_to_base64(image: &DynamicImage) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| anyhow!("Failed to encode page image: {}", e))?;
    Ok(STANDARD.encode(&buffer))
}
