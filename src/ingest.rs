use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::models::Document;
use crate::store::ChatStore;
use crate::text::extract_questions;

pub const DECODE_FAILED_TEXT: &str = "Unable to decode file content";
pub const UNSUPPORTED_TYPE_TEXT: &str =
    "File uploaded but text extraction not available for this type. Please describe the content.";

/// One uploaded file as received at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn ChatStore>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// Ingests a batch of uploads for one chat. Extraction of each file runs
    /// concurrently; the returned records preserve input order, and a file
    /// that degrades to sentinel text never aborts the rest of the batch.
    pub async fn ingest_batch(
        &self,
        chat_id: &str,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<Document>> {
        let mut handles = Vec::with_capacity(files.len());
        for file in files {
            let chat_id = chat_id.to_string();
            handles.push(tokio::spawn(
                async move { ingest_file(&chat_id, file).await },
            ));
        }

        let mut documents = Vec::with_capacity(handles.len());
        for handle in handles {
            let document = handle.await.context("document ingestion task panicked")?;
            self.store.insert_document(document.clone()).await?;
            documents.push(document);
        }

        Ok(documents)
    }
}

/// Extracts text and questions from one upload. Infallible: every failure
/// path inside extraction degrades to a sentinel text value.
pub async fn ingest_file(chat_id: &str, file: UploadedFile) -> Document {
    let extracted_text = extract_text(file.bytes, &file.mime_type).await;
    let questions = extract_questions(&extracted_text);

    Document {
        id: Uuid::new_v4().to_string(),
        chat_id: chat_id.to_string(),
        filename: file.filename.clone(),
        original_name: file.filename,
        mime_type: file.mime_type,
        size: extracted_text.len().to_string(),
        extracted_text,
        questions,
        uploaded_at: Utc::now(),
    }
}

/// Plain-text extraction by declared media type. Unsupported types and
/// decode failures yield fixed sentinel strings instead of errors so the
/// user still gets a usable document record.
pub async fn extract_text(bytes: Vec<u8>, mime_type: &str) -> String {
    match mime_type {
        "text/plain" => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => DECODE_FAILED_TEXT.to_string(),
        },
        "application/pdf" => extract_pdf_text(bytes).await,
        _ => UNSUPPORTED_TYPE_TEXT.to_string(),
    }
}

async fn extract_pdf_text(bytes: Vec<u8>) -> String {
    let extracted =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await;

    match extracted {
        Ok(Ok(pages)) => {
            let mut text = String::new();
            for page in pages {
                text.push_str(&page);
                text.push('\n');
            }
            text
        }
        Ok(Err(err)) => format!("Error extracting PDF text: {err}"),
        Err(err) => format!("Error extracting PDF text: {err}"),
    }
}
