//! Azure Vision Read client: submit the receipt image, poll the returned
//! operation a bounded number of times, parse the recovered text.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::constants::{OCR_MAX_POLL_ATTEMPTS, OCR_POLL_INTERVAL};
use crate::error::TagbookError;

use super::{PollStatus, ReceiptExtractor, ReceiptFields, parse, poll_bounded};

pub struct AzureVisionExtractor {
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

impl AzureVisionExtractor {
    pub fn new(endpoint: String, key: String) -> Self {
        AzureVisionExtractor {
            endpoint,
            key,
            client: reqwest::Client::new(),
        }
    }

    async fn submit(&self, receipt_url: &str) -> Result<String, TagbookError> {
        let image = self
            .client
            .get(receipt_url)
            .send()
            .await
            .map_err(|e| TagbookError::Extraction(format!("receipt download failed: {e}")))?
            .bytes()
            .await
            .map_err(|e| TagbookError::Extraction(format!("receipt download failed: {e}")))?;

        let response = self
            .client
            .post(format!("{}/vision/v3.2/read/analyze", self.endpoint))
            .header("Content-Type", "application/octet-stream")
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .body(image)
            .send()
            .await
            .map_err(|e| TagbookError::Extraction(format!("analyze request failed: {e}")))?;

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                TagbookError::Extraction("no operation-location in response".to_string())
            })
    }

    async fn poll_operation(&self, operation_url: &str) -> Result<PollStatus, TagbookError> {
        let body: Value = self
            .client
            .get(operation_url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .send()
            .await
            .map_err(|e| TagbookError::Extraction(format!("poll request failed: {e}")))?
            .json()
            .await
            .map_err(|e| TagbookError::Extraction(format!("poll response malformed: {e}")))?;

        match body["status"].as_str() {
            Some("succeeded") => Ok(PollStatus::Succeeded(collect_lines(&body))),
            Some("failed") => Ok(PollStatus::Failed),
            _ => Ok(PollStatus::Running),
        }
    }
}

fn collect_lines(body: &Value) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(pages) = body["analyzeResult"]["readResults"].as_array() {
        for page in pages {
            if let Some(page_lines) = page["lines"].as_array() {
                for line in page_lines {
                    if let Some(text) = line["text"].as_str() {
                        lines.push(text.to_string());
                    }
                }
            }
        }
    }
    lines.join("\n")
}

#[async_trait]
impl ReceiptExtractor for AzureVisionExtractor {
    async fn extract(&self, receipt_url: &str) -> Result<ReceiptFields, TagbookError> {
        let operation_url = self.submit(receipt_url).await?;
        let text = poll_bounded(
            || self.poll_operation(&operation_url),
            OCR_MAX_POLL_ATTEMPTS,
            OCR_POLL_INTERVAL,
        )
        .await?;

        if text.is_empty() {
            return Err(TagbookError::Extraction("no text on receipt".to_string()));
        }
        info!(chars = text.len(), "receipt text extracted");
        Ok(parse::parse_receipt_text(&text))
    }
}
