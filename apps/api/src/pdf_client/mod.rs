/// HTML → PDF conversion client.
///
/// The service never renders PDFs itself. The complete HTML document is posted
/// to an external converter (headless browser service) configured through
/// `PDF_SERVICE_URL`; the converter answers with the PDF bytes.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Converter error (status {status}): {message}")]
    Converter { status: u16, message: String },

    #[error("Converter returned an empty document")]
    EmptyDocument,

    #[error("Converter unavailable after {retries} retries")]
    Exhausted { retries: u32 },
}

/// Converts a self-contained HTML document into PDF bytes.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, html: &str) -> Result<Bytes, PdfError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertRequest<'a> {
    html: &'a str,
    format: &'a str,
    print_background: bool,
    margin: PageMargin<'a>,
}

#[derive(Debug, Serialize)]
struct PageMargin<'a> {
    top: &'a str,
    right: &'a str,
    bottom: &'a str,
    left: &'a str,
}

/// Default converter: posts the document as JSON to the configured endpoint.
#[derive(Clone)]
pub struct HttpPdfConverter {
    client: Client,
    endpoint: String,
}

impl HttpPdfConverter {
    pub fn new(endpoint: String) -> Result<Self, PdfError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PdfConverter for HttpPdfConverter {
    /// Retries on connection errors, 429 and 5xx with exponential backoff.
    async fn convert(&self, html: &str) -> Result<Bytes, PdfError> {
        let request_body = ConvertRequest {
            html,
            format: "A4",
            print_background: true,
            margin: PageMargin {
                top: "10px",
                right: "10px",
                bottom: "10px",
                left: "10px",
            },
        };

        let mut last_error: Option<PdfError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "PDF conversion attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .header("accept", "application/pdf")
                .json(&request_body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(PdfError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("PDF converter returned {}: {}", status, body);
                last_error = Some(PdfError::Converter {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(PdfError::Converter {
                    status: status.as_u16(),
                    message,
                });
            }

            let pdf = response.bytes().await?;
            if pdf.is_empty() {
                return Err(PdfError::EmptyDocument);
            }
            debug!("PDF conversion succeeded: {} bytes", pdf.len());
            return Ok(pdf);
        }

        Err(last_error.unwrap_or(PdfError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// File name for the `Content-Disposition` header, derived from the resume
/// title. Characters outside a conservative set are replaced by `_`.
pub fn attachment_filename(title: &str) -> String {
    let mut name: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();
    name = name.trim_matches(|c| c == '.' || c == ' ').to_string();
    if name.is_empty() {
        name = "resume".to_string();
    }
    format!("{name}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_filename_keeps_plain_titles() {
        assert_eq!(
            attachment_filename("Resume - 2026-10-16"),
            "Resume - 2026-10-16.pdf"
        );
    }

    #[test]
    fn test_attachment_filename_strips_header_breaking_characters() {
        assert_eq!(
            attachment_filename("Ada \"CV\"\r\n; v2/final"),
            "Ada _CV____ v2_final.pdf"
        );
    }

    #[test]
    fn test_attachment_filename_falls_back_when_empty() {
        assert_eq!(attachment_filename("  ..  "), "resume.pdf");
        assert_eq!(attachment_filename("Ünïcode"), "_n_code.pdf");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ConvertRequest {
            html: "<html></html>",
            format: "A4",
            print_background: true,
            margin: PageMargin {
                top: "10px",
                right: "10px",
                bottom: "10px",
                left: "10px",
            },
        })
        .unwrap();
        assert_eq!(body["printBackground"], true);
        assert_eq!(body["margin"]["left"], "10px");
    }

    #[tokio::test]
    async fn test_unreachable_converter_reports_http_error() {
        let converter = HttpPdfConverter::new("http://127.0.0.1:9/convert".to_string()).unwrap();
        let result = converter.convert("<html></html>").await;
        assert!(matches!(result, Err(PdfError::Http(_))));
    }
}
