//! JSON bodies of the `streamGenerateContent` endpoint.

use nutriscan_core::request::{AnalysisRequest, Part};
use serde::{Deserialize, Serialize};

/// Finish reasons that mean the service withheld the content.
const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Maps an analysis request to a single user turn, keeping part order.
    pub fn from_request(request: &AnalysisRequest) -> Self {
        let parts = request
            .parts()
            .iter()
            .map(|part| match part {
                Part::Image { asset, .. } => RequestPart::InlineData {
                    inline_data: Blob {
                        mime_type: asset.mime_type().to_owned(),
                        data: asset.to_base64(),
                    },
                },
                Part::Text { content } => RequestPart::Text {
                    text: content.clone(),
                },
            })
            .collect();

        Self {
            contents: vec![Content {
                role: "user".to_owned(),
                parts,
            }],
        }
    }
}

/// One conversation turn of the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

/// A request part: inline image bytes or text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    InlineData { inline_data: Blob },
    Text { text: String },
}

/// Base64 encoded inline bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// One streamed response chunk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of every candidate.
    pub fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect()
    }

    /// Returns why the service withheld this chunk, if it did.
    pub fn block_reason(&self) -> Option<&str> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Some(reason);
        }

        self.candidates
            .iter()
            .filter_map(|candidate| candidate.finish_reason.as_deref())
            .find(|reason| BLOCKING_FINISH_REASONS.contains(reason))
    }
}

/// A generated candidate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A response part; non-text parts are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error body returned with non-success statuses and, rarely, mid-stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Details of an API error.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ErrorResponse {
    /// Extracts the message from an error body, if it is one.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .map(|response| response.error.message)
            .filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use nutriscan_core::image::{ImageAsset, ImageFormat};
    use serde_json::json;

    use super::*;

    #[test]
    fn request_keeps_part_order_and_mime_types() {
        let brand = ImageAsset::new(ImageFormat::Png, b"png".to_vec()).unwrap();
        let nutrition = ImageAsset::new(ImageFormat::Jpeg, b"jpg".to_vec()).unwrap();
        let request = AnalysisRequest::new(brand, nutrition);

        let body = serde_json::to_value(GenerateContentRequest::from_request(&request)).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts.len(), 5);
        assert_eq!(
            parts[0],
            json!({"inline_data": {"mime_type": "image/png", "data": "cG5n"}})
        );
        assert_eq!(
            parts[1]["text"],
            "This image contains the brand and product information."
        );
        assert_eq!(parts[2]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[3]["text"], "This image contains the nutritional values.");
        assert!(
            parts[4]["text"]
                .as_str()
                .unwrap()
                .contains("Extract and organize")
        );
    }

    #[test]
    fn response_text_concatenates_parts() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "## Brand"}, {"text": "\n\nAcme"}]},
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 10}
        }))
        .unwrap();

        assert_eq!(chunk.text(), "## Brand\n\nAcme");
        assert_eq!(chunk.block_reason(), None);
    }

    #[test]
    fn blocking_reasons_are_detected() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY", "index": 0}]
        }))
        .unwrap();
        assert_eq!(chunk.block_reason(), Some("SAFETY"));

        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        }))
        .unwrap();
        assert_eq!(chunk.block_reason(), Some("OTHER"));

        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "STOP", "index": 0}]
        }))
        .unwrap();
        assert_eq!(chunk.block_reason(), None);
    }

    #[test]
    fn error_message_is_extracted() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            ErrorResponse::message_from(body).as_deref(),
            Some("API key not valid. Please pass a valid API key.")
        );
        assert_eq!(ErrorResponse::message_from("<html>"), None);
    }
}
