//! Serde mirror of the generateContent request/response JSON.
//!
//! Only the fields this client reads or writes are modeled; everything else
//! in the service's responses is ignored on deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    pub parts: Option<Vec<Part>>,
}

/// A content part: inline binary data or text. The service emits exactly one
/// of the two per part; both are kept optional so mixed responses parse.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentRequest {
    /// One content entry carrying the sketch first, then the instruction,
    /// mirroring the order the service expects for image-grounded prompts.
    pub fn sketch_with_instruction(png_base64: &str, instruction: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: Some(vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: png_base64.to_string(),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(instruction.to_string()),
                    },
                ]),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_image_part_before_text() {
        let request = GenerateContentRequest::sketch_with_instruction("QUJD", "draw a beast");
        let json = serde_json::to_value(&request).expect("serializable request");

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert_eq!(parts[1]["text"], "draw a beast");
        // The unused side of each part stays off the wire entirely.
        assert!(parts[0].get("text").is_none());
        assert!(parts[1].get("inlineData").is_none());
    }

    #[test]
    fn response_parses_camel_case_inline_data() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "here you go"},
                        {"inlineData": {"mimeType": "image/png", "data": "Zm9v"}}
                    ]
                }
            }]
        }"#;
        let response: GenerateContentResponse =
            serde_json::from_str(json).expect("well-formed response");
        let candidates = response.candidates.expect("candidates present");
        let parts = candidates[0]
            .content
            .as_ref()
            .and_then(|c| c.parts.as_ref())
            .expect("parts present");
        assert_eq!(parts.len(), 2);
        assert!(parts[0].inline_data.is_none());
        assert_eq!(
            parts[1].inline_data.as_ref().map(|d| d.data.as_str()),
            Some("Zm9v")
        );
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let response: GenerateContentResponse =
            serde_json::from_str("{}").expect("empty object parses");
        assert!(response.candidates.is_none());

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":null}]}"#).expect("null content");
        assert!(response.candidates.expect("candidates")[0].content.is_none());
    }
}
