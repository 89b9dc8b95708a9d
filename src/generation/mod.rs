mod error;
mod wire;

pub use error::GenerationError;
// The transport error rides inside `GenerationError::Transport`; re-exported
// here so callers can name it.
pub use crate::networking::NetworkError;

use crate::networking::HttpClient;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use wire::{GenerateContentRequest, GenerateContentResponse};

/// Fixed framing that keeps every result a creature, whatever the user types.
const BASE_INSTRUCTION: &str = "Transform this rough sketch into a living, breathing creature or monster. The output must be a high-quality, polished 2D art illustration. Use the sketch as the structural basis for the creature's body/anatomy.";

/// Style applied when the user supplies no traits of their own.
const FALLBACK_STYLE: &str = "Style: detailed, vibrant fantasy art.";

/// Injected endpoint/credential/model configuration. The credential is read
/// from the environment by the binary, never by this module.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash-image".to_string(),
        }
    }
}

/// An image returned by the service: a mime type plus base64 payload, held
/// in wire form until someone needs the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    /// `data:<mime>;base64,<payload>`, directly displayable/downloadable.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }
}

/// Client for the external image-generation service. One request at a time
/// is the caller's contract; the client itself is stateless and cheap to
/// clone onto a worker task.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    config: GenerationConfig,
    http: HttpClient,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            http: HttpClient::new(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Submit the sketch (bare-base64 PNG) plus optional trait prompt.
    ///
    /// `Ok(Some(_))` carries the first inline image in the response,
    /// `Ok(None)` means the call succeeded but produced no image, and any
    /// transport or service failure propagates unmodified, with no retries.
    pub async fn generate(
        &self,
        png_base64: &str,
        prompt: Option<&str>,
    ) -> Result<Option<GeneratedImage>, GenerationError> {
        let instruction = compose_instruction(prompt);
        let request = GenerateContentRequest::sketch_with_instruction(png_base64, &instruction);
        let body = serde_json::to_vec(&request)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        log::info!(
            target: "generation",
            "Submitting sketch to {} ({} bytes of PNG base64)",
            self.config.model,
            png_base64.len()
        );

        let response = self
            .http
            .post(
                &url,
                "application/json",
                &[("x-goog-api-key", self.config.api_key.as_str())],
                body,
            )
            .await?;

        if !response.status.is_success() {
            log::warn!(
                target: "generation",
                "Service rejected request: {} {}",
                response.status.code,
                response.status.text
            );
            return Err(GenerationError::Rejected {
                code: response.status.code,
                text: response.status.text,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        match first_inline_image(parsed) {
            Some(image) => {
                log::info!(
                    target: "generation",
                    "Received {} image ({} base64 chars)",
                    image.mime_type,
                    image.data.len()
                );
                Ok(Some(image))
            }
            None => {
                log::info!(target: "generation", "Call succeeded but returned no image part");
                Ok(None)
            }
        }
    }
}

/// Concatenate the fixed creature framing with the user's traits, or with
/// the fallback style when none were given.
fn compose_instruction(prompt: Option<&str>) -> String {
    let specific = match prompt {
        Some(traits) if !traits.trim().is_empty() => {
            format!("Specific traits or style: {}", traits)
        }
        _ => FALLBACK_STYLE.to_string(),
    };
    format!("{} {}", BASE_INSTRUCTION, specific)
}

/// Scan candidates' parts in order; the first inline-image part wins. Text
/// parts are commentary and are skipped.
fn first_inline_image(response: GenerateContentResponse) -> Option<GeneratedImage> {
    for candidate in response.candidates? {
        let Some(parts) = candidate.content.and_then(|c| c.parts) else {
            continue;
        };
        for part in parts {
            if let Some(inline) = part.inline_data {
                if !inline.data.is_empty() {
                    return Some(GeneratedImage {
                        mime_type: inline.mime_type,
                        data: inline.data,
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).expect("well-formed test response")
    }

    #[test]
    fn instruction_embeds_user_prompt_verbatim() {
        let composed = compose_instruction(Some("Cute, Scary, Robotic"));
        assert!(composed.starts_with(BASE_INSTRUCTION));
        assert!(composed.ends_with("Specific traits or style: Cute, Scary, Robotic"));
    }

    #[test]
    fn instruction_falls_back_to_fixed_style() {
        let composed = compose_instruction(None);
        assert!(composed.ends_with(FALLBACK_STYLE));
        // A whitespace-only prompt counts as absent.
        assert_eq!(compose_instruction(Some("   ")), composed);
    }

    #[test]
    fn first_inline_image_skips_text_parts() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"behold"},
                {"inlineData":{"mimeType":"image/webp","data":"AAAA"}},
                {"inlineData":{"mimeType":"image/png","data":"BBBB"}}
            ]}}]}"#,
        );
        let image = first_inline_image(response).expect("image present");
        // Mime type is echoed from the service, not assumed to be PNG.
        assert_eq!(image.mime_type, "image/webp");
        assert_eq!(image.data, "AAAA");
    }

    #[test]
    fn text_only_response_is_no_image_not_an_error() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[{"text":"no can do"}]}}]}"#);
        assert!(first_inline_image(response).is_none());
    }

    #[test]
    fn empty_or_degenerate_responses_yield_no_image() {
        assert!(first_inline_image(parse("{}")).is_none());
        assert!(first_inline_image(parse(r#"{"candidates":[]}"#)).is_none());
        assert!(first_inline_image(parse(r#"{"candidates":[{"content":null}]}"#)).is_none());
        // An inline part with an empty payload is not a result.
        assert!(
            first_inline_image(parse(
                r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":""}}]}}]}"#
            ))
            .is_none()
        );
    }

    #[test]
    fn data_uri_shape() {
        let image = GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "aGk=".to_string(),
        };
        assert_eq!(image.data_uri(), "data:image/png;base64,aGk=");
        assert_eq!(image.bytes().expect("valid base64"), b"hi");
    }

    #[tokio::test]
    async fn generate_round_trip_against_local_service() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();

        // Minimal one-shot stand-in for the service: capture the request,
        // answer with a single inline-image part.
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                let n = socket.read(&mut buffer).await.expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..n]);
                if let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                    let content_length: usize = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"Zm9v"}}]}}]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            socket.shutdown().await.ok();
            request
        });

        let client = GenerationClient::new(GenerationConfig {
            endpoint: format!("http://127.0.0.1:{port}"),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
        });

        let image = client
            .generate("QUJD", Some("three heads"))
            .await
            .expect("round trip")
            .expect("image present");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data_uri(), "data:image/png;base64,Zm9v");

        let request = server.await.expect("server task");
        let request_text = String::from_utf8_lossy(&request);
        assert!(request_text.contains("POST /v1beta/models/test-model:generateContent HTTP/1.1"));
        assert!(request_text.contains("x-goog-api-key: test-key"));
        // The user's traits ride inside the composed instruction verbatim,
        // and the sketch payload is the inline image part.
        assert!(request_text.contains("Specific traits or style: three heads"));
        assert!(request_text.contains(r#""data":"QUJD""#));
        assert!(request_text.contains(r#""mimeType":"image/png""#));
    }

    #[tokio::test]
    async fn transport_failure_propagates_unmodified() {
        // Port 1 on loopback refuses connections; the error must surface as a
        // transport failure rather than being retried or swallowed.
        let client = GenerationClient::new(GenerationConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
        });
        let outcome = client.generate("QUJD", None).await;
        assert!(matches!(outcome, Err(GenerationError::Transport(_))));
    }
}
