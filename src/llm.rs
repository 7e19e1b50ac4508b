use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::preferences::PreferenceDescriptor;

/// Client for the generative-text upstream. Speaks two wire dialects,
/// selected from the base URL: the Gemini REST shape for the real service,
/// and the plain `{"prompt"} -> {"output"}` shape of the mock upstream.
#[derive(Clone)]
pub struct DesignClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
    is_gemini: bool,
}

impl DesignClient {
    pub fn new(config: &Config) -> Self {
        let is_gemini = config.genai_base_url.contains("generativelanguage");

        // HTTP/1.1 only, no upgrade: keeps the client compatible with the
        // mock upstream as well as the real endpoint.
        let http = Client::builder()
            .http1_only()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: config.genai_base_url.clone(),
            model: config.genai_model.clone(),
            api_key: config.genai_api_key.clone(),
            is_gemini,
        }
    }

    /// One upstream call per invocation, no retries. Returns the generated
    /// Markdown, or an error for the caller to recover with the fallback
    /// template.
    pub async fn generate_design(
        &self,
        descriptor: &PreferenceDescriptor,
    ) -> Result<String, UpstreamError> {
        let prompt = build_prompt(descriptor);

        let raw = if self.is_gemini {
            self.call_gemini(&prompt).await?
        } else {
            self.call_mock_server(&prompt).await?
        };

        let text = strip_code_fence(&raw);
        if text.trim().is_empty() {
            return Err(UpstreamError::Empty);
        }
        Ok(text)
    }

    async fn call_gemini(&self, prompt: &str) -> Result<String, UpstreamError> {
        #[derive(Serialize)]
        struct GeminiPart<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct GeminiContent<'a> {
            parts: Vec<GeminiPart<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiRequest<'a> {
            contents: Vec<GeminiContent<'a>>,
        }

        #[derive(Deserialize)]
        struct GeminiReplyPart {
            #[serde(default)]
            text: String,
        }

        #[derive(Deserialize)]
        struct GeminiReplyContent {
            #[serde(default)]
            parts: Vec<GeminiReplyPart>,
        }

        #[derive(Deserialize)]
        struct GeminiCandidate {
            content: Option<GeminiReplyContent>,
        }

        #[derive(Deserialize)]
        struct GeminiResponse {
            #[serde(default)]
            candidates: Vec<GeminiCandidate>,
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GeminiRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart { text: prompt }],
                }],
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::Status { status, body });
        }

        let body: GeminiResponse = resp.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .flat_map(|c| c.content.map(|content| content.parts).unwrap_or_default())
            .map(|p| p.text)
            .collect();
        Ok(text)
    }

    async fn call_mock_server(&self, prompt: &str) -> Result<String, UpstreamError> {
        #[derive(Serialize)]
        struct GenRequest<'a> {
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct GenResponse {
            output: String,
        }

        let resp = self
            .http
            .post(&self.base_url)
            .header("Connection", "close")
            .json(&GenRequest { prompt })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UpstreamError::Status { status, body });
        }

        let body: GenResponse = resp.json().await?;
        Ok(body.output)
    }
}

/// Fixed-shape prompt naming the five sections every design plan carries.
pub fn build_prompt(descriptor: &PreferenceDescriptor) -> String {
    let mut s = String::new();

    s.push_str("Create a detailed custom home design plan with:\n");
    s.push_str(&format!("- Style: {}\n", descriptor.style));
    s.push_str(&format!("- Size: {}\n", descriptor.size));
    s.push_str(&format!("- Rooms: {}\n", descriptor.room_count));
    s.push_str(&format!(
        "- Preferences: {}\n",
        descriptor.flattened_preferences()
    ));
    s.push('\n');
    s.push_str("Include:\n");
    s.push_str("1. Design concept overview\n");
    s.push_str("2. Layout with room sizes\n");
    s.push_str("3. Furniture recommendations\n");
    s.push_str("4. Materials and finishes\n");
    s.push_str("5. Style-specific tips\n");
    s.push('\n');
    s.push_str("Format in Markdown with clear headings.\n");

    s
}

/// Deterministic design plan synthesized from the local fields alone. Used
/// whenever the upstream call fails; never fails itself and always yields
/// well-formed Markdown naming the submitted style, size and room count.
pub fn fallback_design(descriptor: &PreferenceDescriptor) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "## {} Home Design: {}, {} Rooms\n\n",
        descriptor.style, descriptor.size, descriptor.room_count
    ));
    s.push_str("**Overview:**\n\n");
    s.push_str(&format!(
        "This {} home features {} rooms across {}.\n\n",
        descriptor.style.to_lowercase(),
        descriptor.room_count,
        descriptor.size
    ));
    s.push_str("**Layout:**\n\n");
    s.push_str("- Open living area\n");
    s.push_str(&format!("- {} rooms\n", descriptor.room_count));
    if descriptor.amenities.is_empty() {
        s.push_str("- Modern amenities\n");
    } else {
        s.push_str(&format!(
            "- Amenities: {}\n",
            descriptor.amenities.join(", ")
        ));
    }
    s.push_str("\n**Design Tips:**\n\n");
    s.push_str("- Use natural materials\n");
    s.push_str("- Large windows for light\n");
    s.push_str("- Functional spaces\n\n");
    s.push_str("Note: Custom design generation is unavailable right now. Try again later.\n");

    s
}

/// Strip an enclosing Markdown code fence, which some models wrap their
/// whole answer in.
fn strip_code_fence(response: &str) -> String {
    let mut cleaned = response.trim();

    if cleaned.starts_with("```") {
        if let Some(start_idx) = cleaned.find('\n') {
            cleaned = &cleaned[start_idx + 1..];
        } else {
            cleaned = &cleaned[3..];
        }
        if cleaned.ends_with("```") {
            cleaned = &cleaned[..cleaned.len() - 3];
        }
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{aggregate, RawFields};

    fn descriptor() -> PreferenceDescriptor {
        let raw = RawFields {
            style: "Modern".to_string(),
            size: "2000 sq ft".to_string(),
            rooms: "4".to_string(),
            extras: Some("home theater".to_string()),
            ..RawFields::default()
        };
        aggregate(&raw).unwrap()
    }

    #[test]
    fn test_prompt_names_all_five_sections() {
        let prompt = build_prompt(&descriptor());
        for section in [
            "Design concept overview",
            "Layout with room sizes",
            "Furniture recommendations",
            "Materials and finishes",
            "Style-specific tips",
        ] {
            assert!(prompt.contains(section), "prompt missing: {section}");
        }
    }

    #[test]
    fn test_prompt_carries_inputs() {
        let prompt = build_prompt(&descriptor());
        assert!(prompt.contains("Style: Modern"));
        assert!(prompt.contains("Size: 2000 sq ft"));
        assert!(prompt.contains("Rooms: 4"));
        assert!(prompt.contains("Extras: home theater"));
        assert!(prompt.contains("Format in Markdown"));
    }

    #[test]
    fn test_fallback_contains_literal_inputs() {
        let text = fallback_design(&descriptor());
        assert!(!text.is_empty());
        assert!(text.contains("Modern"));
        assert!(text.contains("2000 sq ft"));
        assert!(text.contains("4"));
        assert!(text.contains("unavailable"));
        assert!(text.starts_with("## "));
    }

    #[test]
    fn test_fallback_lists_amenities_when_present() {
        let raw = RawFields {
            style: "Rustic".to_string(),
            size: "1200 sq ft".to_string(),
            rooms: "2".to_string(),
            amenities: vec!["Garden".to_string(), "Gym".to_string()],
            ..RawFields::default()
        };
        let text = fallback_design(&aggregate(&raw).unwrap());
        assert!(text.contains("Amenities: Garden, Gym"));
    }

    #[test]
    fn test_strip_code_fence_removes_wrapping() {
        let fenced = "```markdown\n# Plan\n\nBody\n```";
        assert_eq!(strip_code_fence(fenced), "# Plan\n\nBody");
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  # Plan\n"), "# Plan");
    }
}
