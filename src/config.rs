use crate::error::ConfigError;

pub const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GENAI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://api.unsplash.com";

/// Process configuration for the two upstream services. The generative-text
/// credential is required; without the image credential the image fetcher
/// degrades to the curated table.
#[derive(Debug, Clone)]
pub struct Config {
    pub genai_api_key: String,
    pub genai_base_url: String,
    pub genai_model: String,
    pub image_api_key: Option<String>,
    pub image_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let genai_api_key = lookup("GENAI_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("GENAI_API_KEY"))?;

        Ok(Self {
            genai_api_key,
            genai_base_url: lookup("GENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GENAI_BASE_URL.to_string()),
            genai_model: lookup("GENAI_MODEL").unwrap_or_else(|| DEFAULT_GENAI_MODEL.to_string()),
            image_api_key: lookup("IMAGE_API_KEY").filter(|v| !v.trim().is_empty()),
            image_base_url: lookup("IMAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
        })
    }
}
