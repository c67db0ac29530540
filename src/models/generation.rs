use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};

/// A validated request to generate one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub width: u32,
    pub height: u32,
    /// Requested length in seconds.
    pub duration: u32,
    pub description: String,
}

/// Generation form as submitted by a browser.
///
/// Every field is optional so that a partially filled form can be reported as
/// "missing fields" instead of a deserialization failure. Numbers may arrive
/// as JSON numbers or numeric strings.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct GenerationForm {
    #[garde(required, range(min = 1))]
    #[serde(default, deserialize_with = "lenient_u32")]
    pub width: Option<u32>,

    #[garde(required, range(min = 1))]
    #[serde(default, deserialize_with = "lenient_u32")]
    pub height: Option<u32>,

    #[garde(required, range(min = 1))]
    #[serde(default, deserialize_with = "lenient_u32")]
    pub duration: Option<u32>,

    #[garde(required, length(min = 1))]
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Missing required fields")]
    MissingFields,
}

impl GenerationForm {
    /// Parse a raw request body. Anything that is not a JSON object with the
    /// expected shape is reported as missing fields.
    pub fn parse(body: &[u8]) -> Result<GenerationRequest, FormError> {
        let form: GenerationForm =
            serde_json::from_slice(body).map_err(|_| FormError::MissingFields)?;
        GenerationRequest::try_from(form)
    }
}

impl TryFrom<GenerationForm> for GenerationRequest {
    type Error = FormError;

    fn try_from(form: GenerationForm) -> Result<Self, Self::Error> {
        if let Err(report) = form.validate() {
            tracing::debug!(%report, "Generation form failed validation");
            return Err(FormError::MissingFields);
        }

        match form {
            GenerationForm {
                width: Some(width),
                height: Some(height),
                duration: Some(duration),
                description: Some(description),
            } => Ok(Self {
                width,
                height,
                duration,
                description,
            }),
            _ => Err(FormError::MissingFields),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

/// Accepts `1920`, `1920.0` or `"1920"`. Values that cannot be read as a
/// non-negative integer become `None`.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        NumberOrText::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        NumberOrText::Text(s) => s.trim().parse::<u32>().ok(),
    }))
}
