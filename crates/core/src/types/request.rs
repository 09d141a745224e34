use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// Request Types
// =============================================================================

/// The kind of input a support request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

/// Authenticated caller, as produced by the external identity collaborator.
///
/// Opaque to the gateway: the subject is whatever the identity provider
/// returned, never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Subject identifier.
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// An immutable support request after validation.
///
/// The set of modalities is derived from which optional fields are populated,
/// so it always mirrors the payload exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportRequest {
    /// Unique request ID for this request.
    pub request_id: String,

    /// Free-text question, if any.
    pub text_query: Option<String>,

    /// Reference to an image (http(s) URL or data: blob), if any.
    pub image_ref: Option<String>,

    /// Reference to an audio clip (http(s) URL or data: blob), if any.
    pub audio_ref: Option<String>,

    /// Authenticated caller.
    pub caller: Principal,
}

impl SupportRequest {
    /// Create a text-only request with a fresh request ID.
    pub fn text(query: impl Into<String>, caller: Principal) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            text_query: Some(query.into()),
            image_ref: None,
            audio_ref: None,
            caller,
        }
    }

    /// Attach an image reference.
    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Attach an audio reference.
    pub fn with_audio_ref(mut self, audio_ref: impl Into<String>) -> Self {
        self.audio_ref = Some(audio_ref.into());
        self
    }

    /// Modalities present in this request, in Text, Image, Audio order.
    pub fn modalities(&self) -> Vec<Modality> {
        let mut modalities = Vec::with_capacity(3);
        if self.text_query.as_deref().is_some_and(|q| !q.is_empty()) {
            modalities.push(Modality::Text);
        }
        if self.image_ref.is_some() {
            modalities.push(Modality::Image);
        }
        if self.audio_ref.is_some() {
            modalities.push(Modality::Audio);
        }
        modalities
    }

    /// Validate the request shape.
    ///
    /// At least one modality must be present, and every blob reference must
    /// be syntactically well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.modalities().is_empty() {
            return Err(Error::invalid_input(
                "request must carry at least one of text_query, image_ref, audio_ref",
            ));
        }
        if let Some(ref image_ref) = self.image_ref {
            validate_blob_ref("image_ref", image_ref)?;
        }
        if let Some(ref audio_ref) = self.audio_ref {
            validate_blob_ref("audio_ref", audio_ref)?;
        }
        Ok(())
    }
}

/// Check that a blob reference is an http(s) URL or a base64 `data:` blob.
fn validate_blob_ref(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_input(format!("{} is empty", field)));
    }

    if let Some(rest) = value.strip_prefix("data:") {
        // data:<mime>;base64,<payload>
        let payload = rest
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| {
                Error::invalid_input(format!("{} data blob is not base64-encoded", field))
            })?;
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::invalid_input(format!("{} base64 payload invalid: {}", field, e)))?;
        return Ok(());
    }

    let parsed = url::Url::parse(value)
        .map_err(|e| Error::invalid_input(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::invalid_input(format!(
            "{} has unsupported scheme '{}'",
            field, scheme
        ))),
    }
}
