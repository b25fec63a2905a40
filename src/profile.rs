//! Template profiles: the narrative brief plus the generation parameters
//! applied to every request a deployment handles.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Substitution point for the caller's theme inside a template.
pub const THEME_SLOT: &str = "{theme}";

pub const DEFAULT_RESOLUTION: &str = "1024x1024";

pub const BOOTH_TEMPLATE: &str = "Generate a professional 3D render of a custom exhibition booth for a trade show.
Company / theme: {theme}
Booth size: 20x20 feet (standard expo booth)
Style: Modern and eye-catching, designed to attract visitors
Colors: Use professional color combinations matching the company's branding theme
Features: Back wall with the company logo and graphics, reception counter, product display area,
LED screens for presentations, seating for meetings, and overhead signage with the brand name
Lighting: Bright and professional, suitable for an expo hall
Background: Realistic expo environment with people around
Angle: Perspective front view
Make the design look photo-realistic, clean, and professional.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("template must contain exactly one {{theme}} slot, found {0}")]
    SlotCount(usize),
    #[error("image count must be at least 1")]
    ZeroImages,
    #[error("output compression must be within 0-100, got {0}")]
    Compression(u8),
    #[error("unknown profile '{0}'")]
    UnknownPreset(String),
    #[error("unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(ProfileError::UnknownValue { kind: "output format", value: other.to_string() }),
        }
    }
}

/// `Unspecified` leaves the quality field off the provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Auto,
    #[default]
    Unspecified,
}

impl QualityTier {
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            QualityTier::Low => Some("low"),
            QualityTier::Medium => Some("medium"),
            QualityTier::High => Some("high"),
            QualityTier::Auto => Some("auto"),
            QualityTier::Unspecified => None,
        }
    }
}

impl FromStr for QualityTier {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(QualityTier::Low),
            "medium" => Ok(QualityTier::Medium),
            "high" => Ok(QualityTier::High),
            "auto" => Ok(QualityTier::Auto),
            "" | "unspecified" | "default" => Ok(QualityTier::Unspecified),
            other => Err(ProfileError::UnknownValue { kind: "quality tier", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateProfile {
    name: String,
    template_text: String,
    image_count: u8,
    resolution: String,
    output_format: OutputFormat,
    output_compression: Option<u8>,
    quality: QualityTier,
}

impl TemplateProfile {
    pub fn new(
        name: impl Into<String>,
        template_text: impl Into<String>,
        image_count: u8,
        resolution: impl Into<String>,
        output_format: OutputFormat,
        output_compression: Option<u8>,
        quality: QualityTier,
    ) -> Result<Self, ProfileError> {
        let template_text = template_text.into();
        let slots = template_text.matches(THEME_SLOT).count();
        if slots != 1 {
            return Err(ProfileError::SlotCount(slots));
        }
        if image_count == 0 {
            return Err(ProfileError::ZeroImages);
        }
        if let Some(c) = output_compression {
            if c > 100 {
                return Err(ProfileError::Compression(c));
            }
        }
        Ok(Self {
            name: name.into(),
            template_text,
            image_count,
            resolution: resolution.into(),
            output_format,
            output_compression,
            quality,
        })
    }

    /// Looks up one of the built-in deployment presets by name.
    pub fn preset(name: &str) -> Result<Self, ProfileError> {
        let (n, compression, quality) = match name {
            "booth-preview" => (2, Some(100), QualityTier::Low),
            "booth-single" => (1, Some(100), QualityTier::Medium),
            "booth-provider-defaults" => (1, None, QualityTier::Unspecified),
            other => return Err(ProfileError::UnknownPreset(other.to_string())),
        };
        Self::new(name, BOOTH_TEMPLATE, n, DEFAULT_RESOLUTION, OutputFormat::Webp, compression, quality)
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["booth-preview", "booth-single", "booth-provider-defaults"]
    }

    /// Same parameters, different narrative. The new text is validated like any other.
    pub fn with_template(self, template_text: impl Into<String>) -> Result<Self, ProfileError> {
        Self::new(
            self.name,
            template_text,
            self.image_count,
            self.resolution,
            self.output_format,
            self.output_compression,
            self.quality,
        )
    }

    /// Splices the caller's theme into the brief. No escaping is applied.
    pub fn render(&self, theme: &str) -> String {
        self.template_text.replacen(THEME_SLOT, theme, 1)
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn template_text(&self) -> &str { &self.template_text }
    pub fn image_count(&self) -> u8 { self.image_count }
    pub fn resolution(&self) -> &str { &self.resolution }
    pub fn output_format(&self) -> OutputFormat { self.output_format }
    pub fn output_compression(&self) -> Option<u8> { self.output_compression }
    pub fn quality(&self) -> QualityTier { self.quality }
}
