// settings.rs - Compression parameters captured when a batch starts

use crate::error::CompressError;

/// Name of the folder created next to each source image.
pub const OUTPUT_DIR_NAME: &str = "compressed";

/// Appended to the source file stem.
pub const OUTPUT_SUFFIX: &str = "_compressed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// All formats in the order the format selector lists them.
    pub const ALL: [OutputFormat; 3] = [Self::Jpeg, Self::Png, Self::WebP];

    /// Lowercased format tag used as the output file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn supports_quality(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
            Self::WebP => write!(f, "WEBP"),
        }
    }
}

/// Codec fidelity parameter, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;
    pub const DEFAULT: u8 = 20;

    pub fn new(value: u8) -> Result<Self, CompressError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CompressError::InvalidQuality(value))
        }
    }

    /// Saturates out-of-range values instead of failing.
    pub fn clamped(value: u8) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Parameters for one batch. The window copies its control values into a
/// fresh value when a batch starts; later control changes do not reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub quality: Quality,
    pub format: OutputFormat,
    /// Ask the encoder for its size optimisation pass (oxipng for PNG).
    pub optimize: bool,
    /// Replace outputs left by an earlier run. When false those files are skipped.
    pub overwrite: bool,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            format: OutputFormat::default(),
            optimize: true,
            overwrite: true,
        }
    }
}
