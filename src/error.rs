// error.rs - Error types shared by the compression and batch modules

use std::path::PathBuf;
use thiserror::Error;

use crate::settings::OutputFormat;

/// Everything that can go wrong while compressing a single file.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Source is not a valid or supported image
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Reading the source, creating the output directory or writing the output failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The codec rejected the image or the parameters
    #[error("{format} encoding failed: {reason}")]
    Encode { format: OutputFormat, reason: String },

    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("Path has no file name: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl CompressError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn encode(format: OutputFormat, reason: impl ToString) -> Self {
        Self::Encode {
            format,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = CompressError::io(
            "/tmp/photos/compressed",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/photos/compressed"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_encode_message_names_format() {
        let err = CompressError::encode(OutputFormat::WebP, "too large");
        assert_eq!(err.to_string(), "WEBP encoding failed: too large");
    }

    #[test]
    fn test_invalid_quality_message() {
        assert_eq!(
            CompressError::InvalidQuality(0).to_string(),
            "Quality must be between 1 and 100, got 0"
        );
    }
}
