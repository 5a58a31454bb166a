// batch.rs - Run a list of files through the compressor

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::compression::{compress_one, CompressionResult};
use crate::error::CompressError;
use crate::settings::{CompressionSettings, OutputFormat, OUTPUT_DIR_NAME, OUTPUT_SUFFIX};

/// Shown when every file of a batch was written.
pub const COMPLETION_MESSAGE: &str =
    "The images were compressed and saved in the 'compressed' folder.";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

#[derive(Debug)]
pub enum FileStatus {
    Compressed(CompressionResult),
    /// Output already existed and overwriting was turned off.
    Skipped,
    Failed(CompressError),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub source: PathBuf,
    /// `None` when no output location could be derived from the source path.
    pub output: Option<PathBuf>,
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Compressed(_))
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Skipped))
            .count()
    }

    /// True when nothing failed. Skipped files do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary(&self) -> String {
        if self.outcomes.is_empty() {
            return "No images to compress.".to_string();
        }

        if self.failed() == 0 && self.skipped() == 0 {
            return COMPLETION_MESSAGE.to_string();
        }

        let mut summary = format!(
            "Compressed {} of {} images",
            self.succeeded(),
            self.outcomes.len()
        );
        if self.skipped() > 0 {
            summary.push_str(&format!(", {} skipped", self.skipped()));
        }
        if self.failed() > 0 {
            summary.push_str(&format!(", {} failed", self.failed()));
        }
        summary.push('.');
        summary
    }
}

/// `<parent>/compressed/<stem>_compressed.<ext>` for the given source.
pub fn output_path_for(source: &Path, format: OutputFormat) -> Result<PathBuf, CompressError> {
    let stem = source
        .file_stem()
        .ok_or_else(|| CompressError::InvalidPath(source.to_path_buf()))?;

    let parent = match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file_name = stem.to_os_string();
    file_name.push(OUTPUT_SUFFIX);
    file_name.push(".");
    file_name.push(format.extension());

    Ok(parent.join(OUTPUT_DIR_NAME).join(file_name))
}

/// Create the output directory if needed. Safe to call repeatedly.
pub fn ensure_output_dir(dir: &Path) -> Result<(), CompressError> {
    fs::create_dir_all(dir).map_err(|e| CompressError::io(dir, e))
}

/// Compress every path in order, recording one outcome per path.
///
/// A failing file never stops the batch.
pub fn process_files<P: AsRef<Path>>(paths: &[P], settings: &CompressionSettings) -> BatchReport {
    log::info!(
        "Compressing {} file(s) to {} at quality {}",
        paths.len(),
        settings.format,
        settings.quality.get()
    );

    let outcomes = paths
        .iter()
        .map(|path| process_single_file(path.as_ref(), settings))
        .collect();
    let report = BatchReport { outcomes };

    log::info!(
        "Batch finished: {} compressed, {} skipped, {} failed",
        report.succeeded(),
        report.skipped(),
        report.failed()
    );
    report
}

fn process_single_file(source: &Path, settings: &CompressionSettings) -> FileOutcome {
    let output = match output_path_for(source, settings.format) {
        Ok(output) => output,
        Err(e) => {
            log::warn!("{}", e);
            return FileOutcome {
                source: source.to_path_buf(),
                output: None,
                status: FileStatus::Failed(e),
            };
        }
    };

    let status = match compress_to(source, &output, settings) {
        Ok(Some(result)) => {
            log::info!(
                "{} -> {} ({} -> {} bytes)",
                source.display(),
                output.display(),
                result.original_size,
                result.compressed_size
            );
            FileStatus::Compressed(result)
        }
        Ok(None) => {
            log::info!("Skipping {}, output exists", source.display());
            FileStatus::Skipped
        }
        Err(e) => {
            log::warn!("{}", e);
            FileStatus::Failed(e)
        }
    };

    FileOutcome {
        source: source.to_path_buf(),
        output: Some(output),
        status,
    }
}

fn compress_to(
    source: &Path,
    output: &Path,
    settings: &CompressionSettings,
) -> Result<Option<CompressionResult>, CompressError> {
    if let Some(dir) = output.parent() {
        ensure_output_dir(dir)?;
    }

    if !settings.overwrite && output.exists() {
        return Ok(None);
    }

    compress_one(source, output, settings).map(Some)
}

/// Turn user-supplied paths into the list of files to compress.
///
/// Files are kept as given. Directories are walked for image files, leaving
/// out earlier `compressed` output folders.
pub fn expand_inputs<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            files.push(path.to_path_buf());
            continue;
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_output_dir(e.path()));
        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_image_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files
}

fn is_output_dir(path: &Path) -> bool {
    path.is_dir() && path.file_name().is_some_and(|name| name == OUTPUT_DIR_NAME)
}

fn is_image_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_output_path_basic() {
        let output = output_path_for(Path::new("/photos/holiday.jpg"), OutputFormat::WebP).unwrap();
        assert_eq!(
            output,
            PathBuf::from("/photos/compressed/holiday_compressed.webp")
        );
    }

    #[test]
    fn test_output_path_uses_jpeg_not_jpg() {
        let output = output_path_for(Path::new("/photos/a.png"), OutputFormat::Jpeg).unwrap();
        assert_eq!(output, PathBuf::from("/photos/compressed/a_compressed.jpeg"));
    }

    #[test]
    fn test_output_path_keeps_inner_dots() {
        let output = output_path_for(Path::new("/x/scan.2024.01.TIFF"), OutputFormat::Png).unwrap();
        assert_eq!(
            output,
            PathBuf::from("/x/compressed/scan.2024.01_compressed.png")
        );
    }

    #[test]
    fn test_output_path_without_extension() {
        let output = output_path_for(Path::new("/x/raw"), OutputFormat::Png).unwrap();
        assert_eq!(output, PathBuf::from("/x/compressed/raw_compressed.png"));
    }

    #[test]
    fn test_output_path_dot_file_keeps_name() {
        let output = output_path_for(Path::new("/d/.hidden"), OutputFormat::Jpeg).unwrap();
        assert_eq!(
            output,
            PathBuf::from("/d/compressed/.hidden_compressed.jpeg")
        );
    }

    #[test]
    fn test_output_path_bare_file_name() {
        let output = output_path_for(Path::new("photo.PNG"), OutputFormat::Jpeg).unwrap();
        assert_eq!(output, PathBuf::from("./compressed/photo_compressed.jpeg"));
    }

    #[test]
    fn test_output_path_rejects_missing_file_name() {
        assert!(matches!(
            output_path_for(Path::new("/"), OutputFormat::Jpeg),
            Err(CompressError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a.JPG")));
        assert!(is_image_file(Path::new("a.webp")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("README")));
    }

    #[test]
    fn test_summary_wording() {
        assert_eq!(BatchReport::default().summary(), "No images to compress.");

        let report = BatchReport {
            outcomes: vec![
                FileOutcome {
                    source: PathBuf::from("a.png"),
                    output: None,
                    status: FileStatus::Compressed(CompressionResult {
                        original_size: 100,
                        compressed_size: 50,
                        format: OutputFormat::Jpeg,
                    }),
                },
                FileOutcome {
                    source: PathBuf::from("b.png"),
                    output: None,
                    status: FileStatus::Skipped,
                },
                FileOutcome {
                    source: PathBuf::from("c.png"),
                    output: None,
                    status: FileStatus::Failed(CompressError::InvalidQuality(0)),
                },
            ],
        };
        assert_eq!(
            report.summary(),
            "Compressed 1 of 3 images, 1 skipped, 1 failed."
        );
        assert!(!report.is_success());
    }

    proptest! {
        #[test]
        fn prop_output_path_shape(
            stem in "[A-Za-z0-9_-]{1,16}",
            ext in "[A-Za-z]{1,5}",
            format_index in 0usize..3,
        ) {
            let format = OutputFormat::ALL[format_index];
            let source = PathBuf::from("/data/in").join(format!("{}.{}", stem, ext));
            let output = output_path_for(&source, format).unwrap();

            let expected = PathBuf::from("/data/in/compressed")
                .join(format!("{}_compressed.{}", stem, format.extension()));
            prop_assert_eq!(output, expected);
        }
    }
}
