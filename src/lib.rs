//! Batch image re-encoding into a `compressed` folder next to each source.
//!
//! The window in `main.rs` only collects paths and control values; all file
//! work happens here and can be driven without a GUI:
//!
//! ```no_run
//! use image_compressor::{process_files, CompressionSettings, OutputFormat, Quality};
//!
//! let settings = CompressionSettings {
//!     quality: Quality::new(50).unwrap(),
//!     format: OutputFormat::WebP,
//!     ..Default::default()
//! };
//! let report = process_files(&["photos/beach.png"], &settings);
//! println!("{}", report.summary());
//! ```

pub mod batch;
pub mod compression;
pub mod error;
pub mod settings;

pub use batch::{expand_inputs, output_path_for, process_files, BatchReport, FileOutcome, FileStatus};
pub use compression::{compress_one, CompressionResult};
pub use error::CompressError;
pub use settings::{CompressionSettings, OutputFormat, Quality};
