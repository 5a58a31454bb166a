// compression.rs - Decode, convert and re-encode a single image

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageError};
use std::fs;
use std::io::Cursor;
use mozjpeg::{ColorSpace, Compress};
use std::path::Path;
use webp::WebPConfig;

use crate::error::CompressError;
use crate::settings::{CompressionSettings, OutputFormat, Quality};

/// libwebp refuses anything wider or taller than this.
const WEBP_MAX_DIMENSION: u32 = 16383;

/// libwebp effort levels: 4 is its default, 6 the slowest and smallest.
const WEBP_METHOD_DEFAULT: i32 = 4;
const WEBP_METHOD_OPTIMIZED: i32 = 6;

/// oxipng preset used when optimisation is requested.
const OXIPNG_PRESET: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    pub original_size: u64,
    pub compressed_size: u64,
    pub format: OutputFormat,
}

impl CompressionResult {
    pub fn ratio(&self) -> f32 {
        if self.original_size > 0 {
            self.compressed_size as f32 / self.original_size as f32
        } else {
            0.0
        }
    }
}

/// Compress `source` into `output` with the given settings.
///
/// The output is overwritten if it exists. The parent directory of `output`
/// must already exist; see [`crate::batch::ensure_output_dir`].
pub fn compress_one(
    source: &Path,
    output: &Path,
    settings: &CompressionSettings,
) -> Result<CompressionResult, CompressError> {
    let original_size = fs::metadata(source)
        .map_err(|e| CompressError::io(source, e))?
        .len();

    let image = image::open(source).map_err(|e| match e {
        ImageError::IoError(io) => CompressError::io(source, io),
        other => CompressError::Decode {
            path: source.to_path_buf(),
            source: other,
        },
    })?;

    let image = prepare_for_format(flatten_alpha(image), settings.format);
    let data = encode(&image, settings)?;

    fs::write(output, &data).map_err(|e| CompressError::io(output, e))?;

    Ok(CompressionResult {
        original_size,
        compressed_size: data.len() as u64,
        format: settings.format,
    })
}

/// Drop the alpha channel, keeping the bit depth class.
///
/// Palette images with a transparency entry are expanded to RGBA by the
/// decoder, so they take the same path.
pub fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    log::debug!("Dropping alpha channel from {:?} image", image.color());
    match image {
        DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgba16(_) => {
            DynamicImage::ImageRgb16(image.to_rgb16())
        }
        DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Reduce the image to a layout the target codec accepts.
///
/// JPEG takes 8-bit gray or RGB, libwebp 8-bit RGB. PNG takes anything.
pub fn prepare_for_format(image: DynamicImage, format: OutputFormat) -> DynamicImage {
    let accepted = match format {
        OutputFormat::Png => true,
        OutputFormat::Jpeg => matches!(
            image,
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)
        ),
        OutputFormat::WebP => matches!(image, DynamicImage::ImageRgb8(_)),
    };

    if accepted {
        image
    } else {
        log::debug!("Converting {:?} to Rgb8 for {}", image.color(), format);
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Encode an already prepared image into memory.
pub fn encode(
    image: &DynamicImage,
    settings: &CompressionSettings,
) -> Result<Vec<u8>, CompressError> {
    match settings.format {
        OutputFormat::Jpeg => encode_jpeg(image, settings.quality, settings.optimize),
        OutputFormat::Png => encode_png(image, settings.optimize),
        OutputFormat::WebP => encode_webp(image, settings.quality, settings.optimize),
    }
}

// mozjpeg's default profile turns on trellis quantisation, progressive scans
// and optimised Huffman tables. Without `optimize` the baseline libjpeg
// profile is used instead.
fn encode_jpeg(
    image: &DynamicImage,
    quality: Quality,
    optimize: bool,
) -> Result<Vec<u8>, CompressError> {
    let (width, height) = image.dimensions();
    let (color_space, pixels) = match image {
        DynamicImage::ImageLuma8(gray) => (ColorSpace::JCS_GRAYSCALE, gray.as_raw()),
        DynamicImage::ImageRgb8(rgb) => (ColorSpace::JCS_RGB, rgb.as_raw()),
        other => {
            return Err(CompressError::encode(
                OutputFormat::Jpeg,
                format!("unsupported layout {:?}", other.color()),
            ))
        }
    };

    let mut compress = Compress::new(color_space);
    if !optimize {
        compress.set_fastest_defaults();
    }
    compress.set_size(width as usize, height as usize);
    compress.set_quality(quality.get() as f32);
    compress.set_optimize_coding(optimize);

    let jpeg_error = |e: std::io::Error| CompressError::encode(OutputFormat::Jpeg, e);
    let mut started = compress.start_compress(Vec::new()).map_err(jpeg_error)?;
    started.write_scanlines(pixels).map_err(jpeg_error)?;
    started.finish().map_err(jpeg_error)
}

// PNG is lossless, so quality has no say here.
fn encode_png(image: &DynamicImage, optimize: bool) -> Result<Vec<u8>, CompressError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder =
        PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CompressError::encode(OutputFormat::Png, e))?;
    let data = buffer.into_inner();

    if !optimize {
        return Ok(data);
    }

    let options = oxipng::Options::from_preset(OXIPNG_PRESET);
    match oxipng::optimize_from_memory(&data, &options) {
        Ok(optimized) if optimized.len() < data.len() => Ok(optimized),
        Ok(_) => Ok(data),
        Err(e) => {
            log::debug!("oxipng failed, keeping unoptimized PNG: {}", e);
            Ok(data)
        }
    }
}

fn encode_webp(
    image: &DynamicImage,
    quality: Quality,
    optimize: bool,
) -> Result<Vec<u8>, CompressError> {
    let (width, height) = image.dimensions();
    // libwebp rejects these; report them with the actual size
    if width == 0 || height == 0 || width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(CompressError::encode(
            OutputFormat::WebP,
            format!(
                "{}x{} is outside 1..={}px",
                width, height, WEBP_MAX_DIMENSION
            ),
        ));
    }

    let mut config = WebPConfig::new()
        .map_err(|_| CompressError::encode(OutputFormat::WebP, "libwebp config init failed"))?;
    config.quality = quality.get() as f32;
    config.method = if optimize {
        WEBP_METHOD_OPTIMIZED
    } else {
        WEBP_METHOD_DEFAULT
    };

    let rgb = image.to_rgb8();
    let encoder = webp::Encoder::from_rgb(rgb.as_raw(), width, height);
    let webp = encoder
        .encode_advanced(&config)
        .map_err(|e| CompressError::encode(OutputFormat::WebP, format!("{:?}", e)))?;

    Ok(webp.to_vec())
}
