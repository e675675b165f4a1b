// icon_converter.rs — Raster image → .ico conversion
//
// The conversion engine is a capability the core calls through the
// IconConverter trait.  ImageIconConverter is the default, built on the
// `image` crate: decode, fit inside a square, centre on a transparent
// canvas, encode as ICO.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, Rgba, RgbaImage};
use log::debug;

use crate::ehm::AppError;

/// Edge length of produced icons, in pixels.
pub const ICON_SIZE: u32 = 256;





/// Capability: turn an arbitrary image file into an icon resource file.
pub trait IconConverter {

    ////////////////////////////////////////////////////////////////////////////
    //
    //  convert
    //
    //  Read `source`, write a square icon with a transparent background to
    //  `destination` (overwriting it).
    //
    ////////////////////////////////////////////////////////////////////////////

    fn convert(&self, source: &Path, destination: &Path) -> Result<(), AppError>;
}





/// Default converter backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageIconConverter {
    size:   u32,
    filter: FilterType,
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl Default for ImageIconConverter
//
//  256×256, Lanczos resampling.
//
////////////////////////////////////////////////////////////////////////////////

impl Default for ImageIconConverter {
    fn default() -> Self {
        ImageIconConverter {
            size:   ICON_SIZE,
            filter: FilterType::Lanczos3,
        }
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl ImageIconConverter
//
//  Rendering steps, separated from file I/O for testing.
//
////////////////////////////////////////////////////////////////////////////////

impl ImageIconConverter {
    pub fn size(&self) -> u32 {
        self.size
    }





    ////////////////////////////////////////////////////////////////////////////
    //
    //  render
    //
    //  Scale `image` to fit inside size×size keeping its aspect ratio, then
    //  centre it on a fully transparent canvas of exactly size×size.
    //
    ////////////////////////////////////////////////////////////////////////////

    pub fn render(&self, image: &image::DynamicImage) -> RgbaImage {
        let scaled = image.resize(self.size, self.size, self.filter).to_rgba8();

        let mut canvas = RgbaImage::from_pixel(self.size, self.size, Rgba([0, 0, 0, 0]));
        let x = (self.size - scaled.width().min(self.size)) / 2;
        let y = (self.size - scaled.height().min(self.size)) / 2;

        imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));
        canvas
    }
}





////////////////////////////////////////////////////////////////////////////////
//
//  impl IconConverter for ImageIconConverter
//
//  Decode by content (not extension), render, encode as ICO.
//
////////////////////////////////////////////////////////////////////////////////

impl IconConverter for ImageIconConverter {
    fn convert(&self, source: &Path, destination: &Path) -> Result<(), AppError> {
        let reader = ImageReader::open(source)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| AppError::io(source, e))?;

        let image = reader.decode().map_err(|e| AppError::Conversion {
            path:   source.to_path_buf(),
            source: e,
        })?;

        debug!(
            "{}: {}x{} → {}x{} icon",
            source.display(),
            image.width(),
            image.height(),
            self.size,
            self.size
        );

        self.render(&image)
            .save_with_format(destination, ImageFormat::Ico)
            .map_err(|e| AppError::Conversion {
                path:   destination.to_path_buf(),
                source: e,
            })
    }
}
