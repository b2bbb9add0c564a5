//! Vertical-strip import and export through the `image` crate
//!
//! A strip is one face wide and six faces tall, faces stacked in cube order.
//! That is exactly the face-major layout of a single-mip [`Image`], so
//! conversion is a straight copy.

use crate::cubemap::Image;
use crate::error::{Error, Result};
use crate::face::CubeFace;
use glam::Vec4;
use image::{DynamicImage, ImageFormat, Rgba32FImage};
use std::path::Path;

impl Image {
    /// Build a single-mip cubemap from a decoded vertical strip
    pub fn from_dynamic_strip(strip: &DynamicImage) -> Result<Self> {
        let (width, height) = (strip.width(), strip.height());
        if width == 0 || height != width * 6 {
            return Err(Error::InvalidStrip { width, height });
        }

        let data: Vec<Vec4> = strip
            .to_rgba32f()
            .into_raw()
            .chunks_exact(4)
            .map(Vec4::from_slice)
            .collect();
        Image::from_texels(width, width, 6, 1, data).ok_or(Error::InvalidStrip { width, height })
    }

    /// Decode a strip file
    pub fn load_strip<P: AsRef<Path>>(path: P) -> Result<Self> {
        let strip = image::open(path)?;
        Self::from_dynamic_strip(&strip)
    }

    /// One mip of the cubemap as a float vertical strip
    pub fn to_dynamic_strip(&self, mip: u32) -> Result<DynamicImage> {
        self.ensure_cubemap()?;
        let mip = mip.min(self.mip_count() - 1);
        let size = self.mip_face_size(mip);

        let mut raw = Vec::with_capacity(size as usize * size as usize * 6 * 4);
        for face in CubeFace::ALL {
            for texel in self.face(face, mip) {
                raw.extend_from_slice(&texel.to_array());
            }
        }

        let height = size * 6;
        Rgba32FImage::from_raw(size, height, raw)
            .map(DynamicImage::ImageRgba32F)
            .ok_or(Error::InvalidStrip { width: size, height })
    }

    /// Encode one mip as a strip; the format follows the file extension
    ///
    /// EXR keeps float RGBA, HDR keeps float RGB, JPEG gets 8-bit RGB and
    /// everything else 8-bit RGBA.
    pub fn save_strip<P: AsRef<Path>>(&self, mip: u32, path: P) -> Result<()> {
        let path = path.as_ref();
        let strip = self.to_dynamic_strip(mip)?;
        let format = ImageFormat::from_path(path)?;

        let encoded = match format {
            ImageFormat::OpenExr => strip,
            ImageFormat::Hdr => DynamicImage::ImageRgb32F(strip.to_rgb32f()),
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(strip.to_rgb8()),
            _ => DynamicImage::ImageRgba8(strip.to_rgba8()),
        };
        encoded.save_with_format(path, format)?;

        tracing::debug!(path = %path.display(), mip, ?format, "strip saved");
        Ok(())
    }
}
