use crate::error::Error;
use crate::pixels::PixelBuffer;
use image::imageops::FilterType;

//===========================================================================//

/// Produces resized renditions of a source image.
///
/// Implementations must be deterministic: the same source buffer and target
/// dimensions must always yield identical pixel data, so that assembled ICO
/// files are reproducible.
pub trait Resampler {
    /// Returns a new `width`x`height` buffer resampled from `source`.
    fn resample(
        &self,
        source: &PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, Error>;
}

//===========================================================================//

/// The default [`Resampler`], backed by the `image` crate's bilinear
/// (triangle) filter.  Channels are filtered independently with straight
/// (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(
        &self,
        source: &PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EncodingFailed {
                size: width.max(height),
                reason: "target dimensions must be nonzero".to_string(),
            });
        }
        let buffer = match image::RgbaImage::from_raw(
            source.width(),
            source.height(),
            source.rgba_data().to_vec(),
        ) {
            Some(buffer) => buffer,
            None => {
                return Err(Error::EncodingFailed {
                    size: width,
                    reason: "source buffer has the wrong length".to_string(),
                });
            }
        };
        let resized =
            image::imageops::resize(&buffer, width, height, FilterType::Triangle);
        Ok(PixelBuffer::from_rgba_data(width, height, resized.into_raw()))
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{LinearResampler, Resampler};
    use crate::pixels::PixelBuffer;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> PixelBuffer {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..(width * height) {
            rgba.extend_from_slice(&color);
        }
        PixelBuffer::from_rgba_data(width, height, rgba)
    }

    #[test]
    fn downscale_dimensions() {
        let source = solid(64, 64, [0xff, 0x00, 0x00, 0xff]);
        let result = LinearResampler.resample(&source, 16, 16).unwrap();
        assert_eq!(result.width(), 16);
        assert_eq!(result.height(), 16);
        assert_eq!(result.rgba_data().len(), 16 * 16 * 4);
    }

    #[test]
    fn solid_color_stays_solid() {
        let source = solid(48, 48, [0x12, 0x34, 0x56, 0xff]);
        let result = LinearResampler.resample(&source, 32, 32).unwrap();
        for pixel in result.rgba_data().chunks(4) {
            assert_eq!(pixel, [0x12, 0x34, 0x56, 0xff]);
        }
    }

    #[test]
    fn upscale_is_supported() {
        let source = solid(64, 64, [0x00, 0xff, 0x00, 0xff]);
        let result = LinearResampler.resample(&source, 256, 256).unwrap();
        assert_eq!(result.width(), 256);
        assert_eq!(result.height(), 256);
    }

    #[test]
    fn resampling_is_deterministic() {
        let mut rgba = Vec::new();
        for index in 0..(33u32 * 21) {
            rgba.push((index % 251) as u8);
            rgba.push((index % 127) as u8);
            rgba.push((index % 63) as u8);
            rgba.push(255 - (index % 200) as u8);
        }
        let source = PixelBuffer::from_rgba_data(33, 21, rgba);
        let first = LinearResampler.resample(&source, 16, 16).unwrap();
        let second = LinearResampler.resample(&source, 16, 16).unwrap();
        assert_eq!(first.rgba_data(), second.rgba_data());
    }

    #[test]
    fn zero_target_size_fails() {
        let source = solid(8, 8, [0, 0, 0, 0xff]);
        assert!(LinearResampler.resample(&source, 0, 16).is_err());
    }
}

//===========================================================================//
