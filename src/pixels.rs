use crate::error::Error;
use std::fs;
use std::path::Path;

//===========================================================================//

// Size limits for images stored in an ICO file:
const MIN_WIDTH: u32 = 1;
const MIN_HEIGHT: u32 = 1;

//===========================================================================//

/// An in-memory RGBA image.
///
/// Pixel data is tightly packed at four bytes per pixel, in row-major order
/// from top to bottom, with straight (non-premultiplied) alpha.
#[derive(Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba_data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a new buffer with the given dimensions and RGBA data.  The
    /// `width` and `height` must be nonzero, and `rgba_data` must have `4 *
    /// width * height` bytes.  Panics if the dimensions are out of range or
    /// if `rgba_data` is the wrong length.
    pub fn from_rgba_data(
        width: u32,
        height: u32,
        rgba_data: Vec<u8>,
    ) -> PixelBuffer {
        if width < MIN_WIDTH {
            panic!(
                "Invalid width (was {}, but must be at least {})",
                width, MIN_WIDTH
            );
        }
        if height < MIN_HEIGHT {
            panic!(
                "Invalid height (was {}, but must be at least {})",
                height, MIN_HEIGHT
            );
        }
        let expected_data_len = (width as u64) * (height as u64) * 4;
        if (rgba_data.len() as u64) != expected_data_len {
            panic!(
                "Invalid data length (was {}, but must be {} for {}x{} image)",
                rgba_data.len(),
                expected_data_len,
                width,
                height
            );
        }
        PixelBuffer { width, height, rgba_data }
    }

    /// Opens and decodes a source image file into an RGBA buffer.  Any
    /// format supported by the `image` crate is accepted; non-RGBA inputs
    /// are converted to straight-alpha RGBA.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = match image::load_from_memory(&bytes) {
            Ok(decoded) => decoded,
            Err(error) => {
                return Err(Error::DecodeFailed {
                    path: path.to_path_buf(),
                    reason: error.to_string(),
                });
            }
        };
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(PixelBuffer::from_rgba_data(width, height, rgba.into_raw()))
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the RGBA data for this image, in row-major order from top to
    /// bottom.
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Consumes the buffer and returns its RGBA data.
    pub fn into_rgba_data(self) -> Vec<u8> {
        self.rgba_data
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::PixelBuffer;
    use crate::error::Error;
    use std::io::Write;

    #[test]
    fn buffer_accessors() {
        let buffer =
            PixelBuffer::from_rgba_data(2, 3, vec![0x7f; 2 * 3 * 4]);
        assert_eq!(buffer.width(), 2);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.rgba_data().len(), 24);
        assert_eq!(buffer.into_rgba_data(), vec![0x7f; 24]);
    }

    #[test]
    #[should_panic(expected = "Invalid width")]
    fn zero_width_panics() {
        let _ = PixelBuffer::from_rgba_data(0, 1, Vec::new());
    }

    #[test]
    #[should_panic(expected = "Invalid data length")]
    fn wrong_data_length_panics() {
        let _ = PixelBuffer::from_rgba_data(2, 2, vec![0u8; 15]);
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-image.png");
        match PixelBuffer::open(&path) {
            Err(Error::OpenFailed { path: failed, .. }) => {
                assert_eq!(failed, path);
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[test]
    fn open_garbage_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not an image").unwrap();
        match PixelBuffer::open(file.path()) {
            Err(Error::DecodeFailed { .. }) => {}
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }
}

//===========================================================================//
