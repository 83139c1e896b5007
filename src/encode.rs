use crate::pixels::PixelBuffer;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::{self, Read};

//===========================================================================//

// The signature that all PNG files start with.
pub(crate) const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

// The size of a BITMAPINFOHEADER struct, in bytes.
pub(crate) const DIB_HEADER_LEN: u32 = 40;

//===========================================================================//

/// How each rendition's payload is encoded inside the container.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum EncodingMode {
    /// Uncompressed 32-bpp DIB with a zero-filled AND mask (legacy mode).
    Bitmap,
    /// A complete PNG byte stream per rendition (modern mode).
    Png,
}

//===========================================================================//

/// Encodes a pixel buffer into a payload in the given mode.
pub(crate) fn encode_payload(
    mode: EncodingMode,
    buffer: &PixelBuffer,
) -> io::Result<Vec<u8>> {
    match mode {
        EncodingMode::Bitmap => write_dib(buffer),
        EncodingMode::Png => write_png(buffer),
    }
}

/// Decodes a raw payload (PNG or DIB, sniffed by signature) back into a
/// pixel buffer.
pub(crate) fn decode_payload(data: &[u8]) -> io::Result<PixelBuffer> {
    if data.starts_with(PNG_SIGNATURE) {
        read_png(data)
    } else {
        read_dib(data)
    }
}

//===========================================================================//

// A bitmap payload is a 40-byte BITMAPINFOHEADER followed by the RGBA pixel
// rows and an equally sized, zero-filled AND mask.  The stored height is
// doubled to cover both halves; the all-zero mask means "always opaque,
// trust the alpha channel".
fn write_dib(buffer: &PixelBuffer) -> io::Result<Vec<u8>> {
    let width = buffer.width();
    let height = buffer.height();
    let pixel_len = buffer.rgba_data().len();
    let image_size = match u32::try_from(2 * (pixel_len as u64)) {
        Ok(size) => size,
        Err(_) => invalid_input!(
            "Image is too large for a DIB payload ({}x{})",
            width,
            height
        ),
    };
    let mut data =
        Vec::<u8>::with_capacity(DIB_HEADER_LEN as usize + 2 * pixel_len);
    data.write_u32::<LittleEndian>(DIB_HEADER_LEN)?;
    data.write_i32::<LittleEndian>(width as i32)?;
    data.write_i32::<LittleEndian>((2 * height) as i32)?;
    data.write_u16::<LittleEndian>(1)?; // planes
    data.write_u16::<LittleEndian>(32)?; // bits per pixel
    data.write_u32::<LittleEndian>(0)?; // compression (BI_RGB)
    data.write_u32::<LittleEndian>(image_size)?;
    data.write_i32::<LittleEndian>(0)?; // horz ppm
    data.write_i32::<LittleEndian>(0)?; // vert ppm
    data.write_u32::<LittleEndian>(0)?; // colors used
    data.write_u32::<LittleEndian>(0)?; // colors important
    debug_assert_eq!(data.len(), DIB_HEADER_LEN as usize);
    data.extend_from_slice(buffer.rgba_data());
    data.resize(DIB_HEADER_LEN as usize + 2 * pixel_len, 0);
    Ok(data)
}

// Parses the fixed-width fields of a BITMAPINFOHEADER and returns the
// nominal (undoubled) image dimensions.
pub(crate) fn read_dib_size<R: Read>(reader: &mut R) -> io::Result<(u32, u32)> {
    let header_len = reader.read_u32::<LittleEndian>()?;
    if header_len != DIB_HEADER_LEN {
        invalid_data!(
            "Invalid DIB header size (was {}, but must be {})",
            header_len,
            DIB_HEADER_LEN
        );
    }
    let width = reader.read_i32::<LittleEndian>()?;
    if width < 1 {
        invalid_data!("Invalid DIB width (was {}, but must be positive)", width);
    }
    let height = reader.read_i32::<LittleEndian>()?;
    if height % 2 != 0 {
        // The height is stored doubled, counting the rows of both the color
        // data and the AND mask, so it must be divisible by 2.
        invalid_data!(
            "Invalid height field in DIB header \
             (was {}, but must be divisible by 2)",
            height
        );
    }
    let height = height / 2;
    if height < 1 {
        invalid_data!(
            "Invalid DIB height (was {}, but must be positive)",
            height
        );
    }
    Ok((width as u32, height as u32))
}

fn read_dib(data: &[u8]) -> io::Result<PixelBuffer> {
    let mut reader = data;
    let (width, height) = read_dib_size(&mut reader)?;
    let planes = reader.read_u16::<LittleEndian>()?;
    if planes != 1 {
        invalid_data!("Invalid DIB planes field (was {}, but must be 1)", planes);
    }
    let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
    if bits_per_pixel != 32 {
        invalid_data!("Unsupported DIB bits-per-pixel ({})", bits_per_pixel);
    }
    let compression = reader.read_u32::<LittleEndian>()?;
    if compression != 0 {
        invalid_data!("Unsupported DIB compression ({})", compression);
    }
    let _image_size = reader.read_u32::<LittleEndian>()?;
    let _horz_ppm = reader.read_i32::<LittleEndian>()?;
    let _vert_ppm = reader.read_i32::<LittleEndian>()?;
    let _colors_used = reader.read_u32::<LittleEndian>()?;
    let _colors_important = reader.read_u32::<LittleEndian>()?;
    let pixel_len = match (width as u64).checked_mul(height as u64) {
        Some(num_pixels) => (num_pixels * 4) as usize,
        None => invalid_data!("Width * Height is too large"),
    };
    // Only the color half is decoded; the mask half is ignored (this crate
    // always writes it as zeros).
    let mut rgba = vec![0u8; pixel_len];
    reader.read_exact(&mut rgba)?;
    Ok(PixelBuffer::from_rgba_data(width, height, rgba))
}

//===========================================================================//

// A PNG payload is a complete, self-contained PNG stream: 8-bit RGBA, no
// interlacing.  Unlike a general-purpose encoder we never downgrade opaque
// images to RGB, since the directory advertises 32 bpp for every entry.
fn write_png(buffer: &PixelBuffer) -> io::Result<Vec<u8>> {
    let mut data = Vec::<u8>::new();
    match write_png_rgba(buffer, &mut data) {
        Ok(()) => Ok(data),
        Err(png::EncodingError::IoError(error)) => Err(error),
        Err(error) => invalid_input!("PNG encoding error: {}", error),
    }
}

fn write_png_rgba(
    buffer: &PixelBuffer,
    data: &mut Vec<u8>,
) -> Result<(), png::EncodingError> {
    let mut encoder =
        png::Encoder::new(&mut *data, buffer.width(), buffer.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(buffer.rgba_data())?;
    writer.finish()?;
    Ok(())
}

// Reads just enough of a PNG stream to determine its dimensions.
pub(crate) fn read_png_size<R: Read>(reader: R) -> io::Result<(u32, u32)> {
    let decoder = png::Decoder::new(reader);
    match decoder.read_info() {
        Ok(png_reader) => {
            Ok((png_reader.info().width, png_reader.info().height))
        }
        Err(error) => invalid_data!("Malformed PNG data: {}", error),
    }
}

pub(crate) fn read_png<R: Read>(reader: R) -> io::Result<PixelBuffer> {
    let decoder = png::Decoder::new(reader);
    let mut png_reader = match decoder.read_info() {
        Ok(png_reader) => png_reader,
        Err(error) => invalid_data!("Malformed PNG data: {}", error),
    };
    if png_reader.info().width < 1 || png_reader.info().height < 1 {
        invalid_data!(
            "Invalid PNG dimensions ({}x{})",
            png_reader.info().width,
            png_reader.info().height
        );
    }
    if png_reader.info().bit_depth != png::BitDepth::Eight {
        invalid_data!(
            "Unsupported PNG bit depth: {:?}",
            png_reader.info().bit_depth
        );
    }
    let mut buffer = vec![0u8; png_reader.output_buffer_size()];
    match png_reader.next_frame(&mut buffer) {
        Ok(_) => {}
        Err(error) => invalid_data!("Malformed PNG data: {}", error),
    }
    let rgba_data = match png_reader.info().color_type {
        png::ColorType::Rgba => buffer,
        png::ColorType::Rgb => {
            let num_pixels = buffer.len() / 3;
            let mut rgba = Vec::with_capacity(num_pixels * 4);
            for i in 0..num_pixels {
                rgba.extend_from_slice(&buffer[(3 * i)..][..3]);
                rgba.push(u8::MAX);
            }
            rgba
        }
        color_type => {
            invalid_data!("Unsupported PNG color type: {:?}", color_type);
        }
    };
    Ok(PixelBuffer::from_rgba_data(
        png_reader.info().width,
        png_reader.info().height,
        rgba_data,
    ))
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{decode_payload, encode_payload, EncodingMode, PNG_SIGNATURE};
    use crate::pixels::PixelBuffer;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let mut rgba = Vec::new();
        for index in 0..(width * height) {
            let on = (index % 2) == 0;
            rgba.extend_from_slice(if on {
                &[0xff, 0x00, 0x00, 0xff]
            } else {
                &[0x00, 0x00, 0xff, 0x80]
            });
        }
        PixelBuffer::from_rgba_data(width, height, rgba)
    }

    #[test]
    fn bitmap_payload_shape() {
        let buffer = checker(4, 4);
        let payload =
            encode_payload(EncodingMode::Bitmap, &buffer).unwrap();
        assert_eq!(payload.len(), 40 + 2 * 4 * 4 * 4);
        // Header size, width, doubled height:
        assert_eq!(&payload[0..4], &40u32.to_le_bytes());
        assert_eq!(&payload[4..8], &4i32.to_le_bytes());
        assert_eq!(&payload[8..12], &8i32.to_le_bytes());
        // Planes and bit count:
        assert_eq!(&payload[12..14], &1u16.to_le_bytes());
        assert_eq!(&payload[14..16], &32u16.to_le_bytes());
        // Uncompressed, with biSizeImage covering both halves:
        assert_eq!(&payload[16..20], &0u32.to_le_bytes());
        assert_eq!(&payload[20..24], &(2u32 * 4 * 4 * 4).to_le_bytes());
        // Pixel data is the source RGBA, mask half is all zero:
        assert_eq!(&payload[40..40 + 64], buffer.rgba_data());
        assert!(payload[40 + 64..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn bitmap_payload_round_trip() {
        let buffer = checker(5, 3);
        let payload =
            encode_payload(EncodingMode::Bitmap, &buffer).unwrap();
        let decoded = decode_payload(&payload).unwrap();
        assert_eq!(decoded.width(), 5);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.rgba_data(), buffer.rgba_data());
    }

    #[test]
    fn png_payload_is_a_complete_stream() {
        let buffer = checker(8, 8);
        let payload = encode_payload(EncodingMode::Png, &buffer).unwrap();
        assert!(payload.starts_with(PNG_SIGNATURE));
        let decoded = decode_payload(&payload).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
        assert_eq!(decoded.rgba_data(), buffer.rgba_data());
    }

    #[test]
    fn reject_odd_dib_height() {
        let buffer = checker(2, 2);
        let mut payload =
            encode_payload(EncodingMode::Bitmap, &buffer).unwrap();
        payload[8..12].copy_from_slice(&5i32.to_le_bytes());
        assert!(decode_payload(&payload).is_err());
    }

    #[test]
    fn reject_unsupported_dib_depth() {
        let buffer = checker(2, 2);
        let mut payload =
            encode_payload(EncodingMode::Bitmap, &buffer).unwrap();
        payload[14..16].copy_from_slice(&24u16.to_le_bytes());
        assert!(decode_payload(&payload).is_err());
    }

    #[test]
    fn reject_truncated_payload() {
        let buffer = checker(4, 4);
        let payload =
            encode_payload(EncodingMode::Bitmap, &buffer).unwrap();
        assert!(decode_payload(&payload[..48]).is_err());
    }
}

//===========================================================================//
