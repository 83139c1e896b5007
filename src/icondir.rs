use crate::encode::{self, EncodingMode, PNG_SIGNATURE};
use crate::error::Error;
use crate::pixels::PixelBuffer;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, SeekFrom, Write};

//===========================================================================//

// Serialized sizes of the ICONDIR header and of each ICONDIRENTRY.
const HEADER_LEN: u32 = 6;
const ENTRY_LEN: u32 = 16;

// The image type field value for icon (.ICO) files.  Cursor (.CUR) files
// use 2; this crate only produces icons.
const IMAGE_TYPE_ICON: u16 = 1;
const IMAGE_TYPE_CURSOR: u16 = 2;

//===========================================================================//

/// The contents of a single ICO file: an ordered list of icon renditions.
///
/// Serialization is a single forward pass in a fixed order: the 6-byte
/// header, then one 16-byte directory entry per rendition, then every
/// payload laid out contiguously with no padding.  Payload offsets are
/// computed before any payload byte is emitted, so all payloads stay
/// resident until the write completes.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct IconDir {
    entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Creates a new, empty icon directory.
    pub fn new() -> IconDir {
        IconDir { entries: Vec::new() }
    }

    /// Returns the entries in this directory, in file order.
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Appends an entry.  Entry order is significant: it is preserved in
    /// both the serialized directory and the payload layout.
    pub fn add_entry(&mut self, entry: IconDirEntry) {
        self.entries.push(entry);
    }

    /// Reads an ICO file into memory.
    pub fn read<R: Read + Seek>(mut reader: R) -> io::Result<IconDir> {
        let reserved = reader.read_u16::<LittleEndian>()?;
        if reserved != 0 {
            invalid_data!(
                "Invalid reserved field value in ICONDIR \
                 (was {}, but must be 0)",
                reserved
            );
        }
        let image_type = reader.read_u16::<LittleEndian>()?;
        if image_type == IMAGE_TYPE_CURSOR {
            invalid_data!("Cursor (.CUR) files are not supported");
        }
        if image_type != IMAGE_TYPE_ICON {
            invalid_data!("Invalid image type ({})", image_type);
        }
        let num_entries = reader.read_u16::<LittleEndian>()? as usize;
        let mut entries = Vec::<IconDirEntry>::with_capacity(num_entries);
        let mut spans = Vec::<(u32, u32)>::with_capacity(num_entries);
        for _ in 0..num_entries {
            let width_byte = reader.read_u8()?;
            let height_byte = reader.read_u8()?;
            let _num_colors = reader.read_u8()?;
            let reserved = reader.read_u8()?;
            if reserved != 0 {
                invalid_data!(
                    "Invalid reserved field value in ICONDIRENTRY \
                     (was {}, but must be 0)",
                    reserved
                );
            }
            let _color_planes = reader.read_u16::<LittleEndian>()?;
            let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
            let data_size = reader.read_u32::<LittleEndian>()?;
            let data_offset = reader.read_u32::<LittleEndian>()?;
            // A width/height byte of zero is the format's convention for a
            // size of 256 (or more); the exact size comes from the payload.
            let width = if width_byte == 0 { 256 } else { width_byte as u32 };
            let height =
                if height_byte == 0 { 256 } else { height_byte as u32 };
            spans.push((data_offset, data_size));
            entries.push(IconDirEntry {
                width,
                height,
                bits_per_pixel,
                data: Vec::new(),
            });
        }
        for (index, &(data_offset, data_size)) in spans.iter().enumerate() {
            reader.seek(SeekFrom::Start(data_offset as u64))?;
            let mut data = vec![0u8; data_size as usize];
            reader.read_exact(&mut data)?;
            entries[index].data = data;
        }
        // Replace the one-byte directory dimensions with the actual payload
        // dimensions where the payload is well-formed; malformed payloads
        // keep the directory's guess and fail later in decode().
        for entry in entries.iter_mut() {
            if let Ok((width, height)) = entry.decode_size() {
                entry.width = width;
                entry.height = height;
            }
        }
        Ok(IconDir { entries })
    }

    /// Writes an ICO file: the header, then every directory entry, then
    /// every payload, contiguously and in entry order.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), Error> {
        if self.entries.len() > (u16::MAX as usize) {
            return Err(Error::TooManyEntries(self.entries.len()));
        }
        self.write_inner(writer).map_err(Error::WriteFailed)
    }

    fn write_inner<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(IMAGE_TYPE_ICON)?;
        writer.write_u16::<LittleEndian>(self.entries.len() as u16)?;
        let mut data_offset =
            HEADER_LEN + ENTRY_LEN * (self.entries.len() as u32);
        for entry in self.entries.iter() {
            // A width/height byte of zero indicates a size of 256 or more.
            let width = if entry.width > 255 { 0 } else { entry.width as u8 };
            writer.write_u8(width)?;
            let height =
                if entry.height > 255 { 0 } else { entry.height as u8 };
            writer.write_u8(height)?;
            writer.write_u8(0)?; // no color palette
            writer.write_u8(0)?; // reserved
            writer.write_u16::<LittleEndian>(1)?; // color planes
            writer.write_u16::<LittleEndian>(entry.bits_per_pixel)?;
            let data_size = entry.data.len() as u32;
            writer.write_u32::<LittleEndian>(data_size)?;
            writer.write_u32::<LittleEndian>(data_offset)?;
            data_offset += data_size;
        }
        for entry in self.entries.iter() {
            writer.write_all(&entry.data)?;
        }
        Ok(())
    }
}

//===========================================================================//

/// One entry in an ICO file: a single rendition and its encoded payload.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct IconDirEntry {
    width: u32,
    height: u32,
    bits_per_pixel: u16,
    data: Vec<u8>,
}

impl IconDirEntry {
    /// Encodes a pixel buffer into a new entry using the given mode.
    /// Returns an error if the encoding fails; no entry is produced without
    /// a completed payload.
    pub fn encode(
        mode: EncodingMode,
        buffer: &PixelBuffer,
    ) -> Result<IconDirEntry, Error> {
        let data = match encode::encode_payload(mode, buffer) {
            Ok(data) => data,
            Err(error) => {
                return Err(Error::EncodingFailed {
                    size: buffer.width().max(buffer.height()),
                    reason: error.to_string(),
                });
            }
        };
        Ok(IconDirEntry {
            width: buffer.width(),
            height: buffer.height(),
            bits_per_pixel: 32,
            data,
        })
    }

    /// Returns the width of the rendition, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the rendition, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the bits-per-pixel advertised in the directory.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns true if the payload is a PNG stream, or false if it is a
    /// DIB, judged by signature.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Returns the encoding mode implied by the payload signature.
    pub fn mode(&self) -> EncodingMode {
        if self.is_png() {
            EncodingMode::Png
        } else {
            EncodingMode::Bitmap
        }
    }

    /// Returns the raw, encoded payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decodes just enough of the payload to determine its dimensions.
    pub(crate) fn decode_size(&self) -> io::Result<(u32, u32)> {
        if self.is_png() {
            encode::read_png_size(self.data.as_slice())
        } else {
            encode::read_dib_size(&mut self.data.as_slice())
        }
    }

    /// Decodes the payload back into a pixel buffer.  Returns an error if
    /// the payload is malformed or its dimensions disagree with the
    /// directory.
    pub fn decode(&self) -> io::Result<PixelBuffer> {
        let image = encode::decode_payload(&self.data)?;
        if image.width() != self.width || image.height() != self.height {
            invalid_data!(
                "Encoded image has wrong dimensions \
                 (was {}x{}, but should be {}x{})",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
        }
        Ok(image)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{EncodingMode, IconDir, IconDirEntry};
    use crate::pixels::PixelBuffer;
    use std::io::Cursor;

    fn tiny_buffer() -> PixelBuffer {
        PixelBuffer::from_rgba_data(1, 1, vec![0x10, 0x20, 0x30, 0xff])
    }

    #[test]
    fn read_empty_icon_set() {
        let input = b"\x00\x00\x01\x00\x00\x00";
        let icondir = IconDir::read(Cursor::new(input)).unwrap();
        assert_eq!(icondir.entries().len(), 0);
    }

    #[test]
    fn write_empty_icon_set() {
        let icondir = IconDir::new();
        let mut output = Vec::<u8>::new();
        icondir.write(&mut output).unwrap();
        let expected: &[u8] = b"\x00\x00\x01\x00\x00\x00";
        assert_eq!(output.as_slice(), expected);
    }

    #[test]
    fn reject_nonzero_reserved_field() {
        let input = b"\x01\x00\x01\x00\x00\x00";
        assert!(IconDir::read(Cursor::new(input)).is_err());
    }

    #[test]
    fn reject_cursor_file() {
        let input = b"\x00\x00\x02\x00\x00\x00";
        assert!(IconDir::read(Cursor::new(input)).is_err());
    }

    #[test]
    fn reject_invalid_image_type() {
        let input = b"\x00\x00\x07\x00\x00\x00";
        assert!(IconDir::read(Cursor::new(input)).is_err());
    }

    #[test]
    fn entry_reports_mode() {
        let bmp =
            IconDirEntry::encode(EncodingMode::Bitmap, &tiny_buffer()).unwrap();
        assert!(!bmp.is_png());
        assert_eq!(bmp.mode(), EncodingMode::Bitmap);
        let png =
            IconDirEntry::encode(EncodingMode::Png, &tiny_buffer()).unwrap();
        assert!(png.is_png());
        assert_eq!(png.mode(), EncodingMode::Png);
    }

    #[test]
    fn entry_round_trip_through_file() {
        let buffer = tiny_buffer();
        let mut icondir = IconDir::new();
        icondir
            .add_entry(IconDirEntry::encode(EncodingMode::Bitmap, &buffer).unwrap());
        let mut file = Vec::<u8>::new();
        icondir.write(&mut file).unwrap();
        let icondir = IconDir::read(Cursor::new(&file)).unwrap();
        assert_eq!(icondir.entries().len(), 1);
        let decoded = icondir.entries()[0].decode().unwrap();
        assert_eq!(decoded.rgba_data(), buffer.rgba_data());
    }

    #[test]
    fn too_many_entries_is_rejected() {
        let entry =
            IconDirEntry::encode(EncodingMode::Bitmap, &tiny_buffer()).unwrap();
        let mut icondir = IconDir::new();
        for _ in 0..(u16::MAX as usize + 1) {
            icondir.add_entry(entry.clone());
        }
        let mut output = Vec::<u8>::new();
        match icondir.write(&mut output) {
            Err(crate::Error::TooManyEntries(count)) => {
                assert_eq!(count, u16::MAX as usize + 1);
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        assert!(output.is_empty());
    }
}

//===========================================================================//
