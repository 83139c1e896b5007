//! A library for building multi-size Windows ICO files from a single source
//! image.
//!
//! The entry point is [`IcoAssembler`]: configure it with an
//! [`EncodingMode`] and a list of target sizes (defaulting to 16, 32, 48 and
//! 256 pixel squares), hand [`assemble`](IcoAssembler::assemble) a decoded
//! [`PixelBuffer`] and a [`Resampler`], and write the resulting [`IconDir`]
//! to any `Write` sink.  Each rendition is stored either as an uncompressed
//! 32-bpp DIB with a zero-filled AND mask, or as an embedded PNG stream.
//!
//! ```no_run
//! use icoforge::{EncodingMode, Error, IcoAssembler, LinearResampler, PixelBuffer};
//!
//! let source = PixelBuffer::open("app.png")?;
//! let assembler = IcoAssembler::new(EncodingMode::Bitmap);
//! let icondir = assembler.assemble(&source, &LinearResampler)?;
//! let file = std::fs::File::create("icon.ico").map_err(Error::WriteFailed)?;
//! icondir.write(file)?;
//! # Ok::<(), Error>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod assemble;
mod encode;
mod error;
mod icondir;
mod pixels;
mod resample;

pub use crate::assemble::{IcoAssembler, DEFAULT_SIZES};
pub use crate::encode::EncodingMode;
pub use crate::error::Error;
pub use crate::icondir::{IconDir, IconDirEntry};
pub use crate::pixels::PixelBuffer;
pub use crate::resample::{LinearResampler, Resampler};

//===========================================================================//
