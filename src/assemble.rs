use crate::encode::EncodingMode;
use crate::error::Error;
use crate::icondir::{IconDir, IconDirEntry};
use crate::pixels::PixelBuffer;
use crate::resample::Resampler;

//===========================================================================//

/// The size list used when none is configured: the renditions Windows
/// expects from a typical application icon.
pub const DEFAULT_SIZES: &[u32] = &[16, 32, 48, 256];

//===========================================================================//

/// Builds a complete ICO container from a single source image.
///
/// The assembler owns the list of target sizes and the encoding mode.  For
/// each size, in order, it asks the [`Resampler`] for a square rendition
/// and encodes it into a payload; once every payload has been produced, the
/// resulting [`IconDir`] lays them out contiguously after the directory and
/// serializes the whole container in one forward pass.  Any resample or
/// encode failure aborts the whole operation.
#[derive(Clone, Debug)]
pub struct IcoAssembler {
    sizes: Vec<u32>,
    mode: EncodingMode,
}

impl IcoAssembler {
    /// Creates an assembler with the default size list ([`DEFAULT_SIZES`]).
    pub fn new(mode: EncodingMode) -> IcoAssembler {
        IcoAssembler::with_sizes(mode, DEFAULT_SIZES.to_vec())
    }

    /// Creates an assembler with a caller-specified size list.  Order is
    /// significant: directory entries and payloads are emitted in exactly
    /// this order.
    pub fn with_sizes(mode: EncodingMode, sizes: Vec<u32>) -> IcoAssembler {
        IcoAssembler { sizes, mode }
    }

    /// Returns the target sizes, in output order.
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the encoding mode.
    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// Resamples and encodes one rendition per target size.  Returns an
    /// error as soon as any size fails; no partial directory is returned.
    pub fn assemble<R: Resampler>(
        &self,
        source: &PixelBuffer,
        resampler: &R,
    ) -> Result<IconDir, Error> {
        let mut icondir = IconDir::new();
        for &size in self.sizes.iter() {
            if size == 0 {
                return Err(Error::EncodingFailed {
                    size,
                    reason: "target size must be nonzero".to_string(),
                });
            }
            log::debug!(
                "resampling {}x{} source to {}x{}",
                source.width(),
                source.height(),
                size,
                size
            );
            let rendition = resampler.resample(source, size, size)?;
            icondir.add_entry(IconDirEntry::encode(self.mode, &rendition)?);
        }
        Ok(icondir)
    }
}

//===========================================================================//


//===========================================================================//
