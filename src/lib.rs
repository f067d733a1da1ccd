/*
    cbmgcr
    https://github.com/mbrenner/cbmgcr

    Copyright 2025 Markus Brenner

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! # cbmgcr
//!
//! `cbmgcr` is a Rust library for reading, reconstructing, and converting floppy disk images
//! produced by a Commodore 1541/1571-class 5.25" drive. These drives record data in Group Code
//! Recording (GCR) with four zoned bit rates, a variable number of sectors per track, and a
//! custom block/header format unrelated to the IBM/PC FM or MFM formats.
//!
//! Three container formats are supported:
//!
//! * [`formats::d64`] — a linear array of decoded 256-byte sectors, optionally followed by a
//!   per-block error status annex.
//! * [`formats::g64`] — a bit-exact GCR track image: one fixed-size slot per half-track holding
//!   the raw GCR byte stream, a used-length prefix, and a per-track speed zone.
//! * [`formats::nib`] — a raw nibbler dump: a small header describing which half-tracks were
//!   captured (and at what density), followed by fixed 8192-byte raw reads per half-track.
//!
//! The hard engineering is concentrated in a handful of leaf modules: [`codec::gcr`] (the
//! nibble/GCR bit-level conversion), [`sync`] (locating synchronization marks), [`sector`] (the
//! sector parser, `convert_GCR_sector` in the reference implementation this crate is modeled
//! on), [`track_cycle`] and [`track_extractor`] (locating and packing one physical revolution out
//! of an over-sampled raw read), [`voting`] (converging on the best decode of a sector across
//! several noisy retries), and [`classifier`] (selecting a speed zone and detecting killer/no-sync
//! tracks from short raw samples).
//!
//! [`imaging`] ties these together into the four conversions a user actually wants: NIB capture,
//! NIB→D64, NIB→G64, and G64→D64.
pub mod classifier;
pub mod codec;
pub mod drive;
mod error;
pub mod formats;
pub mod geometry;
pub mod imaging;
pub mod sector;
pub mod sync;
pub mod track_cycle;
pub mod track_extractor;
pub mod voting;

pub use crate::error::GcrError;
pub use crate::geometry::Geometry;
pub use crate::sector::ErrorCode;

/// Size in bytes of a single raw half-track capture, including unformatted noise.
pub const RAW_TRACK_LENGTH: usize = 0x2000;
/// Number of decoded data bytes in one sector.
pub const SECTOR_DATA_SIZE: usize = 256;
/// Size in bytes of a decoded sector image: header mark, data, checksum, and inter-sector pattern.
pub const SECTOR_IMAGE_SIZE: usize = 260;
/// Highest track number this crate will attempt to read or write in a D64 image.
pub const MAX_TRACK_D64: u8 = 40;
/// Highest physical track number acknowledged by the geometry tables (41-42 are non-standard).
pub const MAX_TRACK_1541: u8 = 42;
/// Total formatted blocks for a standard 35-track disk.
pub const BLOCKS_ON_DISK: usize = 683;
/// Additional blocks contributed by tracks 36-40 when present.
pub const BLOCKS_EXTRA: usize = 85;
/// Maximum possible blocks, 35-track image plus tracks 36-40.
pub const MAX_BLOCKS_ON_DISK: usize = BLOCKS_ON_DISK + BLOCKS_EXTRA;

pub type Result<T> = std::result::Result<T, GcrError>;
