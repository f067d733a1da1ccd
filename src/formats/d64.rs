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

    D64: a flat sequence of decoded 256-byte sectors in track/sector order,
    with an optional one-byte-per-sector error annex. No fixed header - the
    geometry alone determines layout, so this reader/writer works directly
    on byte slices rather than a binrw struct.
*/

use std::io::Write;
use std::path::Path;

use crate::geometry::Geometry;
use crate::sector::ErrorCode;
use crate::{GcrError, Result};

/// An in-memory D64 image: decoded sector data plus an optional per-sector error annex.
pub struct D64Image {
    pub last_track: u8,
    pub sectors: Vec<[u8; crate::SECTOR_DATA_SIZE]>,
    pub errors: Vec<ErrorCode>,
}

impl D64Image {
    /// Build an image from sectors already in track/sector order, deciding for itself whether an
    /// error annex is warranted.
    pub fn new(last_track: u8, sectors: Vec<[u8; crate::SECTOR_DATA_SIZE]>, errors: Vec<ErrorCode>) -> Self {
        debug_assert_eq!(sectors.len(), errors.len());
        D64Image { last_track, sectors, errors }
    }

    /// Whether this image needs a written error annex: any non-`Ok` entry on a standard track
    /// (1-35), or any extended track (36-40) present at all, regardless of error status.
    fn needs_annex(&self) -> bool {
        let geo = Geometry;
        let standard_blocks = geo.blocks_through_track(35.min(self.last_track));
        let has_standard_error = self.errors[..standard_blocks.min(self.errors.len())]
            .iter()
            .any(|e| *e != ErrorCode::Ok);
        let has_extended_tracks = self.last_track > 35;
        has_standard_error || has_extended_tracks
    }

    /// Serialize to the on-disk D64 byte layout: all sector data, then (if warranted) the
    /// one-byte-per-sector error annex, both in ascending track/sector order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sectors.len() * crate::SECTOR_DATA_SIZE);
        for sector in &self.sectors {
            out.extend_from_slice(sector);
        }
        if self.needs_annex() {
            out.extend(self.errors.iter().map(|e| e.byte()));
        }
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Parse a D64 byte buffer back into sectors and (if present) an error annex. `last_track`
    /// tells the reader how many blocks to expect; a buffer whose length doesn't match either the
    /// bare or annexed size for that track count is [`GcrError::ImageCorrupt`].
    pub fn from_bytes(buf: &[u8], last_track: u8) -> Result<Self> {
        let geo = Geometry;
        let blocks = geo.blocks_through_track(last_track);
        let bare_len = blocks * crate::SECTOR_DATA_SIZE;
        let annexed_len = bare_len + blocks;

        let has_annex = if buf.len() == annexed_len {
            true
        }
        else if buf.len() == bare_len {
            false
        }
        else {
            return Err(GcrError::ImageCorrupt);
        };

        let mut sectors = Vec::with_capacity(blocks);
        for i in 0..blocks {
            let start = i * crate::SECTOR_DATA_SIZE;
            let mut sector = [0u8; crate::SECTOR_DATA_SIZE];
            sector.copy_from_slice(&buf[start..start + crate::SECTOR_DATA_SIZE]);
            sectors.push(sector);
        }

        let errors = if has_annex {
            let annex_start = bare_len;
            buf[annex_start..annex_start + blocks].iter().map(|&b| error_code_from_byte(b)).collect()
        }
        else {
            vec![ErrorCode::Ok; blocks]
        };

        Ok(D64Image { last_track, sectors, errors })
    }

    pub fn load(path: impl AsRef<Path>, last_track: u8) -> Result<Self> {
        let buf = std::fs::read(path)?;
        Self::from_bytes(&buf, last_track)
    }
}

fn error_code_from_byte(b: u8) -> ErrorCode {
    match b {
        0x02 => ErrorCode::HeaderNotFound,
        0x03 => ErrorCode::SyncNotFound,
        0x04 => ErrorCode::DataNotFound,
        0x05 => ErrorCode::BadDataChecksum,
        0x07 => ErrorCode::VerifyError,
        0x08 => ErrorCode::WriteProtected,
        0x09 => ErrorCode::BadHeaderChecksum,
        0x0b => ErrorCode::IdMismatch,
        0x0f => ErrorCode::DiskNotInserted,
        _ => ErrorCode::Ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_annex_presence_and_size() {
        let geo = Geometry;
        let blocks = geo.blocks_through_track(35);
        let mut sectors = vec![[0u8; crate::SECTOR_DATA_SIZE]; blocks];
        let mut errors = vec![ErrorCode::Ok; blocks];
        errors[0] = ErrorCode::BadDataChecksum;
        sectors[0][0] = 0xaa;

        let image = D64Image::new(35, sectors, errors);
        let bytes = image.to_bytes();
        assert_eq!(bytes.len(), blocks * crate::SECTOR_DATA_SIZE + blocks);
        assert_eq!(bytes[blocks * crate::SECTOR_DATA_SIZE], 0x05);
    }

    #[test]
    fn test_clean_image_has_no_annex() {
        let geo = Geometry;
        let blocks = geo.blocks_through_track(35);
        let sectors = vec![[0u8; crate::SECTOR_DATA_SIZE]; blocks];
        let errors = vec![ErrorCode::Ok; blocks];

        let image = D64Image::new(35, sectors, errors);
        let bytes = image.to_bytes();
        assert_eq!(bytes.len(), blocks * crate::SECTOR_DATA_SIZE);
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let geo = Geometry;
        let blocks = geo.blocks_through_track(35);
        let mut sectors = vec![[0u8; crate::SECTOR_DATA_SIZE]; blocks];
        sectors[10][5] = 0x42;
        let errors = vec![ErrorCode::Ok; blocks];

        let image = D64Image::new(35, sectors.clone(), errors);
        let bytes = image.to_bytes();
        let parsed = D64Image::from_bytes(&bytes, 35).unwrap();
        assert_eq!(parsed.sectors, sectors);
    }

    #[test]
    fn test_extended_track_forces_annex() {
        let geo = Geometry;
        let blocks = geo.blocks_through_track(40);
        let sectors = vec![[0u8; crate::SECTOR_DATA_SIZE]; blocks];
        let errors = vec![ErrorCode::Ok; blocks];

        let image = D64Image::new(40, sectors, errors);
        let bytes = image.to_bytes();
        assert_eq!(bytes.len(), blocks * crate::SECTOR_DATA_SIZE + blocks);
    }
}
