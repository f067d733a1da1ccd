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

    NIB: a raw nibbler dump. A 256-byte header listing captured half-tracks
    (index, density/flags) followed by fixed 8192-byte raw reads in the
    order the header lists them.
*/

use std::io::Cursor;
use std::path::Path;

use binrw::{binrw, BinRead, BinWrite};

use crate::classifier::DensityFlags;
use crate::{GcrError, RAW_TRACK_LENGTH, Result};

const HEADER_SIZE: usize = 0x100;
const ENTRY_TABLE_OFFSET: usize = 0x10;
const MAX_ENTRIES: usize = (HEADER_SIZE - ENTRY_TABLE_OFFSET) / 2;

#[binrw]
#[brw(little, magic = b"MNIB-1541-RAW\0")]
#[derive(Debug)]
struct NibSignature {
    version_major: u8,
    version_minor: u8,
    version_patch: u8,
}

/// One captured half-track: its index (0 = track 1, 1 = track 1.5, ...) and the packed
/// [`DensityFlags`] byte the classifier produced for it.
#[derive(Copy, Clone, Debug)]
pub struct NibEntry {
    pub halftrack_index: u8,
    pub flags: DensityFlags,
}

/// An in-memory NIB image: the ordered list of captured half-tracks and their raw 8192-byte reads.
pub struct NibImage {
    pub entries: Vec<NibEntry>,
    pub raw_tracks: Vec<[u8; RAW_TRACK_LENGTH]>,
}

impl NibImage {
    pub fn new() -> Self {
        NibImage { entries: Vec::new(), raw_tracks: Vec::new() }
    }

    pub fn push_track(&mut self, halftrack_index: u8, flags: DensityFlags, raw: [u8; RAW_TRACK_LENGTH]) {
        self.entries.push(NibEntry { halftrack_index, flags });
        self.raw_tracks.push(raw);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        if self.entries.len() > MAX_ENTRIES {
            // Best effort: the reference simply stops writing entries past the header's capacity.
        }

        let mut header = vec![0u8; HEADER_SIZE];
        let signature = NibSignature { version_major: 1, version_minor: 0, version_patch: 0 };
        let mut sig_cursor = Cursor::new(Vec::new());
        signature.write(&mut sig_cursor).expect("writing to an in-memory buffer cannot fail");
        let sig_bytes = sig_cursor.into_inner();
        header[..sig_bytes.len()].copy_from_slice(&sig_bytes);

        for (i, entry) in self.entries.iter().take(MAX_ENTRIES).enumerate() {
            header[ENTRY_TABLE_OFFSET + i * 2] = entry.halftrack_index;
            header[ENTRY_TABLE_OFFSET + i * 2 + 1] = entry.flags.bits();
        }

        let mut out = Vec::with_capacity(HEADER_SIZE + self.raw_tracks.len() * RAW_TRACK_LENGTH);
        out.extend_from_slice(&header);
        for track in &self.raw_tracks {
            out.extend_from_slice(track);
        }
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(GcrError::ImageCorrupt);
        }
        let mut cursor = Cursor::new(&buf[..HEADER_SIZE]);
        NibSignature::read(&mut cursor)?;

        let mut entries = Vec::new();
        for i in 0..MAX_ENTRIES {
            let idx = ENTRY_TABLE_OFFSET + i * 2;
            let halftrack_index = buf[idx];
            let flags_byte = buf[idx + 1];
            if halftrack_index == 0 && flags_byte == 0 {
                break;
            }
            entries.push(NibEntry { halftrack_index, flags: DensityFlags::from_bits_truncate(flags_byte) });
        }

        let mut raw_tracks = Vec::with_capacity(entries.len());
        let mut pos = HEADER_SIZE;
        for _ in &entries {
            if pos + RAW_TRACK_LENGTH > buf.len() {
                return Err(GcrError::ImageCorrupt);
            }
            let mut track = [0u8; RAW_TRACK_LENGTH];
            track.copy_from_slice(&buf[pos..pos + RAW_TRACK_LENGTH]);
            raw_tracks.push(track);
            pos += RAW_TRACK_LENGTH;
        }

        Ok(NibImage { entries, raw_tracks })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let buf = std::fs::read(path)?;
        Self::from_bytes(&buf)
    }

    /// Index of the half-track listed for `track` (1-indexed, whole-track granularity), or `None`
    /// if it wasn't captured. Mirrors the reference's lookup against `nib_header[0x10+track*2]`.
    pub fn find_halftrack(&self, track: u8) -> Option<usize> {
        let target = track * 2;
        self.entries.iter().position(|e| e.halftrack_index == target)
    }
}

impl Default for NibImage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut image = NibImage::new();
        image.push_track(2, DensityFlags::from_bits_truncate(3), [0x11u8; RAW_TRACK_LENGTH]);
        image.push_track(4, DensityFlags::from_bits_truncate(2), [0x22u8; RAW_TRACK_LENGTH]);

        let bytes = image.to_bytes();
        let parsed = NibImage::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].halftrack_index, 2);
        assert_eq!(parsed.raw_tracks[1], [0x22u8; RAW_TRACK_LENGTH]);
    }

    #[test]
    fn test_find_halftrack() {
        let mut image = NibImage::new();
        image.push_track(2, DensityFlags::from_bits_truncate(3), [0u8; RAW_TRACK_LENGTH]);
        image.push_track(36, DensityFlags::from_bits_truncate(2), [0u8; RAW_TRACK_LENGTH]); // track 18

        assert_eq!(image.find_halftrack(18), Some(1));
        assert_eq!(image.find_halftrack(1), Some(0));
        assert_eq!(image.find_halftrack(5), None);
    }

    #[test]
    fn test_signature_header() {
        let image = NibImage::new();
        let bytes = image.to_bytes();
        assert_eq!(&bytes[0..14], b"MNIB-1541-RAW\0");
        assert_eq!(bytes.len(), HEADER_SIZE);
    }
}
