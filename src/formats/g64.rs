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

    G64: a bit-exact GCR track image. Fixed-size slots per half-track, each
    holding a 2-byte used-length prefix followed by 7928 bytes of GCR
    (0xFF-padded). Track presence and speed zone are recorded in two
    parallel offset tables in the header.
*/

use std::io::Cursor;
use std::path::Path;

use binrw::{binrw, BinRead, BinWrite};

use crate::geometry::SpeedZone;
use crate::{GcrError, Result};

const NUM_HALFTRACKS: usize = 84;
const TRACK_SLOT_CAPACITY: usize = 7928;

#[binrw]
#[brw(little, magic = b"GCR-1541")]
#[derive(Debug)]
struct G64Header {
    version: u8,
    num_tracks: u8,
    #[br(assert(track_slot_size as usize == TRACK_SLOT_CAPACITY))]
    track_slot_size: u16,
    #[br(count = NUM_HALFTRACKS)]
    track_offsets: Vec<u32>,
    #[br(count = NUM_HALFTRACKS)]
    track_speeds: Vec<u32>,
}

/// One half-track's GCR payload, as stored in (or destined for) a G64 slot.
#[derive(Clone, Debug, Default)]
pub struct G64Track {
    pub data: Vec<u8>,
    pub speed: SpeedZone,
}

/// An in-memory G64 image: up to [`NUM_HALFTRACKS`] optional half-track slots.
#[derive(Default)]
pub struct G64Image {
    pub tracks: Vec<Option<G64Track>>,
}

impl G64Image {
    pub fn new() -> Self {
        G64Image { tracks: vec![None; NUM_HALFTRACKS] }
    }

    pub fn set_track(&mut self, halftrack_index: usize, data: Vec<u8>, speed: SpeedZone) {
        self.tracks[halftrack_index] = Some(G64Track { data, speed });
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut offsets = vec![0u32; NUM_HALFTRACKS];
        let mut speeds = vec![0u32; NUM_HALFTRACKS];
        let header_len = 12 + NUM_HALFTRACKS * 4 * 2;
        let mut body = Vec::new();

        for (i, slot) in self.tracks.iter().enumerate() {
            if let Some(track) = slot {
                offsets[i] = (header_len + body.len()) as u32;
                speeds[i] = track.speed.code() as u32;

                let used_len = track.data.len().min(TRACK_SLOT_CAPACITY) as u16;
                body.extend_from_slice(&used_len.to_le_bytes());
                let mut slot_bytes = vec![0xffu8; TRACK_SLOT_CAPACITY];
                let copy_len = track.data.len().min(TRACK_SLOT_CAPACITY);
                slot_bytes[..copy_len].copy_from_slice(&track.data[..copy_len]);
                body.extend_from_slice(&slot_bytes);
            }
        }

        let header = G64Header {
            version: 0,
            num_tracks: NUM_HALFTRACKS as u8,
            track_slot_size: TRACK_SLOT_CAPACITY as u16,
            track_offsets: offsets,
            track_speeds: speeds,
        };

        let mut out = Cursor::new(Vec::with_capacity(header_len + body.len()));
        header.write(&mut out).expect("writing to an in-memory buffer cannot fail");
        let mut out = out.into_inner();
        out.extend_from_slice(&body);
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(buf);
        let header = G64Header::read(&mut cursor)?;

        let mut tracks = vec![None; NUM_HALFTRACKS];
        for i in 0..NUM_HALFTRACKS {
            let offset = header.track_offsets[i] as usize;
            if offset == 0 {
                continue;
            }
            if offset + 2 > buf.len() {
                return Err(GcrError::ImageCorrupt);
            }
            let used_len = u16::from_le_bytes([buf[offset], buf[offset + 1]]) as usize;
            let data_start = offset + 2;
            if used_len > TRACK_SLOT_CAPACITY || data_start + used_len > buf.len() {
                return Err(GcrError::ImageCorrupt);
            }
            tracks[i] = Some(G64Track {
                data: buf[data_start..data_start + used_len].to_vec(),
                speed: SpeedZone::from(header.track_speeds[i] as u8),
            });
        }

        Ok(G64Image { tracks })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let buf = std::fs::read(path)?;
        Self::from_bytes(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout_offsets() {
        let mut image = G64Image::new();
        image.set_track(34, vec![0x55; 100], SpeedZone::Zone2); // track 18, full track

        let bytes = image.to_bytes();
        let header_len = 12 + NUM_HALFTRACKS * 4 * 2;
        assert_eq!(header_len, 12 + 84 * 4 + 84 * 4);

        let offset = u32::from_le_bytes([bytes[12 + 34 * 4], bytes[13 + 34 * 4], bytes[14 + 34 * 4], bytes[15 + 34 * 4]]) as usize;
        assert_eq!(offset, header_len);
        let used_len = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
        assert_eq!(used_len, 100);
    }

    #[test]
    fn test_round_trip() {
        let mut image = G64Image::new();
        image.set_track(0, vec![0xaa; 500], SpeedZone::Zone3);
        image.set_track(40, vec![0xbb; 7928], SpeedZone::Zone0);

        let bytes = image.to_bytes();
        let parsed = G64Image::from_bytes(&bytes).unwrap();

        assert_eq!(parsed.tracks[0].as_ref().unwrap().data, vec![0xaa; 500]);
        assert_eq!(parsed.tracks[40].as_ref().unwrap().speed, SpeedZone::Zone0);
        assert!(parsed.tracks[1].is_none());
    }

    #[test]
    fn test_header_constants() {
        let image = G64Image::new();
        let bytes = image.to_bytes();
        assert_eq!(&bytes[0..8], b"GCR-1541");
        assert_eq!(bytes[8], 0);
        assert_eq!(bytes[9], NUM_HALFTRACKS as u8);
        assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), TRACK_SLOT_CAPACITY as u16);
    }
}
