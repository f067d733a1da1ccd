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

    The sector parser: turns a raw GCR track region into a decoded 260-byte
    sector image plus an error code. Grounded on convert_GCR_sector in the
    reference implementation, including its exact error-precedence rules.
*/

use crate::codec::gcr::decode_5_to_4;
use crate::sync::find_sync;

/// Maximum byte distance between two adjacent syncs before a track read is considered too sparse
/// to be real (the drive would have timed out waiting).
const MAX_SYNC_OFFSET: usize = 800;

/// A fully decoded (or best-effort fallback) 260-byte sector payload: `[0]` header mark, `[1..257]`
/// user data, `[257]` checksum, `[258..260]` inter-sector filler.
pub type SectorImage = [u8; crate::SECTOR_IMAGE_SIZE];

/// Per-sector outcome, stable byte values match the D64 error annex.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::Display)]
#[repr(u8)]
pub enum ErrorCode {
    #[default]
    Ok = 0x01,
    HeaderNotFound = 0x02,
    SyncNotFound = 0x03,
    DataNotFound = 0x04,
    BadDataChecksum = 0x05,
    VerifyError = 0x07,
    WriteProtected = 0x08,
    BadHeaderChecksum = 0x09,
    IdMismatch = 0x0b,
    DiskNotInserted = 0x0f,
}

impl ErrorCode {
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// The character upper layers print for this code in a status display: a space for `Ok`, the
    /// single hex digit of the byte value otherwise.
    pub fn display_char(self) -> char {
        if self == ErrorCode::Ok {
            ' '
        }
        else {
            char::from_digit((self.byte() & 0x0f) as u32, 16).unwrap_or('?').to_ascii_uppercase()
        }
    }
}

/// A decoded sector together with the error encountered while decoding it. A non-`Ok` error still
/// carries the best partial (or fallback) payload - the voting reader uses the pair as its key.
#[derive(Clone, Debug)]
pub struct Sector {
    pub image: SectorImage,
    pub error: ErrorCode,
}

pub(crate) fn fallback_image() -> SectorImage {
    // "Original Format Pattern": byte[0]=data mark, byte[1]=seed, rest filled with 0x01, with a
    // checksum computed so the fallback itself is internally consistent.
    let mut image = [0x01u8; crate::SECTOR_IMAGE_SIZE];
    image[0] = 0x07;
    image[1] = 0x4b;
    let checksum = image[1..257].iter().fold(0u8, |acc, b| acc ^ b);
    image[257] = checksum;
    image
}

/// The 256-byte user-data portion of [`fallback_image`], for callers (like the imaging layer)
/// that need to fill a missing track's blocks with the parser's own fallback pattern.
pub(crate) fn fallback_data() -> [u8; crate::SECTOR_DATA_SIZE] {
    let image = fallback_image();
    let mut data = [0u8; crate::SECTOR_DATA_SIZE];
    data.copy_from_slice(&image[1..257]);
    data
}

/// Count the distinct maximal `0xFF` runs in `buf[..end]`.
fn count_sync_runs(buf: &[u8], end: usize) -> usize {
    crate::sync::count_syncs(buf, end)
}

/// Parse one sector out of a doubled GCR track buffer. `buf` must already be the track's raw GCR
/// bytes concatenated with themselves (so a sector that straddles the physical wrap can still be
/// read without special-casing the seam); `cycle_len` is the length of a single revolution within
/// `buf`. `disk_id` is `(id_lo, id_hi)` as it appears in the directory header.
///
/// This is `convert_GCR_sector` in the reference implementation.
pub fn convert_gcr_sector(
    buf: &[u8],
    cycle_len: usize,
    track: u8,
    sector: u8,
    disk_id: (u8, u8),
) -> Sector {
    let end = (cycle_len * 2).min(buf.len());
    let mut image = fallback_image();
    let mut error = ErrorCode::Ok;

    // Step 2: sync presence.
    if count_sync_runs(buf, end) < 2 {
        return Sector { image, error: ErrorCode::SyncNotFound };
    }

    // Step 3: sync spacing - walk every sync and check the gap to the previous one.
    {
        let mut pos = 0;
        let mut prev = None;
        loop {
            match find_sync(buf, pos, end) {
                Some(p) => {
                    if let Some(prev_pos) = prev {
                        if p - prev_pos > MAX_SYNC_OFFSET {
                            return Sector { image, error: ErrorCode::SyncNotFound };
                        }
                    }
                    prev = Some(p);
                    pos = p;
                }
                None => break,
            }
        }
    }

    // Step 4: header search.
    let mut pos = 0;
    let header_pos = loop {
        let sync_end = match find_sync(buf, pos, end) {
            Some(p) => p,
            None => return Sector { image, error: ErrorCode::HeaderNotFound },
        };
        if sync_end + 10 > end {
            return Sector { image, error: ErrorCode::HeaderNotFound };
        }
        let header = decode_header(buf, sync_end);
        if header[0] == 0x08 && header[2] == sector && header[3] == track {
            break sync_end;
        }
        pos = sync_end;
    };

    let header = decode_header(buf, header_pos);

    // Step 5: header validation (non-fatal).
    let header_checksum = header[1..6].iter().fold(0u8, |acc, b| acc ^ b);
    if header_checksum != 0 {
        error = ErrorCode::BadHeaderChecksum;
    }
    else if header[4] != disk_id.1 || header[5] != disk_id.0 {
        error = ErrorCode::IdMismatch;
    }

    // Step 6: data block - advance past the header group to the next sync.
    let data_sync = match find_sync(buf, header_pos + 8, end) {
        Some(p) => p,
        None => return Sector { image, error: ErrorCode::DataNotFound },
    };

    let mut decoded = [0u8; crate::SECTOR_IMAGE_SIZE];
    let mut data_pos = data_sync;
    for group_idx in 0..65 {
        if data_pos + 5 > buf.len() {
            return Sector { image, error: ErrorCode::DataNotFound };
        }
        let group = [buf[data_pos], buf[data_pos + 1], buf[data_pos + 2], buf[data_pos + 3], buf[data_pos + 4]];
        let nibbles = decode_5_to_4(&group);
        let out_start = group_idx * 4;
        if out_start + 4 <= decoded.len() {
            decoded[out_start..out_start + 4].copy_from_slice(&nibbles);
        }
        else {
            decoded[out_start..].copy_from_slice(&nibbles[..decoded.len() - out_start]);
        }
        data_pos += 5;
    }
    image = decoded;

    // Step 7: mark check (non-fatal).
    if image[0] != 0x07 && error == ErrorCode::Ok {
        error = ErrorCode::DataNotFound;
    }

    // Step 8: data checksum (non-fatal).
    let data_checksum = image[1..258].iter().fold(0u8, |acc, b| acc ^ b);
    if data_checksum != 0 && error == ErrorCode::Ok {
        error = ErrorCode::BadDataChecksum;
    }

    Sector { image, error }
}

/// Decode the 8 on-disk header bytes (two 4-byte GCR groups) starting at `sync_end`.
fn decode_header(buf: &[u8], sync_end: usize) -> [u8; 8] {
    let g0 = decode_5_to_4(&[buf[sync_end], buf[sync_end + 1], buf[sync_end + 2], buf[sync_end + 3], buf[sync_end + 4]]);
    let g1 = decode_5_to_4(&[
        buf[sync_end + 5],
        buf[sync_end + 6],
        buf[sync_end + 7],
        buf[sync_end + 8],
        buf[sync_end + 9],
    ]);
    [g0[0], g0[1], g0[2], g0[3], g1[0], g1[1], g1[2], g1[3]]
}

/// Locate the disk ID by searching `buf` (a decoded or raw track-18 GCR region) for any valid
/// sector header and returning its `(id_lo, id_hi)` pair. Supplements the parser: the reference
/// calls this once per disk, from the directory track, before any sector can be parsed (a header's
/// ID bytes are needed to validate every other header against it).
pub fn extract_disk_id(buf: &[u8], cycle_len: usize) -> Option<(u8, u8)> {
    let end = (cycle_len * 2).min(buf.len());
    let mut pos = 0;
    while let Some(sync_end) = find_sync(buf, pos, end) {
        if sync_end + 10 > end {
            return None;
        }
        let header = decode_header(buf, sync_end);
        if header[0] == 0x08 {
            let checksum = header[1..6].iter().fold(0u8, |acc, b| acc ^ b);
            if checksum == 0 {
                return Some((header[5], header[4]));
            }
        }
        pos = sync_end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::gcr::{encode_sector, encoded_sector_len};

    fn build_synthetic_track(track: u8, sector: u8, id: (u8, u8), payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; encoded_sector_len()];
        let len = encode_sector(&mut buf, payload, track, sector, id);
        buf.truncate(len);
        buf
    }

    #[test]
    fn test_sector_reconstruction_end_to_end() {
        let payload = vec![0x55u8; crate::SECTOR_DATA_SIZE];
        let track_bytes = build_synthetic_track(18, 0, (0x41, 0x42), &payload);
        let cycle_len = track_bytes.len();
        let mut doubled = track_bytes.clone();
        doubled.extend_from_slice(&track_bytes);

        let sector = convert_gcr_sector(&doubled, cycle_len, 18, 0, (0x41, 0x42));
        assert_eq!(sector.error, ErrorCode::Ok);
        assert_eq!(&sector.image[1..257], &payload[..]);
    }

    #[test]
    fn test_header_checksum_property() {
        for sector in 0u8..21 {
            let track = 18u8;
            let id = (0x41u8, 0x42u8);
            let checksum = sector ^ track ^ id.1 ^ id.0;
            // header layout is [0x08, checksum, sector, track, id_hi, id_lo, 0x0f, 0x0f]
            assert_eq!(checksum, sector ^ track ^ id.1 ^ id.0);
        }
    }

    #[test]
    fn test_bad_data_checksum_detected() {
        let payload = vec![0x55u8; crate::SECTOR_DATA_SIZE];
        let mut track_bytes = build_synthetic_track(18, 0, (0x41, 0x42), &payload);
        let cycle_len = track_bytes.len();
        // Corrupt one data byte post-encode by flipping a bit inside the data block's GCR region.
        let corrupt_at = 20;
        track_bytes[corrupt_at] ^= 0xff;
        let mut doubled = track_bytes.clone();
        doubled.extend_from_slice(&track_bytes);

        let sector = convert_gcr_sector(&doubled, cycle_len, 18, 0, (0x41, 0x42));
        // Corruption inside the GCR stream either produces invalid groups (still checksum-caught)
        // or a clean decode; either way the parser must not silently report Ok with wrong data.
        if sector.error == ErrorCode::Ok {
            assert_eq!(&sector.image[1..257], &payload[..]);
        }
    }

    #[test]
    fn test_missing_header_reports_header_not_found() {
        let payload = vec![0x55u8; crate::SECTOR_DATA_SIZE];
        let track_bytes = build_synthetic_track(18, 0, (0x41, 0x42), &payload);
        let cycle_len = track_bytes.len();
        let mut doubled = track_bytes.clone();
        doubled.extend_from_slice(&track_bytes);

        // Ask for a sector number that was never written.
        let sector = convert_gcr_sector(&doubled, cycle_len, 18, 5, (0x41, 0x42));
        assert_eq!(sector.error, ErrorCode::HeaderNotFound);
    }

    #[test]
    fn test_extract_disk_id() {
        let payload = vec![0x00u8; crate::SECTOR_DATA_SIZE];
        let track_bytes = build_synthetic_track(18, 0, (0x30, 0x31), &payload);
        let cycle_len = track_bytes.len();
        let mut doubled = track_bytes.clone();
        doubled.extend_from_slice(&track_bytes);

        assert_eq!(extract_disk_id(&doubled, cycle_len), Some((0x30, 0x31)));
    }

    #[test]
    fn test_error_display_chars() {
        assert_eq!(ErrorCode::Ok.display_char(), ' ');
        assert_eq!(ErrorCode::BadDataChecksum.display_char(), '5');
    }
}
