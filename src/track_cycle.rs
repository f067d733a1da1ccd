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

    Locates the point in an over-sampled raw read where a physical revolution
    repeats. Grounded on find_track_cycle in the reference implementation.
*/

use crate::sync::find_sync;

/// Shortest plausible revolution length; candidates closer to the start than this are rejected
/// outright (a real track can't be shorter than the slowest speed zone's nominal length).
pub const MIN_TRACK_LENGTH: usize = 0x1780;

/// Number of bytes immediately following a sync that must match between two candidate
/// revolutions for the detector to trust the candidate.
pub const MATCH_LENGTH: usize = 7;

/// Find the offset within `buf[start..]` (length `8192 - start` available) at which the raw read
/// begins to repeat - i.e. the length in bytes of one physical revolution. Returns `None` if no
/// sync-anchored candidate within `[start + MIN_TRACK_LENGTH, start + buf.len() - MATCH_LENGTH)`
/// survives the every-sync comparison.
///
/// The comparison only checks the first [`MATCH_LENGTH`] bytes after each sync, not a full-window
/// `memcmp` across the whole candidate length - full-window comparison breaks under the speed
/// variation and capture noise that a real raw read always has some of, while anchoring to every
/// sync in turn is robust to that drift.
pub fn find_track_cycle(buf: &[u8], start: usize) -> Option<usize> {
    let buf_end = buf.len();
    if start + MIN_TRACK_LENGTH >= buf_end {
        return None;
    }

    let mut candidate_pos = start + MIN_TRACK_LENGTH;
    while let Some(p) = find_sync(buf, candidate_pos, buf_end.saturating_sub(MATCH_LENGTH)) {
        if candidates_match(buf, start, p, buf_end) {
            return Some(p - start);
        }
        candidate_pos = p;
    }
    None
}

/// Walk `p1` from `start` and `p2` from `candidate` in lockstep, hopping sync to sync, requiring
/// the [`MATCH_LENGTH`]-byte window after each to agree. Stops (successfully) when either pointer
/// runs out of syncs before a buffer.
fn candidates_match(buf: &[u8], start: usize, candidate: usize, buf_end: usize) -> bool {
    let mut p1 = start;
    let mut p2 = candidate;

    loop {
        if p1 + MATCH_LENGTH > buf_end || p2 + MATCH_LENGTH > buf_end {
            return true;
        }
        if buf[p1..p1 + MATCH_LENGTH] != buf[p2..p2 + MATCH_LENGTH] {
            return false;
        }

        let next1 = find_sync(buf, p1, buf_end);
        let next2 = find_sync(buf, p2, buf_end);
        match (next1, next2) {
            (Some(n1), Some(n2)) => {
                p1 = n1;
                p2 = n2;
            }
            _ => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::gcr::{encode_sector, encoded_sector_len};

    fn build_revolution(len_sectors: usize) -> Vec<u8> {
        let mut track = Vec::new();
        let payload = vec![0x55u8; crate::SECTOR_DATA_SIZE];
        for sector in 0..len_sectors as u8 {
            let mut buf = vec![0u8; encoded_sector_len()];
            let n = encode_sector(&mut buf, &payload, 18, sector, (0x41, 0x42));
            buf.truncate(n);
            track.extend_from_slice(&buf);
        }
        track
    }

    #[test]
    fn test_cycle_detector_on_oversampled_read() {
        let revolution = build_revolution(21);
        let rev_len = revolution.len();
        assert!(rev_len > MIN_TRACK_LENGTH, "synthetic revolution must exceed MIN_TRACK_LENGTH for this test");

        let mut raw = Vec::with_capacity(8192);
        while raw.len() < 8192 {
            raw.extend_from_slice(&revolution);
        }
        raw.truncate(8192);

        let cycle = find_track_cycle(&raw, 0);
        assert_eq!(cycle, Some(rev_len));
    }

    #[test]
    fn test_no_cycle_in_pure_noise() {
        // A buffer with no repeating structure at all (no syncs whatsoever) can't cycle.
        let raw = vec![0x92u8; 8192];
        assert_eq!(find_track_cycle(&raw, 0), None);
    }
}
