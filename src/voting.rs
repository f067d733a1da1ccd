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

    Converges on the best decode of each sector across repeated noisy reads
    of a physical half-track. The only stateful, long-running piece of the
    core; everything else here is pure functions over borrowed buffers.
*/

use crate::sector::{convert_gcr_sector, ErrorCode, Sector, SectorImage};

/// Maximum number of physical retries the voter will spend on one track.
pub const MAX_RETRIES: usize = 16;

/// An accumulated `(payload, error)` outcome and how many times it has been observed.
struct Entry {
    image: SectorImage,
    error: ErrorCode,
    count: u32,
}

impl Entry {
    /// `count - 8` when the outcome is erroneous, `count` when it's `Ok`. This lets a
    /// persistently-confirmed error outvote a single spurious `Ok`, while still preferring a good
    /// read whenever one is available.
    fn score(&self) -> i32 {
        self.count as i32 - if self.error != ErrorCode::Ok { 8 } else { 0 }
    }
}

/// Per-sector voting state: the distinct outcomes seen so far for one (track, sector).
#[derive(Default)]
struct SectorVotes {
    entries: Vec<Entry>,
}

impl SectorVotes {
    fn record(&mut self, sector: &Sector) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.image == sector.image && e.error == sector.error) {
            existing.count += 1;
        }
        else {
            self.entries.push(Entry { image: sector.image, error: sector.error, count: 1 });
        }
    }

    fn best(&self) -> Option<&Entry> {
        self.entries.iter().max_by_key(|e| e.score())
    }

    fn is_good(&self, retry: usize) -> bool {
        match self.best() {
            Some(best) => best.score() > (retry / 2) as i32 + 1,
            None => false,
        }
    }

    fn ever_ok(&self) -> bool {
        self.entries.iter().any(|e| e.error == ErrorCode::Ok)
    }
}

/// One raw read of a half-track, already cycle-detected and split per sector: `reads[i]` is the
/// result of parsing sector `i` out of that single physical read.
pub type TrackRead = Vec<Sector>;

/// Orchestrates up to [`MAX_RETRIES`] calls to `read_track` (supplied by the caller, since the
/// actual raw read is an external-collaborator concern - see the drive channel) until every sector
/// on the track is marked good, or retries are exhausted.
///
/// Returns the best `(image, error)` pair chosen per sector, in sector order.
pub fn vote_track<F>(num_sectors: usize, mut read_track: F) -> Vec<(SectorImage, ErrorCode)>
where
    F: FnMut(usize) -> TrackRead,
{
    let mut votes: Vec<SectorVotes> = (0..num_sectors).map(|_| SectorVotes::default()).collect();

    for retry in 0..MAX_RETRIES {
        let read = read_track(retry);
        for (sector_idx, sector) in read.into_iter().enumerate().take(num_sectors) {
            votes[sector_idx].record(&sector);
        }

        // Short-circuit: after 2 retries, if nothing on the track has ever decoded Ok, give up.
        if retry >= 2 && votes.iter().all(|v| !v.ever_ok()) {
            break;
        }

        if votes.iter().all(|v| v.is_good(retry)) {
            break;
        }
    }

    votes
        .iter()
        .map(|v| match v.best() {
            Some(e) => (e.image, e.error),
            None => (crate::sector::fallback_image(), ErrorCode::SyncNotFound),
        })
        .collect()
}

/// Decide whether a D64 track (tracks 1-35) needs an error-annex entry: true iff any chosen
/// sector's error is non-`Ok`.
pub fn track_needs_annex(sectors: &[(SectorImage, ErrorCode)]) -> bool {
    sectors.iter().any(|(_, e)| *e != ErrorCode::Ok)
}

/// Extended tracks (36-40) get an annex entry unconditionally once they are written at all - see
/// the resolved open question about mixed-error handling on non-standard tracks.
pub fn extended_track_needs_annex(track: u8, sectors: &[(SectorImage, ErrorCode)]) -> bool {
    (36..=40).contains(&track) && !sectors.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_sector(byte: u8) -> Sector {
        let mut image = [byte; crate::SECTOR_IMAGE_SIZE];
        image[0] = 0x07;
        Sector { image, error: ErrorCode::Ok }
    }

    fn bad_sector(byte: u8) -> Sector {
        let mut image = [byte; crate::SECTOR_IMAGE_SIZE];
        image[0] = 0x07;
        Sector { image, error: ErrorCode::BadDataChecksum }
    }

    #[test]
    fn test_voting_convergence_prefers_confirmed_ok() {
        // sector 0 of a 1-sector track: 3 reads bad/ok/bad with identical bad payloads,
        // plus enough further reads to reach retry=4 with the Ok copy repeated.
        let reads: Vec<TrackRead> = vec![
            vec![bad_sector(0xaa)],
            vec![ok_sector(0x11)],
            vec![bad_sector(0xaa)],
            vec![ok_sector(0x11)],
            vec![ok_sector(0x11)],
        ];
        let mut i = 0;
        let result = vote_track(1, |_retry| {
            let r = reads[i.min(reads.len() - 1)].clone();
            i += 1;
            r
        });
        assert_eq!(result[0].1, ErrorCode::Ok);
        assert_eq!(result[0].0[1], 0x11);
    }

    #[test]
    fn test_short_circuit_when_never_ok() {
        let mut calls = 0;
        let _ = vote_track(1, |_retry| {
            calls += 1;
            vec![bad_sector(0xaa)]
        });
        // 2 retries (0, 1) plus the check on retry 2 should stop the loop well short of
        // MAX_RETRIES.
        assert!(calls <= 4, "expected short-circuit, got {calls} calls");
    }

    #[test]
    fn test_track_needs_annex() {
        let sectors = vec![([0u8; crate::SECTOR_IMAGE_SIZE], ErrorCode::Ok), ([0u8; crate::SECTOR_IMAGE_SIZE], ErrorCode::BadDataChecksum)];
        assert!(track_needs_annex(&sectors));

        let clean = vec![([0u8; crate::SECTOR_IMAGE_SIZE], ErrorCode::Ok)];
        assert!(!track_needs_annex(&clean));
    }

    #[test]
    fn test_extended_track_annex_unconditional() {
        let sectors = vec![([0u8; crate::SECTOR_IMAGE_SIZE], ErrorCode::Ok)];
        assert!(extended_track_needs_annex(36, &sectors));
        assert!(!extended_track_needs_annex(18, &sectors));
    }
}
