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

//! Track geometry: sectors-per-track and speed-zone lookup tables.
//!
//! The reference implementation keeps these as mutable global arrays (`sector_map_1541`,
//! `speed_map_1541`). Here they are immutable data owned by a zero-sized [`Geometry`] value, so
//! every caller carries its geometry explicitly rather than reading module globals.

use std::fmt;

/// A disk's four rotational speed classes, 0 (slowest, outermost tracks) through 3 (fastest,
/// innermost tracks).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum SpeedZone {
    Zone0,
    #[default]
    Zone1,
    Zone2,
    Zone3,
}

impl SpeedZone {
    /// Nominal unformatted track length in bytes for this speed zone.
    pub fn raw_track_length(&self) -> usize {
        match self {
            SpeedZone::Zone0 => 6250,
            SpeedZone::Zone1 => 6666,
            SpeedZone::Zone2 => 7142,
            SpeedZone::Zone3 => 7692,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            SpeedZone::Zone0 => 0,
            SpeedZone::Zone1 => 1,
            SpeedZone::Zone2 => 2,
            SpeedZone::Zone3 => 3,
        }
    }
}

impl From<u8> for SpeedZone {
    fn from(code: u8) -> Self {
        match code & 0x03 {
            0 => SpeedZone::Zone0,
            1 => SpeedZone::Zone1,
            2 => SpeedZone::Zone2,
            _ => SpeedZone::Zone3,
        }
    }
}

/// Sectors-per-track, indexed `[track - 1]`, track 1..=42. Tracks 36-42 are non-standard and
/// included only for best-effort support.
const SECTORS_PER_TRACK: [u8; 42] = [
    21, 21, 21, 21, 21, 21, 21, 21, 21, 21, // 1-10
    21, 21, 21, 21, 21, 21, 21, 19, 19, 19, // 11-20
    19, 19, 19, 19, 18, 18, 18, 18, 18, 18, // 21-30
    17, 17, 17, 17, 17, // 31-35
    17, 17, 17, 17, 17, 17, 17, // 36-42
];

/// Speed zone per track, indexed `[track - 1]`, track 1..=42.
const SPEED_ZONE_PER_TRACK: [u8; 42] = [
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, // 1-17
    2, 2, 2, 2, 2, 2, 2, // 18-24
    1, 1, 1, 1, 1, 1, // 25-30
    0, 0, 0, 0, 0, // 31-35
    0, 0, 0, 0, 0, 0, 0, // 36-42
];

/// Immutable track geometry for a 1541/1571-class disk. There is only one geometry this crate
/// knows about, but it is passed as a value (rather than read from module globals) so that
/// callers and tests can be explicit about which geometry a computation is using.
#[derive(Copy, Clone, Debug, Default)]
pub struct Geometry;

impl Geometry {
    pub const MAX_TRACK: u8 = 42;

    /// Number of sectors on `track` (1-indexed). Panics if `track` is 0 or > 42, as those are
    /// programming errors, not recoverable disk conditions.
    pub fn sectors_per_track(&self, track: u8) -> u8 {
        assert!((1..=Self::MAX_TRACK).contains(&track), "track {track} out of range");
        SECTORS_PER_TRACK[(track - 1) as usize]
    }

    /// Speed zone for `track` (1-indexed).
    pub fn speed_zone(&self, track: u8) -> SpeedZone {
        assert!((1..=Self::MAX_TRACK).contains(&track), "track {track} out of range");
        SpeedZone::from(SPEED_ZONE_PER_TRACK[(track - 1) as usize])
    }

    /// Total number of formatted blocks across tracks `1..=last_track`.
    pub fn blocks_through_track(&self, last_track: u8) -> usize {
        (1..=last_track).map(|t| self.sectors_per_track(t) as usize).sum()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1541/1571 geometry (35 standard tracks, {} blocks)", self.blocks_through_track(35))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_on_disk() {
        let geo = Geometry;
        assert_eq!(geo.blocks_through_track(35), crate::BLOCKS_ON_DISK);
    }

    #[test]
    fn test_speed_zones() {
        let geo = Geometry;
        assert_eq!(geo.speed_zone(1).code(), 3);
        assert_eq!(geo.speed_zone(18).code(), 2);
        assert_eq!(geo.speed_zone(25).code(), 1);
        assert_eq!(geo.speed_zone(31).code(), 0);
    }

    #[test]
    fn test_sector_counts() {
        let geo = Geometry;
        assert_eq!(geo.sectors_per_track(1), 21);
        assert_eq!(geo.sectors_per_track(18), 19);
        assert_eq!(geo.sectors_per_track(25), 18);
        assert_eq!(geo.sectors_per_track(31), 17);
    }
}
