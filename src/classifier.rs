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

    Selects a speed zone for a track and flags killer / no-sync tracks, using
    short samples from the drive-resident density helper. Grounded on
    scan_track in the reference implementation; the helper itself (and the
    par_read/par_write primitives it rides on) is an external collaborator -
    see the drive module.
*/

use crate::geometry::SpeedZone;

bitflags::bitflags! {
    /// Packed classifier result: bits 0-1 speed zone, bit 6 no-sync, bit 7 killer.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct DensityFlags: u8 {
        const ZONE_MASK = 0x03;
        const NO_SYNC   = 0x40;
        const KILLER    = 0x80;
    }
}

impl DensityFlags {
    pub fn zone(&self) -> SpeedZone {
        SpeedZone::from(self.bits() & Self::ZONE_MASK.bits())
    }

    pub fn is_killer(&self) -> bool {
        self.contains(Self::KILLER)
    }

    pub fn is_no_sync(&self) -> bool {
        self.contains(Self::NO_SYNC)
    }
}

/// Minimum per-bin byte count for a density-scan bin to count as "good" for its speed zone.
const GOOD_BIN_THRESHOLD: u32 = 40;

/// Number of density-scan passes averaged before choosing a zone.
const SCAN_PASSES: usize = 6;

/// Classify a track's speed zone and killer/no-sync status. `scan_killer` invokes the drive's
/// killer-scan primitive and returns its raw flag byte (bit 0x80 set means killer, in which case
/// no density scan is attempted at all - mirroring the reference's early return). `scan_bins`
/// invokes one density-scan pass and returns the four per-zone byte counts it reported, zone 3
/// first (as the hardware streams them).
pub fn classify_track<K, B>(mut scan_killer: K, mut scan_bins: B) -> DensityFlags
where
    K: FnMut() -> u8,
    B: FnMut() -> [u8; 4],
{
    let killer_info = scan_killer();
    if killer_info & DensityFlags::KILLER.bits() != 0 {
        return DensityFlags::from_bits_truncate(killer_info);
    }

    let mut good_counts = [0u32; 4];
    let mut totals = [0u32; 4];
    for _ in 0..SCAN_PASSES {
        let counts = scan_bins();
        for bin in 0..4 {
            totals[bin] += counts[bin] as u32;
            if counts[bin] as u32 >= GOOD_BIN_THRESHOLD {
                good_counts[bin] += 1;
            }
        }
    }

    let (good_best, good_max) = argmax(&good_counts);
    let (stat_best, _) = argmax(&totals);
    let zone = if good_max > 0 { good_best } else { stat_best };

    let killer_info = scan_killer();
    DensityFlags::from_bits_truncate((zone as u8 & DensityFlags::ZONE_MASK.bits()) | killer_info)
}

fn argmax(values: &[u32; 4]) -> (usize, u32) {
    let mut best_idx = 0;
    let mut best_val = values[0];
    for (idx, &v) in values.iter().enumerate().skip(1) {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    (best_idx, best_val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_killer_short_circuits_scan() {
        let mut bin_calls = 0;
        let flags = classify_track(|| 0x80, || {
            bin_calls += 1;
            [0; 4]
        });
        assert!(flags.is_killer());
        assert_eq!(bin_calls, 0);
    }

    #[test]
    fn test_selects_zone_with_most_good_observations() {
        let mut pass = 0;
        let flags = classify_track(
            || 0x00,
            || {
                pass += 1;
                // Zone 2 is consistently "good" (>= 40), others are not.
                [10, 20, 45, 5]
            },
        );
        assert_eq!(flags.zone(), SpeedZone::Zone2);
        assert!(!flags.is_killer());
        assert!(!flags.is_no_sync());
    }

    #[test]
    fn test_falls_back_to_highest_cumulative_sum() {
        let flags = classify_track(|| 0x00, || [39, 39, 39, 39]);
        // No bin ever reaches the "good" threshold; the first-seen max wins the tie.
        assert_eq!(flags.zone(), SpeedZone::Zone0);
    }

    #[test]
    fn test_no_sync_flag_propagates() {
        let mut second_call = false;
        let flags = classify_track(
            || {
                if !second_call {
                    second_call = true;
                    0x00
                }
                else {
                    0x40
                }
            },
            || [50, 0, 0, 0],
        );
        assert!(flags.is_no_sync());
        assert_eq!(flags.zone(), SpeedZone::Zone0);
    }
}
