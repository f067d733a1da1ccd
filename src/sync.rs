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

    Locates GCR synchronization marks. On disk, a sync is a run of >=10
    consecutive 1-bits; at whole-byte granularity, that's a run of one or
    more 0xFF bytes. Sub-byte bit alignment is outside the codec's
    resolution, per spec - everything downstream works in bytes.
*/

/// Scan `buf[pos..end]` for the end of the next sync mark: skip any non-`0xFF` bytes, then skip
/// the following run of `0xFF` bytes, and return the position of the first non-`0xFF` byte after
/// it. Returns `None` if the scan runs off the end of `buf[..end]` while still inside or before a
/// sync - this is `find_sync` in the reference implementation.
pub fn find_sync(buf: &[u8], mut pos: usize, end: usize) -> Option<usize> {
    while pos < end && buf[pos] != 0xff {
        pos += 1;
    }
    while pos < end && buf[pos] == 0xff {
        pos += 1;
    }
    if pos < end {
        Some(pos)
    }
    else {
        None
    }
}

/// Count the number of maximal `0xFF` runs (syncs) in `buf[..end]`, each of length >= 1.
pub fn count_syncs(buf: &[u8], end: usize) -> usize {
    let mut count = 0;
    let mut pos = 0;
    let mut in_sync = false;
    while pos < end {
        if buf[pos] == 0xff {
            if !in_sync {
                count += 1;
                in_sync = true;
            }
        }
        else {
            in_sync = false;
        }
        pos += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_sync_basic() {
        let buf = [0x00, 0x00, 0xff, 0xff, 0xff, 0x08, 0x00];
        assert_eq!(find_sync(&buf, 0, buf.len()), Some(5));
    }

    #[test]
    fn test_find_sync_no_sync_returns_none() {
        let buf = [0x00, 0x01, 0x02, 0x03];
        assert_eq!(find_sync(&buf, 0, buf.len()), None);
    }

    #[test]
    fn test_find_sync_sync_runs_to_end() {
        let buf = [0x00, 0xff, 0xff];
        assert_eq!(find_sync(&buf, 0, buf.len()), None);
    }

    #[test]
    fn test_find_sync_returns_smallest_position_after_p() {
        let buf = [0xff, 0xff, 0x01, 0xff, 0xff, 0xff, 0x02, 0x00];
        // Starting before the first sync's end, we land on the first boundary.
        assert_eq!(find_sync(&buf, 0, buf.len()), Some(2));
        // Starting inside/at the first boundary, we advance to the next one.
        assert_eq!(find_sync(&buf, 2, buf.len()), Some(6));
    }

    #[test]
    fn test_count_syncs() {
        let buf = [0xff, 0x00, 0xff, 0xff, 0x00, 0x00, 0xff];
        assert_eq!(count_syncs(&buf, buf.len()), 3);
    }
}
