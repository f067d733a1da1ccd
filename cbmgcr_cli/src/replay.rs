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

    A stand-in for a live DriveChannel: reads pre-captured raw half-track
    dumps from a directory so `mnib --replay` can exercise the voting reader
    without a physical 1541/1571 attached. Each half-track may have multiple
    recorded retries, named `ht{halftrack:03}_{retry:02}.bin`, each exactly
    RAW_TRACK_LENGTH bytes.
*/
use std::path::Path;

use anyhow::{bail, Error};

use cbmgcr::RAW_TRACK_LENGTH;

/// Load every recorded retry for `halftrack` from `dir`, in retry order, stopping at the first
/// missing file. An empty result means the half-track was never captured in this replay set.
pub(crate) fn load_halftrack_reads(dir: &Path, halftrack: u8) -> Result<Vec<[u8; RAW_TRACK_LENGTH]>, Error> {
    let mut reads = Vec::new();
    for retry in 0..cbmgcr::voting::MAX_RETRIES {
        let path = dir.join(format!("ht{halftrack:03}_{retry:02}.bin"));
        if !path.exists() {
            break;
        }
        let bytes = std::fs::read(&path)?;
        if bytes.len() != RAW_TRACK_LENGTH {
            bail!("{} is {} bytes, expected {RAW_TRACK_LENGTH}", path.display(), bytes.len());
        }
        let mut buf = [0u8; RAW_TRACK_LENGTH];
        buf.copy_from_slice(&bytes);
        reads.push(buf);
    }
    Ok(reads)
}
