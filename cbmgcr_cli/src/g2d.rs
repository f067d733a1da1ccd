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
use anyhow::{Context, Error};

use cbmgcr::formats::g64::G64Image;
use cbmgcr::imaging::{g64_to_d64, summarize_errors};

use crate::args::{with_extension, G2dParams};

pub(crate) fn run(params: &G2dParams) -> Result<(), Error> {
    let g64 = G64Image::load(&params.g64_in).with_context(|| format!("reading {}", params.g64_in.display()))?;

    let last_track = (1..=cbmgcr::MAX_TRACK_D64).rev().find(|&t| g64.tracks.get((t as usize - 1) * 2).and_then(|s| s.as_ref()).is_some()).unwrap_or(35);

    let d64 = g64_to_d64(&g64, last_track)?;

    let out_path = params.d64_out.clone().unwrap_or_else(|| with_extension(&params.g64_in, "d64"));
    d64.save(&out_path).with_context(|| format!("writing {}", out_path.display()))?;

    println!("wrote {} ({} tracks, {} blocks)", out_path.display(), last_track, d64.sectors.len());
    for (error, count) in summarize_errors(&d64) {
        if error != cbmgcr::ErrorCode::Ok {
            println!("  {count} block(s) with error {error} (0x{:02x})", error.byte());
        }
    }

    Ok(())
}
