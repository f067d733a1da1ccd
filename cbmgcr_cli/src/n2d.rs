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

use cbmgcr::formats::nib::NibImage;
use cbmgcr::imaging::{nib_to_d64, summarize_errors};

use crate::args::{with_extension, N2dParams};

/// Highest track a captured NIB is searched for when deciding how much of the extended range
/// (36-40) to include in the output D64.
const MAX_EXTENDED_TRACK: u8 = cbmgcr::MAX_TRACK_D64;

pub(crate) fn run(params: &N2dParams) -> Result<(), Error> {
    let nib = NibImage::load(&params.nib_in).with_context(|| format!("reading {}", params.nib_in.display()))?;

    let last_track = (36..=MAX_EXTENDED_TRACK).rev().find(|&t| nib.find_halftrack(t).is_some()).unwrap_or(35);

    let d64 = nib_to_d64(&nib, last_track)?;

    let out_path = params.d64_out.clone().unwrap_or_else(|| with_extension(&params.nib_in, "d64"));
    d64.save(&out_path).with_context(|| format!("writing {}", out_path.display()))?;

    println!("wrote {} ({} tracks, {} blocks)", out_path.display(), last_track, d64.sectors.len());
    for (error, count) in summarize_errors(&d64) {
        if error != cbmgcr::ErrorCode::Ok {
            println!("  {count} block(s) with error {error} (0x{:02x})", error.byte());
        }
    }

    Ok(())
}
