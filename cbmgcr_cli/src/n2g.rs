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
use cbmgcr::imaging::nib_to_g64;

use crate::args::{with_extension, N2gParams};

pub(crate) fn run(params: &N2gParams) -> Result<(), Error> {
    let nib = NibImage::load(&params.nib_in).with_context(|| format!("reading {}", params.nib_in.display()))?;

    let g64 = nib_to_g64(&nib)?;
    let track_count = g64.tracks.iter().filter(|t| t.is_some()).count();

    let out_path = params.g64_out.clone().unwrap_or_else(|| with_extension(&params.nib_in, "g64"));
    g64.save(&out_path).with_context(|| format!("writing {}", out_path.display()))?;

    println!("wrote {} ({track_count} half-track(s))", out_path.display());
    Ok(())
}
