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
use thiserror::Error;

/// Top-level error type for the crate. Per-sector decode failures are represented separately by
/// [`crate::ErrorCode`], since a non-`Ok` sector is an expected, recoverable outcome rather than a
/// failure of the surrounding operation.
#[derive(Debug, Error)]
pub enum GcrError {
    #[error("an IO error occurred reading or writing a disk image")]
    IoError(#[from] std::io::Error),
    #[error("a binary parsing error occurred")]
    BinError(#[from] binrw::Error),
    #[error("unrecognized disk image format")]
    UnknownFormat,
    #[error("the disk image is truncated or otherwise inconsistent with its declared geometry")]
    ImageCorrupt,
    #[error("track {0} is outside the range this crate supports")]
    TrackOutOfRange(u8),
    #[error("could not locate the directory sector on track 18 to determine the disk ID")]
    NoDiskId,
    #[error("no raw capture is available for half-track {0}")]
    HalftrackUnavailable(u8),
    #[error("an invalid parameter was supplied")]
    ParameterError,
}
