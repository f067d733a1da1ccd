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

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use bpaf::*;

#[derive(Clone, Debug)]
pub(crate) struct AppParams {
    pub global: GlobalOptions,
    pub command: Command,
}

/// Verbosity flags, applied to `RUST_LOG` before `env_logger` initializes.
#[derive(Clone, Debug, Default)]
pub(crate) struct GlobalOptions {
    pub verbose: usize,
    pub quiet: bool,
}

impl GlobalOptions {
    /// The `RUST_LOG` level this combination of flags implies, absent an explicit override.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        }
        else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

fn global_options_parser() -> impl Parser<GlobalOptions> {
    let verbose = short('v').help("Increase log verbosity (repeatable: -v debug, -vv trace)").req_flag(()).many().map(|v| v.len());
    let quiet = long("quiet").short('q').help("Suppress all but error-level logging").switch();
    construct!(GlobalOptions { verbose, quiet })
}

#[derive(Clone, Debug)]
pub(crate) enum Command {
    Version,
    N2d(N2dParams),
    N2g(N2gParams),
    G2d(G2dParams),
    Mnib(MnibParams),
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Version => write!(f, "version"),
            Command::N2d(_) => write!(f, "n2d"),
            Command::N2g(_) => write!(f, "n2g"),
            Command::G2d(_) => write!(f, "g2d"),
            Command::Mnib(_) => write!(f, "mnib"),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct N2dParams {
    pub nib_in: PathBuf,
    pub d64_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub(crate) struct N2gParams {
    pub nib_in: PathBuf,
    pub g64_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub(crate) struct G2dParams {
    pub g64_in: PathBuf,
    pub d64_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub(crate) struct MnibParams {
    pub out: PathBuf,
    pub bump: bool,
    pub density_scan: bool,
    pub half_tracks: bool,
    pub reset: bool,
    pub geos: bool,
    pub only_35: bool,
    /// Replay a previously captured raw-read log instead of talking to real hardware - lets the
    /// voting reader and classifier be exercised without a drive attached.
    pub replay: Option<PathBuf>,
}

fn n2d_parser() -> impl Parser<N2dParams> {
    let nib_in = positional::<PathBuf>("NIB_IN").help("Path to the source .nib file");
    let d64_out = positional::<PathBuf>("D64_OUT").help("Path to the destination .d64 file").optional();
    construct!(N2dParams { nib_in, d64_out })
}

fn n2g_parser() -> impl Parser<N2gParams> {
    let nib_in = positional::<PathBuf>("NIB_IN").help("Path to the source .nib file");
    let g64_out = positional::<PathBuf>("G64_OUT").help("Path to the destination .g64 file").optional();
    construct!(N2gParams { nib_in, g64_out })
}

fn g2d_parser() -> impl Parser<G2dParams> {
    let g64_in = positional::<PathBuf>("G64_IN").help("Path to the source .g64 file");
    let d64_out = positional::<PathBuf>("D64_OUT").help("Path to the destination .d64 file").optional();
    construct!(G2dParams { g64_in, d64_out })
}

fn mnib_parser() -> impl Parser<MnibParams> {
    let out = positional::<PathBuf>("OUT").help("Path to the output image; extension selects the container format");
    let bump = long("bump").short('b').help("Bump the head before reading").switch();
    let density_scan = long("density").short('d').help("Honour the per-track density scan").switch();
    let half_tracks = long("half-tracks").short('h').help("Include half-tracks in the capture").switch();
    let reset = long("reset").short('r').help("Reset the drive before reading").switch();
    let geos = long("geos").short('g').help("GEOS-1.2 profile: force density 3 on track 36.5").switch();
    let only_35 = long("35").help("Limit the capture to 35 tracks").switch();
    let replay = long("replay")
        .help("Replay a recorded raw-read log instead of a physical drive")
        .argument::<PathBuf>("REPLAY_LOG")
        .optional();
    construct!(MnibParams { out, bump, density_scan, half_tracks, reset, geos, only_35, replay })
}

fn command_only_parser() -> impl Parser<Command> {
    let version = pure(Command::Version).to_options().command("version").help("Display version information and exit");

    let n2d = construct!(Command::N2d(n2d_parser())).to_options().command("n2d").help("Convert a NIB capture to a D64 image");

    let n2g = construct!(Command::N2g(n2g_parser())).to_options().command("n2g").help("Convert a NIB capture to a G64 image");

    let g2d = construct!(Command::G2d(g2d_parser())).to_options().command("g2d").help("Convert a G64 image to a D64 image");

    let mnib = construct!(Command::Mnib(mnib_parser()))
        .to_options()
        .command("mnib")
        .help("Capture a disk directly from a drive into a NIB/D64/G64 image");

    construct!([version, n2d, n2g, g2d, mnib])
}

pub(crate) fn command_parser() -> impl Parser<AppParams> {
    let global = global_options_parser();
    let command = command_only_parser();
    construct!(AppParams { global, command })
}

/// Replace `path`'s extension, or append one if it has none.
pub(crate) fn with_extension(path: &std::path::Path, ext: &str) -> PathBuf {
    let mut out = path.to_path_buf();
    out.set_extension(ext);
    out
}
