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

    Captures a disk into a NIB/D64/G64 image. Grounded on mnib.c's main loop,
    generalized over the DriveChannel collaborator: since no physical
    parallel-port/IEC driver ships in this crate (out of scope per spec §1),
    the only capture source this binary can actually drive end to end is
    `--replay`, a directory of pre-recorded raw half-track dumps (see
    `crate::replay`). A live `DriveChannel` implementation would plug in here
    without changing anything downstream of `raw_reads_for_halftrack`.
*/
use std::path::Path;

use anyhow::{bail, Error};
use log::{info, warn};

use cbmgcr::classifier::DensityFlags;
use cbmgcr::formats::nib::NibImage;
use cbmgcr::geometry::{Geometry, SpeedZone};
use cbmgcr::sector::{convert_gcr_sector, extract_disk_id};
use cbmgcr::track_extractor::{extract_track, find_cycle_fallback};
use cbmgcr::RAW_TRACK_LENGTH;

use crate::args::MnibParams;
use crate::replay;

/// Half-track index for track 36, half-track 0.5 (36.5) - the GEOS-1.2 profile forces density 3
/// there regardless of what the geometry table or a live scan would otherwise select.
const GEOS_FORCED_HALFTRACK: u8 = (36 - 1) * 2 + 1;

pub(crate) fn run(params: &MnibParams) -> Result<(), Error> {
    let Some(replay_dir) = params.replay.as_ref() else {
        bail!(
            "no DriveChannel implementation is bundled with this crate (the parallel-port/IEC driver is out of \
             scope); pass --replay <dir> with pre-captured raw half-track dumps to exercise capture without hardware"
        );
    };

    if params.bump {
        info!("bump-head requested (no-op without a live DriveChannel)");
    }
    if params.reset {
        info!("drive reset requested (no-op without a live DriveChannel)");
    }
    if params.density_scan {
        info!("density scan requested, but replay mode has no live scan bins; falling back to the geometry table");
    }

    let max_track: u8 = if params.only_35 { 35 } else { cbmgcr::MAX_TRACK_D64 };
    let geo = Geometry;

    let mut nib = NibImage::new();
    let mut disk_id: Option<(u8, u8)> = None;

    for track in 1..=max_track {
        let whole_halftrack = (track - 1) * 2;
        for halftrack in whole_halftrack..=(if params.half_tracks { whole_halftrack + 1 } else { whole_halftrack }) {
            let reads = replay::load_halftrack_reads(replay_dir, halftrack)?;
            if reads.is_empty() {
                warn!("no replay data for half-track {halftrack} (track {track}), skipping");
                continue;
            }

            // Track 18 (whole) supplies the disk ID every other track's header is checked against;
            // resolve it as soon as that half-track is captured.
            if track == 18 && halftrack == whole_halftrack && disk_id.is_none() {
                disk_id = resolve_disk_id(&reads);
            }

            let raw = pick_best_read(&reads, disk_id, track);
            let flags = classify_from_geometry(&geo, track, halftrack, params.geos);
            nib.push_track(halftrack, flags, raw);
        }
    }

    if nib.entries.is_empty() {
        bail!("no half-tracks captured from {}", replay_dir.display());
    }

    write_output(&nib, &params.out)?;
    println!("captured {} half-track(s) from {}", nib.entries.len(), replay_dir.display());
    Ok(())
}

/// Scan every recorded read of track 18 for a valid header and return its disk ID, if any.
fn resolve_disk_id(reads: &[[u8; RAW_TRACK_LENGTH]]) -> Option<(u8, u8)> {
    for raw in reads {
        let extracted = extract_track(raw).or_else(|| find_cycle_fallback(raw))?;
        let mut doubled = extracted.data.clone();
        doubled.extend_from_slice(&extracted.data);
        if let Some(id) = extract_disk_id(&doubled, extracted.cycle_len) {
            return Some(id);
        }
    }
    None
}

/// Among the recorded retries for one half-track, pick the raw capture that decodes the most
/// sectors cleanly against the known disk ID - a raw-capture-level analogue of §4.6's voting, used
/// here because NIB stores one raw buffer per half-track rather than per-sector decoded data.
fn pick_best_read(reads: &[[u8; RAW_TRACK_LENGTH]], disk_id: Option<(u8, u8)>, track: u8) -> [u8; RAW_TRACK_LENGTH] {
    if reads.len() == 1 || disk_id.is_none() {
        return reads[0];
    }
    let disk_id = disk_id.unwrap();
    let geo = Geometry;
    let num_sectors = geo.sectors_per_track(track);

    let mut best_idx = 0;
    let mut best_score = -1i32;
    for (idx, raw) in reads.iter().enumerate() {
        let Some(extracted) = extract_track(raw).or_else(|| find_cycle_fallback(raw)) else {
            continue;
        };
        let mut doubled = extracted.data.clone();
        doubled.extend_from_slice(&extracted.data);
        let ok_count = (0..num_sectors)
            .filter(|&sector| convert_gcr_sector(&doubled, extracted.cycle_len, track, sector, disk_id).error == cbmgcr::ErrorCode::Ok)
            .count() as i32;
        if ok_count > best_score {
            best_score = ok_count;
            best_idx = idx;
        }
    }
    reads[best_idx]
}

/// Without a live density scan, fall back to the geometry table's nominal speed zone for the
/// track, with the GEOS-1.2 profile's forced override on 36.5 applied when requested.
fn classify_from_geometry(geo: &Geometry, track: u8, halftrack: u8, geos: bool) -> DensityFlags {
    if geos && halftrack == GEOS_FORCED_HALFTRACK {
        return DensityFlags::from_bits_truncate(SpeedZone::Zone3.code());
    }
    DensityFlags::from_bits_truncate(geo.speed_zone(track).code())
}

fn write_output(nib: &NibImage, out: &Path) -> Result<(), Error> {
    match out.extension().and_then(|e| e.to_str()) {
        Some("d64") => {
            let last_track = (36..=cbmgcr::MAX_TRACK_D64).rev().find(|&t| nib.find_halftrack(t).is_some()).unwrap_or(35);
            let d64 = cbmgcr::imaging::nib_to_d64(nib, last_track)?;
            d64.save(out)?;
        }
        Some("g64") => {
            let g64 = cbmgcr::imaging::nib_to_g64(nib)?;
            g64.save(out)?;
        }
        _ => {
            nib.save(out)?;
        }
    }
    Ok(())
}
