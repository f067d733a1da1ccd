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

    Nibble <-> 5-bit group conversion, and the 4-byte <-> 5-byte GCR block
    transform built on top of it. This is the lowest layer of the stack: it
    never fails, and it never sees a track, a sync, or a sector - just bytes.
*/

/// Encode table: 4-bit source nibble -> 5-bit GCR group. Every 5-bit code in this table has no
/// more than two consecutive zero bits, which is what keeps the recorded stream self-clocking.
const ENCODE_TABLE: [u8; 16] = [
    0x0a, 0x0b, 0x12, 0x13, 0x0e, 0x0f, 0x16, 0x17, 0x09, 0x19, 0x1a, 0x1b, 0x0d, 0x1d, 0x1e, 0x15,
];

/// Decode table: 5-bit GCR group -> source nibble, or `None` if the group never appears in
/// [`ENCODE_TABLE`] (a format violation, not a crash - see [`decode_5_to_4`]).
const DECODE_TABLE: [Option<u8>; 32] = build_decode_table();

const fn build_decode_table() -> [Option<u8>; 32] {
    let mut table = [None; 32];
    let mut nibble = 0usize;
    while nibble < 16 {
        table[ENCODE_TABLE[nibble] as usize] = Some(nibble as u8);
        nibble += 1;
    }
    table
}

/// Encode 4 source bytes (8 nibbles) into 5 GCR bytes (40 bits, 5 bits per nibble, big-endian
/// within the 40-bit stream). This is `convert_4bytes_to_GCR` in the reference implementation,
/// re-expressed as a generic bit-packing loop rather than its hand-unrolled shift sequence - the
/// two are bit-for-bit identical, but this form makes the 40-bit layout explicit instead of
/// implicit in eleven lines of shifts.
pub fn encode_4_to_5(src: &[u8; 4]) -> [u8; 5] {
    let nibbles = [
        src[0] >> 4,
        src[0] & 0x0f,
        src[1] >> 4,
        src[1] & 0x0f,
        src[2] >> 4,
        src[2] & 0x0f,
        src[3] >> 4,
        src[3] & 0x0f,
    ];

    let mut bits: u64 = 0;
    for n in nibbles {
        bits = (bits << 5) | ENCODE_TABLE[n as usize] as u64;
    }

    let mut out = [0u8; 5];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = ((bits >> (8 * (4 - i))) & 0xff) as u8;
    }
    out
}

/// Decode 5 GCR bytes back into 4 source bytes. Never fails: an invalid 5-bit group (one with no
/// corresponding entry in [`ENCODE_TABLE`]) decodes to `0xFF` in its half of the output byte,
/// exactly as the reference's `GCR_decode_high`/`GCR_decode_low` tables do. It is the caller's job
/// (the sector parser) to notice that via the data/header checksum, not this layer's.
pub fn decode_5_to_4(src: &[u8; 5]) -> [u8; 4] {
    let mut bits: u64 = 0;
    for b in src {
        bits = (bits << 8) | *b as u64;
    }

    let mut out = [0u8; 4];
    for (i, byte) in out.iter_mut().enumerate() {
        let hi_shift = 40 - 5 * (2 * i + 1);
        let lo_shift = 40 - 5 * (2 * i + 2);
        let hi_group = ((bits >> hi_shift) & 0x1f) as usize;
        let lo_group = ((bits >> lo_shift) & 0x1f) as usize;

        let hi = DECODE_TABLE[hi_group].map(|n| n << 4).unwrap_or(0xff);
        let lo = DECODE_TABLE[lo_group].unwrap_or(0xff);
        *byte = hi | lo;
    }
    out
}

/// Encode one on-disk sector (sync, header, header gap, sync, data block, inter-sector gap) into
/// `out`, which must be at least [`encoded_sector_len`] bytes long. Grounded on the reference's
/// `convert_sector_to_GCR`; used to build synthetic GCR tracks in tests, and by the (test-only)
/// track assembler.
///
/// `data` must be exactly 256 bytes. `id` is `(id_lo, id_hi)` as stored on disk.
pub fn encode_sector(out: &mut [u8], data: &[u8], track: u8, sector: u8, id: (u8, u8)) -> usize {
    assert_eq!(data.len(), crate::SECTOR_DATA_SIZE);
    let mut pos = 0;

    out[pos..pos + 5].fill(0xff); // sync
    pos += 5;

    let header = [
        0x08,
        sector ^ track ^ id.1 ^ id.0,
        sector,
        track,
    ];
    let group = encode_4_to_5(&[header[0], header[1], header[2], header[3]]);
    out[pos..pos + 5].copy_from_slice(&group);
    pos += 5;

    let group = encode_4_to_5(&[id.1, id.0, 0x0f, 0x0f]);
    out[pos..pos + 5].copy_from_slice(&group);
    pos += 5;

    out[pos..pos + 9].fill(0x55); // header gap
    pos += 9;

    out[pos..pos + 5].fill(0xff); // sync
    pos += 5;

    let mut checksum = 0u8;
    for b in data {
        checksum ^= b;
    }
    let mut block = [0u8; crate::SECTOR_DATA_SIZE + 4];
    block[0] = 0x07;
    block[1..257].copy_from_slice(data);
    block[257] = checksum;
    block[258] = 0x00;
    block[259] = 0x00;

    for chunk in block.chunks_exact(4) {
        let group = encode_4_to_5(&[chunk[0], chunk[1], chunk[2], chunk[3]]);
        out[pos..pos + 5].copy_from_slice(&group);
        pos += 5;
    }

    out[pos..pos + 6].fill(0x55); // inter-sector gap
    pos += 6;

    pos
}

/// Byte length produced by [`encode_sector`]: 5 + 5 + 5 + 9 + 5 + 65*5 + 6.
pub const fn encoded_sector_len() -> usize {
    5 + 5 + 5 + 9 + 5 + 65 * 5 + 6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_nibble_combinations() {
        for a in 0u8..=15 {
            for b in 0u8..=15 {
                let src = [a << 4 | b, b << 4 | a, a << 4 | a, b << 4 | b];
                let encoded = encode_4_to_5(&src);
                let decoded = decode_5_to_4(&encoded);
                assert_eq!(decoded, src, "round trip failed for nibbles {a:x},{b:x}");
            }
        }
    }

    #[test]
    fn test_encode_table_is_self_clocking() {
        // No code may have a run of more than two consecutive zero bits - that's the entire
        // point of GCR. Check directly on the table rather than trusting the magic numbers.
        for &code in &ENCODE_TABLE {
            let mut zero_run = 0;
            for bit in (0..5).rev() {
                if (code >> bit) & 1 == 0 {
                    zero_run += 1;
                    assert!(zero_run <= 2, "code {code:05b} has a zero run > 2");
                }
                else {
                    zero_run = 0;
                }
            }
        }
    }

    #[test]
    fn test_invalid_group_decodes_to_ff() {
        // Group 0 (0b00000) never appears in ENCODE_TABLE.
        let src = [0x00, 0x00, 0x00, 0x00, 0x00];
        let decoded = decode_5_to_4(&src);
        assert_eq!(decoded, [0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_encoded_sector_length() {
        let mut buf = vec![0u8; encoded_sector_len()];
        let data = vec![0x55u8; crate::SECTOR_DATA_SIZE];
        let written = encode_sector(&mut buf, &data, 18, 0, (0x41, 0x42));
        assert_eq!(written, encoded_sector_len());
    }
}
