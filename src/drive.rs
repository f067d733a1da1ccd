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

    The narrow interface the core consumes from the host-side parallel-port
    driver and the drive-resident 6502 helper. No implementation ships here -
    a real channel talks to a physical 1541/1571 over a cable this crate
    never touches; tests and CLI dry-runs use a recorded-replay channel
    instead (see cbmgcr_cli).
*/

use crate::Result;

/// Single-byte opcodes understood by the uploaded drive-resident helper. The core issues these
/// over [`DriveChannel::send_command`]; their 6502-side implementation is opaque to this crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HelperCommand {
    ScanKiller = 0x01,
    ScanDensity = 0x02,
    ReadTrack = 0x03,
    WriteTrack = 0x04,
    StepMotor = 0x05,
}

/// Everything the core needs from a physical (or replayed) 1541/1571 connection. Implementations
/// own the parallel-port cable and the IEC command layer; this crate depends only on this trait's
/// byte-level contract, never on how a concrete channel talks to the hardware.
pub trait DriveChannel {
    /// Read one byte from the parallel port, blocking until the drive presents one or the
    /// implementation's own timeout elapses.
    fn par_read(&mut self) -> Result<u8>;

    /// Write one byte to the parallel port.
    fn par_write(&mut self, byte: u8) -> Result<()>;

    /// First-stage nibbler read primitive: returns one sample byte from the drive's read latch.
    fn nib_read1(&mut self) -> Result<u8>;

    /// Second-stage nibbler read primitive, used when the helper streams two bytes per cycle.
    fn nib_read2(&mut self) -> Result<u8>;

    /// Step the head to the given half-track index (0 = track 1, 1 = track 1.5, ...).
    fn step_to_halftrack(&mut self, halftrack: u8) -> Result<()>;

    /// Send a single-byte opcode (optionally followed by parameter bytes written via
    /// [`par_write`]) to the drive-resident helper.
    fn send_command(&mut self, cmd: HelperCommand) -> Result<()>;

    /// Upload the helper program into the drive's RAM via IEC memory-write, then start it via
    /// memory-execute. Must be called once before any `send_command`.
    fn upload_helper(&mut self) -> Result<()>;
}
