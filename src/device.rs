//! Block device interface.
//!
//! The core consumes exactly two operations from the underlying media: read
//! and write a run of 512-byte blocks at a byte offset. Byte-vs-block
//! addressing for small, non-CCS SD cards is the adapter's responsibility —
//! callers here always speak byte offsets, already multiplied by the block
//! size when necessary.

use core::any::Any;
use core::marker::{Send, Sync};
use core::result::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    ReadFailed,
    WriteFailed,
    WriteProtected,
}

pub trait BlockDevice: Send + Sync + Any {
    /// Read `block_cnt` blocks starting at `offset` (a multiple of the block
    /// size) into `buf`.
    ///
    /// - `offset` must be a multiple of `BLOCK_SIZE`
    /// - `block_cnt` = `buf.len() / BLOCK_SIZE`
    fn read_blocks(
        &self,
        buf: &mut [u8],
        offset: usize,
        block_cnt: usize,
    ) -> Result<(), DeviceError>;

    /// Write `block_cnt` blocks from `buf` to `offset` (a multiple of the
    /// block size).
    ///
    /// - `buf.len()` must be a multiple of `BLOCK_SIZE`
    /// - `offset` must be a multiple of `BLOCK_SIZE`
    /// - `block_cnt` = `buf.len() / BLOCK_SIZE`
    fn write_blocks(&self, buf: &[u8], offset: usize, block_cnt: usize)
        -> Result<(), DeviceError>;

    /// Whether media is currently inserted/reachable. Adapters that cannot
    /// detect this may always return `true`.
    fn is_present(&self) -> bool {
        true
    }
}
