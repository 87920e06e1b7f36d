//! Crate-wide error taxonomy.
//!
//! One enum covers every failure mode surfaced by the block device, the FAT
//! table, the directory entry engine, and the file/directory handles. The
//! crate is `no_std`, so this implements `Debug`/`Display` by hand rather
//! than `std::error::Error`.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatError {
    /// The block device reported a read or write failure.
    Io,
    /// MBR/BPB signature invalid, unsupported sector size, or the volume
    /// classifies as FAT12.
    FormatInvalid,
    /// A name did not resolve inside the searched directory.
    NotFound,
    /// `create_file` was asked to create a name that already exists.
    Exists,
    /// The FAT table has no free cluster left to allocate.
    OutOfSpace,
    /// A read was attempted on a write-only handle, or vice versa.
    Capability,
    /// `fseek` targeted a position outside `[0, file_size]`.
    OutOfBounds,
    /// The underlying device is write-protected.
    WriteProtected,
}

impl fmt::Display for FatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FatError::Io => "block device I/O error",
            FatError::FormatInvalid => "invalid or unsupported on-disk format",
            FatError::NotFound => "name not found",
            FatError::Exists => "name already exists",
            FatError::OutOfSpace => "no free cluster available",
            FatError::Capability => "handle lacks the required capability",
            FatError::OutOfBounds => "position outside file bounds",
            FatError::WriteProtected => "device is write-protected",
        };
        f.write_str(msg)
    }
}

pub type FatResult<T> = Result<T, FatError>;
