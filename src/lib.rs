#![no_std]
//! FAT16/FAT32 filesystem core over a 512-byte block device.
//!
//! Five layers, leaves first: [`device`] (the block device contract),
//! [`cache`] (the per-volume sector cache every other layer reads/writes
//! through), [`bpb`] (MBR + BIOS Parameter Block parsing and FAT variant
//! classification), [`fat`] (cluster chain allocation/traversal),
//! [`entry`]/[`dir`] (directory record layouts and the scan/assemble/create
//! engine), [`volume`] (geometry + wiring of the above), and [`file`]
//! (the `fopen`/`fread`/`fwrite`/`opendir`/`readdir` stream API).

pub mod bpb;
pub mod cache;
pub mod device;
pub mod dir;
pub mod entry;
pub mod error;
pub mod fat;
pub mod file;
pub mod volume;

extern crate alloc;

pub use error::{FatError, FatResult};
pub use file::{DirEntryInfo, DirHandle, FileHandle, OpenFlags, SeekWhence};
pub use volume::Volume;

pub const LEAD_SIGNATURE: u32 = 0x4161_5252;
pub const STRUCT_SIGNATURE: u32 = 0x6141_7272;
pub const TRAIL_SIGNATURE: u32 = 0xAA55_0000;

pub const FREE_CLUSTER: u32 = 0x0000_0000;
/// Canonical end-of-chain sentinel this crate normalizes every variant's
/// native EOC encoding to. Not a real cluster number; used only as a
/// chain-walking terminator.
pub const END_OF_CLUSTER: u32 = 0xFFFF_FFFF;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

pub const DIRENT_SIZE: usize = 32;

/// Per-volume sector cache capacity, in resident sectors.
pub const BLOCK_CACHE_LIMIT: usize = 64;

pub const SPACE: u8 = 0x20;

pub const BLOCK_SIZE: usize = 512;

/// Number of UTF-16 code units packed into one long-name directory entry.
pub const LONG_NAME_LEN_CAP: usize = 13;

/// For Short Directory Entry `name[0]` and Long Directory Entry `ord`:
/// deleted/free but scanning continues.
pub const DIR_ENTRY_UNUSED: u8 = 0xE5;
/// For Short Directory Entry `name[0]`: end of directory, every following
/// slot is free.
pub const DIR_ENTRY_LAST_AND_UNUSED: u8 = 0x00;
/// Long Directory Entry `ord` bit marking the entry written FIRST on disk,
/// i.e. the logically LAST fragment of the name.
pub const LAST_LONG_ENTRY: u8 = 0x40;

pub const MAX_CLUSTER_FAT12: usize = 4085;
pub const MAX_CLUSTER_FAT16: usize = 65525;
