//! File and directory API: stream-oriented handles over files
//! (`fopen`/`fseek`/`ftell`/`fread`/`fwrite`/`fclose`) and directories
//! (`opendir`/`readdir`/`closedir`).

use alloc::string::String;
use alloc::sync::Arc;

use crate::dir::{self, EntryLocation};
use crate::entry::{EntryKind, ShortDirEntry};
use crate::error::{FatError, FatResult};
use crate::volume::Volume;

/// Mode-string capability set, kept as a discriminated struct rather than
/// re-parsing the mode string at every operation site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub create: bool,
    pub truncate: bool,
}

/// Parse a C-style `fopen` mode string into its capability set.
pub fn parse_mode(mode: &str) -> FatResult<OpenFlags> {
    Ok(match mode {
        "r" => OpenFlags {
            read: true,
            ..Default::default()
        },
        "w" => OpenFlags {
            write: true,
            create: true,
            truncate: true,
            ..Default::default()
        },
        "a" => OpenFlags {
            write: true,
            create: true,
            append: true,
            ..Default::default()
        },
        "r+" => OpenFlags {
            read: true,
            write: true,
            ..Default::default()
        },
        "w+" => OpenFlags {
            read: true,
            write: true,
            create: true,
            truncate: true,
            ..Default::default()
        },
        "a+" => OpenFlags {
            read: true,
            write: true,
            create: true,
            append: true,
            ..Default::default()
        },
        _ => return Err(FatError::FormatInvalid),
    })
}

#[derive(Debug, Clone, Copy)]
pub enum SeekWhence {
    Set,
    Cur,
    End,
}

/// An open file stream. Holds the directory's starting cluster (where the
/// entry itself lives), the file's first data cluster, current size and
/// byte position, and the exact `(sector, entry_index)` of its directory
/// record so `fwrite` never needs to re-scan the directory to update
/// `DIR_FileSize` — re-scanning on every size update would risk writing
/// the update to the wrong sector if an intervening operation moved the
/// cache.
pub struct FileHandle {
    volume: Arc<Volume>,
    flags: OpenFlags,
    first_cluster: u32,
    file_size: usize,
    position: usize,
    loc: EntryLocation,
}

impl FileHandle {
    pub fn file_size(&self) -> usize {
        self.file_size
    }

    pub fn ftell(&self) -> usize {
        self.position
    }

    /// `fseek`: whence is `Set`/`Cur`/`End`. Rejects any move whose
    /// resulting absolute position falls outside `[0, file_size]`. A no-op
    /// returning success, without moving the position, when the handle was
    /// opened with `append`.
    pub fn fseek(&mut self, offset: i64, whence: SeekWhence) -> FatResult<()> {
        if self.flags.append {
            return Ok(());
        }
        let base = match whence {
            SeekWhence::Set => 0i64,
            SeekWhence::Cur => self.position as i64,
            SeekWhence::End => self.file_size as i64,
        };
        let target = base
            .checked_add(offset)
            .ok_or(FatError::OutOfBounds)?;
        if target < 0 || target as usize > self.file_size {
            return Err(FatError::OutOfBounds);
        }
        self.position = target as usize;
        Ok(())
    }

    /// `fread`: requires read capability. Reads
    /// `min(buf.len(), file_size - position)` bytes, translating the byte
    /// position into (cluster, sector, byte-offset) one sector at a time.
    /// Returns the number of bytes actually read; a handle lacking read
    /// capability returns `Ok(0)` rather than an error.
    pub fn fread(&mut self, buf: &mut [u8]) -> FatResult<usize> {
        if !self.flags.read {
            return Ok(0);
        }
        let remaining = self.file_size.saturating_sub(self.position);
        let to_read = buf.len().min(remaining);
        let bps = self.volume.bytes_per_sector();
        let mut done = 0usize;
        while done < to_read {
            let pos = self.position + done;
            let sector_offset = pos / bps;
            let byte_in_sector = pos % bps;
            let sector = self
                .volume
                .chain_sector_for_read(self.first_cluster, sector_offset)?;
            let len = (bps - byte_in_sector).min(to_read - done);
            let sector_bytes = self.volume.read_sector(sector);
            buf[done..done + len].copy_from_slice(&sector_bytes[byte_in_sector..byte_in_sector + len]);
            done += len;
        }
        self.position += done;
        Ok(done)
    }

    /// `fwrite`: requires write capability. If `position > file_size`,
    /// clamps to `file_size` first (writes cannot leave a hole). Touches
    /// one sector at a time, extending the chain as needed
    /// (`allocate_if_needed = true`). After the loop, if the final position
    /// exceeds the recorded size, updates `DIR_FileSize` via the
    /// remembered entry location — the last write `fwrite` performs, so a
    /// crash mid-write leaves data populated but the size field unchanged.
    pub fn fwrite(&mut self, buf: &[u8]) -> FatResult<usize> {
        if !self.flags.write {
            return Ok(0);
        }
        if self.position > self.file_size {
            self.position = self.file_size;
        }
        let bps = self.volume.bytes_per_sector();
        let mut done = 0usize;
        while done < buf.len() {
            let pos = self.position + done;
            let sector_offset = pos / bps;
            let byte_in_sector = pos % bps;
            let sector =
                self.volume
                    .chain_sector_for_write(self.first_cluster, sector_offset, true)?;
            let len = (bps - byte_in_sector).min(buf.len() - done);
            self.volume
                .write_sector_range(sector, byte_in_sector, &buf[done..done + len]);
            done += len;
        }
        self.position += done;
        if self.position > self.file_size {
            self.file_size = self.position;
            self.update_size_on_disk();
        }
        Ok(done)
    }

    fn update_size_on_disk(&self) {
        let bytes = self.volume.read_entry(self.loc.sector, self.loc.entry_index);
        let mut sfn = ShortDirEntry::from_bytes(&bytes);
        sfn.set_file_size(self.file_size as u32);
        self.volume
            .write_entry(self.loc.sector, self.loc.entry_index, &sfn.as_bytes_array());
    }

    /// `fclose`: release the handle. No flush is required here — sector
    /// writes already reached the volume's cache; [`Volume::sync`] (called
    /// at unmount) is what guarantees they reach the device.
    pub fn fclose(self) {}
}

/// `fopen`. If the file is not found and `create` is set, creates it and
/// re-locates. If `truncate` is set, truncates and re-locates. Position
/// starts at 0, or at `file_size` when opened with `append`.
pub fn fopen(volume: &Arc<Volume>, dir_start: u32, name: &str, mode: &str) -> FatResult<FileHandle> {
    let flags = parse_mode(mode)?;

    let found = dir::find_by_long_name(volume, dir_start, name);
    let (mut sfn, mut loc) = match found {
        Ok(pair) => pair,
        Err(FatError::NotFound) if flags.create => {
            dir::create_file(volume, dir_start, name, EntryKind::File)?;
            dir::find_by_long_name(volume, dir_start, name)?
        }
        Err(e) => return Err(e),
    };

    if flags.truncate {
        dir::truncate_file(volume, loc, sfn.first_cluster())?;
        let (refreshed_sfn, refreshed_loc) = dir::find_by_long_name(volume, dir_start, name)?;
        sfn = refreshed_sfn;
        loc = refreshed_loc;
    }

    let file_size = sfn.file_size() as usize;
    let position = if flags.append { file_size } else { 0 };

    Ok(FileHandle {
        volume: Arc::clone(volume),
        flags,
        first_cluster: sfn.first_cluster(),
        file_size,
        position,
        loc,
    })
}

/// One entry surfaced by [`DirHandle::readdir`]: the reconstructed long
/// name (or the bare short name, when no LFN set preceded the record) plus
/// the attributes a caller typically wants without a second lookup.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub file_size: u32,
    pub first_cluster: u32,
}

/// An open directory stream. `position` is a 32-byte-entry cursor within
/// the directory's cluster chain (or the FAT16 fixed root region).
pub struct DirHandle {
    volume: Arc<Volume>,
    dir_start: u32,
    position: usize,
}

impl DirHandle {
    /// `readdir`: advances by exactly one logical entry (its preceding LFN
    /// fragments, if any, plus its SFN record). Returns `Ok(None)` at
    /// end-of-directory.
    pub fn readdir(&mut self) -> FatResult<Option<DirEntryInfo>> {
        match dir::iterate_next(&self.volume, self.dir_start, &mut self.position)? {
            Some((sfn, name)) => Ok(Some(DirEntryInfo {
                name,
                is_dir: sfn.is_dir(),
                file_size: sfn.file_size(),
                first_cluster: sfn.first_cluster(),
            })),
            None => Ok(None),
        }
    }

    /// `closedir`: release the handle. No flush required, same rationale as
    /// [`FileHandle::fclose`].
    pub fn closedir(self) {}
}

/// `opendir`: resolves `path` relative to the root by walking `/`-delimited
/// parts (not used by `fopen`, which resolves names only within a single
/// caller-chosen starting directory). `path == "/"` (or any all-slash
/// path) yields the root directory.
pub fn opendir(volume: &Arc<Volume>, path: &str) -> FatResult<DirHandle> {
    let dir_start = dir::resolve_dir_path(volume, path)?;
    Ok(DirHandle {
        volume: Arc::clone(volume),
        dir_start,
        position: 0,
    })
}
