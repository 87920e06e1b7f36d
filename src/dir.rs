//! Directory entry engine: scanning, long-name assembly, short-name
//! generation, and the `create_file`/`truncate_file` procedures.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::entry::{emit_fragment, lde_cnt, EntryKind, LongDirEntry, ShortDirEntry};
use crate::error::{FatError, FatResult};
use crate::volume::Volume;
use crate::{ATTR_DIRECTORY, DIRENT_SIZE, END_OF_CLUSTER, SPACE};

/// Where a short entry physically lives: the directory chain it belongs to,
/// plus the exact sector and slot index. Remembered by `fopen` so later
/// metadata updates (file size) never need to re-scan the directory.
#[derive(Debug, Clone, Copy)]
pub struct EntryLocation {
    pub dir_start: u32,
    pub sector: usize,
    pub entry_index: usize,
}

struct LfnCache {
    fragments: [[u16; 13]; 20],
    seen: [bool; 20],
    max_order: usize,
    checksum: Option<u8>,
}

impl LfnCache {
    fn new() -> Self {
        Self {
            fragments: [[0u16; 13]; 20],
            seen: [false; 20],
            max_order: 0,
            checksum: None,
        }
    }

    fn reset(&mut self) {
        self.seen = [false; 20];
        self.max_order = 0;
        self.checksum = None;
    }

    fn push(&mut self, lde: &LongDirEntry) {
        let order = lde.lde_order();
        if order == 0 || order > 20 {
            self.reset();
            return;
        }
        if let Some(sum) = self.checksum {
            if sum != lde.check_sum() {
                self.reset();
            }
        }
        self.checksum = Some(lde.check_sum());
        self.fragments[order - 1] = lde.name_utf16();
        self.seen[order - 1] = true;
        if order > self.max_order {
            self.max_order = order;
        }
    }

    fn assemble(&self) -> String {
        let mut units = Vec::new();
        for i in 0..self.max_order {
            if !self.seen[i] {
                break;
            }
            for &u in self.fragments[i].iter() {
                if u == 0 || u == 0xFFFF {
                    break;
                }
                units.push(u);
            }
        }
        String::from_utf16_lossy(&units)
    }
}

fn entries_per_sector(volume: &Volume) -> usize {
    volume.bytes_per_sector() / DIRENT_SIZE
}

/// Visit every 32-byte slot of the directory starting at `dir_start` in
/// order, calling `f(sector, entry_index, bytes)` for each. Stops when `f`
/// returns `Some(result)`, or when the `last` sentinel is reached.
fn scan<T>(
    volume: &Volume,
    dir_start: u32,
    mut f: impl FnMut(usize, usize, &[u8; 32]) -> Option<T>,
) -> FatResult<T> {
    let per_sector = entries_per_sector(volume);
    let mut sector_offset = 0usize;
    loop {
        let sector = match volume.chain_sector_for_read(dir_start, sector_offset) {
            Ok(s) => s,
            Err(FatError::OutOfBounds) => return Err(FatError::NotFound),
            Err(e) => return Err(e),
        };
        for entry_index in 0..per_sector {
            let bytes = volume.read_entry(sector, entry_index);
            if bytes[0] == 0x00 {
                return Err(FatError::NotFound);
            }
            if let Some(result) = f(sector, entry_index, &bytes) {
                return Ok(result);
            }
        }
        sector_offset += 1;
    }
}

/// Linear scan maintaining an LFN assembly cache, comparing reconstructed
/// long names (or bare short names when no LFN set precedes them) against
/// `name`, case-insensitively.
pub fn find_by_long_name(
    volume: &Volume,
    dir_start: u32,
    name: &str,
) -> FatResult<(ShortDirEntry, EntryLocation)> {
    let mut cache = LfnCache::new();
    let target = name.to_ascii_uppercase();
    scan(volume, dir_start, |sector, entry_index, bytes| {
        if bytes[0] == 0xE5 {
            cache.reset();
            return None;
        }
        let attr = bytes[11];
        if (attr & 0x3F) == crate::ATTR_LONG_NAME {
            cache.push(&LongDirEntry::from_bytes(bytes));
            return None;
        }
        let sfn = ShortDirEntry::from_bytes(bytes);
        let long_name = cache.assemble();
        let matched = if !long_name.is_empty() {
            long_name.to_ascii_uppercase() == target
        } else {
            sfn.name().to_ascii_uppercase() == target
        };
        cache.reset();
        if matched {
            Some((
                sfn,
                EntryLocation {
                    dir_start,
                    sector,
                    entry_index,
                },
            ))
        } else {
            None
        }
    })
}

/// Scan ignoring LFNs and free slots, byte-exact compare of the 11-byte SFN
/// field.
pub fn find_by_short_name(
    volume: &Volume,
    dir_start: u32,
    name: &[u8; 8],
    extension: &[u8; 3],
) -> FatResult<(ShortDirEntry, EntryLocation)> {
    scan(volume, dir_start, |sector, entry_index, bytes| {
        if bytes[0] == 0xE5 {
            return None;
        }
        let attr = bytes[11];
        if (attr & 0x3F) == crate::ATTR_LONG_NAME {
            return None;
        }
        if &bytes[0..8] == name && &bytes[8..11] == extension {
            Some((
                ShortDirEntry::from_bytes(bytes),
                EntryLocation {
                    dir_start,
                    sector,
                    entry_index,
                },
            ))
        } else {
            None
        }
    })
}

/// Locate the first run of `n` consecutive free-or-last slots. When the
/// directory's allocated chain runs out before a qualifying run is found,
/// extends the chain by one cluster via `allocate` and keeps scanning,
/// rather than failing — a directory can always grow to fit a new entry.
pub fn find_free_run(volume: &Volume, dir_start: u32, n: usize) -> FatResult<EntryLocation> {
    let per_sector = entries_per_sector(volume);
    let mut sector_offset = 0usize;
    let mut run_start: Option<(usize, usize)> = None;
    let mut run_len = 0usize;

    loop {
        let sector = match volume.chain_sector_for_read(dir_start, sector_offset) {
            Ok(s) => s,
            Err(FatError::OutOfBounds) => {
                // The FAT16 fixed root is a flat run of sectors outside the
                // cluster chain. It never grows, so running off its end
                // means the root is full.
                if volume.is_fat16_root(dir_start) {
                    return Err(FatError::OutOfSpace);
                }
                let last_cluster = last_cluster_of(volume, dir_start)?;
                let new_cluster = volume.allocate(last_cluster)?;
                if new_cluster == 0 {
                    return Err(FatError::OutOfSpace);
                }
                zero_cluster(volume, new_cluster)?;
                continue;
            }
            Err(e) => return Err(e),
        };
        for entry_index in 0..per_sector {
            let bytes = volume.read_entry(sector, entry_index);
            let free = bytes[0] == 0x00 || bytes[0] == 0xE5;
            if free {
                if run_start.is_none() {
                    run_start = Some((sector, entry_index));
                }
                run_len += 1;
                if run_len == n {
                    let (s, i) = run_start.unwrap();
                    return Ok(EntryLocation {
                        dir_start,
                        sector: s,
                        entry_index: i,
                    });
                }
            } else {
                run_start = None;
                run_len = 0;
            }
        }
        sector_offset += 1;
    }
}

fn last_cluster_of(volume: &Volume, dir_start: u32) -> FatResult<u32> {
    let mut cluster = dir_start;
    loop {
        let next = volume.get_next(cluster)?;
        if next == END_OF_CLUSTER {
            return Ok(cluster);
        }
        cluster = next;
    }
}

fn zero_cluster(volume: &Volume, cluster: u32) -> FatResult<()> {
    let zero = [0u8; DIRENT_SIZE];
    let per_sector = entries_per_sector(volume);
    for s in 0..volume.sectors_per_cluster() {
        let sector = volume.chain_sector_for_write(cluster, s, false)?;
        for entry_index in 0..per_sector {
            volume.write_entry(sector, entry_index, &zero);
        }
    }
    Ok(())
}

fn digits_of(mut n: u32) -> Vec<u8> {
    if n == 0 {
        return alloc::vec![b'0'];
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(b'0' + (n % 10) as u8);
        n /= 10;
    }
    digits.reverse();
    digits
}

/// Generate an 8.3 name from a long name. Rejects names beginning with
/// `.`. Uses the FIRST `.` as the extension boundary, rather than the
/// last one Microsoft's own short-name generation algorithm uses. When
/// `tail` is non-zero, writes `~n` right-justified into the basename,
/// overwriting its tail.
pub fn lfn_to_sfn(name: &str, tail: u32) -> FatResult<([u8; 8], [u8; 3])> {
    if name.starts_with('.') {
        return Err(FatError::FormatInvalid);
    }
    if tail > 9999 {
        return Err(FatError::Exists);
    }
    let (base, ext) = match name.find('.') {
        Some(i) => (&name[0..i], &name[i + 1..]),
        None => (&name[0..], ""),
    };

    let mut sfn_name = [SPACE; 8];
    let mut sfn_ext = [SPACE; 3];

    for (i, ch) in ext.chars().take(3).enumerate() {
        sfn_ext[i] = (ch as u8).to_ascii_uppercase();
    }

    let mut i = 0;
    for ch in base.chars() {
        if i >= 8 {
            break;
        }
        if ch == ' ' || ch == '.' {
            continue;
        }
        sfn_name[i] = (ch as u8).to_ascii_uppercase();
        i += 1;
    }

    if tail != 0 {
        let mut digits = digits_of(tail);
        digits.insert(0, b'~');
        let start = 8 - digits.len();
        for (k, &d) in digits.iter().enumerate() {
            sfn_name[start + k] = d;
        }
    }

    Ok((sfn_name, sfn_ext))
}

fn checksum_of(name: &[u8; 8], ext: &[u8; 3]) -> u8 {
    let mut bytes = [0u8; 11];
    bytes[0..8].copy_from_slice(name);
    bytes[8..11].copy_from_slice(ext);
    let mut sum: u8 = 0;
    for &b in bytes.iter() {
        sum = (if sum & 1 == 1 { 0x80 } else { 0 }) + (sum >> 1) + b;
    }
    sum
}

/// Create a new directory entry for `long_name`. Fails with `Exists` if
/// `long_name` already resolves, `OutOfSpace` if no cluster or no unique
/// short name can be found.
pub fn create_file(
    volume: &Volume,
    dir_start: u32,
    long_name: &str,
    kind: EntryKind,
) -> FatResult<EntryLocation> {
    if long_name.is_empty() {
        return Err(FatError::FormatInvalid);
    }
    if find_by_long_name(volume, dir_start, long_name).is_ok() {
        return Err(FatError::Exists);
    }

    // A fresh, unlinked chain: find a free cluster directly rather than
    // `allocate`, which would link it after (and write into the FAT entry
    // of) whatever cluster is passed as "after" — there is no such
    // predecessor for a brand-new file.
    let data_cluster = volume.find_next_free(dir_start)?;
    if data_cluster == 0 {
        return Err(FatError::OutOfSpace);
    }

    // the original always starts the tail at 1 and appends it unconditionally
    // (fat_fs.c's fat_create_file loops `i = 1; while (i < 65535)`), so every
    // created file gets a `~n` suffix, not just ones whose truncated
    // basename collides with an existing entry.
    let mut tail = 1u32;
    let (sfn_name, sfn_ext) = loop {
        let candidate = lfn_to_sfn(long_name, tail)?;
        if find_by_short_name(volume, dir_start, &candidate.0, &candidate.1).is_err() {
            break candidate;
        }
        tail += 1;
        if tail > 9999 {
            return Err(FatError::OutOfSpace);
        }
    };

    let checksum = checksum_of(&sfn_name, &sfn_ext);

    let units: Vec<u16> = long_name.encode_utf16().collect();
    let fragment_cnt = lde_cnt(units.len());

    let loc = find_free_run(volume, dir_start, fragment_cnt + 1)?;

    // write LFN fragments in descending ordinal order (highest ordinal,
    // i.e. the logically last fragment, is written first on disk).
    for i in (0..fragment_cnt).rev() {
        let ordinal = (i + 1) as u8;
        let ord_byte = if i == fragment_cnt - 1 {
            ordinal | crate::LAST_LONG_ENTRY
        } else {
            ordinal
        };
        let fragment = emit_fragment(&units, i);
        let lde = LongDirEntry::new(ord_byte, checksum, fragment);
        let slot_offset = fragment_cnt - 1 - i;
        let (sector, entry_index) = advance_slot(volume, &loc, slot_offset)?;
        volume.write_entry(sector, entry_index, &lde.as_bytes_array());
    }

    let (sfn_sector, sfn_entry_index) = advance_slot(volume, &loc, fragment_cnt)?;
    let sfn = ShortDirEntry::new(data_cluster, &sfn_name, &sfn_ext, kind);
    volume.write_entry(sfn_sector, sfn_entry_index, &sfn.as_bytes_array());

    volume.set_next(data_cluster, END_OF_CLUSTER)?;

    Ok(EntryLocation {
        dir_start,
        sector: sfn_sector,
        entry_index: sfn_entry_index,
    })
}

/// Advance `slots` entry positions forward from `loc`, crossing sector
/// boundaries as needed (the free run found by `find_free_run` is
/// contiguous but may span sectors/clusters).
fn advance_slot(volume: &Volume, loc: &EntryLocation, slots: usize) -> FatResult<(usize, usize)> {
    let per_sector = entries_per_sector(volume);
    let mut flat = loc.entry_index + slots;
    let mut sector_offset = 0usize;
    while flat >= per_sector {
        flat -= per_sector;
        sector_offset += 1;
    }
    if sector_offset == 0 {
        Ok((loc.sector, flat))
    } else {
        let abs_offset = sector_index_of(volume, loc)? + sector_offset;
        let sector = volume.chain_sector_for_write(loc.dir_start, abs_offset, true)?;
        Ok((sector, flat))
    }
}

/// Recover the chain-relative sector offset for an `EntryLocation`'s sector
/// by re-walking the chain until the LBA matches.
fn sector_index_of(volume: &Volume, loc: &EntryLocation) -> FatResult<usize> {
    let mut offset = 0usize;
    loop {
        let sector = volume.chain_sector_for_read(loc.dir_start, offset)?;
        if sector == loc.sector {
            return Ok(offset);
        }
        offset += 1;
    }
}

/// Truncate a file to zero length. Frees the file's data chain (zeroing the
/// data as it goes), then re-marks the original first cluster as
/// end-of-chain rather than clearing the directory entry's cluster pointer —
/// the file keeps its first cluster allocated-but-empty instead of
/// disowning it, so a subsequent write can reuse it directly.
pub fn truncate_file(volume: &Volume, loc: EntryLocation, first_cluster: u32) -> FatResult<()> {
    let mut bytes = volume.read_entry(loc.sector, loc.entry_index);
    let mut sfn = ShortDirEntry::from_bytes(&bytes);
    sfn.set_file_size(0);
    bytes = sfn.as_bytes_array();
    volume.write_entry(loc.sector, loc.entry_index, &bytes);

    if first_cluster != 0 {
        volume.free_chain(first_cluster, true)?;
        volume.set_next(first_cluster, END_OF_CLUSTER)?;
    }
    Ok(())
}

/// Advance a directory cursor by exactly one SFN record, assembling any
/// preceding LFN fragments into the returned name. Returns `Ok(None)` at
/// end of directory.
pub fn iterate_next(
    volume: &Volume,
    dir_start: u32,
    position: &mut usize,
) -> FatResult<Option<(ShortDirEntry, String)>> {
    let per_sector = entries_per_sector(volume);
    let mut cache = LfnCache::new();
    loop {
        let sector_offset = *position / per_sector;
        let entry_index = *position % per_sector;
        let sector = match volume.chain_sector_for_read(dir_start, sector_offset) {
            Ok(s) => s,
            Err(FatError::OutOfBounds) => return Ok(None),
            Err(e) => return Err(e),
        };
        let bytes = volume.read_entry(sector, entry_index);
        *position += 1;
        if bytes[0] == 0x00 {
            return Ok(None);
        }
        if bytes[0] == 0xE5 {
            cache.reset();
            continue;
        }
        let attr = bytes[11];
        if (attr & 0x3F) == crate::ATTR_LONG_NAME {
            cache.push(&LongDirEntry::from_bytes(&bytes));
            continue;
        }
        let sfn = ShortDirEntry::from_bytes(&bytes);
        let name = {
            let long_name = cache.assemble();
            if !long_name.is_empty() {
                long_name
            } else {
                sfn.name()
            }
        };
        return Ok(Some((sfn, name)));
    }
}

/// Walk a single path component at a time, requiring each to resolve to a
/// directory. Used by `opendir`; `fopen` resolves names only within a
/// single caller-chosen starting directory and never calls this.
pub fn resolve_dir_path(volume: &Volume, path: &str) -> FatResult<u32> {
    let mut current = volume.root_dir_start();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(current);
    }
    for part in trimmed.split('/') {
        let (sfn, _loc) = find_by_long_name(volume, current, part)?;
        if (sfn.attr() & ATTR_DIRECTORY) == 0 {
            return Err(FatError::NotFound);
        }
        current = sfn.first_cluster();
    }
    Ok(current)
}
