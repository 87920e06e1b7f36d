//! FAT table engine.
//!
//! A cluster chain is a singly linked list threaded through the File
//! Allocation Table: FAT\[c\] holds either the next cluster in the chain, 0
//! (free), or an end-of-chain sentinel. Every read/write here goes through
//! the sector [`crate::cache::Cache`] rather than the block device directly,
//! so repeated hops through the same FAT sector cost one load.

use alloc::sync::Arc;

use crate::bpb::FatType;
use crate::cache::{BlockCacheManager, Cache};
use crate::device::BlockDevice;
use crate::error::{FatError, FatResult};
use crate::{BLOCK_SIZE, END_OF_CLUSTER};

/// FAT table accessor bound to one volume's geometry. Holds no cache state
/// of its own — callers supply the [`BlockCacheManager`] (owned by
/// [`crate::volume::Volume`]) on every call, so multiple FAT tables never
/// compete over one manager's borrow.
pub struct FatTable {
    fat_type: FatType,
    fat1_sector: usize,
    bytes_per_sector: usize,
    data_cluster_cnt: usize,
}

impl FatTable {
    pub fn new(
        fat_type: FatType,
        fat1_sector: usize,
        bytes_per_sector: usize,
        data_cluster_cnt: usize,
    ) -> Self {
        Self {
            fat_type,
            fat1_sector,
            bytes_per_sector,
            data_cluster_cnt,
        }
    }

    fn entry_width(&self) -> usize {
        match self.fat_type {
            FatType::Fat16 => 2,
            FatType::Fat32 => 4,
        }
    }

    fn entry_location(&self, cluster: u32) -> (usize, usize) {
        let offset = cluster as usize * self.entry_width();
        let sector = self.fat1_sector + offset / self.bytes_per_sector;
        let byte_offset = offset % self.bytes_per_sector;
        (sector, byte_offset)
    }

    fn is_eoc(&self, raw: u32) -> bool {
        match self.fat_type {
            FatType::Fat16 => raw >= 0xFFF8,
            FatType::Fat32 => (raw & 0x0FFF_FFFF) >= 0x0FFF_FFF8,
        }
    }

    fn read_raw(
        &self,
        cluster: u32,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<u32> {
        let (sector, byte_offset) = self.entry_location(cluster);
        let cache = manager.get_block_cache(sector * BLOCK_SIZE, device);
        let raw = if self.entry_width() == 2 {
            cache
                .read()
                .read(byte_offset, |buf: &[u8; 2]| u16::from_le_bytes(*buf) as u32)
        } else {
            cache
                .read()
                .read(byte_offset, |buf: &[u8; 4]| u32::from_le_bytes(*buf) & 0x0FFF_FFFF)
        };
        Ok(raw)
    }

    fn write_raw(
        &self,
        cluster: u32,
        value: u32,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<()> {
        let (sector, byte_offset) = self.entry_location(cluster);
        let cache = manager.get_block_cache(sector * BLOCK_SIZE, Arc::clone(&device));
        if self.entry_width() == 2 {
            cache.write().modify(byte_offset, |buf: &mut [u8; 2]| {
                buf.copy_from_slice(&(value as u16).to_le_bytes());
            });
        } else {
            cache.write().modify(byte_offset, |buf: &mut [u8; 4]| {
                let preserved_hi = u32::from_le_bytes(*buf) & 0xF000_0000;
                let merged = (value & 0x0FFF_FFFF) | preserved_hi;
                buf.copy_from_slice(&merged.to_le_bytes());
            });
        }
        Ok(())
    }

    /// Successor cluster of `c`, or the canonical EOC `0xFFFF_FFFF`.
    pub fn get_next(
        &self,
        cluster: u32,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<u32> {
        let raw = self.read_raw(cluster, manager, device)?;
        if self.is_eoc(raw) {
            Ok(END_OF_CLUSTER)
        } else {
            Ok(raw)
        }
    }

    /// Write `value` into the FAT entry for `cluster`. `value` may be a real
    /// cluster number, 0 (free), or `END_OF_CLUSTER` (canonicalized to the
    /// variant's native EOC encoding).
    pub fn set_next(
        &self,
        cluster: u32,
        value: u32,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<()> {
        let encoded = if value == END_OF_CLUSTER {
            match self.fat_type {
                FatType::Fat16 => 0xFFFF,
                FatType::Fat32 => 0x0FFF_FFFF,
            }
        } else {
            value
        };
        self.write_raw(cluster, encoded, manager, device)
    }

    /// Linear scan starting AT `from` (inclusive) for the first free (FAT
    /// value 0) cluster. `from` of 0 or 1 starts the scan at cluster 2. In
    /// practice `from` is always a cluster already in use (the caller's own
    /// directory cluster, or the last cluster of a chain being extended), so
    /// inclusive vs. exclusive only matters if a caller ever passes an
    /// already-free cluster.
    pub fn find_next_free(
        &self,
        from: u32,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<u32> {
        let start = if from < 2 { 2 } else { from };
        let last = self.data_cluster_cnt as u32 + 1;
        let mut cluster = start;
        while cluster <= last {
            let raw = self.read_raw(cluster, manager, Arc::clone(&device))?;
            if raw == 0 {
                return Ok(cluster);
            }
            cluster += 1;
        }
        Ok(0)
    }

    /// Allocate a free cluster and link it after `after`. Returns 0 ("out of
    /// space") when no free cluster exists.
    pub fn allocate(
        &self,
        after: u32,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<u32> {
        let free = self.find_next_free(after, manager, Arc::clone(&device))?;
        if free == 0 {
            log::debug!("fat: allocate after cluster {} found no free cluster", after);
            return Ok(0);
        }
        self.set_next(after, free, manager, Arc::clone(&device))?;
        self.set_next(free, END_OF_CLUSTER, manager, device)?;
        log::debug!("fat: allocated cluster {} after cluster {}", free, after);
        Ok(free)
    }

    /// Free every cluster in the chain starting at `start`. When
    /// `clear_data` is set, zero-fill each cluster's data area before
    /// releasing its FAT entry.
    pub fn free_chain(
        &self,
        start: u32,
        clear_data: bool,
        data_begin_sector: usize,
        sectors_per_cluster: usize,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<()> {
        log::debug!("fat: freeing chain starting at cluster {} (clear_data={})", start, clear_data);
        let mut cluster = start;
        while cluster != 0 && cluster != END_OF_CLUSTER {
            let next = self.get_next(cluster, manager, Arc::clone(&device))?;
            if clear_data {
                let base = self.cluster_lba(cluster, data_begin_sector, sectors_per_cluster);
                for s in 0..sectors_per_cluster {
                    let cache =
                        manager.get_block_cache((base + s) * BLOCK_SIZE, Arc::clone(&device));
                    cache.write().modify(0, |buf: &mut [u8; BLOCK_SIZE]| {
                        buf.iter_mut().for_each(|b| *b = 0);
                    });
                }
            }
            self.set_next(cluster, 0, manager, Arc::clone(&device))?;
            cluster = next;
        }
        Ok(())
    }

    /// LBA of the first sector of cluster `c`. Clusters below 2 clamp to 2
    /// (there is no cluster before the data area).
    pub fn cluster_lba(&self, c: u32, data_begin_sector: usize, sectors_per_cluster: usize) -> usize {
        let c = if c < 2 { 2 } else { c };
        data_begin_sector + (c as usize - 2) * sectors_per_cluster
    }

    /// Sector-within-chain translation: hop `sector_offset /
    /// sectors_per_cluster` times through `get_next` starting at
    /// `first_cluster`, then land on the sector at the resulting cluster's
    /// base plus the remainder. Fails with `OutOfBounds` if EOC is reached
    /// before the requested hop count.
    pub fn read_chain_sector(
        &self,
        first_cluster: u32,
        sector_offset: usize,
        data_begin_sector: usize,
        sectors_per_cluster: usize,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<usize> {
        let hops = sector_offset / sectors_per_cluster;
        let remainder = sector_offset % sectors_per_cluster;
        let mut cluster = first_cluster;
        for _ in 0..hops {
            let next = self.get_next(cluster, manager, Arc::clone(&device))?;
            if next == END_OF_CLUSTER || next == 0 {
                return Err(FatError::OutOfBounds);
            }
            cluster = next;
        }
        Ok(self.cluster_lba(cluster, data_begin_sector, sectors_per_cluster) + remainder)
    }

    /// As [`FatTable::read_chain_sector`], but when `allocate_if_needed` is
    /// set and the chain runs out mid-hop, extends it via
    /// [`FatTable::allocate`] instead of failing.
    pub fn write_chain_sector(
        &self,
        first_cluster: u32,
        sector_offset: usize,
        allocate_if_needed: bool,
        data_begin_sector: usize,
        sectors_per_cluster: usize,
        manager: &mut BlockCacheManager,
        device: Arc<dyn BlockDevice>,
    ) -> FatResult<usize> {
        let hops = sector_offset / sectors_per_cluster;
        let remainder = sector_offset % sectors_per_cluster;
        let mut cluster = first_cluster;
        for _ in 0..hops {
            let next = self.get_next(cluster, manager, Arc::clone(&device))?;
            if next == END_OF_CLUSTER || next == 0 {
                if !allocate_if_needed {
                    return Err(FatError::OutOfBounds);
                }
                let new_cluster = self.allocate(cluster, manager, Arc::clone(&device))?;
                if new_cluster == 0 {
                    return Err(FatError::OutOfSpace);
                }
                cluster = new_cluster;
            } else {
                cluster = next;
            }
        }
        Ok(self.cluster_lba(cluster, data_begin_sector, sectors_per_cluster) + remainder)
    }
}
