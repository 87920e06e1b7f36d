//! Mounted volume: geometry plus the per-volume sector cache and FAT table.
//!
//! [`Volume::mount`] reads the MBR and BPB, classifies the FAT width, and
//! builds a [`FatTable`] over the resulting geometry. Everything above this
//! layer (directory entries, file handles) reaches the block device only
//! through [`Volume`]'s chain-translation helpers, which route through the
//! cache.

use alloc::sync::Arc;

use spin::Mutex;

use crate::bpb::{read_mbr, BIOSParameterBlock, FatType};
use crate::cache::{BlockCacheManager, Cache};
use crate::device::BlockDevice;
use crate::error::{FatError, FatResult};
use crate::fat::FatTable;
use crate::{BLOCK_CACHE_LIMIT, BLOCK_SIZE};

/// Sentinel `dir_start` value meaning "the FAT16 fixed root-directory
/// region", as opposed to a real cluster chain.
pub const FAT16_ROOT: u32 = 0;

pub struct Volume {
    device: Arc<dyn BlockDevice>,
    fat_type: FatType,
    fat: FatTable,
    cache: Mutex<BlockCacheManager>,
    partition_start_sector: usize,
    data_begin_sector: usize,
    sectors_per_cluster: usize,
    bytes_per_sector: usize,
    root_dir_start: u32,
    root_dir_sector: usize,
    root_dir_sector_cnt: usize,
}

impl Volume {
    /// Mount a block device: read the MBR to locate the partition, then the
    /// BPB to classify and size it. Fails with `FatError::FormatInvalid` on
    /// a bad signature, unsupported sector size, or a FAT12 volume.
    pub fn mount(device: Arc<dyn BlockDevice>) -> FatResult<Self> {
        let mut mbr_sector = [0u8; BLOCK_SIZE];
        device
            .read_blocks(&mut mbr_sector, 0, 1)
            .map_err(|_| FatError::Io)?;
        // a crude device-size estimate for the superfloppy (no partition
        // table) case; callers needing an exact count should prefer a
        // partitioned layout.
        let (partition_start, _partition_len) = read_mbr(&mbr_sector, usize::MAX / BLOCK_SIZE)?;

        let mut bpb_sector = [0u8; BLOCK_SIZE];
        device
            .read_blocks(&mut bpb_sector, partition_start * BLOCK_SIZE, 1)
            .map_err(|_| FatError::Io)?;
        let signature = u16::from_le_bytes([bpb_sector[510], bpb_sector[511]]);
        if signature != 0xAA55 {
            return Err(FatError::FormatInvalid);
        }
        let bpb = unsafe { *(bpb_sector.as_ptr() as *const BIOSParameterBlock) };
        if !bpb.is_valid() {
            return Err(FatError::FormatInvalid);
        }
        let fat_type = bpb.fat_type()?;

        let fat1_sector = partition_start + bpb.fat1_sector_id();
        let data_begin_sector = partition_start + bpb.first_data_sector();
        let (root_dir_start, root_dir_sector, root_dir_sector_cnt) = match fat_type {
            FatType::Fat32 => (bpb.root_cluster() as u32, 0, 0),
            FatType::Fat16 => (
                FAT16_ROOT,
                partition_start + bpb.root_dir_sector_id(),
                bpb.root_dir_sector_cnt(),
            ),
        };

        let fat = FatTable::new(
            fat_type,
            fat1_sector,
            bpb.bytes_per_sector(),
            bpb.data_cluster_cnt(),
        );

        Ok(Self {
            device,
            fat_type,
            fat,
            cache: Mutex::new(BlockCacheManager::new(BLOCK_CACHE_LIMIT)),
            partition_start_sector: partition_start,
            data_begin_sector,
            sectors_per_cluster: bpb.sectors_per_cluster(),
            bytes_per_sector: bpb.bytes_per_sector(),
            root_dir_start,
            root_dir_sector,
            root_dir_sector_cnt,
        })
    }

    pub fn fat_type(&self) -> FatType {
        self.fat_type
    }

    pub fn root_dir_start(&self) -> u32 {
        self.root_dir_start
    }

    pub fn sectors_per_cluster(&self) -> usize {
        self.sectors_per_cluster
    }

    pub fn bytes_per_sector(&self) -> usize {
        self.bytes_per_sector
    }

    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster * self.bytes_per_sector
    }

    pub(crate) fn is_fat16_root(&self, dir_start: u32) -> bool {
        self.fat_type == FatType::Fat16 && dir_start == FAT16_ROOT
    }

    /// Translate (dir_start, sector_offset) to an absolute LBA for reading,
    /// handling the FAT16 fixed-root-directory special case.
    pub fn chain_sector_for_read(&self, dir_start: u32, sector_offset: usize) -> FatResult<usize> {
        if self.is_fat16_root(dir_start) {
            if sector_offset >= self.root_dir_sector_cnt {
                return Err(FatError::OutOfBounds);
            }
            return Ok(self.root_dir_sector + sector_offset);
        }
        let mut cache = self.cache.lock();
        self.fat.read_chain_sector(
            dir_start,
            sector_offset,
            self.data_begin_sector,
            self.sectors_per_cluster,
            &mut cache,
            Arc::clone(&self.device),
        )
    }

    /// As [`Volume::chain_sector_for_read`], but extends the chain via
    /// `allocate` when `allocate_if_needed` is set and the chain is
    /// exhausted. The FAT16 root region never allocates.
    pub fn chain_sector_for_write(
        &self,
        dir_start: u32,
        sector_offset: usize,
        allocate_if_needed: bool,
    ) -> FatResult<usize> {
        if self.is_fat16_root(dir_start) {
            if sector_offset >= self.root_dir_sector_cnt {
                return Err(FatError::OutOfBounds);
            }
            return Ok(self.root_dir_sector + sector_offset);
        }
        let mut cache = self.cache.lock();
        self.fat.write_chain_sector(
            dir_start,
            sector_offset,
            allocate_if_needed,
            self.data_begin_sector,
            self.sectors_per_cluster,
            &mut cache,
            Arc::clone(&self.device),
        )
    }

    /// Linear scan for the first free cluster at or after `from`. Unlike
    /// [`Volume::allocate`], this does not link anything into the chain —
    /// callers starting a brand-new, unlinked chain (e.g. `create_file`)
    /// want this instead of `allocate`, which would otherwise write into
    /// the FAT entry for `from` itself.
    pub fn find_next_free(&self, from: u32) -> FatResult<u32> {
        let mut cache = self.cache.lock();
        self.fat.find_next_free(from, &mut cache, Arc::clone(&self.device))
    }

    pub fn get_next(&self, cluster: u32) -> FatResult<u32> {
        let mut cache = self.cache.lock();
        self.fat.get_next(cluster, &mut cache, Arc::clone(&self.device))
    }

    pub fn set_next(&self, cluster: u32, value: u32) -> FatResult<()> {
        let mut cache = self.cache.lock();
        self.fat.set_next(cluster, value, &mut cache, Arc::clone(&self.device))
    }

    pub fn allocate(&self, after: u32) -> FatResult<u32> {
        let mut cache = self.cache.lock();
        self.fat.allocate(after, &mut cache, Arc::clone(&self.device))
    }

    pub fn free_chain(&self, start: u32, clear_data: bool) -> FatResult<()> {
        let mut cache = self.cache.lock();
        self.fat.free_chain(
            start,
            clear_data,
            self.data_begin_sector,
            self.sectors_per_cluster,
            &mut cache,
            Arc::clone(&self.device),
        )
    }

    /// Read the 32-byte record at (sector, entry_index) out of the cache.
    pub fn read_entry(&self, sector: usize, entry_index: usize) -> [u8; 32] {
        let mut cache_mgr = self.cache.lock();
        let cache = cache_mgr.get_block_cache(sector * BLOCK_SIZE, Arc::clone(&self.device));
        cache
            .read()
            .read(entry_index * 32, |buf: &[u8; 32]| *buf)
    }

    /// Overwrite the 32-byte record at (sector, entry_index).
    pub fn write_entry(&self, sector: usize, entry_index: usize, bytes: &[u8; 32]) {
        let mut cache_mgr = self.cache.lock();
        let cache = cache_mgr.get_block_cache(sector * BLOCK_SIZE, Arc::clone(&self.device));
        cache.write().modify(entry_index * 32, |buf: &mut [u8; 32]| {
            buf.copy_from_slice(bytes);
        });
    }

    /// Read the full 512-byte contents of `sector` out of the cache. Used
    /// by file reads, which span arbitrary byte ranges rather than the
    /// fixed 32-byte records directory scanning deals in.
    pub fn read_sector(&self, sector: usize) -> [u8; BLOCK_SIZE] {
        let mut cache_mgr = self.cache.lock();
        let cache = cache_mgr.get_block_cache(sector * BLOCK_SIZE, Arc::clone(&self.device));
        cache.read().read(0, |buf: &[u8; BLOCK_SIZE]| *buf)
    }

    /// Overwrite `data.len()` bytes of `sector` starting at `offset`. The
    /// rest of the sector is preserved — the cache loads the full sector
    /// from the device on first touch, so a partial-sector write here never
    /// clobbers neighboring bytes.
    pub fn write_sector_range(&self, sector: usize, offset: usize, data: &[u8]) {
        let mut cache_mgr = self.cache.lock();
        let cache = cache_mgr.get_block_cache(sector * BLOCK_SIZE, Arc::clone(&self.device));
        cache.write().modify(0, |buf: &mut [u8; BLOCK_SIZE]| {
            buf[offset..offset + data.len()].copy_from_slice(data);
        });
    }

    pub fn partition_start_sector(&self) -> usize {
        self.partition_start_sector
    }

    /// Flush every dirty cached sector. Call before dropping the volume.
    pub fn sync(&self) {
        self.cache.lock().sync_all();
    }
}
