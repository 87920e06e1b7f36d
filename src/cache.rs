//! Sector cache.
//!
//! Every subsystem (FAT table, directory entries, file data) goes through
//! this cache instead of hitting the block device directly, so the same
//! sector is never read twice in a row and writes are coalesced until
//! eviction or drop.

use alloc::{sync::Arc, vec, vec::Vec};
use core::ops::{Drop, FnOnce};
use lru::LruCache;
use spin::RwLock;

use super::device::BlockDevice;
use super::BLOCK_SIZE;

pub trait Cache {
    /// The read-only mapper to the block cache
    ///
    /// - `offset`: offset in cache
    /// - `f`: a closure to read
    fn read<T, V>(&self, offset: usize, f: impl FnOnce(&T) -> V) -> V;
    /// The mutable mapper to the block cache
    ///
    /// - `offset`: offset in cache
    /// - `f`: a closure to write
    fn modify<T, V>(&mut self, offset: usize, f: impl FnOnce(&mut T) -> V) -> V;
    /// Tell cache to write back
    fn sync(&mut self);
}

pub struct BlockCache {
    cache: Vec<u8>,
    // byte offset on the device, not a cluster-relative index
    sector_offset: usize,
    block_device: Arc<dyn BlockDevice>,
    modified: bool,
}

impl BlockCache {
    pub fn new(sector_offset: usize, block_device: Arc<dyn BlockDevice>) -> Self {
        let mut cache = vec![0u8; BLOCK_SIZE];
        block_device
            .read_blocks(&mut cache, sector_offset, 1)
            .unwrap();
        log::trace!("cache: loaded sector at offset {}", sector_offset);
        Self {
            cache,
            sector_offset,
            block_device,
            modified: false,
        }
    }

    fn addr_of_offset(&self, offset: usize) -> usize {
        &self.cache[offset] as *const _ as usize
    }

    fn get_ref<T>(&self, offset: usize) -> &T
    where
        T: Sized,
    {
        let type_size = core::mem::size_of::<T>();
        assert!(offset + type_size <= BLOCK_SIZE);
        let addr = self.addr_of_offset(offset);
        unsafe { &*(addr as *const T) }
    }

    fn get_mut<T>(&mut self, offset: usize) -> &mut T
    where
        T: Sized,
    {
        let type_size = core::mem::size_of::<T>();
        assert!(offset + type_size <= BLOCK_SIZE);
        self.modified = true;
        let addr = self.addr_of_offset(offset);
        unsafe { &mut *(addr as *mut T) }
    }
}

impl Cache for BlockCache {
    fn read<T, V>(&self, offset: usize, f: impl FnOnce(&T) -> V) -> V {
        f(self.get_ref(offset))
    }

    fn modify<T, V>(&mut self, offset: usize, f: impl FnOnce(&mut T) -> V) -> V {
        f(self.get_mut(offset))
    }

    fn sync(&mut self) {
        if self.modified {
            self.modified = false;
            if let Err(e) = self
                .block_device
                .write_blocks(&self.cache, self.sector_offset, 1)
            {
                log::error!(
                    "cache: write-back at offset {} failed: {:?}",
                    self.sector_offset,
                    e
                );
            }
        }
    }
}

impl Drop for BlockCache {
    fn drop(&mut self) {
        self.sync()
    }
}

/// Per-volume sector cache manager.
///
/// Unlike a process-wide singleton, each [`crate::volume::Volume`] owns one
/// of these, so mounting more than one device in the same process cannot
/// alias cache state between them.
pub struct BlockCacheManager {
    lru: LruCache<usize, Arc<RwLock<BlockCache>>>,
    limit: usize,
}

impl BlockCacheManager {
    pub fn new(limit: usize) -> Self {
        Self {
            lru: LruCache::unbounded(),
            limit,
        }
    }

    /// Get (or load) the cache entry for the sector at `sector_offset`.
    pub fn get_block_cache(
        &mut self,
        sector_offset: usize,
        block_device: Arc<dyn BlockDevice>,
    ) -> Arc<RwLock<BlockCache>> {
        if let Some(cache) = self.lru.get(&sector_offset) {
            Arc::clone(cache)
        } else {
            let block_cache = Arc::new(RwLock::new(BlockCache::new(
                sector_offset,
                Arc::clone(&block_device),
            )));

            if self.lru.len() == self.limit {
                let (_, peek_cache) = self.lru.peek_lru().unwrap();
                if Arc::strong_count(peek_cache) == 1 {
                    self.lru.pop_lru();
                } else {
                    log::warn!("cache: full and LRU entry still referenced, growing past limit");
                }
            }
            self.lru.put(sector_offset, Arc::clone(&block_cache));
            block_cache
        }
    }

    /// Write back every resident entry. Called at unmount.
    pub fn sync_all(&mut self) {
        for (_, block_cache) in self.lru.iter() {
            block_cache.write().sync();
        }
    }
}
