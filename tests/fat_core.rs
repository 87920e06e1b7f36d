//! Integration tests driving the whole FAT16/FAT32 core against an
//! in-memory block device, mirroring how a `std::fs`-backed `BlockDevice`
//! would back a demo binary. Images are built by hand (MBR/BPB + a handful
//! of FAT and data sectors) rather than shipped as a binary fixture.

use std::sync::{Arc, Mutex};

use fat_core::bpb::FatType;
use fat_core::cache::BlockCacheManager;
use fat_core::device::{BlockDevice, DeviceError};
use fat_core::dir;
use fat_core::entry::EntryKind;
use fat_core::fat::FatTable;
use fat_core::file::{self, SeekWhence};
use fat_core::volume::Volume;
use fat_core::{BLOCK_SIZE, END_OF_CLUSTER};

/// A `Vec<u8>`-backed [`BlockDevice`] that grows on demand. This lets a test
/// declare a volume as large as a real 1 GiB card without actually
/// allocating a gigabyte — only the sectors a test touches get backing
/// storage.
struct MemoryBlockDevice {
    data: Mutex<Vec<u8>>,
}

impl MemoryBlockDevice {
    fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
        }
    }
}

impl BlockDevice for MemoryBlockDevice {
    fn read_blocks(&self, buf: &mut [u8], offset: usize, _block_cnt: usize) -> Result<(), DeviceError> {
        let mut data = self.data.lock().unwrap();
        let end = offset + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        buf.copy_from_slice(&data[offset..end]);
        Ok(())
    }

    fn write_blocks(&self, buf: &[u8], offset: usize, _block_cnt: usize) -> Result<(), DeviceError> {
        let mut data = self.data.lock().unwrap();
        let end = offset + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(buf);
        Ok(())
    }
}

fn put_u16(sector: &mut [u8; BLOCK_SIZE], offset: usize, v: u16) {
    sector[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(sector: &mut [u8; BLOCK_SIZE], offset: usize, v: u32) {
    sector[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

/// A superfloppy (no MBR partition table) FAT32 boot sector: the BPB lives
/// at LBA 0, signaled by the 0xEB jump-instruction byte `read_mbr` treats as
/// "whole device is the volume".
fn build_fat32_bpb(
    sec_per_clus: u8,
    rsvd_sec_cnt: u16,
    num_fats: u8,
    fat_sz32: u32,
    root_clus: u32,
    tot_sec32: u32,
) -> [u8; BLOCK_SIZE] {
    let mut s = [0u8; BLOCK_SIZE];
    s[0] = 0xEB;
    put_u16(&mut s, 11, 512); // byts_per_sec
    s[13] = sec_per_clus;
    put_u16(&mut s, 14, rsvd_sec_cnt);
    s[16] = num_fats;
    put_u16(&mut s, 17, 0); // root_ent_cnt: 0 on FAT32
    put_u16(&mut s, 19, 0); // tot_sec16: 0, tot_sec32 carries the count
    s[21] = 0xF8; // media
    put_u16(&mut s, 22, 0); // fat_sz16: 0, bpb32.fat_sz32 carries the size
    put_u32(&mut s, 32, tot_sec32);
    put_u32(&mut s, 36, fat_sz32);
    put_u32(&mut s, 44, root_clus);
    put_u16(&mut s, 48, 1); // fs_info
    put_u16(&mut s, 510, 0xAA55);
    s
}

fn build_fat16_bpb(
    sec_per_clus: u8,
    rsvd_sec_cnt: u16,
    num_fats: u8,
    fat_sz16: u16,
    root_ent_cnt: u16,
    tot_sec16: u16,
) -> [u8; BLOCK_SIZE] {
    let mut s = [0u8; BLOCK_SIZE];
    s[0] = 0xEB;
    put_u16(&mut s, 11, 512);
    s[13] = sec_per_clus;
    put_u16(&mut s, 14, rsvd_sec_cnt);
    s[16] = num_fats;
    put_u16(&mut s, 17, root_ent_cnt);
    put_u16(&mut s, 19, tot_sec16);
    s[21] = 0xF8;
    put_u16(&mut s, 22, fat_sz16);
    put_u16(&mut s, 510, 0xAA55);
    s
}

/// A 1 GiB FAT32 volume, `sectors_per_cluster = 8`, `reserved = 32`,
/// `fat_size = 1008`, `num_fats = 2`, `root_cluster = 2`.
fn mount_fat32_scenario() -> (Arc<MemoryBlockDevice>, Volume) {
    let _ = env_logger::try_init();
    let sec_per_clus = 8u8;
    let rsvd = 32u16;
    let num_fats = 2u8;
    let fat_sz32 = 1008u32;
    let root_clus = 2u32;
    let tot_sec32 = 2_097_152u32; // 1 GiB / 512 bytes

    let bpb = build_fat32_bpb(sec_per_clus, rsvd, num_fats, fat_sz32, root_clus, tot_sec32);
    let device = Arc::new(MemoryBlockDevice::new());
    device.write_blocks(&bpb, 0, 1).unwrap();

    // A freshly formatted volume already marks its root directory's cluster
    // end-of-chain; this core never does that itself (it only mounts).
    let fat1_sector = rsvd as usize;
    let mut fat_sector = [0u8; BLOCK_SIZE];
    put_u32(&mut fat_sector, root_clus as usize * 4, 0x0FFF_FFFF);
    device
        .write_blocks(&fat_sector, fat1_sector * BLOCK_SIZE, 1)
        .unwrap();

    let volume = Volume::mount(Arc::clone(&device) as Arc<dyn BlockDevice>).unwrap();
    (device, volume)
}

/// A small FAT16 volume: 1 sector/cluster, a 16-entry (1-sector) fixed root,
/// ~4100 data clusters (just inside the FAT16 classification band).
fn mount_fat16_scenario() -> (Arc<MemoryBlockDevice>, Volume) {
    let _ = env_logger::try_init();
    let sec_per_clus = 1u8;
    let rsvd = 1u16;
    let num_fats = 1u8;
    let fat_sz16 = 17u16;
    let root_ent_cnt = 16u16;
    let tot_sec16 = 1 + fat_sz16 + 1 + 4100; // rsvd + fat + root + data

    let bpb = build_fat16_bpb(sec_per_clus, rsvd, num_fats, fat_sz16, root_ent_cnt, tot_sec16);
    let device = Arc::new(MemoryBlockDevice::new());
    device.write_blocks(&bpb, 0, 1).unwrap();
    let volume = Volume::mount(Arc::clone(&device) as Arc<dyn BlockDevice>).unwrap();
    (device, volume)
}

#[test]
fn mount_classifies_fat32_and_computes_data_begin() {
    let (_device, volume) = mount_fat32_scenario();
    assert_eq!(volume.fat_type(), FatType::Fat32);
    assert_eq!(volume.root_dir_start(), 2);

    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Probe.bin", EntryKind::File).unwrap();
    let (sfn, _) = dir::find_by_long_name(&volume, root, "Probe.bin").unwrap();
    let c = sfn.first_cluster();

    // get_cluster_lba(c) = data_begin + (c-2)*sectors_per_cluster.
    // data_begin = partition_start + reserved (32) + num_fats*fat_size (2*1008=2016).
    let expected =
        volume.partition_start_sector() + 2048 + (c as usize - 2) * volume.sectors_per_cluster();
    let actual = volume.chain_sector_for_read(c, 0).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn mount_classifies_fat16() {
    let (_device, volume) = mount_fat16_scenario();
    assert_eq!(volume.fat_type(), FatType::Fat16);
    assert_eq!(volume.root_dir_start(), 0); // FAT16_ROOT sentinel
}

#[test]
fn mount_rejects_bad_signature() {
    let mut bpb = build_fat32_bpb(8, 32, 2, 1008, 2, 2_097_152);
    bpb[510] = 0; // corrupt the 0xAA55 trailer
    bpb[511] = 0;
    let device = Arc::new(MemoryBlockDevice::new());
    device.write_blocks(&bpb, 0, 1).unwrap();
    assert!(Volume::mount(device as Arc<dyn BlockDevice>).is_err());
}

#[test]
fn fat_allocate_and_free_chain_invariants() {
    // After allocate(k), get_next(k) != 0 and
    // get_next(get_next(k)) == EOC; after free_chain, every freed cluster's
    // FAT entry is 0; find_next_free only ever returns a cluster that was 0.
    let device: Arc<dyn BlockDevice> = Arc::new(MemoryBlockDevice::new());
    let table = FatTable::new(FatType::Fat32, 0, 512, 100);
    let mut mgr = BlockCacheManager::new(16);

    table
        .set_next(2, END_OF_CLUSTER, &mut mgr, Arc::clone(&device))
        .unwrap();

    let free = table.find_next_free(2, &mut mgr, Arc::clone(&device)).unwrap();
    assert_ne!(free, 0);
    assert_eq!(
        table.get_next(free, &mut mgr, Arc::clone(&device)).unwrap(),
        0,
        "find_next_free must only return a cluster whose FAT entry was 0"
    );

    let allocated = table.allocate(2, &mut mgr, Arc::clone(&device)).unwrap();
    assert_ne!(allocated, 0);
    assert_eq!(
        table.get_next(2, &mut mgr, Arc::clone(&device)).unwrap(),
        allocated
    );
    assert_eq!(
        table
            .get_next(allocated, &mut mgr, Arc::clone(&device))
            .unwrap(),
        END_OF_CLUSTER
    );

    table
        .free_chain(2, false, 0, 1, &mut mgr, Arc::clone(&device))
        .unwrap();
    assert_eq!(table.get_next(2, &mut mgr, Arc::clone(&device)).unwrap(), 0);
    assert_eq!(
        table.get_next(allocated, &mut mgr, Arc::clone(&device)).unwrap(),
        0
    );
}

#[test]
fn fat_allocate_returns_zero_when_out_of_space() {
    // A 1-cluster volume: cluster 2 is the only data cluster and it's
    // already in use, so there is nothing left to allocate.
    let device: Arc<dyn BlockDevice> = Arc::new(MemoryBlockDevice::new());
    let table = FatTable::new(FatType::Fat32, 0, 512, 1);
    let mut mgr = BlockCacheManager::new(4);
    table
        .set_next(2, END_OF_CLUSTER, &mut mgr, Arc::clone(&device))
        .unwrap();
    let allocated = table.allocate(2, &mut mgr, Arc::clone(&device)).unwrap();
    assert_eq!(allocated, 0);
}

#[test]
fn fat16_eoc_normalizes_to_canonical_sentinel() {
    let device: Arc<dyn BlockDevice> = Arc::new(MemoryBlockDevice::new());
    let table = FatTable::new(FatType::Fat16, 0, 512, 100);
    let mut mgr = BlockCacheManager::new(16);
    table
        .set_next(5, END_OF_CLUSTER, &mut mgr, Arc::clone(&device))
        .unwrap();
    assert_eq!(
        table.get_next(5, &mut mgr, Arc::clone(&device)).unwrap(),
        END_OF_CLUSTER
    );
}

#[test]
fn fat16_bad_cluster_value_is_not_normalized() {
    // Boundary behavior: 0xFFF7 ("bad cluster") does not satisfy
    // the EOC predicate and must propagate unchanged.
    let device: Arc<dyn BlockDevice> = Arc::new(MemoryBlockDevice::new());
    let mut raw = [0u8; BLOCK_SIZE];
    let off = 6 * 2;
    raw[off..off + 2].copy_from_slice(&0xFFF7u16.to_le_bytes());
    device.write_blocks(&raw, 0, 1).unwrap();

    let table = FatTable::new(FatType::Fat16, 0, 512, 100);
    let mut mgr = BlockCacheManager::new(16);
    let next = table.get_next(6, &mut mgr, Arc::clone(&device)).unwrap();
    assert_eq!(next, 0xFFF7);
}

#[test]
fn create_file_assigns_sequential_unique_short_names() {
    // Both names truncate (after dropping spaces) to the same 8-char
    // basename "AAAAAAAA", so the second file must roll the tail to ~2.
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();

    dir::create_file(&volume, root, "Aaaaaaaa One.bin", EntryKind::File).unwrap();
    dir::create_file(&volume, root, "Aaaaaaaa Two.bin", EntryKind::File).unwrap();

    let (first, _) = dir::find_by_short_name(&volume, root, b"AAAAAA~1", b"BIN").unwrap();
    let (second, _) = dir::find_by_short_name(&volume, root, b"AAAAAA~2", b"BIN").unwrap();
    assert_ne!(first.first_cluster(), second.first_cluster());
}

#[test]
fn create_file_rejects_duplicate_long_name() {
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Unique.txt", EntryKind::File).unwrap();
    let err = dir::create_file(&volume, root, "Unique.txt", EntryKind::File).unwrap_err();
    assert_eq!(err, fat_core::FatError::Exists);
}

#[test]
fn end_to_end_create_write_read_truncate_reopen() {
    // End-to-end walkthrough: create, write 13 bytes,
    // read them back, truncate, then reopen for read and get 0 bytes back
    // with no error.
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();

    let loc = dir::create_file(&volume, root, "Hello World.txt", EntryKind::File).unwrap();
    let sfn_bytes = volume.read_entry(loc.sector, loc.entry_index);
    assert_ne!(sfn_bytes[0], 0x00);
    assert_ne!(sfn_bytes[0], 0xE5);

    let mut dh = file::opendir(&volume, "/").unwrap();
    let entry = dh.readdir().unwrap().expect("one entry in a fresh root");
    assert_eq!(entry.name, "Hello World.txt");
    assert!(!entry.is_dir);
    assert_eq!(entry.file_size, 0);
    assert!(dh.readdir().unwrap().is_none());

    let mut fh = file::fopen(&volume, root, "Hello World.txt", "r+").unwrap();
    let written = fh.fwrite(b"Hello, world!").unwrap();
    assert_eq!(written, 13);
    assert_eq!(fh.file_size(), 13);
    assert_eq!(fh.ftell(), 13);

    fh.fseek(0, SeekWhence::Set).unwrap();
    let mut buf = [0u8; 13];
    let read = fh.fread(&mut buf).unwrap();
    assert_eq!(read, 13);
    assert_eq!(&buf, b"Hello, world!");
    fh.fclose();

    let fh = file::fopen(&volume, root, "Hello World.txt", "w").unwrap();
    assert_eq!(fh.file_size(), 0);
    fh.fclose();

    let mut fh = file::fopen(&volume, root, "Hello World.txt", "r").unwrap();
    let mut one = [0u8; 1];
    assert_eq!(fh.fread(&mut one).unwrap(), 0);
}

#[test]
fn fwrite_clamps_position_to_file_size_and_updates_size_once() {
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Growing.bin", EntryKind::File).unwrap();

    let mut fh = file::fopen(&volume, root, "Growing.bin", "r+").unwrap();
    fh.fwrite(&[1u8, 2, 3, 4]).unwrap();
    assert_eq!(fh.file_size(), 4);

    // fread (capability Capability rule): a write-only-less handle here is
    // read+write ("r+"), so a read should work too.
    fh.fseek(0, SeekWhence::Set).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(fh.fread(&mut buf).unwrap(), 4);
    assert_eq!(buf, [1, 2, 3, 4]);
}

#[test]
fn read_only_handle_write_returns_zero_bytes() {
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Locked.txt", EntryKind::File).unwrap();

    let mut fh = file::fopen(&volume, root, "Locked.txt", "r").unwrap();
    let written = fh.fwrite(b"nope").unwrap();
    assert_eq!(written, 0);
}

#[test]
fn fseek_rejects_out_of_bounds_and_append_ignores_seek() {
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Bounded.bin", EntryKind::File).unwrap();

    let mut fh = file::fopen(&volume, root, "Bounded.bin", "r+").unwrap();
    fh.fwrite(&[0u8; 10]).unwrap();
    assert!(fh.fseek(20, SeekWhence::Set).is_err());
    assert_eq!(fh.ftell(), 10, "a rejected seek must not move the position");
    assert!(fh.fseek(5, SeekWhence::Set).is_ok());
    assert_eq!(fh.ftell(), 5);
    fh.fclose();

    // "a+": append mode. fseek is always a no-op returning success.
    let mut fh = file::fopen(&volume, root, "Bounded.bin", "a+").unwrap();
    assert_eq!(fh.ftell(), 10); // position starts at file_size
    fh.fseek(0, SeekWhence::Set).unwrap();
    assert_eq!(fh.ftell(), 10, "append mode ignores seek");
    let written = fh.fwrite(&[9u8; 3]).unwrap();
    assert_eq!(written, 3);
    assert_eq!(fh.file_size(), 13, "append always writes past the old end");
}

#[test]
fn long_name_round_trips_through_multiple_lfn_fragments() {
    // More than 26 ASCII characters forces at least 3 long-name fragments
    // (13 code units each).
    let long_name = "This is a long file name for testing.txt";
    assert!(long_name.len() > 26);

    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, long_name, EntryKind::File).unwrap();

    let mut dh = file::opendir(&volume, "/").unwrap();
    let entry = dh.readdir().unwrap().expect("one entry");
    assert_eq!(entry.name, long_name);
}

#[test]
fn sector_boundary_spanning_write_and_read() {
    // 600 bytes starting at offset 0 spans two 512-byte sectors.
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Spanning.bin", EntryKind::File).unwrap();

    let payload: Vec<u8> = (0..600u32).map(|i| (i % 256) as u8).collect();
    let mut fh = file::fopen(&volume, root, "Spanning.bin", "r+").unwrap();
    assert_eq!(fh.fwrite(&payload).unwrap(), 600);
    fh.fseek(0, SeekWhence::Set).unwrap();
    let mut readback = vec![0u8; 600];
    assert_eq!(fh.fread(&mut readback).unwrap(), 600);
    assert_eq!(readback, payload);
}

#[test]
fn cluster_boundary_spanning_write_extends_chain() {
    // sectors_per_cluster (8) * 512 + 1 bytes forces a hop into a second,
    // newly allocated cluster.
    let (_device, volume) = mount_fat32_scenario();
    let cluster_size = volume.cluster_size();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Multicluster.bin", EntryKind::File).unwrap();

    let len = cluster_size + 1;
    let payload: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
    let mut fh = file::fopen(&volume, root, "Multicluster.bin", "r+").unwrap();
    assert_eq!(fh.fwrite(&payload).unwrap(), len);

    fh.fseek(0, SeekWhence::Set).unwrap();
    let mut readback = vec![0u8; len];
    assert_eq!(fh.fread(&mut readback).unwrap(), len);
    assert_eq!(readback, payload);
}

#[test]
fn opendir_resolves_nested_directory_by_path() {
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Subdir", EntryKind::Dir).unwrap();

    let mut dh = file::opendir(&volume, "/Subdir").unwrap();
    assert!(dh.readdir().unwrap().is_none(), "freshly created dir starts empty");
}

#[test]
fn fat16_root_directory_file_round_trips() {
    // Exercises the FAT16-fixed-root special case: no cluster chain,
    // translation is `rootdir_begin + sector_offset`, never allocating.
    let (_device, volume) = mount_fat16_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    assert_eq!(root, 0);

    dir::create_file(&volume, root, "Readme.md", EntryKind::File).unwrap();
    let mut fh = file::fopen(&volume, root, "Readme.md", "r+").unwrap();
    assert_eq!(fh.fwrite(b"hi there").unwrap(), 8);
    fh.fseek(0, SeekWhence::Set).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(fh.fread(&mut buf).unwrap(), 8);
    assert_eq!(&buf, b"hi there");
}

#[test]
fn truncate_leaves_first_cluster_allocated_and_marked_eoc() {
    // A documented idiosyncrasy: truncate frees everything past
    // the first cluster but re-marks the first cluster EOC rather than
    // disowning it.
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();
    dir::create_file(&volume, root, "Idiosync.bin", EntryKind::File).unwrap();

    let mut fh = file::fopen(&volume, root, "Idiosync.bin", "r+").unwrap();
    let first_cluster = {
        let (sfn, _) = dir::find_by_long_name(&volume, root, "Idiosync.bin").unwrap();
        sfn.first_cluster()
    };
    // force a second cluster to be allocated
    let len = volume.cluster_size() + 32;
    fh.fwrite(&vec![0xAAu8; len]).unwrap();
    fh.fclose();

    let fh = file::fopen(&volume, root, "Idiosync.bin", "w").unwrap();
    assert_eq!(fh.file_size(), 0);
    fh.fclose();

    assert_eq!(volume.get_next(first_cluster).unwrap(), END_OF_CLUSTER);
}

#[test]
fn fat16_root_full_returns_out_of_space_without_growing() {
    // The fixed FAT16 root (16 entries here, one sector) must never be
    // extended via the FAT — filling it exactly and then trying one more
    // create must fail with OutOfSpace rather than looping or corrupting
    // FAT[0].
    let (_device, volume) = mount_fat16_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();

    // Every created file gets at least one LFN fragment plus its SFN record
    // (two slots each), so 8 files exactly fill the 16-entry root.
    for i in 0..8 {
        let name = format!("f{}.bin", i);
        dir::create_file(&volume, root, &name, EntryKind::File).unwrap();
    }

    let err = dir::create_file(&volume, root, "overflow.bin", EntryKind::File).unwrap_err();
    assert_eq!(err, fat_core::FatError::OutOfSpace);

    // FAT[0]/FAT[1] (reserved entries) must be untouched by the failed attempt.
    assert_eq!(volume.get_next(0).unwrap_or(0), 0);
}

#[test]
fn fat32_root_grows_a_second_cluster_past_first_clusters_capacity() {
    // 8 sectors/cluster * 512 bytes = 4096-byte cluster = 128 32-byte slots.
    // Each file consumes 2 slots (one LFN fragment plus its SFN), so 64
    // files exactly fill the root's first cluster; the 65th must force
    // find_free_run to allocate and link a second directory cluster rather
    // than failing.
    let (_device, volume) = mount_fat32_scenario();
    let volume = Arc::new(volume);
    let root = volume.root_dir_start();

    assert_eq!(volume.get_next(root).unwrap(), END_OF_CLUSTER);

    for i in 0..65 {
        let name = format!("f{}.bin", i);
        dir::create_file(&volume, root, &name, EntryKind::File).unwrap();
    }

    // The root's first cluster now chains into a second one.
    let second = volume.get_next(root).unwrap();
    assert_ne!(second, END_OF_CLUSTER);
    assert_eq!(volume.get_next(second).unwrap(), END_OF_CLUSTER);

    // Every file, including the one that forced the growth, is still
    // findable by its long name.
    for i in 0..65 {
        let name = format!("f{}.bin", i);
        let (sfn, _) = dir::find_by_long_name(&volume, root, &name).unwrap();
        assert!(sfn.is_file());
    }
}
