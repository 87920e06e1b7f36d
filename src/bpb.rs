//! MBR and BIOS Parameter Block (BPB).
//!
//! The first sector of a FAT volume (the "boot sector" or "reserved sector")
//! carries the BPB. [`BIOSParameterBlock`] wraps the [`BasicBPB`] fields
//! common to every FAT width plus the [`BPB32`] extension. [`BPB12_16`] is
//! kept for completeness of the on-disk layout but this crate never mounts
//! FAT12.
//!
//! FAT type is a function of cluster count alone, not of anything the
//! volume claims about itself: fewer than 4085 data clusters is FAT12 (not
//! handled here), fewer than 65525 is FAT16, otherwise FAT32. See
//! [`BIOSParameterBlock::fat_type`].
//!
//! Given any valid data cluster number N, the sector number of the first
//! sector of that cluster (relative to sector 0 of the volume) is:
//!     first_sector_of_cluster = (N - 2) * sec_per_clus + first_data_sector

use crate::error::{FatError, FatResult};
use super::{
    LEAD_SIGNATURE, MAX_CLUSTER_FAT12, MAX_CLUSTER_FAT16, STRUCT_SIGNATURE, TRAIL_SIGNATURE,
};

/// A FAT volume is classified by its data-cluster count alone. FAT12 is
/// recognized only to be rejected at mount time; it is never constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatType {
    Fat16,
    Fat32,
}

/// On-disk MBR partition table entry (bytes 0x1BE + 16*n of sector 0).
#[derive(Debug, Clone, Copy)]
#[repr(packed)]
pub struct PartitionEntry {
    pub(crate) status: u8,
    pub(crate) chs_first: [u8; 3],
    pub(crate) partition_type: u8,
    pub(crate) chs_last: [u8; 3],
    pub(crate) lba_first: u32,
    pub(crate) sector_cnt: u32,
}

const FAT_PARTITION_TYPES: [u8; 4] = [0x06, 0x0B, 0x0C, 0x0E];

/// Locate the partition that carries the FAT volume. Returns its first LBA
/// and length in sectors.
///
/// If the boot sector starts with a jump instruction (0xEB or 0xE9) there is
/// no partition table: the whole device is the volume ("superfloppy"
/// layout), starting at LBA 0.
pub fn read_mbr(sector: &[u8], device_sector_cnt: usize) -> FatResult<(usize, usize)> {
    if sector.len() < 512 {
        return Err(FatError::FormatInvalid);
    }
    let signature = u16::from_le_bytes([sector[510], sector[511]]);
    if signature != 0xAA55 {
        return Err(FatError::FormatInvalid);
    }

    if sector[0] == 0xEB || sector[0] == 0xE9 {
        return Ok((0, device_sector_cnt));
    }

    let entry_offset = 0x1BE;
    let partition_type = sector[entry_offset + 4];
    if !FAT_PARTITION_TYPES.contains(&partition_type) {
        return Err(FatError::FormatInvalid);
    }
    let lba_first = u32::from_le_bytes([
        sector[entry_offset + 8],
        sector[entry_offset + 9],
        sector[entry_offset + 10],
        sector[entry_offset + 11],
    ]) as usize;
    let sector_cnt = u32::from_le_bytes([
        sector[entry_offset + 12],
        sector[entry_offset + 13],
        sector[entry_offset + 14],
        sector[entry_offset + 15],
    ]) as usize;
    Ok((lba_first, sector_cnt))
}

/// *On-disk* data structure combining the BPB common region and the FAT32
/// extension. Valid only when [`BIOSParameterBlock::fat_type`] is
/// [`FatType::Fat32`]; FAT16 volumes never populate `bpb32` meaningfully and
/// should not read `root_cluster`/`fat_info_sector` from it.
#[derive(Debug, Copy, Clone)]
#[repr(packed)]
pub struct BIOSParameterBlock {
    pub(crate) basic_bpb: BasicBPB, // size = 36B
    pub(crate) bpb32: BPB32,        // size = 54B
}

impl BIOSParameterBlock {
    /// Number of sectors occupied by one FAT, whichever width field the
    /// volume actually populated.
    #[inline(always)]
    pub fn fat_size(&self) -> usize {
        if self.basic_bpb.fat_sz16 != 0 {
            self.basic_bpb.fat_sz16 as usize
        } else {
            self.bpb32.fat_sz32 as usize
        }
    }

    /// Total sector count, whichever width field the volume populated.
    #[inline(always)]
    pub fn total_sectors(&self) -> usize {
        if self.basic_bpb.tot_sec16 != 0 {
            self.basic_bpb.tot_sec16 as usize
        } else {
            self.basic_bpb.tot_sec32 as usize
        }
    }

    #[inline(always)]
    /// The first sector of the cluster.
    pub fn first_sector_of_cluster(&self, cluster: u32) -> usize {
        self.first_data_sector() + (cluster as usize - 2) * self.basic_bpb.sec_per_clus as usize
    }

    #[inline(always)]
    /// The first data sector beyond the root directory region.
    pub fn first_data_sector(&self) -> usize {
        (self.basic_bpb.rsvd_sec_cnt as usize)
            + (self.basic_bpb.num_fats as usize) * self.fat_size()
            + self.root_dir_sector_cnt()
    }

    #[inline(always)]
    /// Offset (in sectors) of the first FAT copy from the start of the
    /// volume.
    pub fn fat1_sector_id(&self) -> usize {
        self.basic_bpb.rsvd_sec_cnt as usize
    }

    #[inline(always)]
    /// Offset (in sectors) of the second FAT copy. Unused: this crate does
    /// not mirror writes to the secondary FAT.
    pub fn fat2_sector_id(&self) -> usize {
        self.fat1_sector_id() + self.fat_size()
    }

    /// Sector count of the root directory region. Always 0 on FAT32, where
    /// the root directory is an ordinary cluster chain.
    #[inline(always)]
    pub fn root_dir_sector_cnt(&self) -> usize {
        ((self.basic_bpb.root_ent_cnt as usize) * 32 + (self.basic_bpb.byts_per_sec as usize - 1))
            / self.basic_bpb.byts_per_sec as usize
    }

    #[inline(always)]
    /// Offset (in sectors) of the first sector of the root directory region.
    /// Meaningful for FAT16 only.
    pub fn root_dir_sector_id(&self) -> usize {
        self.fat1_sector_id() + (self.basic_bpb.num_fats as usize) * self.fat_size()
    }

    #[inline(always)]
    /// Total sectors of the data region.
    pub fn data_sector_cnt(&self) -> usize {
        self.total_sectors()
            - (self.basic_bpb.rsvd_sec_cnt as usize)
            - (self.basic_bpb.num_fats as usize) * self.fat_size()
            - self.root_dir_sector_cnt()
    }

    /// Count of data clusters, rounded down. This is the sole input to FAT
    /// type classification.
    #[inline(always)]
    pub fn data_cluster_cnt(&self) -> usize {
        self.data_sector_cnt() / (self.basic_bpb.sec_per_clus as usize)
    }

    #[inline(always)]
    pub fn cluster_size(&self) -> usize {
        self.basic_bpb.sec_per_clus as usize * self.basic_bpb.byts_per_sec as usize
    }

    /// Classify the volume per the Microsoft rule: cluster count alone
    /// decides the FAT width, regardless of anything else in the BPB.
    /// FAT12 (< 4085 clusters) is rejected, never returned.
    pub fn fat_type(&self) -> FatResult<FatType> {
        let clusters = self.data_cluster_cnt();
        if clusters < MAX_CLUSTER_FAT12 {
            log::warn!(
                "bpb: data cluster count {} classifies as FAT12, which is unsupported",
                clusters
            );
            Err(FatError::FormatInvalid)
        } else if clusters < MAX_CLUSTER_FAT16 {
            Ok(FatType::Fat16)
        } else {
            Ok(FatType::Fat32)
        }
    }

    pub fn bytes_per_sector(&self) -> usize {
        self.basic_bpb.byts_per_sec as usize
    }

    pub fn sectors_per_cluster(&self) -> usize {
        self.basic_bpb.sec_per_clus as usize
    }

    pub fn fat_cnt(&self) -> usize {
        self.basic_bpb.num_fats as usize
    }

    pub fn reserved_sector_cnt(&self) -> usize {
        self.basic_bpb.rsvd_sec_cnt as usize
    }

    /// First cluster of the root directory (FAT32 only).
    pub fn root_cluster(&self) -> usize {
        self.bpb32.root_clus as usize
    }

    /// Sector number of the FSInfo structure, relative to the volume start
    /// (FAT32 only).
    pub fn fat_info_sector(&self) -> usize {
        self.bpb32.fs_info as usize
    }

    /// Basic sanity check beyond the classification rule: 512-byte sectors,
    /// a sane number of FATs, a non-zero total sector count.
    pub fn is_valid(&self) -> bool {
        let valid = self.basic_bpb.byts_per_sec == 512
            && self.basic_bpb.num_fats >= 1
            && self.total_sectors() != 0
            && self.fat_size() != 0;
        if !valid {
            log::warn!(
                "bpb: rejecting BPB (bytes_per_sector={}, num_fats={}, total_sectors={}, fat_size={})",
                self.basic_bpb.byts_per_sec,
                self.basic_bpb.num_fats,
                self.total_sectors(),
                self.fat_size()
            );
        }
        valid
    }
}

#[derive(Debug, Clone, Copy)]
#[repr(packed)]
/// Boot Sector and BPB structure common to FAT12/16/32.
pub struct BasicBPB {
    pub(crate) bs_jmp_boot: [u8; 3],
    pub(crate) bs_oem_name: [u8; 8],
    pub(crate) byts_per_sec: u16,
    pub(crate) sec_per_clus: u8,
    pub(crate) rsvd_sec_cnt: u16,
    pub(crate) num_fats: u8,
    /// 0 on FAT32 (the root directory is a cluster chain, not a fixed
    /// region).
    pub(crate) root_ent_cnt: u16,
    /// 0 on FAT32; `tot_sec32` carries the total instead.
    pub(crate) tot_sec16: u16,
    pub(crate) media: u8,
    /// 0 on FAT32; `bpb32.fat_sz32` carries the FAT size instead.
    pub(crate) fat_sz16: u16,
    pub(crate) sec_per_trk: u16,
    pub(crate) num_heads: u16,
    pub(crate) hidd_sec: u32,
    pub(crate) tot_sec32: u32,
}

#[derive(Debug, Clone, Copy)]
#[repr(packed)]
/// FAT32-specific region starting at offset 36 (0x24) of the boot sector.
pub struct BPB32 {
    pub(crate) fat_sz32: u32,
    pub(crate) ext_flags: u16,
    pub(crate) fs_ver: u16,
    pub(crate) root_clus: u32,
    pub(crate) fs_info: u16,
    pub(crate) bk_boot_sec: u16,
    pub(crate) reserved: [u8; 12],
    pub(crate) bs_drv_num: u8,
    pub(crate) bs_reserved1: u8,
    pub(crate) bs_boot_sig: u8,
    pub(crate) bs_vol_id: u32,
    pub(crate) bs_vol_lab: [u8; 11],
    pub(crate) bs_fil_sys_type: [u8; 8],
}

#[derive(Debug, Clone, Copy)]
#[repr(packed)]
#[allow(dead_code)]
/// FAT12/16 equivalent of [`BPB32`], starting at the same offset. Kept for
/// layout completeness; this crate never mounts FAT12 and reads FAT16
/// volumes through [`BasicBPB`] alone.
pub struct BPB12_16 {
    bs_drv_num: u8,
    bs_reserved1: u8,
    bs_boot_sig: u8,
    bs_vol_id: u32,
    bs_vol_lab: [u8; 11],
    bs_fil_sys_type: [u8; 8],
}

#[derive(Clone, Copy, Debug)]
#[repr(packed)]
/// FAT32 FSInfo sector. Kept only for signature verification; this crate
/// never writes back `free_count`/`nxt_free`, and always treats the FAT
/// table itself as the source of truth for free-cluster state.
pub struct FSInfo {
    pub(crate) lead_sig: u32,
    pub(crate) reserved1: [u8; 480],
    pub(crate) struc_sig: u32,
    pub(crate) free_count: u32,
    pub(crate) nxt_free: u32,
    pub(crate) reserved2: [u8; 12],
    pub(crate) trail_sig: u32,
}

impl FSInfo {
    pub fn check_signature(&self) -> bool {
        self.lead_sig == LEAD_SIGNATURE
            && self.struc_sig == STRUCT_SIGNATURE
            && self.trail_sig == TRAIL_SIGNATURE
    }

    pub fn free_cluster_cnt(&self) -> u32 {
        self.free_count
    }

    pub fn set_free_clusters(&mut self, free_clusters: u32) {
        self.free_count = free_clusters
    }
}
