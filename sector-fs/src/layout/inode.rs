//! 多级扇区索引
//! - 直接索引：inode 自带的扇区号，每个都指向一个**数据扇区**
//! - 一级：整个扇区连续存储扇区号，每个都指向一个数据扇区
//! - 二级：整个扇区连续存储扇区号，每个都指向一个一级索引扇区
//!
//! 任何槽中的 0 表示**尚未分配**；写入走到空槽时就地分配，
//! 文件因此隐式增长。索引字一律按小端序存取。

use core::mem;

use crate::MAGIC;
use crate::SECTOR_SIZE;

/// 间接索引扇区的编号容量
pub const INDIRECT_COUNT: usize = SECTOR_SIZE / 4;

/// 直接索引可编号数量
pub const DIRECT_COUNT: usize = 12;
/// 直接索引时的编号容量
pub const DIRECT_CAP: usize = DIRECT_COUNT;
/// 用上一级索引时的编号容量
pub const INDIRECT_CAP: usize = DIRECT_CAP + INDIRECT_COUNT;
/// 用上二级索引时的编号容量
pub const DOUBLE_INDIRECT_CAP: usize = INDIRECT_CAP + INDIRECT_COUNT * INDIRECT_COUNT;
/// 单个文件的字节容量上限
pub const MAX_FILE_SIZE: usize = DOUBLE_INDIRECT_CAP * SECTOR_SIZE;

/// 填充到恰好一个扇区
const PAD: usize = (SECTOR_SIZE - 68) / 4;

/// 磁盘上的 inode，恒为一个扇区大小
#[repr(C)]
pub struct DiskInode {
    /// 文件长度（字节）
    pub length: u32,
    // 不用usize是为了严控布局
    pub kind: DiskInodeKind,
    /// 直接索引，0 表示尚未分配
    pub direct: [u32; DIRECT_COUNT],
    /// 指向一个一级索引扇区
    pub indirect: u32,
    /// 指向一个二级索引扇区
    pub double_indirect: u32,
    /// 魔数，用于损坏检测
    pub magic: u32,
    pad: [u32; PAD],
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[repr(u32)]
pub enum DiskInodeKind {
    #[default]
    File = 0,
    Directory = 1,
}

const _: () = assert!(mem::size_of::<DiskInode>() == SECTOR_SIZE);

impl DiskInode {
    /* 字段在扇区内的偏移，供字粒度的缓存存取使用 */
    pub(crate) const LENGTH_OFFSET: usize = 0;
    pub(crate) const KIND_OFFSET: usize = 4;
    pub(crate) const DIRECT_OFFSET: usize = 8;
    pub(crate) const INDIRECT_OFFSET: usize = Self::DIRECT_OFFSET + 4 * DIRECT_COUNT;
    pub(crate) const DOUBLE_INDIRECT_OFFSET: usize = Self::INDIRECT_OFFSET + 4;
    pub(crate) const MAGIC_OFFSET: usize = Self::DOUBLE_INDIRECT_OFFSET + 4;

    pub fn new(length: u32, kind: DiskInodeKind) -> Self {
        Self {
            length,
            kind,
            direct: [0; DIRECT_COUNT],
            indirect: 0,
            double_indirect: 0,
            magic: MAGIC,
            pad: [0; PAD],
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == DiskInodeKind::Directory
    }

    /// 按字段逐个编码成扇区内容，多字节字段一律小端序
    pub fn to_bytes(&self) -> [u8; SECTOR_SIZE] {
        let mut bytes = [0; SECTOR_SIZE];
        bytes[Self::LENGTH_OFFSET..][..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[Self::KIND_OFFSET..][..4].copy_from_slice(&(self.kind as u32).to_le_bytes());
        for (index, slot) in self.direct.iter().enumerate() {
            bytes[Self::DIRECT_OFFSET + 4 * index..][..4].copy_from_slice(&slot.to_le_bytes());
        }
        bytes[Self::INDIRECT_OFFSET..][..4].copy_from_slice(&self.indirect.to_le_bytes());
        bytes[Self::DOUBLE_INDIRECT_OFFSET..][..4]
            .copy_from_slice(&self.double_indirect.to_le_bytes());
        bytes[Self::MAGIC_OFFSET..][..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes
    }
}
