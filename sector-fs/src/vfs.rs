//! # 索引节点层
//!
//! 同一扇区的 inode 被多个使用者打开时共享打开表中的同一项；
//! [`Inode`] 是打开表项的句柄，克隆即重新打开，析构即关闭。
//! 字节级读写透过扇区缓存落到多级索引指向的数据扇区上，
//! 写入走到空的索引槽会就地分配，文件因此隐式增长；
//! 读取既不分配也不越过文件长度。

use alloc::sync::Arc;

use enumflags2::bitflags;
use log::debug;

use crate::fs::{FileSystem, FsInner};
use crate::layout::{
    DiskInode, DiskInodeKind, DIRECT_CAP, DIRECT_COUNT, DOUBLE_INDIRECT_CAP, INDIRECT_CAP,
    INDIRECT_COUNT, MAX_FILE_SIZE,
};
use crate::SECTOR_SIZE;

/// 打开表中的一项，被指向同一扇区的所有句柄共享
pub(crate) struct OpenInode {
    pub sector: u32,
    /// 存活句柄数
    pub open_count: u32,
    /// 置位后，最后一个句柄关闭时释放全部扇区
    pub removed: bool,
    /// 大于零时写入一律被拒绝
    pub deny_write_count: u32,
}

/// 打开的 inode 句柄
pub struct Inode {
    sector: u32,
    fs: Arc<FileSystem>,
}

#[repr(C)]
#[derive(Debug, Default)]
pub struct Stat {
    pub dev: u64,
    pub inode: u64,
    pub kind: StatKind,
    pad: [u64; 7],
}

#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatKind {
    DIR = 0o040000,
    #[default]
    FILE = 0o100000,
}

impl Inode {
    #[inline]
    pub(crate) fn new(sector: u32, fs: Arc<FileSystem>) -> Self {
        Self { sector, fs }
    }

    #[inline]
    pub(crate) fn fs(&self) -> &Arc<FileSystem> {
        &self.fs
    }

    /// 从指定偏移读出数据填充 `buf`，到文件末尾为止
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let mut inner = self.fs.inner.lock();
        self.fs.inode_read_at(&mut inner, self.sector, offset, buf)
    }

    /// 把 `buf` 写进指定偏移，必要时扩展文件。
    /// 拒绝写入期间返回 0；分配失败时返回已写入的字节数。
    pub fn write_at(&self, offset: usize, buf: &[u8]) -> usize {
        let mut inner = self.fs.inner.lock();
        self.fs.inode_write_at(&mut inner, self.sector, offset, buf)
    }

    /// 原子地追加到文件末尾：
    /// 取长度与写入在同一个临界区内完成
    pub fn append(&self, buf: &[u8]) -> usize {
        let mut inner = self.fs.inner.lock();
        let offset = self.fs.inode_length(self.sector) as usize;
        self.fs.inode_write_at(&mut inner, self.sector, offset, buf)
    }

    #[inline]
    pub fn length(&self) -> u32 {
        self.fs.inode_length(self.sector)
    }

    /// inode 的编号就是它所在的扇区号
    #[inline]
    pub fn inumber(&self) -> u32 {
        self.sector
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.fs.inode_kind(self.sector) == DiskInodeKind::Directory
    }

    /// 标记删除。调用者应当已把它从目录中摘除；
    /// 存储在最后一个句柄关闭时释放。
    pub fn remove(&self) {
        let mut inner = self.fs.inner.lock();
        self.fs.inode_mark_removed(&mut inner, self.sector);
    }

    /// 拒绝写入。每次调用都必须在关闭前配对一次
    /// [`allow_write`](Inode::allow_write)。
    pub fn deny_write(&self) {
        let mut inner = self.fs.inner.lock();
        let open = inner.open_mut(self.sector).expect("inode not open");
        open.deny_write_count += 1;
        assert!(open.deny_write_count <= open.open_count);
    }

    pub fn allow_write(&self) {
        let mut inner = self.fs.inner.lock();
        let open = inner.open_mut(self.sector).expect("inode not open");
        assert!(open.deny_write_count > 0);
        open.deny_write_count -= 1;
    }

    pub fn stat(&self) -> Stat {
        Stat::new(self.sector as u64, self.fs.inode_kind(self.sector).into())
    }
}

impl Clone for Inode {
    /// 重新打开：新句柄与原句柄共享打开表状态
    fn clone(&self) -> Self {
        let mut inner = self.fs.inner.lock();
        inner
            .open_mut(self.sector)
            .expect("inode not open")
            .open_count += 1;

        Self {
            sector: self.sector,
            fs: self.fs.clone(),
        }
    }
}

impl Drop for Inode {
    fn drop(&mut self) {
        let mut inner = self.fs.inner.lock();
        self.fs.inode_close(&mut inner, self.sector);
    }
}

impl FileSystem {
    /// 通过缓存初始化 inode 扇区。不分配任何数据扇区。
    pub(crate) fn inode_create(&self, sector: u32, length: u32, kind: DiskInodeKind) {
        self.cache.create(sector);
        let disk_inode = DiskInode::new(length, kind);
        self.cache.write(sector, &disk_inode.to_bytes(), 0);
    }

    /// 打开扇区上的 inode；已打开则共享现有状态
    pub(crate) fn inode_open(self: &Arc<Self>, inner: &mut FsInner, sector: u32) -> Inode {
        if let Some(open) = inner.open_mut(sector) {
            open.open_count += 1;
        } else {
            inner.open_inodes.push(OpenInode {
                sector,
                open_count: 1,
                removed: false,
                deny_write_count: 0,
            });
        }

        Inode::new(sector, self.clone())
    }

    fn inode_close(&self, inner: &mut FsInner, sector: u32) {
        let index = inner
            .open_inodes
            .iter()
            .position(|open| open.sector == sector)
            .expect("inode not open");

        let open = &mut inner.open_inodes[index];
        open.open_count -= 1;
        if open.open_count > 0 {
            return;
        }
        // 每个 deny 都必须在关闭前配对 allow
        assert_eq!(open.deny_write_count, 0);

        let removed = open.removed;
        inner.open_inodes.swap_remove(index);
        if removed {
            self.release_inode(inner, sector);
        }
    }

    /// 标记删除：开着就推迟到最后一次关闭，否则立即释放
    pub(crate) fn inode_mark_removed(&self, inner: &mut FsInner, sector: u32) {
        if let Some(open) = inner.open_mut(sector) {
            open.removed = true;
        } else {
            self.release_inode(inner, sector);
        }
    }

    /// 释放 inode 扇区与索引树指向的所有扇区：
    /// 归还空闲位图，并把缓存槽直接丢弃（不写回）
    pub(crate) fn release_inode(&self, inner: &mut FsInner, sector: u32) {
        // 先抄出索引指针，再丢弃 inode 的缓存槽
        let mut direct = [0u32; DIRECT_COUNT];
        for (index, slot) in direct.iter_mut().enumerate() {
            *slot = self.index_word(sector, DiskInode::DIRECT_OFFSET + 4 * index);
        }
        let indirect = self.index_word(sector, DiskInode::INDIRECT_OFFSET);
        let double_indirect = self.index_word(sector, DiskInode::DOUBLE_INDIRECT_OFFSET);

        self.discard(inner, sector);
        for slot in direct {
            if slot != 0 {
                self.discard(inner, slot);
            }
        }
        if indirect != 0 {
            self.release_indirect(inner, indirect);
        }
        if double_indirect != 0 {
            let slots = self.read_indirect(double_indirect);
            self.discard(inner, double_indirect);
            for slot in slots {
                if slot != 0 {
                    self.release_indirect(inner, slot);
                }
            }
        }
    }

    /// 释放一个一级索引扇区与它指向的所有数据扇区
    fn release_indirect(&self, inner: &mut FsInner, sector: u32) {
        let slots = self.read_indirect(sector);
        self.discard(inner, sector);
        for slot in slots {
            if slot != 0 {
                self.discard(inner, slot);
            }
        }
    }

    fn discard(&self, inner: &mut FsInner, sector: u32) {
        self.cache.remove(sector);
        inner.free_map.release(sector);
    }

    pub(crate) fn inode_read_at(
        &self,
        inner: &mut FsInner,
        sector: u32,
        offset: usize,
        buf: &mut [u8],
    ) -> usize {
        let length = self.inode_length(sector) as usize;
        let end = (offset + buf.len()).min(length);
        if offset >= end {
            return 0;
        }

        let mut pos = offset;
        let mut read_size = 0;
        while pos < end {
            let chunk = (end - pos).min(SECTOR_SIZE - pos % SECTOR_SIZE);
            let dst = &mut buf[read_size..read_size + chunk];
            match self.byte_to_sector(inner, sector, pos, false) {
                Some(data_sector) => self.cache.read(data_sector, dst, pos % SECTOR_SIZE),
                // 尚未分配的洞读出全零
                None => dst.fill(0),
            }

            pos += chunk;
            read_size += chunk;
        }

        read_size
    }

    pub(crate) fn inode_write_at(
        &self,
        inner: &mut FsInner,
        sector: u32,
        offset: usize,
        buf: &[u8],
    ) -> usize {
        if inner
            .open_mut(sector)
            .is_some_and(|open| open.deny_write_count > 0)
        {
            return 0;
        }

        let end = (offset + buf.len()).min(MAX_FILE_SIZE);

        // 先扩展长度再写数据，并发读者至多晚一步看到增长
        if end as u32 > self.inode_length(sector) {
            self.cache
                .write(sector, &(end as u32).to_le_bytes(), DiskInode::LENGTH_OFFSET);
        }

        let mut pos = offset;
        let mut written_size = 0;
        while pos < end {
            let chunk = (end - pos).min(SECTOR_SIZE - pos % SECTOR_SIZE);
            let Some(data_sector) = self.byte_to_sector(inner, sector, pos, true) else {
                debug!("write to inode {sector} stops at byte {pos}: no free sectors");
                break;
            };
            self.cache
                .write(data_sector, &buf[written_size..written_size + chunk], pos % SECTOR_SIZE);

            pos += chunk;
            written_size += chunk;
        }

        written_size
    }

    #[inline]
    pub(crate) fn inode_length(&self, sector: u32) -> u32 {
        self.index_word(sector, DiskInode::LENGTH_OFFSET)
    }

    pub(crate) fn inode_kind(&self, sector: u32) -> DiskInodeKind {
        if self.index_word(sector, DiskInode::KIND_OFFSET) == DiskInodeKind::Directory as u32 {
            DiskInodeKind::Directory
        } else {
            DiskInodeKind::File
        }
    }

    pub(crate) fn inode_magic_ok(&self, sector: u32) -> bool {
        self.index_word(sector, DiskInode::MAGIC_OFFSET) == crate::MAGIC
    }

    /// 查出 inode 中字节偏移 `pos` 落在哪个数据扇区。
    /// `alloc` 指示走到空槽时是否就地分配——只有写入会这么做；
    /// 读取遇到空槽或越过文件长度都返回空。
    fn byte_to_sector(
        &self,
        inner: &mut FsInner,
        sector: u32,
        pos: usize,
        alloc: bool,
    ) -> Option<u32> {
        if !alloc && pos >= self.inode_length(sector) as usize {
            return None;
        }

        let index = pos / SECTOR_SIZE;
        if index < DIRECT_CAP {
            self.index_slot(inner, sector, DiskInode::DIRECT_OFFSET + 4 * index, alloc)
        } else if index < INDIRECT_CAP {
            // 剔去直接索引的部分
            let index = index - DIRECT_CAP;
            let indirect = self.index_slot(inner, sector, DiskInode::INDIRECT_OFFSET, alloc)?;
            self.index_slot(inner, indirect, 4 * index, alloc)
        } else {
            debug_assert!(index < DOUBLE_INDIRECT_CAP);
            // 剔去使用了一级索引的部分
            let index = index - INDIRECT_CAP;
            let double_indirect =
                self.index_slot(inner, sector, DiskInode::DOUBLE_INDIRECT_OFFSET, alloc)?;
            let indirect =
                self.index_slot(inner, double_indirect, 4 * (index / INDIRECT_COUNT), alloc)?;
            self.index_slot(inner, indirect, 4 * (index % INDIRECT_COUNT), alloc)
        }
    }

    /// 读出一个索引字；为零且允许分配时，
    /// 分配新扇区、经缓存零填充、并把编号写回父槽
    fn index_slot(
        &self,
        inner: &mut FsInner,
        sector: u32,
        offset: usize,
        alloc: bool,
    ) -> Option<u32> {
        let mut slot = self.index_word(sector, offset);
        if slot == 0 {
            if !alloc {
                return None;
            }
            slot = inner.free_map.allocate()?;
            self.cache.create(slot);
            self.cache.write(sector, &slot.to_le_bytes(), offset);
        }

        Some(slot)
    }

    #[inline]
    fn index_word(&self, sector: u32, offset: usize) -> u32 {
        let mut word = [0u8; 4];
        self.cache.read(sector, &mut word, offset);
        u32::from_le_bytes(word)
    }

    /// 把整个间接索引扇区读成编号数组
    fn read_indirect(&self, sector: u32) -> [u32; INDIRECT_COUNT] {
        let mut data = [0u8; SECTOR_SIZE];
        self.cache.read(sector, &mut data, 0);

        let mut slots = [0u32; INDIRECT_COUNT];
        for (slot, chunk) in slots.iter_mut().zip(data.chunks_exact(4)) {
            *slot = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        slots
    }
}

impl Stat {
    #[inline]
    pub fn new(inode: u64, kind: StatKind) -> Self {
        Self {
            dev: 0,
            inode,
            kind,
            pad: Default::default(),
        }
    }
}

impl From<DiskInodeKind> for StatKind {
    #[inline]
    fn from(kind: DiskInodeKind) -> Self {
        match kind {
            DiskInodeKind::Directory => Self::DIR,
            DiskInodeKind::File => Self::FILE,
        }
    }
}
