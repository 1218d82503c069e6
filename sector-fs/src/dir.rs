//! # 目录层
//!
//! 目录就是一种 inode：它的文件内容是定长目录项的数组。
//! 查找、添加、删除都在文件系统锁内完成，
//! 同名竞争因此不可能出现。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::fs::{FileSystem, FsInner};
use crate::layout::{DirEntry, DiskInodeKind, NAME_MAX};
use crate::vfs::Inode;

/// 目录句柄
pub struct Dir {
    inode: Inode,
}

impl Dir {
    /// 打开根目录
    pub fn open_root(fs: &Arc<FileSystem>) -> Self {
        Self { inode: fs.root() }
    }

    /// 把目录 inode 包装成目录句柄；其它类型返回空
    pub fn open(inode: Inode) -> Option<Self> {
        inode.is_dir().then_some(Self { inode })
    }

    /// 按名查找子项，命中则打开它的 inode
    pub fn lookup(&self, name: &str) -> Option<Inode> {
        let fs = self.inode.fs();
        let mut inner = fs.inner.lock();
        let sector = fs.dir_lookup(&mut inner, self.inode.inumber(), name)?;
        Some(fs.inode_open(&mut inner, sector))
    }

    /// 添加指向 `sector` 的子项。重名或名字超长返回 false。
    pub fn add(&self, name: &str, sector: u32) -> bool {
        let fs = self.inode.fs();
        let mut inner = fs.inner.lock();
        fs.dir_add(&mut inner, self.inode.inumber(), name, sector)
    }

    /// 按名删除子项；非空的子目录会被拒绝
    pub fn remove(&self, name: &str) -> bool {
        let fs = self.inode.fs();
        let mut inner = fs.inner.lock();
        fs.dir_remove(&mut inner, self.inode.inumber(), name)
    }

    /// 列出所有在用子项的名字
    pub fn entries(&self) -> Vec<String> {
        let fs = self.inode.fs();
        let mut inner = fs.inner.lock();
        fs.dir_entries(&mut inner, self.inode.inumber())
    }

    #[inline]
    pub fn inode(&self) -> &Inode {
        &self.inode
    }
}

impl FileSystem {
    /// 线性扫描目录，返回命中项指向的 inode 扇区
    pub(crate) fn dir_lookup(&self, inner: &mut FsInner, dir: u32, name: &str) -> Option<u32> {
        self.scan(inner, dir, |entry| {
            entry.is_in_use() && entry.name() == name
        })
        .map(|(_, entry)| entry.inode_sector())
    }

    pub(crate) fn dir_add(&self, inner: &mut FsInner, dir: u32, name: &str, sector: u32) -> bool {
        if name.is_empty() || name.len() > NAME_MAX {
            return false;
        }
        if self.dir_lookup(inner, dir, name).is_some() {
            return false;
        }

        // 复用第一个空槽，没有就在末尾追加新槽（目录文件随之增长）
        let offset = self
            .scan(inner, dir, |entry| !entry.is_in_use())
            .map(|(offset, _)| offset)
            .unwrap_or(self.inode_length(dir) as usize);

        // 目录项不跨扇区，写不进去只能是磁盘已满
        let entry = DirEntry::new(name, sector);
        self.inode_write_at(inner, dir, offset, &entry.to_bytes()) == DirEntry::SIZE
    }

    pub(crate) fn dir_remove(&self, inner: &mut FsInner, dir: u32, name: &str) -> bool {
        let Some((offset, entry)) = self.scan(inner, dir, |entry| {
            entry.is_in_use() && entry.name() == name
        }) else {
            return false;
        };
        let target = entry.inode_sector();

        // 非空目录不可删除
        if self.inode_kind(target) == DiskInodeKind::Directory
            && self.scan(inner, target, DirEntry::is_in_use).is_some()
        {
            return false;
        }

        self.inode_write_at(inner, dir, offset, &DirEntry::default().to_bytes());
        self.inode_mark_removed(inner, target);
        true
    }

    pub(crate) fn dir_entries(&self, inner: &mut FsInner, dir: u32) -> Vec<String> {
        assert_eq!(self.inode_kind(dir), DiskInodeKind::Directory);
        let size = self.inode_length(dir) as usize;
        let mut bytes = [0; DirEntry::SIZE];
        let mut names = Vec::new();

        for offset in (0..size).step_by(DirEntry::SIZE) {
            self.inode_read_at(inner, dir, offset, &mut bytes);
            let entry = DirEntry::from_bytes(&bytes);
            if entry.is_in_use() {
                names.push(String::from(entry.name()));
            }
        }
        names
    }

    /// 以目录项为步长遍历目录内容，返回首个满足谓词的项及其偏移
    fn scan(
        &self,
        inner: &mut FsInner,
        dir: u32,
        pred: impl Fn(&DirEntry) -> bool,
    ) -> Option<(usize, DirEntry)> {
        assert_eq!(self.inode_kind(dir), DiskInodeKind::Directory);
        let size = self.inode_length(dir) as usize;
        let mut bytes = [0; DirEntry::SIZE];

        for offset in (0..size).step_by(DirEntry::SIZE) {
            assert_eq!(
                self.inode_read_at(inner, dir, offset, &mut bytes),
                DirEntry::SIZE
            );
            let entry = DirEntry::from_bytes(&bytes);
            if pred(&entry) {
                return Some((offset, entry));
            }
        }

        None
    }
}
