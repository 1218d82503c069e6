//! # 文件系统上下文与顶层门面
//!
//! [`FileSystem`] 把设备、扇区缓存、空闲位图和打开表
//! 装进一个对象，互不相干的实例可以共存（例如测试里
//! 同时挂载多个内存盘）。按名操作从根目录出发逐级解析，
//! 解析与修改全程持有文件系统锁，锁序恒为：先文件系统锁，
//! 后缓存锁。

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use log::{debug, info, warn};
use spin::Mutex;

use crate::free_map::FreeMap;
use crate::layout::DiskInodeKind;
use crate::path;
use crate::sector_cache::SectorCache;
use crate::vfs::{Inode, OpenInode};
use crate::{BlockDevice, FREE_MAP_SECTOR, ROOT_SECTOR};

/// 文件系统上下文
pub struct FileSystem {
    pub(crate) cache: SectorCache,
    pub(crate) inner: Mutex<FsInner>,
}

/// 文件系统锁保护的内部状态
pub(crate) struct FsInner {
    pub free_map: FreeMap,
    pub open_inodes: Vec<OpenInode>,
}

impl FsInner {
    pub fn open_mut(&mut self, sector: u32) -> Option<&mut OpenInode> {
        self.open_inodes.iter_mut().find(|open| open.sector == sector)
    }
}

impl FileSystem {
    /// 格式化设备并挂载：建立空的根目录与空闲位图文件
    pub fn format(device: Arc<dyn BlockDevice>, total_sectors: u32) -> Arc<Self> {
        info!("formatting file system: {total_sectors} sectors");

        let mut free_map = FreeMap::new(total_sectors);
        // 保留两个众所周知的扇区
        free_map.mark(FREE_MAP_SECTOR);
        free_map.mark(ROOT_SECTOR);
        let map_len = free_map.to_bytes().len() as u32;

        let fs = Arc::new(Self {
            cache: SectorCache::new(device),
            inner: Mutex::new(FsInner {
                free_map,
                open_inodes: Vec::new(),
            }),
        });

        fs.inode_create(ROOT_SECTOR, 0, DiskInodeKind::Directory);
        fs.inode_create(FREE_MAP_SECTOR, map_len, DiskInodeKind::File);
        fs.store_free_map(&mut fs.inner.lock());
        fs.cache.backup();

        fs
    }

    /// 挂载已格式化的设备，从位图文件恢复分配状态
    pub fn mount(device: Arc<dyn BlockDevice>) -> Arc<Self> {
        let fs = Arc::new(Self {
            cache: SectorCache::new(device),
            inner: Mutex::new(FsInner {
                free_map: FreeMap::new(0),
                open_inodes: Vec::new(),
            }),
        });
        assert!(
            fs.inode_magic_ok(FREE_MAP_SECTOR) && fs.inode_magic_ok(ROOT_SECTOR),
            "not a sector-fs image"
        );

        let length = fs.inode_length(FREE_MAP_SECTOR) as usize;
        let mut bytes = vec![0u8; length];
        {
            let mut inner = fs.inner.lock();
            fs.inode_read_at(&mut inner, FREE_MAP_SECTOR, 0, &mut bytes);
            inner.free_map = FreeMap::from_bytes(&bytes);
            info!("mounted file system: {} sectors", inner.free_map.sectors());
        }

        fs
    }

    /// 写回空闲位图与所有脏缓存，然后清空缓存
    pub fn done(&self) {
        let mut inner = self.inner.lock();
        self.store_free_map(&mut inner);
        self.cache.done();
        debug!("file system shut down");
    }

    /// 系统运行中把脏缓存全部写回磁盘
    pub fn backup(&self) {
        self.cache.backup();
    }

    /// 尚未分配的扇区数
    pub fn free_sectors(&self) -> u32 {
        self.inner.lock().free_map.free_sectors()
    }

    /// 根目录的 inode 句柄
    pub fn root(self: &Arc<Self>) -> Inode {
        let mut inner = self.inner.lock();
        self.inode_open(&mut inner, ROOT_SECTOR)
    }

    /// 建立名为 `name` 的文件。重名、缺少中间目录、
    /// 或磁盘耗尽都返回 false。
    pub fn create(&self, name: &str, initial_size: u32) -> bool {
        self.make(name, DiskInodeKind::File, initial_size)
    }

    /// 建立名为 `name` 的空目录
    pub fn create_dir(&self, name: &str) -> bool {
        self.make(name, DiskInodeKind::Directory, 0)
    }

    /// 打开路径指向的 inode；空路径解析到根目录
    pub fn open_inode(self: &Arc<Self>, name: &str) -> Option<Inode> {
        let comps: Vec<&str> = path::components(name).collect();
        let mut inner = self.inner.lock();

        let Some((&base, parents)) = comps.split_last() else {
            return Some(self.inode_open(&mut inner, ROOT_SECTOR));
        };
        let parent = self.walk(&mut inner, parents)?;
        let sector = self.dir_lookup(&mut inner, parent, base)?;
        Some(self.inode_open(&mut inner, sector))
    }

    /// 打开文件；目录会被拒绝
    pub fn open(self: &Arc<Self>, name: &str) -> Option<Inode> {
        let inode = self.open_inode(name)?;
        (!inode.is_dir()).then_some(inode)
    }

    /// 删除路径指向的文件或空目录。
    /// 目标还开着时，存储推迟到最后一个句柄关闭再释放。
    pub fn remove(&self, name: &str) -> bool {
        let comps: Vec<&str> = path::components(name).collect();
        let Some((&base, parents)) = comps.split_last() else {
            // 根目录不可删除
            return false;
        };

        let mut inner = self.inner.lock();
        let Some(parent) = self.walk(&mut inner, parents) else {
            return false;
        };
        self.dir_remove(&mut inner, parent, base)
    }
}

impl FileSystem {
    fn make(&self, name: &str, kind: DiskInodeKind, initial_size: u32) -> bool {
        let comps: Vec<&str> = path::components(name).collect();
        let Some((&base, parents)) = comps.split_last() else {
            return false;
        };

        let mut inner = self.inner.lock();
        let Some(parent) = self.walk(&mut inner, parents) else {
            return false;
        };
        let Some(sector) = inner.free_map.allocate() else {
            warn!("create {name:?}: no free sectors");
            return false;
        };

        self.inode_create(sector, initial_size, kind);
        if !self.dir_add(&mut inner, parent, base, sector) {
            // 挂进父目录失败，撤销刚分配的扇区
            self.cache.remove(sector);
            inner.free_map.release(sector);
            return false;
        }
        true
    }

    /// 从根出发走过 `comps` 的每个分量，要求沿途都是目录
    fn walk(&self, inner: &mut FsInner, comps: &[&str]) -> Option<u32> {
        let mut cur = ROOT_SECTOR;
        for comp in comps {
            let next = self.dir_lookup(inner, cur, comp)?;
            if self.inode_kind(next) != DiskInodeKind::Directory {
                return None;
            }
            cur = next;
        }
        Some(cur)
    }

    /// 把位图写进它自己的文件。写入可能为该文件分配数据扇区
    /// 而改动位图本身，所以循环直到内容稳定。
    fn store_free_map(&self, inner: &mut FsInner) {
        loop {
            let snapshot = inner.free_map.to_bytes();
            self.inode_write_at(inner, FREE_MAP_SECTOR, 0, &snapshot);
            if snapshot == inner.free_map.to_bytes() {
                break;
            }
        }
    }
}
