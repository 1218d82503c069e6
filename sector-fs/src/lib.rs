#![no_std]

extern crate alloc;

/* sector-fs 的整体架构，自上而下 */

// 顶层门面与文件系统上下文：格式化、挂载、按名操作
mod fs;

// 索引节点层：打开表、字节级读写、按需分配
mod vfs;

// 目录层：目录项的查找、添加与删除
mod dir;

// 路径层：绝对化与分词
pub mod path;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

// 空闲扇区位图：首次适应分配
mod free_map;

// 扇区缓存层：内存上的磁盘扇区数据缓存
mod sector_cache;

// 块设备接口层：读写块设备的接口
mod block_dev;

pub use self::{
    block_dev::BlockDevice,
    dir::Dir,
    fs::FileSystem,
    vfs::{Inode, Stat, StatKind},
};

pub const MAGIC: u32 = 0x494e_4f44;
pub const SECTOR_SIZE: usize = 512;

/// 空闲位图文件的 inode 所在扇区
pub const FREE_MAP_SECTOR: u32 = 0;
/// 根目录的 inode 所在扇区
pub const ROOT_SECTOR: u32 = 1;

type SectorData = [u8; SECTOR_SIZE];
