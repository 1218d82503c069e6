//! # 磁盘数据结构层
//!
//! 磁盘布局：
//! - 扇区 0：空闲位图文件的 inode
//! - 扇区 1：根目录的 inode
//! - 扇区 2..：由空闲位图分配
//!
//! 每个 inode 独占一个扇区，扇区号就是它的编号。

mod dir_entry;
mod inode;

pub use self::dir_entry::{DirEntry, NAME_MAX};
pub use self::inode::{
    DiskInode, DiskInodeKind, DIRECT_CAP, DIRECT_COUNT, DOUBLE_INDIRECT_CAP, INDIRECT_CAP,
    INDIRECT_COUNT, MAX_FILE_SIZE,
};
