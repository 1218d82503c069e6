use std::mem;

use sector_fs::layout::{DirEntry, DiskInode};
use sector_fs::SECTOR_SIZE;

#[test]
fn layout() {
    assert_eq!(SECTOR_SIZE, mem::size_of::<DiskInode>());
    assert_eq!(DirEntry::SIZE, mem::size_of::<DirEntry>())
}
