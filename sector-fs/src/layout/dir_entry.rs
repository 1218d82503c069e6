use core::mem;

/// 文件名长度上限（字节）
pub const NAME_MAX: usize = 23;

/// 目录项。目录文件的内容就是目录项的数组，
/// 同一目录内在用项的名字互不相同。
/// 多字节字段在磁盘上一律是小端序，
/// 所以进出缓存都走 [`to_bytes`](DirEntry::to_bytes) /
/// [`from_bytes`](DirEntry::from_bytes)。
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DirEntry {
    /// 0 表示空槽，可以复用
    in_use: u32,
    /// 指向的 inode 所在扇区
    inode_sector: u32,
    // 最后一字节留给 \0
    name: [u8; NAME_MAX + 1],
}

const _: () = assert!(mem::size_of::<DirEntry>() == DirEntry::SIZE);

impl DirEntry {
    /// 目录项大小恒为32字节
    pub const SIZE: usize = 32;

    #[inline]
    pub fn new(name: &str, inode_sector: u32) -> Self {
        assert!(name.len() <= NAME_MAX);
        let bytes = name.as_bytes();
        let mut name = [0; NAME_MAX + 1];
        name[..bytes.len()].copy_from_slice(bytes);

        Self {
            in_use: 1,
            inode_sector,
            name,
        }
    }

    #[inline]
    pub fn is_in_use(&self) -> bool {
        self.in_use != 0
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&c| c == 0).unwrap();
        core::str::from_utf8(&self.name[..len]).unwrap()
    }

    #[inline]
    pub fn inode_sector(&self) -> u32 {
        self.inode_sector
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..4].copy_from_slice(&self.in_use.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.inode_sector.to_le_bytes());
        bytes[8..].copy_from_slice(&self.name);
        bytes
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            in_use: u32::from_le_bytes(bytes[..4].try_into().unwrap()),
            inode_sector: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            name: bytes[8..].try_into().unwrap(),
        }
    }
}
