//! # 空闲扇区位图
//!
//! 置位表示已分配。位图常驻内存：挂载时从它自己的文件
//! （inode 位于保留扇区）恢复，关机时写回，见
//! [`FileSystem`](crate::FileSystem)。

use alloc::vec;
use alloc::vec::Vec;

/// 以 64 位为一组的分配位图
pub(crate) struct FreeMap {
    groups: Vec<u64>,
    sectors: u32,
}

impl FreeMap {
    /// 建立覆盖 `sectors` 个扇区的全空位图。
    /// 末组中超出设备末尾的虚位永久置位，
    /// 这样文件长度本身就决定了扇区总数。
    pub fn new(sectors: u32) -> Self {
        let count = (sectors as usize).div_ceil(64);
        let mut map = Self {
            groups: vec![0; count],
            sectors,
        };
        for phantom in sectors..(count * 64) as u32 {
            map.mark(phantom);
        }
        map
    }

    /// 从位图文件的内容恢复
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() % 8 == 0);
        let groups: Vec<u64> = bytes
            .chunks_exact(8)
            .map(|chunk| u64::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        let sectors = (groups.len() * 64) as u32;

        Self { groups, sectors }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.groups
            .iter()
            .flat_map(|group| group.to_le_bytes())
            .collect()
    }

    /// 首次适应分配，返回新扇区号；位图用尽则返回空
    pub fn allocate(&mut self) -> Option<u32> {
        let index = self.groups.iter().position(|&bits| bits != u64::MAX)?;
        let inbits = self.groups[index].trailing_ones();
        self.groups[index] |= 1 << inbits;

        Some((index * 64) as u32 + inbits)
    }

    pub fn release(&mut self, sector: u32) {
        let (index, inbits) = Self::position(sector);
        // 编号一定得有对应的位
        assert_ne!(self.groups[index] & (1 << inbits), 0);
        self.groups[index] -= 1 << inbits;
    }

    pub fn mark(&mut self, sector: u32) {
        let (index, inbits) = Self::position(sector);
        self.groups[index] |= 1 << inbits;
    }

    /// 尚未分配的扇区数
    pub fn free_sectors(&self) -> u32 {
        self.groups.iter().map(|group| group.count_zeros()).sum()
    }

    #[inline]
    pub fn sectors(&self) -> u32 {
        self.sectors
    }

    #[inline]
    fn position(sector: u32) -> (usize, u32) {
        ((sector / 64) as usize, sector % 64)
    }
}
