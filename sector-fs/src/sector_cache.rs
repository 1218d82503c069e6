//! # 扇区缓存层
//!
//! 磁盘读写速度远慢于内存，因此对扇区的所有操作都先落到
//! 内存中的缓存槽上。缓存采取**写回**策略：修改只设置脏位，
//! 真正的磁盘写发生在换出、[`backup`](SectorCache::backup)
//! 或 [`done`](SectorCache::done) 时。
//!
//! 槽的数量有上限；队首是最近使用的槽，装满后从队尾换出。
//! 读写均为复制语义，调用者拿到的是数据副本，
//! 槽被换出不会使任何已完成的读写失效。

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use log::trace;
use spin::Mutex;

use crate::BlockDevice;
use crate::SectorData;
use crate::SECTOR_SIZE;

/// 内存中的扇区缓存槽
struct Slot {
    /// 对应的扇区号
    sector: u32,
    /// 缓存的数据
    data: SectorData,
    /// 是否为脏块
    dirty: bool,
}

/// 扇区缓存：每个扇区至多一个槽，一把锁保护整个队列
pub(crate) struct SectorCache {
    device: Arc<dyn BlockDevice>,
    slots: Mutex<VecDeque<Slot>>,
}

impl SectorCache {
    /// 缓存槽数量的上限
    const CAPACITY: usize = 64;

    pub fn new(device: Arc<dyn BlockDevice>) -> Self {
        Self {
            device,
            slots: Mutex::new(VecDeque::new()),
        }
    }

    /// 把扇区 `[offset, offset + buf.len())` 的内容复制进 `buf`
    pub fn read(&self, sector: u32, buf: &mut [u8], offset: usize) {
        assert!(offset + buf.len() <= SECTOR_SIZE);
        if buf.is_empty() {
            return;
        }

        let mut slots = self.slots.lock();
        let slot = self.front(&mut slots, sector, true);
        buf.copy_from_slice(&slot.data[offset..offset + buf.len()]);
    }

    /// 把 `buf` 复制进扇区的 `[offset, offset + buf.len())` 并标脏
    pub fn write(&self, sector: u32, buf: &[u8], offset: usize) {
        assert!(offset + buf.len() <= SECTOR_SIZE);
        if buf.is_empty() {
            return;
        }

        let mut slots = self.slots.lock();
        let slot = self.front(&mut slots, sector, true);
        slot.data[offset..offset + buf.len()].copy_from_slice(buf);
        slot.dirty = true;
    }

    /// 为新分配的扇区插入全零槽，不经过磁盘读。
    /// 槽自带脏位，保证零填充在换出时也能落盘。
    pub fn create(&self, sector: u32) {
        let mut slots = self.slots.lock();
        let slot = self.front(&mut slots, sector, false);
        slot.data.fill(0);
        slot.dirty = true;
    }

    /// 扇区被释放时丢弃它的槽，**不写回**
    pub fn remove(&self, sector: u32) {
        let mut slots = self.slots.lock();
        if let Some(index) = slots.iter().position(|slot| slot.sector == sector) {
            slots.remove(index);
        }
    }

    /// 把所有脏槽写回磁盘并清除脏位，缓存保持可用
    pub fn backup(&self) {
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            self.save(slot);
        }
    }

    /// 关机：写回所有脏槽并清空缓存
    pub fn done(&self) {
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            self.save(slot);
        }
        slots.clear();
    }
}

impl SectorCache {
    /// 确保 `sector` 的槽存在并位于队首，返回它；
    /// `load` 指示未命中时是否从磁盘读入内容
    fn front<'a>(
        &self,
        slots: &'a mut VecDeque<Slot>,
        sector: u32,
        load: bool,
    ) -> &'a mut Slot {
        if let Some(index) = slots.iter().position(|slot| slot.sector == sector) {
            let slot = slots.remove(index).unwrap();
            slots.push_front(slot);
        } else {
            if slots.len() == Self::CAPACITY {
                self.evict(slots);
            }

            let mut slot = Slot {
                sector,
                data: [0; SECTOR_SIZE],
                dirty: false,
            };
            if load {
                self.device.read_sector(sector as usize, &mut slot.data);
            }
            slots.push_front(slot);
        }

        slots.front_mut().unwrap()
    }

    /// 换出最久未使用的槽
    fn evict(&self, slots: &mut VecDeque<Slot>) {
        let mut slot = slots.pop_back().unwrap();
        trace!("evict sector {}", slot.sector);
        self.save(&mut slot);
    }

    fn save(&self, slot: &mut Slot) {
        if slot.dirty {
            slot.dirty = false;
            self.device.write_sector(slot.sector as usize, &slot.data);
        }
    }
}
