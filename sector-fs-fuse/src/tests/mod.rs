mod cache;
mod dir;
mod path;

use std::sync::Arc;

use sector_fs::FileSystem;

use crate::MemDisk;

const SECTORS: u32 = 4096;

fn fresh_fs() -> (Arc<MemDisk>, Arc<FileSystem>) {
    let disk = Arc::new(MemDisk::new(SECTORS as usize));
    let fs = FileSystem::format(disk.clone(), SECTORS);
    (disk, fs)
}

/// 确定性伪随机字节流（xorshift64）
fn pseudo_random(len: usize, mut seed: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(len + 8);
    while bytes.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        bytes.extend_from_slice(&seed.to_le_bytes());
    }
    bytes.truncate(len);
    bytes
}
