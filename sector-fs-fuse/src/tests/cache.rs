use sector_fs::{FileSystem, SECTOR_SIZE};

use super::{fresh_fs, pseudo_random};

#[test]
fn eviction_preserves_data() {
    // 100 个数据扇区远超缓存容量 64，往返必然经历多轮换出
    let (disk, fs) = fresh_fs();
    let data = pseudo_random(100 * SECTOR_SIZE, 0xcafe);
    assert!(fs.create("f", 0));
    {
        let inode = fs.open("f").unwrap();
        assert_eq!(inode.write_at(0, &data), data.len());

        let mut buf = vec![0u8; data.len()];
        assert_eq!(inode.read_at(0, &mut buf), data.len());
        assert_eq!(buf, data);
    }
    fs.done();

    let fs = FileSystem::mount(disk);
    let inode = fs.open("f").unwrap();
    let mut buf = vec![0u8; data.len()];
    assert_eq!(inode.read_at(0, &mut buf), data.len());
    assert_eq!(buf, data);
}

#[test]
fn backup_is_idempotent() {
    let (disk, fs) = fresh_fs();
    assert!(fs.create("f", 0));
    let inode = fs.open("f").unwrap();
    assert_eq!(inode.write_at(0, &pseudo_random(3000, 9)), 3000);

    fs.backup();
    let snapshot = disk.snapshot();
    let writes = disk.writes();

    // 没有新的写入时，再次 backup 不应触碰磁盘
    fs.backup();
    assert_eq!(disk.writes(), writes);
    assert_eq!(disk.snapshot(), snapshot);
}

#[test]
fn backup_persists_dirty_slots() {
    let (disk, fs) = fresh_fs();
    assert!(fs.create("f", 0));
    let inode = fs.open("f").unwrap();
    assert_eq!(inode.write_at(0, b"durable"), 7);

    let before = disk.writes();
    fs.backup();
    assert!(disk.writes() > before);

    // 同一介质重新挂载也能看到数据
    drop(inode);
    fs.done();
    let fs = FileSystem::mount(disk);
    let inode = fs.open("f").unwrap();
    let mut buf = [0u8; 7];
    assert_eq!(inode.read_at(0, &mut buf), 7);
    assert_eq!(&buf, b"durable");
}

#[test]
fn repeated_touches_avoid_disk_io() {
    let (disk, fs) = fresh_fs();
    assert!(fs.create("hot", 0));
    let inode = fs.open("hot").unwrap();
    assert_eq!(inode.write_at(0, b"hot data"), 8);

    // 反复命中同一扇区既不读盘也不写盘
    let reads = disk.reads();
    let writes = disk.writes();
    let mut buf = [0u8; 8];
    for _ in 0..1000 {
        assert_eq!(inode.read_at(0, &mut buf), 8);
        assert_eq!(&buf, b"hot data");
    }
    assert_eq!(disk.reads(), reads);
    assert_eq!(disk.writes(), writes);
}
