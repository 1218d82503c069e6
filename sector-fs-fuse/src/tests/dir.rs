use sector_fs::{Dir, FileSystem};

use super::{fresh_fs, pseudo_random};

#[test]
fn nested_create_and_remove() {
    let (_, fs) = fresh_fs();
    assert!(fs.create_dir("/d"));
    assert!(fs.create("/d/f", 0));

    // 非空目录不可删除
    assert!(!fs.remove("/d"));
    assert!(fs.remove("/d/f"));
    assert!(fs.remove("/d"));
    assert!(fs.open_inode("/d").is_none());
}

#[test]
fn removal_survives_remount() {
    let (disk, fs) = fresh_fs();
    let baseline = fs.free_sectors();
    assert!(fs.create("gone", 0));
    {
        let inode = fs.open("gone").unwrap();
        let data = pseudo_random(20_000, 11);
        assert_eq!(inode.write_at(0, &data), data.len());
    }
    assert!(fs.remove("gone"));
    fs.done();

    // 名字连同它的所有扇区都没有留痕
    let fs = FileSystem::mount(disk);
    assert!(fs.open_inode("gone").is_none());
    assert_eq!(fs.free_sectors(), baseline);
}

#[test]
fn duplicate_names_rejected() {
    let (_, fs) = fresh_fs();
    assert!(fs.create("a", 0));
    assert!(!fs.create("a", 0));
    // 同名目录同样冲突
    assert!(!fs.create_dir("a"));
}

#[test]
fn long_names_rejected() {
    let (_, fs) = fresh_fs();
    let ok = "x".repeat(23);
    let too_long = "x".repeat(24);
    assert!(fs.create(&ok, 0));
    assert!(!fs.create(&too_long, 0));
    assert!(fs.open(&ok).is_some());
}

#[test]
fn open_rejects_directories() {
    let (_, fs) = fresh_fs();
    assert!(fs.create_dir("d"));
    assert!(fs.open("d").is_none());

    let inode = fs.open_inode("d").unwrap();
    assert!(inode.is_dir());
}

#[test]
fn missing_components_fail() {
    let (_, fs) = fresh_fs();
    assert!(fs.open("/no/such").is_none());
    assert!(!fs.create("/no/such", 0));
    assert!(!fs.remove("/no/such"));

    // 中间分量是文件而非目录
    assert!(fs.create("f", 0));
    assert!(!fs.create("/f/x", 0));
    assert!(fs.open_inode("/f/x").is_none());
}

#[test]
fn empty_path_is_root() {
    let (_, fs) = fresh_fs();
    let root = fs.open_inode("/").unwrap();
    assert!(root.is_dir());
    assert_eq!(root.inumber(), sector_fs::ROOT_SECTOR);

    // 根目录不可建立也不可删除
    assert!(!fs.create("/", 0));
    assert!(!fs.remove("/"));
    assert!(fs.open("/").is_none());
}

#[test]
fn entries_lists_names() {
    let (_, fs) = fresh_fs();
    assert!(fs.create("a", 0));
    assert!(fs.create("b", 0));
    assert!(fs.create_dir("c"));

    let root = Dir::open_root(&fs);
    let names = root.entries();
    assert_eq!(names, ["a", "b", "c"]);

    let c = Dir::open(root.lookup("c").unwrap()).unwrap();
    assert!(c.entries().is_empty());
}

#[test]
fn removed_slots_are_reused() {
    let (_, fs) = fresh_fs();
    assert!(fs.create("a", 0));
    assert!(fs.create("b", 0));
    let grown = fs.root().length();

    assert!(fs.remove("a"));
    assert!(fs.create("c", 0));
    // 新名字落进空出来的槽，目录文件不再增长
    assert_eq!(fs.root().length(), grown);

    let names = Dir::open_root(&fs).entries();
    assert_eq!(names, ["c", "b"]);
}

#[test]
fn dir_handle_add_and_lookup() {
    let (_, fs) = fresh_fs();
    assert!(fs.create_dir("d"));
    assert!(fs.create("plain", 0));
    let dir = Dir::open(fs.open_inode("d").unwrap()).unwrap();

    // 目录句柄拒绝包装文件
    assert!(Dir::open(fs.open_inode("plain").unwrap()).is_none());

    assert!(fs.create("d/inner", 0));
    let inner = dir.lookup("inner").unwrap();
    assert_eq!(inner.write_at(0, b"hi"), 2);
    assert!(dir.lookup("missing").is_none());

    assert!(dir.remove("inner"));
    assert!(dir.lookup("inner").is_none());
}
