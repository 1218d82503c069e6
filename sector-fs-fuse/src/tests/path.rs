use sector_fs::path;

#[test]
fn join_absolute_passes_through() {
    assert_eq!(path::join("/work", "/a/b"), "/a/b/");
}

#[test]
fn join_relative_prefixes_base() {
    assert_eq!(path::join("/work", "a"), "/work/a/");
    assert_eq!(path::join("/work/", "a"), "/work/a/");
    assert_eq!(path::join("/", "a/b"), "/a/b/");
}

#[test]
fn components_elide_empties() {
    let comps: Vec<&str> = path::components("//a///b/").collect();
    assert_eq!(comps, ["a", "b"]);
    assert_eq!(path::components("/").count(), 0);
    assert_eq!(path::components("").count(), 0);
}

#[test]
fn joined_relative_path_resolves() {
    let (_, fs) = super::fresh_fs();
    assert!(fs.create_dir("/home"));
    assert!(fs.create("/home/notes", 0));

    // 宿主用 join 把进程工作目录拼到相对名字前
    let name = path::join("/home", "notes");
    assert!(fs.open(&name).is_some());
}
