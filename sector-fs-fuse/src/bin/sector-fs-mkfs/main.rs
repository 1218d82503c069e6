mod cli;

use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use clap::Parser;
use cli::Cli;
use sector_fs::FileSystem;
use sector_fs::SECTOR_SIZE;
use sector_fs_fuse::BlockFile;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("image={:?} sectors={}", cli.image, cli.sectors);

    let block_file = Arc::new(BlockFile(Mutex::new({
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&cli.image)?;
        fd.set_len(cli.sectors as u64 * SECTOR_SIZE as u64)?;

        fd
    })));

    let sfs = FileSystem::format(block_file, cli.sectors);

    if let Some(source) = &cli.source {
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_str().expect("file name is not UTF-8");
            let data = fs::read(entry.path())?;

            println!("import: {name:?} ({} bytes)", data.len());
            assert!(sfs.create(name, 0), "creating {name:?} failed");
            let inode = sfs.open(name).unwrap();
            assert_eq!(inode.write_at(0, &data), data.len(), "short write");
        }
    }

    sfs.done();
    Ok(())
}
