use std::convert::TryInto;
use std::fs;
use std::io;

use cmb::core::{ENTRY_SIZE, HEADER_SIZE, PATH_LEN};
use cmb::{pack, ArchiveBuilder, Error};

fn eprint_grp(label: &str, group: &[u8]) {
    eprintln!("{:>16}: {:02x?}", label, group);
}

fn eprint_u32(label: &str, group: &[u8]) {
    let grp_array = group.try_into()
        .expect("Wrong number of bytes to eprint_u32");
    eprintln!("{:>16}: {} ({:02x?})", label, u32::from_le_bytes(grp_array), group);
}

fn read_u32(archive: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(archive[at..at + 4].try_into().unwrap())
}

// Separate header and entry bytes and write the groups to stderr
fn format_print_archive(archive: &[u8], entry_count: usize) {
    eprintln!("Header");
    eprint_u32("Data Offset", &archive[0..4]);
    eprint_u32("Count", &archive[4..8]);

    for e_indx in 0..entry_count {
        let base = HEADER_SIZE + ENTRY_SIZE * e_indx;
        eprintln!("Entry[{}]", e_indx);
        eprint_grp("Path", &archive[base..base + PATH_LEN]);
        eprint_u32("Offset", &archive[base + PATH_LEN..base + PATH_LEN + 4]);
        eprint_u32("Size", &archive[base + PATH_LEN + 4..base + ENTRY_SIZE]);
    }

    eprintln!("Data\n{:02x?}", &archive[HEADER_SIZE + ENTRY_SIZE * entry_count..]);
}

fn path_field(path: &str) -> Vec<u8> {
    let mut field = vec![0; PATH_LEN];
    field[..path.len()].copy_from_slice(path.as_bytes());
    field
}

#[test]
fn pack_example_directory() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("root");
    fs::create_dir_all(root.join("sub"))?;
    fs::write(root.join("a.txd"), b"\x01\x02\x03\x04")?;
    fs::write(root.join("sub").join("b.txd"), b"\xAA\xBB")?;

    let archive = pack(&root)?;
    format_print_archive(&archive, 2);

    assert_eq!(read_u32(&archive, 0), 184);
    assert_eq!(read_u32(&archive, 4), 2);

    let entry0 = HEADER_SIZE;
    assert_eq!(&archive[entry0..entry0 + PATH_LEN], &path_field("root\\a.txd")[..]);
    assert_eq!(read_u32(&archive, entry0 + PATH_LEN), 0);
    assert_eq!(read_u32(&archive, entry0 + PATH_LEN + 4), 4);

    let entry1 = HEADER_SIZE + ENTRY_SIZE;
    assert_eq!(&archive[entry1..entry1 + PATH_LEN], &path_field("root\\sub\\b.txd")[..]);
    assert_eq!(read_u32(&archive, entry1 + PATH_LEN), 4);
    assert_eq!(read_u32(&archive, entry1 + PATH_LEN + 4), 2);

    assert_eq!(&archive[184..], &[0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB]);
    Ok(())
}

#[test]
fn root_files_precede_subdirectories() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("txd");
    fs::create_dir_all(root.join("a_dir"))?;
    fs::write(root.join("z.txd"), b"z")?;
    fs::write(root.join("a_dir").join("y.txd"), b"y")?;
    fs::write(root.join("m.txd"), b"m")?;

    let records = cmb::core::unpack(&pack(&root)?)?;
    let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["txd\\m.txd", "txd\\z.txd", "txd\\a_dir\\y.txd"]);
    Ok(())
}

#[test]
fn nested_directories_are_not_descended() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("root");
    fs::create_dir_all(root.join("sub").join("deeper"))?;
    fs::write(root.join("sub").join("b.txd"), b"b")?;
    fs::write(root.join("sub").join("deeper").join("c.txd"), b"c")?;

    let records = cmb::core::unpack(&pack(&root)?)?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "root\\sub\\b.txd");
    Ok(())
}

#[test]
fn long_paths_are_truncated_with_warning() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("root");
    fs::create_dir_all(&root)?;
    // "root\" + 76 bytes = 81 bytes stored path
    let name = format!("{}.txd", "x".repeat(72));
    fs::write(root.join(&name), b"data")?;

    let mut builder = ArchiveBuilder::new();
    builder.dir(&root)?;
    let truncations = builder.truncations().to_vec();
    assert_eq!(truncations.len(), 1);
    assert_eq!(truncations[0].target.len(), PATH_LEN + 1);
    assert_eq!(truncations[0].dropped, 1);

    let records = cmb::core::unpack(&builder.to_vec()?)?;
    let full = format!("root\\{}", name);
    assert_eq!(records[0].path, &full[..PATH_LEN]);
    assert_eq!(records[0].data, b"data");
    Ok(())
}

#[test]
fn truncated_multibyte_path_still_unpacks() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("root");
    fs::create_dir_all(&root)?;
    // "root\" + 74 bytes puts the two bytes of 'é' at 79 and 80
    let name = format!("{}\u{e9}.txd", "x".repeat(74));
    fs::write(root.join(&name), b"data")?;

    let mut builder = ArchiveBuilder::new();
    builder.dir(&root)?;
    assert_eq!(builder.truncations()[0].dropped, 6);

    let records = cmb::core::unpack(&builder.to_vec()?)?;
    assert_eq!(records[0].path, format!("root\\{}", "x".repeat(74)));
    assert_eq!(records[0].data, b"data");
    Ok(())
}

#[cfg(unix)]
#[test]
fn backslash_in_file_name_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().join("root");
    fs::create_dir_all(&root)?;
    fs::write(root.join("a\\b.txd"), b"data")?;

    match pack(&root) {
        Err(Error::InvalidPath { component, .. }) => assert_eq!(component, "a\\b.txd"),
        other => panic!("expected InvalidPath, got {:?}", other.map(|a| a.len())),
    }
    Ok(())
}

#[test]
fn file_reader_entries_are_written_in_order() -> Result<(), Error> {
    let mut archive_dest = io::Cursor::new(Vec::new());

    let mut builder = ArchiveBuilder::new();
    builder
        .file_reader(&b"some file contents"[..], "root\\some.txd")?
        .file_reader(io::empty(), "root\\empty.txd")?;
    let size = builder.write_archive(&mut archive_dest)?;

    let archive = archive_dest.into_inner();
    assert_eq!(size, archive.len() as u64);

    let records = cmb::core::unpack(&archive)?;
    assert_eq!(records[0].data, b"some file contents");
    assert!(records[1].data.is_empty());
    Ok(())
}

#[test]
fn missing_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    match pack(tmp.path().join("missing")) {
        Err(Error::Io { path: Some(path), .. }) => assert!(path.ends_with("missing")),
        other => panic!("expected Io error, got {:?}", other.map(|a| a.len())),
    }
}
