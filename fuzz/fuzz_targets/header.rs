#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate cmb_core;

use cmb_core::{ArchiveSrc, Layout};

fuzz_target!(|data: &[u8]| {
    let mut src = data;
    match src.read_header() {
        Ok(header) => {
            // A header that parses must describe a table inside the data
            assert!(header.total_size().unwrap() as usize <= data.len());
            assert!(header.data_offset() >= header.total_size().unwrap());
        },
        Err(_) => (),
    }

    if let Ok(records) = cmb_core::unpack(data) {
        // Re-packing what was read must read back the same records
        let layout = Layout::new(records.iter().map(|record| {
            (cmb_core::PathField::encode(&record.path).unwrap(), record.data.len() as u64)
        }))
        .unwrap();
        let mut archive = layout.head_bytes();
        for record in &records {
            archive.extend_from_slice(&record.data);
        }
        assert_eq!(cmb_core::unpack(&archive).unwrap(), records);
    }
});
