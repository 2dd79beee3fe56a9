use archive_expander::models::event::{
    BucketEntity, NotificationEvent, ObjectEntity, ObjectRecord, S3Entity,
};
use std::io::{Cursor, Write};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Build an in-memory zip with deflated file entries in the given order.
#[allow(dead_code)]
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    build_zip_with_dirs(&[], files)
}

/// Build an in-memory zip with explicit directory entries written first.
#[allow(dead_code)]
pub fn build_zip_with_dirs(dirs: &[&str], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for dir in dirs {
        writer
            .add_directory(dir.to_string(), options)
            .expect("add directory");
    }
    for (name, content) in files {
        writer
            .start_file(name.to_string(), options)
            .expect("start file");
        writer.write_all(content).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Build a stored (uncompressed) zip the way streaming writers do: entries
/// flagged `true` leave sizes and CRC out of the local header and follow
/// their data with a descriptor.
#[allow(dead_code)]
pub fn build_descriptor_zip(files: &[(&str, &[u8], bool)]) -> Vec<u8> {
    const DATA_DESCRIPTOR_FLAG: u16 = 0x0008;
    const DOS_DATE_1980_01_01: u16 = 0x0021;

    let mut out = Vec::new();
    let mut central = Vec::new();
    for (name, content, descriptor) in files {
        let offset = out.len() as u32;
        let crc = crc32(content);
        let size = content.len() as u32;
        let flags = if *descriptor { DATA_DESCRIPTOR_FLAG } else { 0 };
        let (header_crc, header_size) = if *descriptor { (0, 0) } else { (crc, size) };

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        out.extend_from_slice(&header_crc.to_le_bytes());
        out.extend_from_slice(&header_size.to_le_bytes());
        out.extend_from_slice(&header_size.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(content);
        if *descriptor {
            out.extend_from_slice(&0x0807_4b50u32.to_le_bytes());
            out.extend_from_slice(&crc.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&flags.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&DOS_DATE_1980_01_01.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0u8; 12]);
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let central_offset = out.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

#[allow(dead_code)]
fn crc32(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for byte in data {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

/// Notification with one record per `(bucket, encoded_key)` pair.
#[allow(dead_code)]
pub fn event_for(records: &[(&str, &str)]) -> NotificationEvent {
    NotificationEvent::new(
        records
            .iter()
            .map(|(bucket, key)| ObjectRecord {
                event_name: Some("ObjectCreated:Put".to_string()),
                s3: S3Entity {
                    bucket: BucketEntity {
                        name: bucket.to_string(),
                    },
                    object: ObjectEntity {
                        key: key.to_string(),
                        size: None,
                    },
                },
            })
            .collect(),
    )
}
