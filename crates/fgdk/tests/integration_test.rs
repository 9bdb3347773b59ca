//! End-to-end export over a synthetic game directory.

use std::fs;
use std::io::Write;
use std::path::Path;

use fgdk::prelude::*;
use fgdk::{DEFAULT_OUTPUT_DIR, OVERLAY_DIR, OVERLAY_ZIP};

const ZOO_TYPES: usize = 10;

#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
    fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn i32s(mut self, values: &[i32]) -> Self {
        for v in values {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    fn f32s(mut self, values: &[f32]) -> Self {
        for v in values {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }
}

/// Overlay body: four segment kinds, each with per-type element counts.
fn overlay(id: u8, kinds: [&[(usize, u16)]; 4]) -> Bytes {
    let mut bytes = Bytes::default().u8(0).u8(id);
    for counts in kinds {
        for asset_type in 0..ZOO_TYPES {
            let count = counts
                .iter()
                .find(|(t, _)| *t == asset_type)
                .map_or(0, |(_, c)| *c);
            bytes = bytes.u16(count).u16(0);
        }
    }
    bytes
}

fn preload() -> Vec<u8> {
    let mut bytes = Bytes::default().u8(1).u8(2);
    for _ in 0..ZOO_TYPES {
        bytes = bytes.u16(0);
    }
    bytes
        .u8(3)
        .u8(2) // root children
        .raw(&overlay(1, [&[(0, 1), (1, 1), (2, 1)], &[], &[(0, 1)], &[]]).0)
        .u8(1) // tag-1 group
        .u8(1)
        .raw(&overlay(2, [&[(4, 1)], &[], &[], &[]]).0)
        .0
}

fn text_group(text: &[u8]) -> Bytes {
    Bytes::default()
        .i32s(&[0, 1, text.len() as i32, 0, 0])
        .raw(text)
}

fn texture_group() -> Bytes {
    Bytes::default()
        .i32s(&[1])
        .i32s(&[2, 0, 0, 1, 1, 0, 0])
        .u8(0x40)
        .i32s(&[1])
        .i32s(&[0x8000_00FFu32 as i32, 0x8000_FF00u32 as i32])
        .i32s(&[1, 1, 1])
        .u8(0)
        .i32s(&[0])
}

fn shape_group() -> Bytes {
    let header = Bytes::default()
        .f32s(&[1.0, 2.0, 3.0, 4.0])
        .i32s(&[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    let mut bytes = Bytes::default()
        .i32s(&[0, 2, 0, 0, header.0.len() as i32, 0, 0])
        .raw(&header.0)
        // LOD 0: no bone list, one weighted mesh.
        .i32s(&[0, 1, 0])
        .u16(0)
        .u16(1)
        .u16(4)
        .u16(4)
        .i32s(&[0x411C])
        .u16(4)
        .u16(0)
        .u16(1)
        .u16(2)
        .u16(3)
        .u16(0);
    for corner in 0..4u8 {
        let x = f32::from(corner % 2);
        let y = f32::from(corner / 2);
        bytes = bytes
            .f32s(&[x, y, 0.0])
            .raw(&[0, corner + 1, 0, 0])
            .f32s(&[0.5, 0.5, 0.0, 0.0])
            .f32s(&[0.0, 0.0, 1.0, x, y]);
    }
    bytes
}

fn write_zip(path: &Path, files: &[(&str, Vec<u8>)]) {
    let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, data) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn game_dir() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("PRELOAD.DAT"), preload()).unwrap();
    fs::write(root.path().join("ZOO.DGF"), b"").unwrap();

    let overlay_dir = root.path().join(OVERLAY_DIR);
    fs::create_dir(&overlay_dir).unwrap();

    let segment = text_group(b"Gromit\0Wallace\0")
        .raw(&texture_group().0)
        .raw(&shape_group().0);
    fs::write(overlay_dir.join("1.OVL"), segment.0).unwrap();
    fs::write(overlay_dir.join("2.OVL"), b"").unwrap();

    write_zip(
        &root.path().join(OVERLAY_ZIP),
        &[("OVERLAY/1L2.OVL", text_group(b"Cheese\0").0)],
    );

    root
}

#[test]
fn test_export_synthetic_game() {
    let root = game_dir();
    let preload_path = root.path().join("PRELOAD.DAT");

    let target = Target::detect(root.path()).unwrap();
    assert_eq!(target, Target::Zoo);

    let output = root.path().join(DEFAULT_OUTPUT_DIR);
    let exporter = PreloadExporter::new(
        target,
        OverlaySource::beside(&preload_path).unwrap(),
        &output,
        ExportOptions::default(),
    );
    let preload = exporter.read_preload(&preload_path).unwrap();
    let ids: Vec<u8> = preload.overlays().iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let mut calls = Vec::new();
    let stats = exporter.export_all(&preload, |done, total| calls.push((done, total)));
    assert_eq!(calls, vec![(1, 2), (2, 2)]);

    assert_eq!(
        stats,
        ExportStats {
            overlays: 2,
            exported: 2,
            empty: 17,
            not_found: 4,
            aborted: 1,
            failed: 0,
            files: 5,
        }
    );

    let text = fs::read_to_string(output.join("1/text_0.txt")).unwrap();
    assert_eq!(text, "Gromit\nWallace\n");
    let localized = fs::read_to_string(output.join("1l2/text_0.txt")).unwrap();
    assert_eq!(localized, "Cheese\n");

    let image = image::open(output.join("1/texture_0_a.png")).unwrap().to_rgba8();
    assert_eq!(image.get_pixel(0, 0).0, [0xFF, 0, 0, 255]);
    assert!(output.join("1/texture_0_b.png").is_file());

    let doc = fs::read_to_string(output.join("1/shape_0_lod0.dae")).unwrap();
    assert!(doc.contains("<triangles count=\"2\">"));
    assert!(doc.contains(
        "Root AutoExporterJoint1 AutoExporterJoint2 AutoExporterJoint3 AutoExporterJoint4"
    ));
    assert!(doc.contains("<vcount>2 2 2 2</vcount>"));
    assert!(doc.contains("<!-- header.unknown3=4 -->"));

    assert!(!output.join("2").exists());
}

#[test]
fn test_corrupt_segment_does_not_stop_export() {
    let root = game_dir();
    let preload_path = root.path().join("PRELOAD.DAT");
    fs::write(root.path().join(OVERLAY_DIR).join("1.OVL"), [0x00, 0x00, 0x00, 0x80]).unwrap();

    let exporter = PreloadExporter::new(
        Target::Zoo,
        OverlaySource::beside(&preload_path).unwrap(),
        root.path().join("out"),
        ExportOptions {
            parallel: true,
            write_metadata: false,
            ..ExportOptions::default()
        },
    );
    let preload = exporter.read_preload(&preload_path).unwrap();
    let stats = exporter.export_all(&preload, |_, _| {});

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.exported, 1);
    assert_eq!(stats.aborted, 1);
    assert_eq!(stats.files, 1);
    assert!(root.path().join("out/1l2/text_0.txt").is_file());
}
