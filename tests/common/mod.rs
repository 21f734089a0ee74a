#![allow(dead_code)]

use std::fs;
use std::path::Path;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

const SIS_HEADER_LEN: usize = 60;
const SIS_ENTRY_LEN: usize = 8;
const SIS_GENERAL_LEN: usize = 112;

/// A synthetic single-page, 16-bit grayscale Olympus TIFF.
#[derive(Clone, Debug)]
pub struct OlympusTiff {
    pub width: u32,
    pub height: u32,
    /// Nanometers per pixel (x, y); `None` leaves out the SIS tag entirely.
    pub nm_per_pixel: Option<(f64, f64)>,
    pub magnification: f64,
    pub dpi: Option<u32>,
    pub fill: u16,
}

impl OlympusTiff {
    pub fn new(width: u32, height: u32, nm_x: f64, nm_y: f64) -> Self {
        Self {
            width,
            height,
            nm_per_pixel: Some((nm_x, nm_y)),
            magnification: 1000.0,
            dpi: None,
            fill: 0x4000,
        }
    }

    pub fn without_sis(mut self) -> Self {
        self.nm_per_pixel = None;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        tiff_bytes(self)
    }

    pub fn write(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, self.bytes()).expect("write tiff file");
    }
}

struct Entry {
    tag: u16,
    kind: u16,
    value: u32,
}

fn tiff_bytes(spec: &OlympusTiff) -> Vec<u8> {
    let mut entry_count = 9;
    if spec.dpi.is_some() {
        entry_count += 2;
    }
    if spec.nm_per_pixel.is_some() {
        entry_count += 1;
    }

    let ifd_offset = 8usize;
    let data_start = ifd_offset + 2 + entry_count * 12 + 4;
    let resolution_offset = data_start;
    let sis_offset = resolution_offset + 8;
    let general_offset = sis_offset + SIS_HEADER_LEN + SIS_ENTRY_LEN;
    let pixel_offset = general_offset + SIS_GENERAL_LEN;
    let pixel_bytes = spec.width as usize * spec.height as usize * 2;

    let mut entries = vec![
        Entry { tag: 256, kind: TYPE_LONG, value: spec.width },
        Entry { tag: 257, kind: TYPE_LONG, value: spec.height },
        Entry { tag: 258, kind: TYPE_SHORT, value: 16 },
        Entry { tag: 259, kind: TYPE_SHORT, value: 1 },
        Entry { tag: 262, kind: TYPE_SHORT, value: 1 },
        Entry { tag: 273, kind: TYPE_LONG, value: pixel_offset as u32 },
        Entry { tag: 277, kind: TYPE_SHORT, value: 1 },
        Entry { tag: 278, kind: TYPE_LONG, value: spec.height },
        Entry { tag: 279, kind: TYPE_LONG, value: pixel_bytes as u32 },
    ];
    if spec.dpi.is_some() {
        entries.push(Entry { tag: 282, kind: TYPE_RATIONAL, value: resolution_offset as u32 });
        entries.push(Entry { tag: 296, kind: TYPE_SHORT, value: 2 });
    }
    if spec.nm_per_pixel.is_some() {
        entries.push(Entry { tag: 33560, kind: TYPE_LONG, value: sis_offset as u32 });
    }
    assert_eq!(entries.len(), entry_count);

    let mut bytes = Vec::with_capacity(pixel_offset + pixel_bytes);
    bytes.extend_from_slice(b"II");
    bytes.extend_from_slice(&42u16.to_le_bytes());
    bytes.extend_from_slice(&(ifd_offset as u32).to_le_bytes());

    bytes.extend_from_slice(&(entry_count as u16).to_le_bytes());
    for entry in &entries {
        bytes.extend_from_slice(&entry.tag.to_le_bytes());
        bytes.extend_from_slice(&entry.kind.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        if entry.kind == TYPE_SHORT {
            bytes.extend_from_slice(&(entry.value as u16).to_le_bytes());
            bytes.extend_from_slice(&[0, 0]);
        } else {
            bytes.extend_from_slice(&entry.value.to_le_bytes());
        }
    }
    bytes.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(bytes.len(), data_start);

    // XResolution rational
    bytes.extend_from_slice(&spec.dpi.unwrap_or(0).to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());

    bytes.extend_from_slice(&sis_block(spec, general_offset));
    assert_eq!(bytes.len(), pixel_offset);

    for _ in 0..(spec.width as usize * spec.height as usize) {
        bytes.extend_from_slice(&spec.fill.to_le_bytes());
    }
    bytes
}

fn sis_block(spec: &OlympusTiff, general_offset: usize) -> Vec<u8> {
    let mut block = vec![0u8; SIS_HEADER_LEN + SIS_ENTRY_LEN + SIS_GENERAL_LEN];
    let (nm_x, nm_y) = spec.nm_per_pixel.unwrap_or((0.0, 0.0));

    block[0..4].copy_from_slice(b"SIS0");
    block[26..32].copy_from_slice(b"OLYSIA");
    block[58..60].copy_from_slice(&1i16.to_le_bytes());

    let entry = SIS_HEADER_LEN;
    block[entry..entry + 2].copy_from_slice(&1i16.to_le_bytes());
    block[entry + 2..entry + 4].copy_from_slice(&1i16.to_le_bytes());
    block[entry + 4..entry + 8].copy_from_slice(&(general_offset as u32).to_le_bytes());

    let g = SIS_HEADER_LEN + SIS_ENTRY_LEN;
    block[g + 10..g + 12].copy_from_slice(&(-9i16).to_le_bytes());
    block[g + 12..g + 20].copy_from_slice(&nm_x.to_le_bytes());
    block[g + 20..g + 28].copy_from_slice(&nm_y.to_le_bytes());
    block[g + 36..g + 44].copy_from_slice(&spec.magnification.to_le_bytes());
    block[g + 46..g + 51].copy_from_slice(b"DP-74");
    block
}

/// Decodes an annotated output file into (width, height, RGB samples).
pub fn read_rgb8(path: &Path) -> (u32, u32, Vec<u8>) {
    let file = fs::File::open(path).expect("open output");
    let mut decoder = tiff::decoder::Decoder::new(std::io::BufReader::new(file))
        .expect("decode output header");
    let (width, height) = decoder.dimensions().expect("output dimensions");
    match decoder.read_image().expect("decode output pixels") {
        tiff::decoder::DecodingResult::U8(data) => (width, height, data),
        other => panic!("unexpected output sample type {:?}", other),
    }
}
