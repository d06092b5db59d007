#![allow(dead_code)]

use std::path::{Path, PathBuf};

const MINI_SECTOR_SIZE: usize = 64;
const MINI_CUTOFF: usize = 4096;
const HEADER_DIFAT_SLOTS: usize = 109;

const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FREE_SECT: u32 = 0xFFFF_FFFF;
const FAT_SECT: u32 = 0xFFFF_FFFD;
const DIF_SECT: u32 = 0xFFFF_FFFC;
const NO_STREAM: u32 = 0xFFFF_FFFF;

pub const PLANTER_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<entry xmlns="http://www.w3.org/2005/Atom" xmlns:A="urn:schemas-autodesk-com:partatom">
  <title>Garden Planter</title>
  <id>gb0001</id>
  <updated>2021-03-04T10:00:00Z</updated>
  <A:taxonomy><term>adsk:revit</term><label>Autodesk Revit</label></A:taxonomy>
  <A:taxonomy><term>adsk:revit:grouping</term><label>Autodesk Revit Grouping</label></A:taxonomy>
  <category><term>Planting</term><scheme>adsk:revit:grouping</scheme></category>
  <category><term>23.40.20.00</term><scheme>std:oc1</scheme></category>
  <A:family type="user">
    <A:variationCount>2</A:variationCount>
    <A:part type="user">
      <title>Small</title>
      <Width displayName="Width" type="custom" typeOfParameter="Length" units="millimeters">600</Width>
    </A:part>
    <A:part type="user">
      <title>Large</title>
      <Width displayName="Width" type="custom" typeOfParameter="Length" units="millimeters">1200</Width>
    </A:part>
  </A:family>
</entry>"#;

pub const PLANTER_LINES: &str = "Planting {scheme: \"adsk:revit:grouping\", label: \"Autodesk Revit Grouping\", types: 2, parts: [\"Small\", \"Large\"]}\n23.40.20.00 {scheme: \"std:oc1\"}\n";

pub fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// A `BasicFileInfo` stream: a few binary fields followed by UTF-16 text.
pub fn basic_file_info(format: &str) -> Vec<u8> {
    let mut bytes = vec![0x0E, 0x00, 0x00, 0x00, 0x00, 0x00];
    bytes.extend(utf16(&format!(
        "Worksharing: Not enabled\r\nFormat: {format}\r\nBuild: 20200826_1250(x64)\r\nLocale when saved: ENU\r\n"
    )));
    bytes
}

/// A minimal family file with `BasicFileInfo` and `PartAtom`.
pub fn planter_family() -> Vec<u8> {
    CompoundFileBuilder::new()
        .stream("BasicFileInfo", basic_file_info("2021"))
        .stream("PartAtom", PLANTER_ATOM)
        .stream("Formats/Latest", vec![7_u8; 32])
        .build()
}

pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

struct Node {
    name: String,
    kind: u8,
    children: Vec<usize>,
    right: u32,
    child: u32,
    data: Vec<u8>,
    start: u32,
    size: u64,
}

impl Node {
    fn new(name: &str, kind: u8) -> Self {
        Self {
            name: name.to_string(),
            kind,
            children: Vec::new(),
            right: NO_STREAM,
            child: NO_STREAM,
            data: Vec::new(),
            start: END_OF_CHAIN,
            size: 0,
        }
    }
}

/// Writes version 3 (512-byte sectors) or version 4 (4096-byte sectors)
/// compound files. FAT sectors beyond the 109 header slots are listed in a
/// DIFAT chain.
pub struct CompoundFileBuilder {
    version: u16,
    streams: Vec<(String, Vec<u8>)>,
}

impl Default for CompoundFileBuilder {
    fn default() -> Self {
        Self {
            version: 3,
            streams: Vec::new(),
        }
    }
}

impl CompoundFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u16) -> Self {
        assert!(matches!(version, 3 | 4), "unsupported version {version}");
        self.version = version;
        self
    }

    pub fn stream(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.streams.push((path.to_string(), data.into()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let (sector_size, sector_shift) = if self.version == 4 { (4096, 12) } else { (512, 9) };
        let fat_entries_per_sector = sector_size / 4;
        let mut nodes = vec![Node::new("Root Entry", 5)];

        for (path, data) in &self.streams {
            let mut parent = 0;
            let parts: Vec<&str> = path.split('/').collect();
            for (i, part) in parts.iter().enumerate() {
                let is_leaf = i + 1 == parts.len();
                let existing = nodes[parent]
                    .children
                    .iter()
                    .copied()
                    .find(|&c| nodes[c].name == *part);
                parent = match existing {
                    Some(id) => id,
                    None => {
                        let mut node = Node::new(part, if is_leaf { 2 } else { 1 });
                        if is_leaf {
                            node.data.clone_from(data);
                            node.size = data.len() as u64;
                        }
                        nodes.push(node);
                        let id = nodes.len() - 1;
                        nodes[parent].children.push(id);
                        id
                    }
                };
            }
        }

        for id in 0..nodes.len() {
            let children = nodes[id].children.clone();
            if let Some(&first) = children.first() {
                nodes[id].child = first as u32;
            }
            for pair in children.windows(2) {
                nodes[pair[0]].right = pair[1] as u32;
            }
        }

        // Small streams go to the mini stream.
        let mut mini_stream = Vec::new();
        let mut mini_fat: Vec<u32> = Vec::new();
        for node in nodes.iter_mut().filter(|n| n.kind == 2) {
            if node.data.is_empty() || node.data.len() >= MINI_CUTOFF {
                continue;
            }
            let start = mini_fat.len();
            let count = node.data.len().div_ceil(MINI_SECTOR_SIZE);
            node.start = start as u32;
            mini_stream.extend_from_slice(&node.data);
            mini_stream.resize(mini_stream.len().next_multiple_of(MINI_SECTOR_SIZE), 0);
            chain(&mut mini_fat, start, count);
        }

        let dir_sectors = (nodes.len() * 128).div_ceil(sector_size);
        let mini_fat_sectors = (mini_fat.len() * 4).div_ceil(sector_size);
        let mini_stream_sectors = mini_stream.len().div_ceil(sector_size);
        let big_sectors: usize = nodes
            .iter()
            .filter(|n| n.kind == 2 && n.data.len() >= MINI_CUTOFF)
            .map(|n| n.data.len().div_ceil(sector_size))
            .sum();
        let data_sectors = dir_sectors + mini_fat_sectors + mini_stream_sectors + big_sectors;

        // Each DIFAT sector lists one FAT sector per slot except the last,
        // which links to the next DIFAT sector.
        let difat_capacity = fat_entries_per_sector - 1;
        let mut fat_sectors: usize = 1;
        let difat_sectors = loop {
            let difat = fat_sectors
                .saturating_sub(HEADER_DIFAT_SLOTS)
                .div_ceil(difat_capacity);
            if data_sectors + fat_sectors + difat <= fat_sectors * fat_entries_per_sector {
                break difat;
            }
            fat_sectors += 1;
        };

        let mut fat = vec![FREE_SECT; fat_sectors * fat_entries_per_sector];
        for entry in fat.iter_mut().take(fat_sectors) {
            *entry = FAT_SECT;
        }
        for entry in fat.iter_mut().skip(fat_sectors).take(difat_sectors) {
            *entry = DIF_SECT;
        }

        let mut next = fat_sectors + difat_sectors;
        let dir_start = next;
        chain(&mut fat, dir_start, dir_sectors);
        next += dir_sectors;

        let mini_fat_start = next;
        chain(&mut fat, mini_fat_start, mini_fat_sectors);
        next += mini_fat_sectors;

        let mini_stream_start = next;
        chain(&mut fat, mini_stream_start, mini_stream_sectors);
        next += mini_stream_sectors;

        if !mini_stream.is_empty() {
            nodes[0].start = mini_stream_start as u32;
            nodes[0].size = mini_stream.len() as u64;
        }

        let mut big_order = Vec::new();
        for (id, node) in nodes.iter_mut().enumerate() {
            if node.kind == 2 && node.data.len() >= MINI_CUTOFF {
                let count = node.data.len().div_ceil(sector_size);
                node.start = next as u32;
                chain(&mut fat, next, count);
                next += count;
                big_order.push(id);
            }
        }

        // The header fills a whole sector, so sector `n` starts at
        // `(n + 1) * sector_size`.
        let mut out = vec![0_u8; sector_size];
        out[..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
        put_u16(&mut out, 0x18, 0x003E);
        put_u16(&mut out, 0x1A, self.version);
        put_u16(&mut out, 0x1C, 0xFFFE);
        put_u16(&mut out, 0x1E, sector_shift);
        put_u16(&mut out, 0x20, 6);
        if self.version == 4 {
            put_u32(&mut out, 0x28, dir_sectors as u32);
        }
        put_u32(&mut out, 0x2C, fat_sectors as u32);
        put_u32(&mut out, 0x30, dir_start as u32);
        put_u32(&mut out, 0x38, MINI_CUTOFF as u32);
        if mini_fat_sectors > 0 {
            put_u32(&mut out, 0x3C, mini_fat_start as u32);
        } else {
            put_u32(&mut out, 0x3C, END_OF_CHAIN);
        }
        put_u32(&mut out, 0x40, mini_fat_sectors as u32);
        if difat_sectors > 0 {
            put_u32(&mut out, 0x44, fat_sectors as u32);
        } else {
            put_u32(&mut out, 0x44, END_OF_CHAIN);
        }
        put_u32(&mut out, 0x48, difat_sectors as u32);
        for slot in 0..HEADER_DIFAT_SLOTS {
            let value = if slot < fat_sectors { slot as u32 } else { FREE_SECT };
            put_u32(&mut out, 0x4C + slot * 4, value);
        }

        for value in &fat {
            out.extend_from_slice(&value.to_le_bytes());
        }

        let overflow: Vec<u32> = (HEADER_DIFAT_SLOTS..fat_sectors).map(|id| id as u32).collect();
        for (k, ids) in overflow.chunks(difat_capacity).enumerate() {
            let mut sector = vec![FREE_SECT; fat_entries_per_sector];
            sector[..ids.len()].copy_from_slice(ids);
            sector[difat_capacity] = if k + 1 == difat_sectors {
                END_OF_CHAIN
            } else {
                (fat_sectors + k + 1) as u32
            };
            for value in sector {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }

        let mut directory = Vec::new();
        for node in &nodes {
            directory.extend(dir_entry(node));
        }
        while directory.len() < dir_sectors * sector_size {
            directory.extend(empty_dir_entry());
        }
        out.extend(directory);

        let mut mini_fat_bytes: Vec<u8> = mini_fat.iter().flat_map(|v| v.to_le_bytes()).collect();
        while mini_fat_bytes.len() < mini_fat_sectors * sector_size {
            mini_fat_bytes.extend_from_slice(&FREE_SECT.to_le_bytes());
        }
        out.extend(mini_fat_bytes);

        out.extend_from_slice(&mini_stream);
        pad_to_sector(&mut out, sector_size);

        for id in big_order {
            out.extend_from_slice(&nodes[id].data);
            pad_to_sector(&mut out, sector_size);
        }

        out
    }
}

fn chain(table: &mut Vec<u32>, start: usize, count: usize) {
    if table.len() < start + count {
        table.resize(start + count, FREE_SECT);
    }
    for k in 0..count {
        table[start + k] = if k + 1 == count {
            END_OF_CHAIN
        } else {
            (start + k + 1) as u32
        };
    }
}

fn dir_entry(node: &Node) -> Vec<u8> {
    let mut entry = vec![0_u8; 128];
    let units: Vec<u16> = node.name.encode_utf16().collect();
    for (i, unit) in units.iter().enumerate() {
        put_u16(&mut entry, i * 2, *unit);
    }
    put_u16(&mut entry, 0x40, ((units.len() + 1) * 2) as u16);
    entry[0x42] = node.kind;
    entry[0x43] = 1;
    put_u32(&mut entry, 0x44, NO_STREAM);
    put_u32(&mut entry, 0x48, node.right);
    put_u32(&mut entry, 0x4C, node.child);
    put_u32(&mut entry, 0x74, node.start);
    entry[0x78..0x80].copy_from_slice(&node.size.to_le_bytes());
    entry
}

fn empty_dir_entry() -> Vec<u8> {
    let mut entry = vec![0_u8; 128];
    put_u32(&mut entry, 0x44, NO_STREAM);
    put_u32(&mut entry, 0x48, NO_STREAM);
    put_u32(&mut entry, 0x4C, NO_STREAM);
    entry
}

fn pad_to_sector(out: &mut Vec<u8>, sector_size: usize) {
    let len = out.len().next_multiple_of(sector_size);
    out.resize(len, 0);
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
