use byteorder::{ByteOrder, LittleEndian};
use std::collections::HashSet;
use tracing::debug;

use crate::error::ParseError;

const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const HEADER_SIZE: usize = 512;
const HEADER_DIFAT_SLOTS: usize = 109;
const DIR_ENTRY_SIZE: usize = 128;

const MAX_REG_SECT: u32 = 0xFFFF_FFFA;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const NO_STREAM: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Storage,
    Stream,
    Root,
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    /// `/`-joined path from the root, e.g. `Formats/Latest`.
    pub path: String,
    pub kind: EntryKind,
    pub start_sector: u32,
    pub size: u64,
}

#[derive(Debug)]
struct RawEntry {
    name: String,
    kind: Option<EntryKind>,
    left: u32,
    right: u32,
    child: u32,
    start_sector: u32,
    size: u64,
}

/// Read-only view of an OLE2 compound file (the container of `.rfa`/`.rvt`).
#[derive(Debug)]
pub struct CompoundFile<'a> {
    data: &'a [u8],
    pub major_version: u16,
    sector_size: usize,
    mini_sector_size: usize,
    mini_cutoff: u64,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    mini_stream: Vec<u8>,
    root: DirEntry,
    entries: Vec<DirEntry>,
}

impl<'a> CompoundFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < HEADER_SIZE {
            return Err(invalid(format!(
                "file is {} bytes, smaller than the {HEADER_SIZE}-byte header",
                data.len()
            )));
        }
        if data[..SIGNATURE.len()] != SIGNATURE {
            return Err(invalid("missing compound file signature"));
        }

        let major_version = read_u16(data, 0x1A)?;
        let byte_order = read_u16(data, 0x1C)?;
        if byte_order != 0xFFFE {
            return Err(invalid(format!("unexpected byte order mark {byte_order:#06x}")));
        }

        let sector_shift = read_u16(data, 0x1E)?;
        let expected_shift = match major_version {
            3 => 9,
            4 => 12,
            v => return Err(invalid(format!("unsupported major version {v}"))),
        };
        if sector_shift != expected_shift {
            return Err(invalid(format!(
                "sector shift {sector_shift} does not match version {major_version}"
            )));
        }
        let mini_shift = read_u16(data, 0x20)?;
        if mini_shift != 6 {
            return Err(invalid(format!("unsupported mini sector shift {mini_shift}")));
        }

        let num_fat_sectors = read_u32(data, 0x2C)?;
        let first_dir_sector = read_u32(data, 0x30)?;
        let mini_cutoff = read_u32(data, 0x38)?;
        let first_mini_fat_sector = read_u32(data, 0x3C)?;
        let num_mini_fat_sectors = read_u32(data, 0x40)?;
        let first_difat_sector = read_u32(data, 0x44)?;

        let mut file = CompoundFile {
            data,
            major_version,
            sector_size: 1 << sector_shift,
            mini_sector_size: 1 << mini_shift,
            mini_cutoff: u64::from(mini_cutoff),
            fat: Vec::new(),
            mini_fat: Vec::new(),
            mini_stream: Vec::new(),
            root: DirEntry {
                name: String::new(),
                path: String::new(),
                kind: EntryKind::Root,
                start_sector: END_OF_CHAIN,
                size: 0,
            },
            entries: Vec::new(),
        };

        let fat_sectors = file.fat_sector_ids(num_fat_sectors, first_difat_sector)?;
        file.fat = file.load_fat(&fat_sectors)?;
        debug!(
            version = major_version,
            fat_sectors = fat_sectors.len(),
            "compound file header"
        );

        let directory = file.read_chain(first_dir_sector)?;
        let raw_entries = parse_directory(&directory, major_version)?;
        let (root, entries) = build_tree(&raw_entries)?;
        file.root = root;
        file.entries = entries;

        if num_mini_fat_sectors > 0 && first_mini_fat_sector != END_OF_CHAIN {
            let mini_fat = file.read_chain(first_mini_fat_sector)?;
            file.mini_fat = mini_fat
                .chunks_exact(4)
                .map(LittleEndian::read_u32)
                .collect();
        }
        if file.root.size > 0 {
            let mut mini_stream = file.read_chain(file.root.start_sector)?;
            mini_stream.truncate(file.root.size as usize);
            file.mini_stream = mini_stream;
        }

        Ok(file)
    }

    /// All streams, sorted by path.
    pub fn streams(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(is_stream)
    }

    #[must_use]
    pub fn has_stream(&self, path: &str) -> bool {
        self.find_stream(path).is_some()
    }

    pub fn read_stream(&self, path: &str) -> Result<Vec<u8>, ParseError> {
        let entry = self
            .find_stream(path)
            .ok_or_else(|| ParseError::MissingStream {
                name: path.to_string(),
            })?;

        let mut bytes = if entry.size < self.mini_cutoff {
            self.read_mini_chain(entry.start_sector)?
        } else {
            self.read_chain(entry.start_sector)?
        };

        if (bytes.len() as u64) < entry.size {
            return Err(invalid(format!(
                "stream '{path}' is truncated ({} of {} bytes)",
                bytes.len(),
                entry.size
            )));
        }
        bytes.truncate(entry.size as usize);
        Ok(bytes)
    }

    fn find_stream(&self, path: &str) -> Option<&DirEntry> {
        self.streams().find(|e| e.path == path)
    }

    fn sector(&self, id: u32) -> Result<&'a [u8], ParseError> {
        let offset = (id as usize + 1) * self.sector_size;
        if offset >= self.data.len() {
            return Err(invalid(format!("sector {id} lies beyond the end of the file")));
        }
        // The final sector may be stored without padding.
        let end = (offset + self.sector_size).min(self.data.len());
        Ok(&self.data[offset..end])
    }

    fn fat_sector_ids(&self, count: u32, first_difat: u32) -> Result<Vec<u32>, ParseError> {
        let count = count as usize;
        let mut ids = Vec::with_capacity(count.min(HEADER_DIFAT_SLOTS));

        for slot in 0..HEADER_DIFAT_SLOTS {
            if ids.len() >= count {
                break;
            }
            let id = read_u32(self.data, 0x4C + slot * 4)?;
            if id <= MAX_REG_SECT {
                ids.push(id);
            }
        }

        // Remaining FAT locations live in a chain of DIFAT sectors; the last
        // slot of each sector points at the next one.
        let per_sector = self.sector_size / 4 - 1;
        let mut next = first_difat;
        let mut seen = HashSet::new();
        while ids.len() < count && next <= MAX_REG_SECT {
            if !seen.insert(next) {
                return Err(invalid("DIFAT chain loops"));
            }
            let sector = self.sector(next)?;
            for slot in 0..per_sector {
                if ids.len() >= count {
                    break;
                }
                let id = read_u32(sector, slot * 4)?;
                if id <= MAX_REG_SECT {
                    ids.push(id);
                }
            }
            next = read_u32(sector, per_sector * 4)?;
        }

        if ids.len() < count {
            return Err(invalid(format!(
                "header declares {count} FAT sectors but only {} were found",
                ids.len()
            )));
        }
        Ok(ids)
    }

    fn load_fat(&self, sectors: &[u32]) -> Result<Vec<u32>, ParseError> {
        let mut fat = Vec::with_capacity(sectors.len() * self.sector_size / 4);
        for &id in sectors {
            let sector = self.sector(id)?;
            fat.extend(sector.chunks_exact(4).map(LittleEndian::read_u32));
        }
        Ok(fat)
    }

    fn read_chain(&self, start: u32) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::new();
        let mut current = start;
        let mut steps = 0;

        while current != END_OF_CHAIN {
            if current > MAX_REG_SECT || current as usize >= self.fat.len() {
                return Err(invalid(format!("sector {current} is outside the FAT")));
            }
            steps += 1;
            if steps > self.fat.len() {
                return Err(invalid("sector chain loops"));
            }
            out.extend_from_slice(self.sector(current)?);
            current = self.fat[current as usize];
        }

        Ok(out)
    }

    fn read_mini_chain(&self, start: u32) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::new();
        let mut current = start;
        let mut steps = 0;

        while current != END_OF_CHAIN {
            if current > MAX_REG_SECT || current as usize >= self.mini_fat.len() {
                return Err(invalid(format!("mini sector {current} is outside the mini FAT")));
            }
            steps += 1;
            if steps > self.mini_fat.len() {
                return Err(invalid("mini sector chain loops"));
            }
            let offset = current as usize * self.mini_sector_size;
            let end = (offset + self.mini_sector_size).min(self.mini_stream.len());
            if offset >= end {
                return Err(invalid(format!("mini sector {current} lies beyond the mini stream")));
            }
            out.extend_from_slice(&self.mini_stream[offset..end]);
            current = self.mini_fat[current as usize];
        }

        Ok(out)
    }
}

fn parse_directory(bytes: &[u8], major_version: u16) -> Result<Vec<RawEntry>, ParseError> {
    bytes
        .chunks_exact(DIR_ENTRY_SIZE)
        .map(|chunk| -> Result<RawEntry, ParseError> {
            let name_len = (read_u16(chunk, 0x40)? as usize).min(64);
            let units: Vec<u16> = chunk[..name_len]
                .chunks_exact(2)
                .map(LittleEndian::read_u16)
                .take_while(|&u| u != 0)
                .collect();

            let kind = match chunk[0x42] {
                1 => Some(EntryKind::Storage),
                2 => Some(EntryKind::Stream),
                5 => Some(EntryKind::Root),
                _ => None,
            };

            // Version 3 writers may leave garbage in the high half of the size.
            let size = if major_version == 3 {
                u64::from(read_u32(chunk, 0x78)?)
            } else {
                read_u64(chunk, 0x78)?
            };

            Ok(RawEntry {
                name: String::from_utf16_lossy(&units),
                kind,
                left: read_u32(chunk, 0x44)?,
                right: read_u32(chunk, 0x48)?,
                child: read_u32(chunk, 0x4C)?,
                start_sector: read_u32(chunk, 0x74)?,
                size,
            })
        })
        .collect()
}

/// Walks the red-black sibling trees from the root and assigns paths.
fn build_tree(raw: &[RawEntry]) -> Result<(DirEntry, Vec<DirEntry>), ParseError> {
    let root_raw = match raw.first() {
        Some(entry) if entry.kind == Some(EntryKind::Root) => entry,
        _ => return Err(invalid("directory does not start with a root entry")),
    };
    let root = DirEntry {
        name: root_raw.name.clone(),
        path: String::new(),
        kind: EntryKind::Root,
        start_sector: root_raw.start_sector,
        size: root_raw.size,
    };

    let mut entries = Vec::new();
    let mut visited = HashSet::from([0_u32]);
    let mut stack = vec![(root_raw.child, String::new())];

    while let Some((id, parent)) = stack.pop() {
        if id == NO_STREAM {
            continue;
        }
        let entry = raw
            .get(id as usize)
            .ok_or_else(|| invalid(format!("directory entry {id} out of range")))?;
        if !visited.insert(id) {
            return Err(invalid("directory tree contains a cycle"));
        }
        let kind = match entry.kind {
            Some(EntryKind::Root) | None => continue,
            Some(kind) => kind,
        };

        let path = if parent.is_empty() {
            entry.name.clone()
        } else {
            format!("{parent}/{}", entry.name)
        };

        stack.push((entry.right, parent.clone()));
        stack.push((entry.left, parent));
        if kind == EntryKind::Storage {
            stack.push((entry.child, path.clone()));
        }

        entries.push(DirEntry {
            name: entry.name.clone(),
            path,
            kind,
            start_sector: entry.start_sector,
            size: entry.size,
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok((root, entries))
}

fn is_stream(entry: &&DirEntry) -> bool {
    entry.kind == EntryKind::Stream
}

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, ParseError> {
    bytes
        .get(offset..offset + 2)
        .map(LittleEndian::read_u16)
        .ok_or_else(|| invalid(format!("unexpected end of data at offset {offset}")))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, ParseError> {
    bytes
        .get(offset..offset + 4)
        .map(LittleEndian::read_u32)
        .ok_or_else(|| invalid(format!("unexpected end of data at offset {offset}")))
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, ParseError> {
    bytes
        .get(offset..offset + 8)
        .map(LittleEndian::read_u64)
        .ok_or_else(|| invalid(format!("unexpected end of data at offset {offset}")))
}

fn invalid(message: impl Into<String>) -> ParseError {
    ParseError::InvalidCompoundFile {
        message: message.into(),
    }
}
