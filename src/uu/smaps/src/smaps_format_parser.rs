// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::smaps_config::smaps_field_name;
use crate::units::parse_size;
use std::collections::hash_map::{self, HashMap};
use std::io::{BufRead, BufReader, Read, Result, Seek, SeekFrom};

/// Identifier given to mappings whose header line has no pathname.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

// Represents a parsed single entry from /proc/<PID>/smaps. All sizes are in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmapEntry {
    pub identifier: String,
    pub is_path: bool,
    pub address: String,
    pub perms: String,
    pub offset: String,
    pub device: String,
    pub inode: String,
    pub size: u64,
    pub kernel_page_size: u64,
    pub mmu_page_size: u64,
    pub rss: u64,
    pub pss: u64,
    pub pss_dirty: u64,
    pub shared_clean: u64,
    pub shared_dirty: u64,
    pub private_clean: u64,
    pub private_dirty: u64,
    pub referenced: u64,
    pub swap: u64,
}

impl SmapEntry {
    // Builds an entry from the whitespace separated tokens of a header line, e.g.
    // 7ffc3f8df000-7ffc3f900000 rw-p 00000000 00:00 0                          [stack]
    fn from_header(fields: &[&str]) -> Self {
        let (identifier, is_path) = classify_identifier(&fields[5..]);

        Self {
            identifier,
            is_path,
            address: fields[0].into(),
            perms: fields[1].into(),
            offset: fields[2].into(),
            device: fields[3].into(),
            inode: fields[4].into(),
            ..Default::default()
        }
    }

    pub fn is_anonymous(&self) -> bool {
        !self.is_path && self.identifier == UNKNOWN_IDENTIFIER
    }

    /// Returns the value of a numeric field by its smaps key, or `None` if the
    /// key is not one of the recognized attribute lines.
    pub fn get_field(&self, field_name: &str) -> Option<u64> {
        let value = match field_name {
            smaps_field_name::SIZE => self.size,
            smaps_field_name::KERNEL_PAGE_SIZE => self.kernel_page_size,
            smaps_field_name::MMU_PAGE_SIZE => self.mmu_page_size,
            smaps_field_name::RSS => self.rss,
            smaps_field_name::PSS => self.pss,
            smaps_field_name::PSS_DIRTY => self.pss_dirty,
            smaps_field_name::SHARED_CLEAN => self.shared_clean,
            smaps_field_name::SHARED_DIRTY => self.shared_dirty,
            smaps_field_name::PRIVATE_CLEAN => self.private_clean,
            smaps_field_name::PRIVATE_DIRTY => self.private_dirty,
            smaps_field_name::REFERENCED => self.referenced,
            smaps_field_name::SWAP => self.swap,
            _ => return None,
        };
        Some(value)
    }

    // Stores the value of an attribute line. Unknown keys are ignored so that
    // attribute lines added by newer kernels don't break parsing.
    fn set_field(&mut self, field_name: &str, value: &str) {
        let field = match field_name {
            smaps_field_name::SIZE => &mut self.size,
            smaps_field_name::KERNEL_PAGE_SIZE => &mut self.kernel_page_size,
            smaps_field_name::MMU_PAGE_SIZE => &mut self.mmu_page_size,
            smaps_field_name::RSS => &mut self.rss,
            smaps_field_name::PSS => &mut self.pss,
            smaps_field_name::PSS_DIRTY => &mut self.pss_dirty,
            smaps_field_name::SHARED_CLEAN => &mut self.shared_clean,
            smaps_field_name::SHARED_DIRTY => &mut self.shared_dirty,
            smaps_field_name::PRIVATE_CLEAN => &mut self.private_clean,
            smaps_field_name::PRIVATE_DIRTY => &mut self.private_dirty,
            smaps_field_name::REFERENCED => &mut self.referenced,
            smaps_field_name::SWAP => &mut self.swap,
            _ => return,
        };
        *field = parse_size(value.trim());
    }
}

// Returns the identifier and whether it is a path.
//
// "[heap]" becomes "heap". Anything not both starting with '[' and ending with ']'
// is taken as a path, including half-bracketed names like "[anon:foo".
fn classify_identifier(tokens: &[&str]) -> (String, bool) {
    if tokens.is_empty() {
        return (UNKNOWN_IDENTIFIER.into(), false);
    }

    let name = tokens.join(" ");
    match name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
        Some("") => (UNKNOWN_IDENTIFIER.into(), false),
        Some(tag) => (tag.into(), false),
        None => (name, true),
    }
}

/// The parsed contents of a smaps file, grouped by identifier.
///
/// Entries sharing an identifier are kept in the order they appear in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Smaps(HashMap<String, Vec<SmapEntry>>);

impl Smaps {
    pub fn get(&self, identifier: &str) -> Option<&[SmapEntry]> {
        self.0.get(identifier).map(Vec::as_slice)
    }

    /// Like [`Smaps::get`], but returns an empty slice for unknown identifiers.
    pub fn entries(&self, identifier: &str) -> &[SmapEntry] {
        self.get(identifier).unwrap_or_default()
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries over all identifiers.
    pub fn mapping_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SmapEntry])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> HashMap<String, Vec<SmapEntry>> {
        self.0
    }

    fn push(&mut self, entry: SmapEntry) {
        self.0
            .entry(entry.identifier.clone())
            .or_default()
            .push(entry);
    }
}

impl IntoIterator for Smaps {
    type Item = (String, Vec<SmapEntry>);
    type IntoIter = hash_map::IntoIter<String, Vec<SmapEntry>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

enum State {
    SeekingHeader,
    ConsumingAttributes(SmapEntry),
}

// Parses entries from /proc/<PID>/smaps. See
// https://www.kernel.org/doc/html/latest/filesystems/proc.html for details about the expected
// format.
//
// Lines that are neither a header nor a known attribute are skipped and unparsable values
// become 0, so one bad line never loses the rest of the file.
//
// # Errors
//
// Will return an `Error` if reading from `reader` fails.
pub fn parse_smaps<R: BufRead>(mut reader: R) -> Result<Smaps> {
    let mut smaps = Smaps::default();
    let mut state = State::SeekingHeader;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(trim_line_ending(&buf));

        state = match state {
            State::SeekingHeader => {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 5 {
                    State::SeekingHeader
                } else {
                    State::ConsumingAttributes(SmapEntry::from_header(&fields))
                }
            }
            State::ConsumingAttributes(mut smap_entry) => {
                if line.starts_with(smaps_field_name::VMFLAGS_PREFIX) {
                    smaps.push(smap_entry);
                    State::SeekingHeader
                } else {
                    if let Some((key, value)) = line.split_once(':') {
                        smap_entry.set_field(key, value);
                    }
                    State::ConsumingAttributes(smap_entry)
                }
            }
        };
    }

    // The stream may end before the VmFlags line of the last entry.
    if let State::ConsumingAttributes(smap_entry) = state {
        smaps.push(smap_entry);
    }

    Ok(smaps)
}

/// Rewinds `reader` to its start and parses it.
///
/// # Errors
///
/// Will return an `Error` if seeking or reading fails.
pub fn parse_smaps_seekable<R: Read + Seek>(mut reader: R) -> Result<Smaps> {
    reader.seek(SeekFrom::Start(0))?;
    parse_smaps(BufReader::new(reader))
}

pub fn parse_smaps_str(contents: &str) -> Smaps {
    // reading from a slice can't fail
    parse_smaps(contents.as_bytes()).unwrap_or_default()
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
