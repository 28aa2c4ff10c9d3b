// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::smaps_config::smaps_field_name;
use crate::smaps_format_parser::{SmapEntry, Smaps, UNKNOWN_IDENTIFIER};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown sort key: '{0}'")]
    UnknownSortKey(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Count,
    Size,
    #[default]
    Rss,
    Pss,
    Swap,
    // Shared_Clean + Shared_Dirty
    Shared,
    // Private_Clean + Private_Dirty
    Private,
}

impl SortKey {
    pub const NAMES: [&'static str; 8] = [
        "name", "count", "size", "rss", "pss", "swap", "shared", "private",
    ];
}

impl TryFrom<&str> for SortKey {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "name" => Ok(Self::Name),
            "count" => Ok(Self::Count),
            "size" => Ok(Self::Size),
            "rss" => Ok(Self::Rss),
            "pss" => Ok(Self::Pss),
            "swap" => Ok(Self::Swap),
            "shared" => Ok(Self::Shared),
            "private" => Ok(Self::Private),
            _ => Err(Error::UnknownSortKey(value.into())),
        }
    }
}

/// Sums of the numeric smaps fields over several entries, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
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

// Sums saturate at u64::MAX.
impl Totals {
    pub fn add(&mut self, smap_entry: &SmapEntry) {
        self.size = self.size.saturating_add(smap_entry.size);
        self.kernel_page_size = self.kernel_page_size.saturating_add(smap_entry.kernel_page_size);
        self.mmu_page_size = self.mmu_page_size.saturating_add(smap_entry.mmu_page_size);
        self.rss = self.rss.saturating_add(smap_entry.rss);
        self.pss = self.pss.saturating_add(smap_entry.pss);
        self.pss_dirty = self.pss_dirty.saturating_add(smap_entry.pss_dirty);
        self.shared_clean = self.shared_clean.saturating_add(smap_entry.shared_clean);
        self.shared_dirty = self.shared_dirty.saturating_add(smap_entry.shared_dirty);
        self.private_clean = self.private_clean.saturating_add(smap_entry.private_clean);
        self.private_dirty = self.private_dirty.saturating_add(smap_entry.private_dirty);
        self.referenced = self.referenced.saturating_add(smap_entry.referenced);
        self.swap = self.swap.saturating_add(smap_entry.swap);
    }

    fn merge(&mut self, other: &Self) {
        self.size = self.size.saturating_add(other.size);
        self.kernel_page_size = self.kernel_page_size.saturating_add(other.kernel_page_size);
        self.mmu_page_size = self.mmu_page_size.saturating_add(other.mmu_page_size);
        self.rss = self.rss.saturating_add(other.rss);
        self.pss = self.pss.saturating_add(other.pss);
        self.pss_dirty = self.pss_dirty.saturating_add(other.pss_dirty);
        self.shared_clean = self.shared_clean.saturating_add(other.shared_clean);
        self.shared_dirty = self.shared_dirty.saturating_add(other.shared_dirty);
        self.private_clean = self.private_clean.saturating_add(other.private_clean);
        self.private_dirty = self.private_dirty.saturating_add(other.private_dirty);
        self.referenced = self.referenced.saturating_add(other.referenced);
        self.swap = self.swap.saturating_add(other.swap);
    }

    pub fn get(&self, field_name: &str) -> u64 {
        match field_name {
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
            _ => 0,
        }
    }

    pub fn shared(&self) -> u64 {
        self.shared_clean.saturating_add(self.shared_dirty)
    }

    pub fn private(&self) -> u64 {
        self.private_clean.saturating_add(self.private_dirty)
    }
}

// One row of the report: all entries sharing an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSummary {
    pub identifier: String,
    // Set if any of the entries names a file.
    pub is_path: bool,
    pub count: usize,
    pub totals: Totals,
}

impl MappingSummary {
    pub fn new(identifier: &str, entries: &[SmapEntry]) -> Self {
        let mut totals = Totals::default();
        for smap_entry in entries {
            totals.add(smap_entry);
        }

        Self {
            identifier: identifier.into(),
            is_path: entries.iter().any(|e| e.is_path),
            count: entries.len(),
            totals,
        }
    }

    pub fn display_name(&self, show_path: bool) -> String {
        if !self.is_path {
            if self.identifier == UNKNOWN_IDENTIFIER {
                return "[ anon ]".into();
            }
            return format!("[{}]", self.identifier);
        }

        if show_path {
            self.identifier.clone()
        } else {
            match self.identifier.rsplit_once('/') {
                Some((_, name)) if !name.is_empty() => name.into(),
                _ => self.identifier.clone(),
            }
        }
    }

    fn sort_value(&self, sort_key: SortKey) -> u64 {
        match sort_key {
            SortKey::Name => 0,
            SortKey::Count => self.count as u64,
            SortKey::Size => self.totals.size,
            SortKey::Rss => self.totals.rss,
            SortKey::Pss => self.totals.pss,
            SortKey::Swap => self.totals.swap,
            SortKey::Shared => self.totals.shared(),
            SortKey::Private => self.totals.private(),
        }
    }

    fn compare(&self, other: &Self, sort_key: SortKey) -> Ordering {
        other
            .sort_value(sort_key)
            .cmp(&self.sort_value(sort_key))
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

// The aggregated view of a parsed smaps file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmapsSummary {
    pub rows: Vec<MappingSummary>,
    pub total: Totals,
    pub mapping_count: usize,
}

impl SmapsSummary {
    pub fn new(smaps: &Smaps, sort_key: SortKey) -> Self {
        let mut rows: Vec<MappingSummary> = smaps
            .iter()
            .map(|(identifier, entries)| MappingSummary::new(identifier, entries))
            .collect();
        rows.sort_by(|a, b| a.compare(b, sort_key));

        let mut total = Totals::default();
        for row in &rows {
            total.merge(&row.totals);
        }

        Self {
            rows,
            total,
            mapping_count: smaps.mapping_count(),
        }
    }
}
