// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use crate::options;
use crate::summary::SortKey;
use bytesize::ByteSize;
use clap::ArgMatches;

pub mod smaps_field_name {
    pub const SIZE: &str = "Size";
    pub const KERNEL_PAGE_SIZE: &str = "KernelPageSize";
    pub const MMU_PAGE_SIZE: &str = "MMUPageSize";
    pub const RSS: &str = "Rss";
    pub const PSS: &str = "Pss";
    pub const PSS_DIRTY: &str = "Pss_Dirty";
    pub const SHARED_CLEAN: &str = "Shared_Clean";
    pub const SHARED_DIRTY: &str = "Shared_Dirty";
    pub const PRIVATE_CLEAN: &str = "Private_Clean";
    pub const PRIVATE_DIRTY: &str = "Private_Dirty";
    pub const REFERENCED: &str = "Referenced";
    pub const SWAP: &str = "Swap";
    pub const VMFLAGS_PREFIX: &str = "VmFlags:";
    pub const COUNT: &str = "Count";
    pub const MAPPING: &str = "Mapping";

    // All numeric fields in the order the kernel prints them.
    pub const NUMERIC_FIELDS: [&str; 12] = [
        SIZE,
        KERNEL_PAGE_SIZE,
        MMU_PAGE_SIZE,
        RSS,
        PSS,
        PSS_DIRTY,
        SHARED_CLEAN,
        SHARED_DIRTY,
        PRIVATE_CLEAN,
        PRIVATE_DIRTY,
        REFERENCED,
        SWAP,
    ];

    pub const DEFAULT_FIELDS: [&str; 4] = [SIZE, RSS, PSS, SWAP];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayUnit {
    Bytes,
    #[default]
    Kibibytes,
    Human,
}

impl DisplayUnit {
    pub fn format(&self, bytes: u64) -> String {
        match self {
            Self::Bytes => bytes.to_string(),
            Self::Kibibytes => (bytes / 1024).to_string(),
            Self::Human => ByteSize::b(bytes).to_string(),
        }
    }
}

// Represents the options of a single invocation.
// Note: Count and Mapping columns are always shown.
#[derive(Debug, Clone, PartialEq)]
pub struct SmapsConfig {
    pub read_files: bool,
    pub fields: Vec<&'static str>,
    pub sort_key: SortKey,
    pub unit: DisplayUnit,
    pub show_path: bool,
    pub quiet: bool,
}

impl Default for SmapsConfig {
    fn default() -> Self {
        Self {
            read_files: false,
            fields: smaps_field_name::DEFAULT_FIELDS.to_vec(),
            sort_key: SortKey::default(),
            unit: DisplayUnit::default(),
            show_path: false,
            quiet: false,
        }
    }
}

impl SmapsConfig {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let fields = if matches.get_flag(options::EXTENDED) {
            smaps_field_name::NUMERIC_FIELDS.to_vec()
        } else {
            smaps_field_name::DEFAULT_FIELDS.to_vec()
        };

        // --bytes and --human override each other, so at most one is set.
        let unit = if matches.get_flag(options::BYTES) {
            DisplayUnit::Bytes
        } else if matches.get_flag(options::HUMAN) {
            DisplayUnit::Human
        } else {
            DisplayUnit::Kibibytes
        };

        let sort_key = matches
            .get_one::<String>(options::SORT)
            .and_then(|key| SortKey::try_from(key.as_str()).ok())
            .unwrap_or_default();

        Self {
            read_files: matches.get_flag(options::FILE),
            fields,
            sort_key,
            unit,
            show_path: matches.get_flag(options::SHOW_PATH),
            quiet: matches.get_flag(options::QUIET),
        }
    }

    pub fn format_size(&self, bytes: u64) -> String {
        self.unit.format(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::uu_app;

    fn config_from(args: &[&str]) -> SmapsConfig {
        let matches = uu_app()
            .try_get_matches_from(std::iter::once("smaps").chain(args.iter().copied()))
            .unwrap();
        SmapsConfig::from_matches(&matches)
    }

    #[test]
    fn test_default_config() {
        assert_eq!(SmapsConfig::default(), config_from(&["1"]));
    }

    #[test]
    fn test_extended_fields() {
        let config = config_from(&["-x", "1"]);
        assert_eq!(smaps_field_name::NUMERIC_FIELDS.to_vec(), config.fields);
    }

    #[test]
    fn test_flags() {
        let config = config_from(&["-F", "-p", "-q", "/tmp/smaps"]);
        assert!(config.read_files);
        assert!(config.show_path);
        assert!(config.quiet);
    }

    #[test]
    fn test_sort_key() {
        assert_eq!(SortKey::Pss, config_from(&["-s", "pss", "1"]).sort_key);
        assert_eq!(SortKey::Name, config_from(&["--sort=name", "1"]).sort_key);
        assert!(uu_app()
            .try_get_matches_from(["smaps", "-s", "bogus", "1"])
            .is_err());
    }

    #[test]
    fn test_display_unit() {
        assert_eq!(DisplayUnit::Kibibytes, config_from(&["1"]).unit);
        assert_eq!(DisplayUnit::Bytes, config_from(&["-b", "1"]).unit);
        assert_eq!(DisplayUnit::Human, config_from(&["-H", "1"]).unit);
        assert_eq!(DisplayUnit::Bytes, config_from(&["-H", "-b", "1"]).unit);
        assert_eq!(DisplayUnit::Human, config_from(&["-b", "-H", "1"]).unit);
    }

    #[test]
    fn test_format_size() {
        assert_eq!("352", DisplayUnit::Kibibytes.format(352 * 1024));
        assert_eq!("1", DisplayUnit::Kibibytes.format(2047));
        assert_eq!("360448", DisplayUnit::Bytes.format(360448));
        assert!(DisplayUnit::Human.format(4096).ends_with("KiB"));
    }
}
