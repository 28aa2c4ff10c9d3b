// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (words) cmdline

use clap::{crate_version, Arg, ArgAction, Command};
use smaps_config::{smaps_field_name, SmapsConfig};
use std::fs::{self, File};
use std::io;
use summary::{SmapsSummary, SortKey};
use thiserror::Error;
use uucore::display::Quotable;
use uucore::error::{UError, UResult};
use uucore::{format_usage, help_about, help_usage, show, show_warning};

pub mod smaps_config;
pub mod smaps_format_parser;
pub mod summary;
pub mod units;

pub use smaps_format_parser::{
    parse_smaps, parse_smaps_seekable, parse_smaps_str, SmapEntry, Smaps, UNKNOWN_IDENTIFIER,
};

const ABOUT: &str = help_about!("smaps.md");
const USAGE: &str = help_usage!("smaps.md");

pub mod options {
    pub const TARGETS: &str = "targets";
    pub const FILE: &str = "file";
    pub const EXTENDED: &str = "extended";
    pub const SORT: &str = "sort";
    pub const BYTES: &str = "bytes";
    pub const HUMAN: &str = "human";
    pub const SHOW_PATH: &str = "show-path";
    pub const QUIET: &str = "quiet";
}

#[derive(Debug, Error)]
enum SmapsError {
    #[error("invalid process id: {}", .0.quote())]
    InvalidPid(String),

    #[error("cannot read {}: {source}", .target.quote())]
    Read { target: String, source: io::Error },
}

impl UError for SmapsError {
    fn code(&self) -> i32 {
        1
    }
}

#[uucore::main]
pub fn uumain(args: impl uucore::Args) -> UResult<()> {
    let matches = uu_app().try_get_matches_from(args)?;
    let config = SmapsConfig::from_matches(&matches);

    for target in matches
        .get_many::<String>(options::TARGETS)
        .into_iter()
        .flatten()
    {
        match read_target(target, &config) {
            Ok((title, smaps)) => {
                if smaps.is_empty() {
                    show_warning!("{}: no memory mappings found", target.maybe_quote());
                }
                let summary = SmapsSummary::new(&smaps, config.sort_key);
                print!("{}", format_report(&title, &summary, &config));
            }
            Err(e) => show!(e),
        }
    }

    Ok(())
}

// Returns the title line for the report and the parsed smaps of `target`.
fn read_target(target: &str, config: &SmapsConfig) -> Result<(String, Smaps), SmapsError> {
    let read_error = |source| SmapsError::Read {
        target: target.into(),
        source,
    };

    if config.read_files {
        let smaps = if target == "-" {
            parse_smaps(io::stdin().lock())
        } else {
            File::open(target).and_then(parse_smaps_seekable)
        }
        .map_err(read_error)?;
        return Ok((format!("{target}:"), smaps));
    }

    let pid = target
        .parse::<u32>()
        .map_err(|_| SmapsError::InvalidPid(target.into()))?;
    let smaps = File::open(format!("/proc/{pid}/smaps"))
        .and_then(parse_smaps_seekable)
        .map_err(read_error)?;

    // Kernel threads have an empty command line.
    let title = match parse_cmdline(pid) {
        Ok(cmdline) if !cmdline.is_empty() => format!("{pid}:   {cmdline}"),
        _ => format!("{pid}:"),
    };
    Ok((title, smaps))
}

fn parse_cmdline(pid: u32) -> Result<String, io::Error> {
    let contents = fs::read(format!("/proc/{pid}/cmdline"))?;
    // Command line arguments are separated by null bytes.
    // Replace them with spaces for display.
    let cmdline = contents
        .split(|&c| c == 0)
        .filter(|c| !c.is_empty())
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(" ");
    Ok(cmdline)
}

fn format_report(title: &str, summary: &SmapsSummary, config: &SmapsConfig) -> String {
    let mut columns: Vec<(&str, Vec<String>, String)> = config
        .fields
        .iter()
        .map(|&field_name| {
            let values = summary
                .rows
                .iter()
                .map(|row| config.format_size(row.totals.get(field_name)))
                .collect();
            let total = config.format_size(summary.total.get(field_name));
            (field_name, values, total)
        })
        .collect();
    columns.push((
        smaps_field_name::COUNT,
        summary.rows.iter().map(|row| row.count.to_string()).collect(),
        summary.mapping_count.to_string(),
    ));

    let widths: Vec<usize> = columns
        .iter()
        .map(|(name, values, total)| {
            values
                .iter()
                .chain([total])
                .map(String::len)
                .fold(name.len(), usize::max)
        })
        .collect();

    let mut report = String::new();
    if !config.quiet {
        report.push_str(title);
        report.push('\n');

        for ((name, _, _), &width) in columns.iter().zip(&widths) {
            report.push_str(&format!("{name:>width$} "));
        }
        report.push_str(smaps_field_name::MAPPING);
        report.push('\n');
    }

    for (i, row) in summary.rows.iter().enumerate() {
        for ((_, values, _), &width) in columns.iter().zip(&widths) {
            report.push_str(&format!("{:>width$} ", values[i]));
        }
        report.push_str(&row.display_name(config.show_path));
        report.push('\n');
    }

    if !config.quiet {
        let separator: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
        report.push_str(&separator.join(" "));
        report.push('\n');

        for ((_, _, total), &width) in columns.iter().zip(&widths) {
            report.push_str(&format!("{total:>width$} "));
        }
        report.push_str("total\n");
    }

    report
}

pub fn uu_app() -> Command {
    Command::new(uucore::util_name())
        .version(crate_version!())
        .about(ABOUT)
        .override_usage(format_usage(USAGE))
        .infer_long_args(true)
        .arg(
            Arg::new(options::TARGETS)
                .value_name("TARGET")
                .help("process ID, or file in smaps format with -F")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(options::FILE)
                .short('F')
                .long(options::FILE)
                .help("read targets as smaps files ('-' for standard input)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::EXTENDED)
                .short('x')
                .long(options::EXTENDED)
                .help("show all memory columns")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::SORT)
                .short('s')
                .long(options::SORT)
                .value_name("KEY")
                .help("sort mappings by KEY")
                .value_parser(SortKey::NAMES)
                .default_value("rss"),
        )
        .arg(
            Arg::new(options::BYTES)
                .short('b')
                .long(options::BYTES)
                .help("show sizes in bytes")
                .overrides_with(options::HUMAN)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::HUMAN)
                .short('H')
                .long(options::HUMAN)
                .help("show human-readable sizes")
                .overrides_with(options::BYTES)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::SHOW_PATH)
                .short('p')
                .long(options::SHOW_PATH)
                .help("show full path of mapped files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(options::QUIET)
                .short('q')
                .long(options::QUIET)
                .help("do not display header and footer")
                .action(ArgAction::SetTrue),
        )
}
