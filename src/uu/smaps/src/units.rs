// This file is part of the uutils procps package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

use std::str::FromStr;

/// Units the kernel uses for the values of smaps attribute lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Kibibytes, // IEC:2^10
    Mebibytes, // IEC:2^20
    Gibibytes, // IEC:2^30
}

impl SizeUnit {
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Kibibytes => 1 << 10,
            Self::Mebibytes => 1 << 20,
            Self::Gibibytes => 1 << 30,
        }
    }
}

impl FromStr for SizeUnit {
    type Err = ();

    // The kernel writes "kB" but means kibibytes; the match is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kb" => Ok(Self::Kibibytes),
            "mb" => Ok(Self::Mebibytes),
            "gb" => Ok(Self::Gibibytes),
            _ => Err(()),
        }
    }
}

/// Converts a value such as `"352 kB"` into a number of bytes.
///
/// Never fails: anything that is not exactly `<number> <unit>` with a known unit
/// yields 0. Fractional values are truncated after the conversion to bytes.
pub fn parse_size(value: &str) -> u64 {
    let mut parts = value.split_whitespace();
    let (Some(number), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return 0;
    };

    let Ok(number) = number.parse::<f64>() else {
        return 0;
    };
    let Ok(unit) = unit.parse::<SizeUnit>() else {
        return 0;
    };

    let bytes = number * unit.multiplier() as f64;
    if bytes.is_finite() && bytes > 0.0 {
        // `as` saturates at u64::MAX
        bytes as u64
    } else {
        0
    }
}
