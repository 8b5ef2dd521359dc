//! Unit normalization helpers
//!
//! Providers report hashrate in whatever unit suits them (H/s, GH/s, or a
//! human string like "5.87 Ehash/s"). Everything is converted to EH/s here
//! so records are comparable regardless of source.

use rust_decimal::prelude::*;

/// SI prefixes used by hashrate units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashrateUnit {
    Hash,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
    Exa,
    Zetta,
}

impl HashrateUnit {
    /// Power-of-ten exponent of one unit in H/s
    fn exponent(self) -> i32 {
        match self {
            HashrateUnit::Hash => 0,
            HashrateUnit::Kilo => 3,
            HashrateUnit::Mega => 6,
            HashrateUnit::Giga => 9,
            HashrateUnit::Tera => 12,
            HashrateUnit::Peta => 15,
            HashrateUnit::Exa => 18,
            HashrateUnit::Zetta => 21,
        }
    }

    /// Convert a value expressed in this unit to EH/s
    pub fn to_exahash(self, value: f64) -> f64 {
        value * 10f64.powi(self.exponent() - HashrateUnit::Exa.exponent())
    }

    /// Parse the unit part of a hashrate string ("EH/s", "Ehash/s", "th/s", "H/s")
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let s = suffix.trim();
        let lower = s.to_ascii_lowercase();
        let stem = lower
            .strip_suffix("/s")
            .or_else(|| lower.strip_suffix("/sec"))
            .unwrap_or(&lower);
        let prefix = stem
            .strip_suffix("hash")
            .or_else(|| stem.strip_suffix('h'))?;

        match prefix {
            "" => Some(HashrateUnit::Hash),
            "k" => Some(HashrateUnit::Kilo),
            "m" => Some(HashrateUnit::Mega),
            "g" => Some(HashrateUnit::Giga),
            "t" => Some(HashrateUnit::Tera),
            "p" => Some(HashrateUnit::Peta),
            "e" => Some(HashrateUnit::Exa),
            "z" => Some(HashrateUnit::Zetta),
            _ => None,
        }
    }
}

/// H/s to EH/s
pub fn hashes_to_exahash(hashes_per_sec: f64) -> f64 {
    HashrateUnit::Hash.to_exahash(hashes_per_sec)
}

/// Parse a human-formatted number, ignoring thousands separators and spaces.
///
/// Accepts scientific notation. Returns `None` for anything else, including
/// negative, NaN, and infinite values.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}'))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Split "1.5e20 H/s" into ("1.5e20", " H/s").
///
/// An `e`/`E` is only treated as an exponent when digits follow it, so the
/// exa prefix in "2.5EH/s" stays with the unit.
fn split_numeric_prefix(text: &str) -> (&str, &str) {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() || b == b'.' || b == b',' {
            i += 1;
            end = i;
        } else if b == b' ' && end > 0 {
            i += 1;
        } else if (b == b'e' || b == b'E') && end > 0 {
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_digit() {
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                i = j;
                end = j;
            } else {
                break;
            }
        } else {
            break;
        }
    }
    text.split_at(end)
}

/// Parse a hashrate string such as "5.866 Ehash/s" or "631,000 TH/s" into EH/s
pub fn parse_hashrate(text: &str) -> Option<f64> {
    let (number, unit) = split_numeric_prefix(text.trim());
    let value = parse_number(number)?;
    let unit = HashrateUnit::from_suffix(unit)?;
    Some(unit.to_exahash(value))
}

/// Signed percentage change from `old` to `new`, rounded to two decimals.
///
/// Always carries exactly two decimal places so it serializes as e.g.
/// `"-10.00"`. Returns `None` when `old` is not positive or the result is
/// not representable.
pub fn percent_change(old: f64, new: f64) -> Option<Decimal> {
    if old.is_nan() || old <= 0.0 {
        return None;
    }
    let raw = (new - old) / old * 100.0;
    let mut pct = Decimal::from_f64(raw)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    pct.rescale(2);
    Some(pct)
}

/// `0.00` with two decimal places
pub fn zero_pct() -> Decimal {
    Decimal::new(0, 2)
}
