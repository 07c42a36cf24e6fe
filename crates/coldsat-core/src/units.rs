//! Satoshi/BTC conversion and display helpers.
//!
//! Conversions are integer-exact; no floating point is involved.

use crate::constants::SATS_PER_BTC;

/// Render satoshis as a BTC amount with eight decimals, e.g. `"0.00100000"`.
///
/// # Examples
///
/// ```
/// use coldsat_core::units::sats_to_btc_string;
/// assert_eq!(sats_to_btc_string(123_456_789), "1.23456789");
/// ```
pub fn sats_to_btc_string(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// e.g. `100000` -> `"100,000 sats (0.00100000 BTC)"`
pub fn sats_to_display(sats: u64) -> String {
    format!("{} sats ({} BTC)", format_with_commas(sats), sats_to_btc_string(sats))
}

/// Parse a decimal BTC amount (`"0.0015"`, `"2"`, `".5"`) into satoshis.
///
/// Returns `None` for more than eight fractional digits, signs, exponents,
/// or values that overflow `u64`.
pub fn parse_btc(s: &str) -> Option<u64> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 8 || !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole_sats = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().ok()?.checked_mul(SATS_PER_BTC)?
    };
    let frac_sats = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<8}").parse::<u64>().ok()?
    };
    whole_sats.checked_add(frac_sats)
}

/// Parse a satoshi amount. `,` or `_` may separate thousands (`"12,000"`,
/// `"1_000_000"`); any other grouping is refused.
pub fn parse_sats(s: &str) -> Option<u64> {
    let s = s.trim();
    let grouped = s.contains([',', '_']);
    let mut groups = s.split([',', '_']);
    let head = groups.next()?;
    if head.is_empty() || (grouped && head.len() > 3) {
        return None;
    }
    let mut digits = head.to_string();
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        digits.push_str(group);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn format_with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
