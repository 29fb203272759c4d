//! Offset pagination shared by the list endpoints.
//!
//! Bad `limit`/`cursor` values fall back to defaults instead of failing the
//! request. The cursor is an offset rendered as a string.
//!
//! Both values are read from their leading integer (`"10abc"` is 10,
//! `"1.5"` is 1); text with no leading digits counts as missing.

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    pub fn from_query(limit: Option<&str>, cursor: Option<&str>) -> Self {
        Self {
            limit: parse_limit(limit),
            offset: parse_cursor(cursor),
        }
    }

    /// Cursor for the page after one that returned `returned` of `total`
    /// matching rows, or `None` once everything has been handed out.
    pub fn next_cursor(&self, returned: usize, total: u64) -> Option<String> {
        let next = self.offset.saturating_add(returned as u64);
        (next < total).then(|| next.to_string())
    }
}

fn parse_limit(raw: Option<&str>) -> u32 {
    match raw.and_then(leading_int) {
        Some(n) if n < 1 => DEFAULT_LIMIT,
        Some(n) if n > i64::from(MAX_LIMIT) => MAX_LIMIT,
        Some(n) => n as u32,
        None => DEFAULT_LIMIT,
    }
}

fn parse_cursor(raw: Option<&str>) -> u64 {
    match raw.and_then(leading_int) {
        Some(n) if n > 0 => n as u64,
        _ => 0,
    }
}

/// Optional sign followed by decimal digits, after leading whitespace.
/// Trailing text is ignored and magnitudes saturate at the `i64` bounds.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    seen.then_some(value)
}
