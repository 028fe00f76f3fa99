use serde::Serialize;

pub const DEFAULT_LIFETIME_SECONDS: u64 = 3600;

/// Issuance instant and the privilege expiry derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryWindow {
    pub issued_at: i64,
    pub lifetime_seconds: u64,
    pub absolute_expiry: i64,
}

impl ExpiryWindow {
    fn new(issued_at: i64, lifetime_seconds: u64) -> Self {
        let lifetime = i64::try_from(lifetime_seconds).unwrap_or(i64::MAX);
        Self {
            issued_at,
            lifetime_seconds,
            absolute_expiry: issued_at.saturating_add(lifetime),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub max_lifetime_seconds: Option<u64>,
}

impl ExpiryPolicy {
    pub fn new(max_lifetime_seconds: Option<u64>) -> Self {
        Self {
            max_lifetime_seconds,
        }
    }

    pub fn compute(&self, requested: Option<&str>, now: i64) -> ExpiryWindow {
        let lifetime = requested
            .and_then(parse_lifetime)
            .unwrap_or(DEFAULT_LIFETIME_SECONDS);
        let lifetime = match self.max_lifetime_seconds {
            Some(max) => lifetime.min(max),
            None => lifetime,
        };
        ExpiryWindow::new(now, lifetime)
    }
}

/// Unbounded policy: absent or unparseable lifetimes fall back to one hour.
pub fn compute_expiry(requested: Option<&str>, now: i64) -> ExpiryWindow {
    ExpiryPolicy::default().compute(requested, now)
}

/// Leading-integer parse: `"60abc"` is 60, `"12.7"` is 12, `"abc"` and `"-5"` are rejected.
fn parse_lifetime(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return None;
    }
    let value = rest[..digits_len].parse::<u64>().ok()?;
    if negative && value != 0 {
        return None;
    }
    Some(value)
}
