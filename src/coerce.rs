use serde_json::Value;

/// Loose JSON scalar -> i64. Absent, `null`, `""`, `"-"` and anything that
/// does not start with a number all become 0.
pub fn to_safe_integer(v: &Value) -> i64 {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                n.as_f64().map(truncate_finite).unwrap_or(0)
            }
        }
        Value::String(s) => {
            let t = s.trim();
            if is_blank_sentinel(t) {
                return 0;
            }
            integer_prefix(t)
                .and_then(|p| p.parse::<i64>().ok())
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Loose JSON scalar -> finite f64, same sentinel rules as `to_safe_integer`.
pub fn to_safe_float(v: &Value) -> f64 {
    let f = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let t = s.trim();
            if is_blank_sentinel(t) {
                return 0.0;
            }
            float_prefix(t)
                .and_then(|p| p.parse::<f64>().ok())
                .unwrap_or(0.0)
        }
        _ => 0.0,
    };
    if f.is_finite() {
        f
    } else {
        0.0
    }
}

pub fn to_optional_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_blank_sentinel(t: &str) -> bool {
    t.is_empty() || t == "-"
}

fn truncate_finite(f: f64) -> i64 {
    if !f.is_finite() || f >= i64::MAX as f64 || f <= i64::MIN as f64 {
        return 0;
    }
    f.trunc() as i64
}

// Optional sign followed by at least one ASCII digit.
fn integer_prefix(t: &str) -> Option<&str> {
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    Some(&t[..end])
}

// Sign, digits, optional fraction, optional exponent. At least one digit.
fn float_prefix(t: &str) -> Option<&str> {
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        let mut frac_digits = 0;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            frac_digits += 1;
        }
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    Some(&t[..end])
}
