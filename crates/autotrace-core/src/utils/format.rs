/// Truncate to `max_len` characters, ending with "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Render an API date as "Mar 15, 2024".
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD`; anything else is
/// returned unchanged.
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(day) = chrono::NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        day.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

/// Whole kilometers with thousands separators, e.g. "32,400 km"
pub fn format_km(km: f64) -> String {
    let rounded = km.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0 {
        format!("-{} km", grouped)
    } else {
        format!("{} km", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Onix", 10), "Onix");
        assert_eq!(truncate("Chevrolet Onix Plus", 10), "Chevrol...");
        assert_eq!(truncate("Chevrolet", 2), "Ch");
        assert_eq!(truncate("Citroën C3", 7), "Citr...");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("2024-01-01"), "-"), "2024-01-01");
        assert_eq!(format_optional(Some("  "), "-"), "-");
        assert_eq!(format_optional(None, "never"), "never");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-15T10:00:00Z"), "Mar 15, 2024");
        assert_eq!(format_date("2024-03-15"), "Mar 15, 2024");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_km() {
        assert_eq!(format_km(0.0), "0 km");
        assert_eq!(format_km(999.4), "999 km");
        assert_eq!(format_km(32400.5), "32,401 km");
        assert_eq!(format_km(1234567.0), "1,234,567 km");
        assert_eq!(format_km(-1500.0), "-1,500 km");
    }
}
