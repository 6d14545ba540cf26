//! Parsing of `k=v&k=v` connection-parameter strings and Go-style durations.

use std::time::Duration;

/// Splits a raw parameter string into ordered key/value pairs.
///
/// Empty segments (`a=1&&b=2`, trailing `&`) are skipped. Every other
/// segment must contain `=` and a non-empty key. Values are percent-decoded.
pub fn parse_params(raw: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for segment in raw.trim().trim_start_matches('?').split('&') {
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment
            .split_once('=')
            .ok_or_else(|| format!("invalid parameter [{}], expected key=value", segment))?;
        if key.trim().is_empty() {
            return Err(format!("invalid parameter [{}], empty key", segment));
        }
        let value = urlencoding::decode(value)
            .map_err(|e| format!("invalid parameter [{}]: {}", segment, e))?;
        pairs.push((key.trim().to_string(), value.into_owned()));
    }
    Ok(pairs)
}

/// Re-encodes pairs into a query string.
pub fn encode_params(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parses a Go-style duration: `360s`, `2h`, `1h30m`, `500ms`, `1.5h`.
/// A bare number means seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration [{}]", raw))?;
        if num_end == 0 {
            return Err(format!("invalid duration [{}]", raw));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| format!("invalid duration [{}]", raw))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => return Err(format!("unknown unit [{}] in duration [{}]", unit, raw)),
        };
        nanos += value * scale;
        rest = &rest[unit_end..];
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let pairs = parse_params("poolMinSessions=50&timezone=Local&&connect_timeout=15&").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("poolMinSessions".to_string(), "50".to_string()),
                ("timezone".to_string(), "Local".to_string()),
                ("connect_timeout".to_string(), "15".to_string()),
            ]
        );
        assert!(parse_params("").unwrap().is_empty());
        assert_eq!(parse_params("loc=Asia%2FShanghai").unwrap()[0].1, "Asia/Shanghai");
    }

    #[test]
    fn test_parse_params_rejects_malformed() {
        assert!(parse_params("poolMinSessions").is_err());
        assert!(parse_params("=5").is_err());
        assert!(parse_params("a=1&broken").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("360s").unwrap(), Duration::from_secs(360));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("2x").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("-1s").is_err());
    }
}
