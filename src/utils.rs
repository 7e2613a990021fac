//! Conversion helpers shared by the codec

use crate::error::{RedisWireError, Result};

/// Parse a Redis integer from bytes
pub fn parse_redis_int(data: &[u8]) -> Result<i64> {
    let s = std::str::from_utf8(data)
        .map_err(|e| RedisWireError::invalid_format(format!("Invalid UTF-8: {}", e)))?;

    s.parse::<i64>()
        .map_err(|e| RedisWireError::invalid_format(format!("Invalid integer: {}", e)))
}

/// Parse a Redis float from bytes
///
/// RESP doubles may carry the textual forms `inf`, `+inf`, `-inf` and
/// `nan` in addition to plain decimal notation.
pub fn parse_redis_float(data: &[u8]) -> Result<f64> {
    let s = std::str::from_utf8(data)
        .map_err(|e| RedisWireError::invalid_format(format!("Invalid UTF-8: {}", e)))?;

    match s {
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        "nan" => Ok(f64::NAN),
        _ => s
            .parse::<f64>()
            .map_err(|e| RedisWireError::invalid_format(format!("Invalid float: {}", e))),
    }
}

/// Escape a byte slice for diagnostics
///
/// Printable ASCII passes through; control bytes, quotes and non-ASCII
/// bytes are rendered as escapes so wire data is safe to embed in error
/// messages and log lines.
pub fn escape_bytes(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len() + 2);
    result.push('"');

    for &b in data {
        match b {
            b'"' => result.push_str("\\\""),
            b'\\' => result.push_str("\\\\"),
            b'\n' => result.push_str("\\n"),
            b'\r' => result.push_str("\\r"),
            b'\t' => result.push_str("\\t"),
            0x20..=0x7e => result.push(b as char),
            _ => result.push_str(&format!("\\x{:02x}", b)),
        }
    }

    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_redis_int(b"42").unwrap(), 42);
        assert_eq!(parse_redis_int(b"-3").unwrap(), -3);
        assert_eq!(parse_redis_int(b"0").unwrap(), 0);
        assert!(parse_redis_int(b"abc").is_err());
        assert!(parse_redis_int(b"").is_err());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_redis_float(b"1.23").unwrap(), 1.23);
        assert_eq!(parse_redis_float(b"inf").unwrap(), f64::INFINITY);
        assert_eq!(parse_redis_float(b"-inf").unwrap(), f64::NEG_INFINITY);
        assert!(parse_redis_float(b"nan").unwrap().is_nan());
        assert!(parse_redis_float(b"1.2.3").is_err());
    }

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"plain"), "\"plain\"");
        assert_eq!(escape_bytes(b"a\r\nb"), "\"a\\r\\nb\"");
        assert_eq!(escape_bytes(&[0x07]), "\"\\x07\"");
    }
}
