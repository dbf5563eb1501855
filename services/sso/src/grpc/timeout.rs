//! `grpc-timeout` header parsing.

use std::time::Duration;
use tonic::metadata::MetadataMap;

/// Header carrying the caller's deadline.
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// gRPC caps timeout values at eight digits.
const MAX_DIGITS: usize = 8;

/// Parse a `grpc-timeout` value such as `"250m"` or `"5S"`.
///
/// Returns `None` for anything malformed.
#[must_use]
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    let split = value.len().checked_sub(1)?;
    let (digits, unit) = value.split_at_checked(split)?;
    if digits.is_empty() || digits.len() > MAX_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "H" => Some(Duration::from_secs(amount * 3600)),
        "M" => Some(Duration::from_secs(amount * 60)),
        "S" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_millis(amount)),
        "u" => Some(Duration::from_micros(amount)),
        "n" => Some(Duration::from_nanos(amount)),
        _ => None,
    }
}

/// Timeout requested by the caller, if any.
#[must_use]
pub fn request_timeout(metadata: &MetadataMap) -> Option<Duration> {
    metadata
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_grpc_timeout)
}
