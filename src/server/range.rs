//! Byte-range header parsing.

/// A parsed inclusive byte interval within a file of known size.
///
/// Invariant: `0 <= start <= end <= size - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the interval.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parses a `Range` header value of the form `bytes=<start>-[<end>]`
/// against a file of `size` bytes.
///
/// Returns `None` for anything that should degrade to a full-content
/// response: malformed syntax, suffix ranges (`bytes=-N`), multi-range
/// lists, an empty file, a start at or past EOF, or `start > end`. A
/// missing or past-EOF end is clamped to `size - 1`.
pub fn parse(header: &str, size: u64) -> Option<ByteRange> {
    let spec = header.strip_prefix("bytes=")?;
    if spec.contains(',') || size == 0 {
        return None;
    }

    let (start_part, end_part) = spec.split_once('-')?;
    let start: u64 = start_part.trim().parse().ok()?;
    if start >= size {
        return None;
    }

    let end = if end_part.trim().is_empty() {
        size - 1
    } else {
        end_part.trim().parse::<u64>().ok()?.min(size - 1)
    };
    if start > end {
        return None;
    }

    Some(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_range() {
        let range = parse("bytes=10-19", 100).unwrap();
        assert_eq!(range, ByteRange { start: 10, end: 19 });
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn open_ended_range_runs_to_eof() {
        let range = parse("bytes=0-", 100).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn end_past_eof_is_clamped() {
        let range = parse("bytes=90-500", 100).unwrap();
        assert_eq!(range, ByteRange { start: 90, end: 99 });
    }

    #[test]
    fn full_content_fallbacks() {
        // Malformed, suffix, multi-range and out-of-bounds forms all
        // degrade to a full response rather than an error.
        assert_eq!(parse("bytes=abc-def", 100), None);
        assert_eq!(parse("bytes=-20", 100), None);
        assert_eq!(parse("bytes=0-10,20-30", 100), None);
        assert_eq!(parse("items=0-10", 100), None);
        assert_eq!(parse("bytes=100-", 100), None);
        assert_eq!(parse("bytes=20-10", 100), None);
        assert_eq!(parse("bytes=0-", 0), None);
        assert_eq!(parse("bytes", 100), None);
    }
}
