//! Byte-range arithmetic for reconstructing a file from its chunks.
//!
//! Only the open-ended single-range form `bytes=<start>-` is recognized; any
//! other `Range` syntax is treated as if no range was sent. A satisfiable
//! range is answered with at most one chunk's worth of data starting at
//! `start`, which keeps every partial response bounded the same way the
//! stored objects are.

/// Parse a `Range` header, returning the start offset for the supported
/// `bytes=<start>-` form and `None` for every other syntax.
pub fn parse_open_range(header: &str) -> Option<u64> {
    let spec = header.strip_prefix("bytes=")?;
    let start = spec.strip_suffix('-')?;
    if start.is_empty() || !start.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    start.parse().ok()
}

/// A resolved partial-content plan: which chunks to fetch and which byte
/// window of each to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    pub start: u64,
    /// Inclusive end offset of the response.
    pub end: u64,
    pub file_size: u64,
    chunk_size: u64,
    /// First selected chunk index.
    pub start_part: usize,
    /// End-exclusive chunk index.
    pub end_part: usize,
}

/// Byte window within one selected chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartWindow {
    /// Bytes to skip at the front of the chunk.
    pub skip: u64,
    /// Bytes to forward after the skip.
    pub take: u64,
}

impl RangePlan {
    /// Compute the plan for `bytes=<start>-` against a file of `file_size`
    /// bytes stored as `chunk_size`-byte chunks. Returns `None` when `start`
    /// lies beyond the last byte (unsatisfiable).
    pub fn compute(start: u64, file_size: u64, chunk_size: u64) -> Option<Self> {
        if file_size == 0 || start >= file_size || chunk_size == 0 {
            return None;
        }
        let end = (start + chunk_size).min(file_size - 1);
        let start_part = (start / chunk_size) as usize;
        let end_part = end.div_ceil(chunk_size) as usize;
        Some(RangePlan {
            start,
            end,
            file_size,
            chunk_size,
            start_part,
            end_part,
        })
    }

    /// Number of bytes announced in `Content-Length`.
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.file_size)
    }

    /// Selected chunk indices, in delivery order.
    pub fn parts(&self) -> std::ops::Range<usize> {
        self.start_part..self.end_part
    }

    /// Byte window of one selected chunk: the first chunk starts at
    /// `start mod chunk_size`, the last ends at `end mod chunk_size`
    /// (inclusive), middle chunks are forwarded in full.
    pub fn window(&self, part: usize) -> PartWindow {
        let skip = if part == self.start_part {
            self.start % self.chunk_size
        } else {
            0
        };
        let end_inclusive = if part + 1 == self.end_part {
            self.end % self.chunk_size
        } else {
            self.chunk_size - 1
        };
        PartWindow {
            skip,
            take: (end_inclusive + 1).saturating_sub(skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_the_open_ended_form() {
        assert_eq!(parse_open_range("bytes=5000000-"), Some(5_000_000));
        assert_eq!(parse_open_range("bytes=0-"), Some(0));
        assert_eq!(parse_open_range("bytes=0-499"), None);
        assert_eq!(parse_open_range("bytes=-500"), None);
        assert_eq!(parse_open_range("bytes=0-499,1000-"), None);
        assert_eq!(parse_open_range("items=0-"), None);
        assert_eq!(parse_open_range("bytes=abc-"), None);
    }

    #[test]
    fn worked_example_three_chunks() {
        // 25 MB file in 10 MB chunks, request starts mid-chunk 0.
        let plan = RangePlan::compute(5_000_000, 25_000_000, 10_000_000).unwrap();
        assert_eq!(plan.end, 14_999_999);
        assert_eq!(plan.start_part, 0);
        assert_eq!(plan.end_part, 2);
        assert_eq!(plan.parts().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(plan.content_length(), 10_000_000);
        assert_eq!(plan.content_range(), "bytes 5000000-14999999/25000000");
        assert_eq!(
            plan.window(0),
            PartWindow {
                skip: 5_000_000,
                take: 5_000_000
            }
        );
        assert_eq!(
            plan.window(1),
            PartWindow {
                skip: 0,
                take: 5_000_000
            }
        );
    }

    #[test]
    fn range_near_end_of_file_is_clamped() {
        let plan = RangePlan::compute(22_000_000, 25_000_000, 10_000_000).unwrap();
        assert_eq!(plan.end, 24_999_999);
        assert_eq!(plan.start_part, 2);
        assert_eq!(plan.end_part, 3);
        assert_eq!(plan.content_length(), 3_000_000);
        assert_eq!(
            plan.window(2),
            PartWindow {
                skip: 2_000_000,
                take: 3_000_000
            }
        );
    }

    #[test]
    fn start_past_end_is_unsatisfiable() {
        assert!(RangePlan::compute(25_000_000, 25_000_000, 10_000_000).is_none());
        assert!(RangePlan::compute(0, 0, 10_000_000).is_none());
    }

    #[test]
    fn single_chunk_file() {
        let plan = RangePlan::compute(100, 1_000, 10_000_000).unwrap();
        assert_eq!(plan.end, 999);
        assert_eq!(plan.parts().collect::<Vec<_>>(), vec![0]);
        assert_eq!(
            plan.window(0),
            PartWindow {
                skip: 100,
                take: 900
            }
        );
    }
}
