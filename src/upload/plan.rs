use crate::client::part::PartNumber;

use std::ops::Range;

/// How content of a known length is divided into parts.
///
/// Every part is `part_size` bytes except the last, which has what remains.
/// Content of length zero is still one (empty) part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    content_length: u64,
    part_size: u64,
    part_count: u32,
}

impl PartPlan {
    /// Create the plan for `content_length` bytes split into parts of
    /// `part_size` bytes.  A `part_size` of zero is treated as one.
    pub fn new(content_length: u64, part_size: u64) -> Self {
        let part_size = part_size.max(1);
        let count = content_length.div_ceil(part_size).max(1);
        let part_count = u32::try_from(count).unwrap_or(u32::MAX);
        Self {
            content_length,
            part_size,
            part_count,
        }
    }

    /// Total number of parts, at least 1.
    pub fn part_count(&self) -> u32 {
        self.part_count
    }

    /// Size of every part but the last.
    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    /// Length of the whole content.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Byte range of the content that goes in part `n`, or `None` if the plan
    /// has no such part.
    pub fn part_range(&self, n: PartNumber) -> Option<Range<u64>> {
        if *n == 0 || *n > self.part_count {
            return None;
        }
        let start = u64::from(*n - 1) * self.part_size;
        let end = (start + self.part_size).min(self.content_length);
        Some(start.min(end)..end)
    }

    /// Returns `true` if `n` is one of the parts in this plan.
    pub fn contains(&self, n: PartNumber) -> bool {
        *n >= 1 && *n <= self.part_count
    }

    /// Iterate over the part numbers of the plan in order.
    pub fn parts(&self) -> impl Iterator<Item = PartNumber> + use<> {
        (1..=self.part_count).map(PartNumber::new)
    }
}
