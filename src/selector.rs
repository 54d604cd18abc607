//! Bounded, client-facing format selection.
//!
//! Extractors can return dozens of near-duplicate renditions. The selector
//! keeps video formats only, orders them by height then filesize (both
//! descending) and truncates the list.

use std::cmp::Reverse;

use crate::extractor::RawFormat;
use crate::model::FormatDescriptor;

/// Number of formats offered on the unclassified fallback path.
pub const DEFAULT_FORMAT_LIMIT: usize = 10;

/// Filters, sorts and truncates raw formats into at most `limit` descriptors.
///
/// Unknown height sorts as 0; unknown filesize sorts below any known size of
/// the same height. Full ties keep extractor order.
#[must_use]
pub fn select<'a>(
    formats: impl IntoIterator<Item = &'a RawFormat>,
    limit: usize,
) -> Vec<FormatDescriptor> {
    let mut candidates: Vec<&RawFormat> = formats.into_iter().filter(|f| f.has_video()).collect();
    candidates.sort_by_key(|f| Reverse((f.height.unwrap_or(0), f.filesize)));
    candidates
        .into_iter()
        .take(limit)
        .map(RawFormat::to_descriptor)
        .collect()
}
