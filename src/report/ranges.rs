//! Uncovered line compaction

/// Collapse runs of consecutive numbers into `start-end` and join them with
/// `", "`. Output longer than `max_length` is cut back to the last comma that
/// leaves room for a trailing `...`.
///
/// `[1, 2, 3, 7, 9, 10]` becomes `1-3, 7, 9-10`.
pub fn compact_number_ranges(numbers: &[u32], max_length: usize) -> String {
    let Some((&first, rest)) = numbers.split_first() else {
        return String::new();
    };

    let mut ranges = Vec::new();
    let (mut start, mut end) = (first, first);
    for &number in rest {
        if end.checked_add(1) == Some(number) {
            end = number;
        } else {
            ranges.push((start, end));
            start = number;
            end = number;
        }
    }
    ranges.push((start, end));

    let result = ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");

    if result.len() <= max_length {
        return result;
    }

    let budget = max_length.saturating_sub(3);
    match result[..budget].rfind(',') {
        Some(cut) => format!("{}...", &result[..cut]),
        // One range wider than the whole cell: no comma to cut at, so the
        // number is split to keep the column width bounded
        None => format!("{}...", &result[..budget]),
    }
}
