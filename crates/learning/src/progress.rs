//! Completion-to-percentage mapping.

/// `round(100 * completed / total)`, clamped to `[0, 100]`; 0 when `total` is 0.
///
/// Halves round up, so 1 of 8 lessons (12.5%) reports 13.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u128;
    let total = total as u128;
    ((200 * completed + total) / (2 * total)) as u8
}
