//! Error costs used to rank recoveries.

pub(crate) const ERROR_COST_PER_RECOVERY: u32 = 500;
pub(crate) const ERROR_COST_PER_MISSING_TREE: u32 = 110;
pub(crate) const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
pub(crate) const ERROR_COST_PER_SKIPPED_LINE: u32 = 30;
pub(crate) const ERROR_COST_PER_SKIPPED_CHAR: u32 = 1;

/// Cost of skipping `trees` subtrees covering `text`.
pub(crate) fn skipped_cost(trees: usize, text: &str) -> u32 {
    let lines = text.bytes().filter(|&b| b == b'\n').count();
    let trees = u32::try_from(trees).unwrap_or(u32::MAX);
    let bytes = u32::try_from(text.len()).unwrap_or(u32::MAX);
    let lines = u32::try_from(lines).unwrap_or(u32::MAX);
    trees
        .saturating_mul(ERROR_COST_PER_SKIPPED_TREE)
        .saturating_add(bytes.saturating_mul(ERROR_COST_PER_SKIPPED_CHAR))
        .saturating_add(lines.saturating_mul(ERROR_COST_PER_SKIPPED_LINE))
}
