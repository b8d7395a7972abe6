//! Pluralization for log lines.

/// Format count with noun, handling pluralization
///
/// - `plural_count(0, "asset")` -> `"0 assets"`
/// - `plural_count(1, "asset")` -> `"1 asset"`
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "asset"), "0 assets");
        assert_eq!(plural_count(1, "file"), "1 file");
        assert_eq!(plural_count(3, "sibling"), "3 siblings");
    }
}
