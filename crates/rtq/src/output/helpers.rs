//! Common helper functions for output formatting.

use owo_colors::OwoColorize;

/// Widest a table column is allowed to grow.
pub const MAX_COLUMN_WIDTH: usize = 48;

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Pads a string on the right to a width in characters.
pub fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

/// Formats a table header line.
pub fn format_header(header: &str, use_colors: bool) -> String {
    if use_colors {
        format!("{}\n", header.dimmed())
    } else {
        format!("{header}\n")
    }
}

/// Formats a section title.
pub fn format_title(title: &str, use_colors: bool) -> String {
    if use_colors {
        title.green().bold().to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("exactly ten", 11), "exactly ten");
        assert_eq!(truncate_str("a much longer name", 10), "a much ...");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("Æon Flux Æon Flux", 8), "Æon F...");
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdef", 4), "abcdef");
        assert_eq!(pad("Æ", 2), "Æ ");
    }

    #[test]
    fn test_format_header_plain() {
        assert_eq!(format_header("Name", false), "Name\n");
    }
}
