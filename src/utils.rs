//! Text utilities shared by normalization and rendering.

/// Drop markup and collapse whitespace; feed summaries frequently arrive as
/// HTML fragments.
pub fn strip_html(html: &str) -> String {
    html.chars()
        .fold((String::new(), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' => (text, false),
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Char-boundary-safe truncation with an ellipsis marker.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "日本語のテキスト".repeat(100);
        let truncated = truncate_chars(&text, 500);
        assert!(truncated.chars().count() <= 500);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("short", 500), "short");
    }

    #[test]
    fn strip_html_collapses_whitespace() {
        assert_eq!(strip_html("<p>hello</p>\n  <b>world</b>"), "hello world");
    }

    #[test]
    fn strip_html_keeps_plain_text() {
        assert_eq!(strip_html("no markup here"), "no markup here");
    }
}
