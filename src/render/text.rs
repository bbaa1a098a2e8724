//! Text measurement and the small markup subset annotations carry.

use std::sync::LazyLock;

use regex::Regex;

/// Heuristic: estimate pixel width of text (plotters has no built-in text measuring).
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Truncate to fit `max_px` and add a single ellipsis if needed.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if estimate_text_width_px(&out, font_px) + estimate_text_width_px("…", font_px) > max_px {
            out.pop();
            break;
        }
    }
    out.push('…');
    out
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));
static BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("break regex is valid"));

/// Plain lines of a possibly marked-up string: `<br>` splits lines, other
/// tags are dropped and the basic entities decoded.
pub fn plain_lines(text: &str) -> Vec<String> {
    BREAK
        .split(text)
        .map(|line| {
            TAG.replace_all(line, "")
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&amp;", "&")
        })
        .collect()
}

/// Width of the widest line of a block.
pub fn block_width_px(lines: &[String], font_px: u32) -> u32 {
    lines
        .iter()
        .map(|l| estimate_text_width_px(l, font_px))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped() {
        let lines = plain_lines("<b>Top</b><br>a &lt; b<BR/>c");
        assert_eq!(lines, ["Top", "a < b", "c"]);
    }

    #[test]
    fn truncation_adds_ellipsis() {
        assert_eq!(truncate_to_width("short", 10, 100), "short");
        let t = truncate_to_width("a fairly long label", 10, 60);
        assert!(t.ends_with('…'));
        assert!(estimate_text_width_px(&t, 10) <= 60);
    }
}
