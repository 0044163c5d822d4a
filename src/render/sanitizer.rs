use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static STRAY_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`{3,}").unwrap());

const STRIPPED_CHARS: &[char] = &['"', '\u{201C}', '\u{201D}', '*', '\n', '\r'];

/// Turn model output into a single-line utterance of at most `max_length` chars.
///
/// Example:
/// ```rust
/// use talkgen::render::sanitizer::sanitize;
///
/// let utterance = sanitize("**Olá!**\n\"Bem-vinda\"", 500);
/// assert_eq!(utterance, "Olá!Bem-vinda");
/// ```
pub fn sanitize(raw: &str, max_length: usize) -> String {
    let without_blocks = FENCED_BLOCK.replace_all(raw, "");
    let stripped: String = without_blocks
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect();
    let single_line = STRAY_FENCE.replace_all(&stripped, "");

    // Hard cut on chars; the tail can expose whitespace.
    let cut: String = single_line.trim().chars().take(max_length).collect();
    cut.trim_end().to_string()
}
