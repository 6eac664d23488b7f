use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_ ]+").expect("valid regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid regex"));

/// URL-friendly form of a label: lowercased, everything except ASCII word
/// characters and spaces removed, runs of spaces replaced by one hyphen.
pub fn url_slug(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lower, "");
    SPACES.replace_all(&stripped, "-").into_owned()
}
