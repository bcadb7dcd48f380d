use scraper::Html;

/// Sentence terminators followed by a separator become a line break.
///
/// Applied in this order; later rules see the output of earlier ones.
const SENTENCE_BREAKS: [(&str, &str); 9] = [
    (". ", ".\r\n"),
    (".\n", ".\r\n"),
    (".\t", ".\r\n"),
    ("! ", "!\r\n"),
    ("!\n", "!\r\n"),
    ("!\t", "!\r\n"),
    ("? ", "?\r\n"),
    ("?\n", "?\r\n"),
    ("?\t", "?\r\n"),
];

/// Abbreviations whose period is not a sentence end. Runs after every break
/// rule has been applied.
const ABBREVIATION_FIXES: [(&str, &str); 3] = [
    ("Fig.\r\n", "Fig. "),
    ("et al.\r\n", "et al. "),
    ("et al,.\r\n", "et al. "),
];

/// Strips markup, keeping only text nodes.
///
/// Text from different nodes is joined with a single space. Entities are
/// decoded by the HTML parser.
///
/// # Examples
///
/// ```
/// use feedrelay::util::html_to_text;
///
/// assert_eq!(html_to_text("<p>Hello <b>world</b></p>"), "Hello  world");
/// ```
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    let mut first = true;

    for text in fragment.root_element().text() {
        if text.is_empty() {
            continue;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(text);
        first = false;
    }

    out
}

/// Turns a raw entry description into relay-ready text: one sentence per line.
///
/// 1. markup stripped ([`html_to_text`])
/// 2. trimmed, `\r` removed, `\n` turned into spaces, double spaces halved
/// 3. `\r\n` inserted after `.`, `!`, `?` followed by space, newline or tab
/// 4. breaks after `Fig.`, `et al.` and `et al,.` turned back into spaces
///
/// The heuristic is lossy on purpose and the step order is load-bearing.
pub fn format_description(raw: &str) -> String {
    let mut text = html_to_text(raw)
        .trim()
        .replace('\r', "")
        .replace('\n', " ")
        .replace("  ", " ");

    for (from, to) in SENTENCE_BREAKS {
        text = text.replace(from, to);
    }
    for (from, to) in ABBREVIATION_FIXES {
        text = text.replace(from, to);
    }

    text
}
