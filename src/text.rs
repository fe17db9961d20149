use regex::Regex;

/// Reflows a prose blob into one logical sentence per line so the frontend
/// can render it as bullet-style lines.
///
/// Splits after sentence-terminal punctuation followed by whitespace, or at
/// any existing newline. This is a heuristic, not a sentence tokenizer:
/// abbreviations ("Mr. Smith") split incorrectly while decimals ("3.14")
/// survive, and rendered output depends on keeping it that way.
pub fn split_lines(text: &str) -> String {
    let boundary = Regex::new(r"([.!?])\s+").unwrap_or_else(|_| Regex::new("^$").unwrap());
    let marked = boundary.replace_all(text, "$1\n");

    marked
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pulls numbered question blocks ("1. ...", "2. ...") out of document text.
///
/// A block starts at a digits-plus-period marker and runs until the next
/// marker at the start of a line, or end of input, so multi-line questions
/// stay whole. Embedded newlines collapse to single spaces. No markers means
/// an empty list, which is a normal outcome for prose-only documents.
pub fn extract_questions(text: &str) -> Vec<String> {
    let marker = Regex::new(r"\d+\.").unwrap_or_else(|_| Regex::new("^$").unwrap());
    let Some(first) = marker.find(text) else {
        return Vec::new();
    };

    let line_marker = Regex::new(r"\n\d+\.").unwrap_or_else(|_| Regex::new("^$").unwrap());
    let mut starts = vec![first.start()];
    for m in line_marker.find_iter(&text[first.start()..]) {
        let start = first.start() + m.start() + 1;
        if start > *starts.last().unwrap_or(&0) {
            starts.push(start);
        }
    }

    let mut questions = Vec::with_capacity(starts.len());
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(text.len());
        let block = text[start..end].trim().replace('\n', " ");
        if !block.is_empty() {
            questions.push(block);
        }
    }

    questions
}
