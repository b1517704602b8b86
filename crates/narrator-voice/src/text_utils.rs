//! Small text helpers shared by the transcript buffer and the classifier.

/// Lowercase, drop punctuation and collapse whitespace.
///
/// Used to compare utterances ("다음 챕터!" and "다음  챕터" are the same
/// command) without touching the text that is shown to the user.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `segment` to `transcript` with a single separating space.
pub fn join_transcript(transcript: &str, segment: &str) -> String {
    let segment = segment.trim();
    let transcript = transcript.trim_end();
    match (transcript.is_empty(), segment.is_empty()) {
        (_, true) => transcript.to_string(),
        (true, false) => segment.to_string(),
        (false, false) => format!("{transcript} {segment}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  Next   Chapter! "), "next chapter");
        assert_eq!(normalize("다음 챕터?"), "다음 챕터");
        assert_eq!(normalize("...?"), "");
    }

    #[test]
    fn join_handles_empty_sides() {
        assert_eq!(join_transcript("", "hello"), "hello");
        assert_eq!(join_transcript("hello ", "  "), "hello");
        assert_eq!(join_transcript("hello", " world "), "hello world");
    }
}
