//! Keyword intent classification.
//!
//! The router only depends on [`IntentClassifier`]; [`KeywordClassifier`] is
//! the default implementation, a priority-ordered list of phrase rules per
//! locale.

use narrator_core::Intent;

use crate::text_utils::normalize;

/// Maps an utterance to one of the fixed intents.
#[cfg_attr(test, mockall::automock)]
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Option<Intent>;
}

/// How a phrase is compared against the normalised utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    /// The whole utterance must equal the phrase.
    Exact(&'static str),
    /// The utterance must contain the phrase.
    Contains(&'static str),
}

impl Phrase {
    fn matches(self, normalized: &str) -> bool {
        match self {
            Self::Exact(p) => normalized == p,
            Self::Contains(p) => normalized.contains(p),
        }
    }
}

/// First-match-wins phrase table.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Intent, Vec<Phrase>)>,
}

impl KeywordClassifier {
    /// Build a classifier from rules checked in order.
    pub const fn new(rules: Vec<(Intent, Vec<Phrase>)>) -> Self {
        Self { rules }
    }

    /// Korean command phrases.
    ///
    /// "질문" and "퀴즈" only match on their own, so a question that merely
    /// mentions a quiz is not taken as a command.
    pub fn korean() -> Self {
        use Phrase::{Contains, Exact};
        Self::new(vec![
            (
                Intent::GoBack,
                vec![Contains("뒤로"), Contains("이전 화면"), Contains("돌아가")],
            ),
            (
                Intent::OpenQuestion,
                vec![
                    Exact("질문"),
                    Exact("질문하기"),
                    Contains("질문 하기"),
                    Contains("질문해줘"),
                ],
            ),
            (
                Intent::OpenQuiz,
                vec![Exact("퀴즈"), Exact("퀴즈 풀기"), Contains("퀴즈 시작")],
            ),
            (
                Intent::OpenSettings,
                vec![Exact("설정"), Contains("설정 열기"), Contains("설정 화면")],
            ),
            (
                Intent::OpenLibrary,
                vec![Exact("서재"), Contains("내 서재"), Contains("자료 목록")],
            ),
            (
                Intent::Next,
                vec![Contains("다음 챕터"), Contains("다음장"), Exact("다음")],
            ),
            (
                Intent::Prev,
                vec![Contains("이전 챕터"), Contains("앞장"), Exact("이전")],
            ),
            (
                Intent::PlayPause,
                vec![
                    Contains("재생"),
                    Contains("일시정지"),
                    Contains("멈춰"),
                    Contains("정지"),
                ],
            ),
        ])
    }

    /// English command phrases.
    pub fn english() -> Self {
        use Phrase::{Contains, Exact};
        Self::new(vec![
            (
                Intent::GoBack,
                vec![Exact("back"), Contains("go back"), Contains("previous screen")],
            ),
            (
                Intent::OpenQuestion,
                vec![
                    Exact("question"),
                    Contains("ask a question"),
                    Contains("i have a question"),
                ],
            ),
            (
                Intent::OpenQuiz,
                vec![Exact("quiz"), Contains("start quiz"), Contains("take the quiz")],
            ),
            (
                Intent::OpenSettings,
                vec![Exact("settings"), Contains("open settings")],
            ),
            (
                Intent::OpenLibrary,
                vec![Exact("library"), Contains("open library"), Contains("my library")],
            ),
            (
                Intent::Next,
                vec![Exact("next"), Contains("next chapter"), Contains("next section")],
            ),
            (
                Intent::Prev,
                vec![
                    Exact("previous"),
                    Contains("previous chapter"),
                    Contains("previous section"),
                ],
            ),
            (
                Intent::PlayPause,
                vec![
                    Exact("play"),
                    Exact("stop"),
                    Contains("pause"),
                    Contains("resume"),
                    Contains("start reading"),
                    Contains("stop reading"),
                ],
            ),
        ])
    }

    /// Pick a table from a BCP-47 tag. Unknown languages fall back to Korean.
    pub fn for_language(language: &str) -> Self {
        let primary = language.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("en") {
            Self::english()
        } else {
            Self::korean()
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::korean()
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Option<Intent> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| p.matches(&normalized)))
            .map(|(intent, _)| *intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korean_navigation_phrases() {
        let c = KeywordClassifier::korean();
        assert_eq!(c.classify("다음 챕터로 가줘"), Some(Intent::Next));
        assert_eq!(c.classify("다음"), Some(Intent::Next));
        assert_eq!(c.classify("앞장"), Some(Intent::Prev));
        assert_eq!(c.classify("이전"), Some(Intent::Prev));
        assert_eq!(c.classify("뒤로 가기"), Some(Intent::GoBack));
    }

    #[test]
    fn previous_screen_beats_previous_chapter() {
        let c = KeywordClassifier::korean();
        assert_eq!(c.classify("이전 화면"), Some(Intent::GoBack));
    }

    #[test]
    fn bare_question_word_is_a_command_but_a_question_is_not() {
        let c = KeywordClassifier::korean();
        assert_eq!(c.classify("질문"), Some(Intent::OpenQuestion));
        assert_eq!(c.classify("질문해줘"), Some(Intent::OpenQuestion));
        assert_eq!(c.classify("세포막의 질문이 뭐였지"), None);
        assert_eq!(c.classify("퀴즈"), Some(Intent::OpenQuiz));
        assert_eq!(c.classify("퀴즈는 언제 봐"), None);
    }

    #[test]
    fn play_pause_phrases() {
        let c = KeywordClassifier::korean();
        for phrase in ["재생", "일시정지", "멈춰!", "정지해"] {
            assert_eq!(c.classify(phrase), Some(Intent::PlayPause), "{phrase}");
        }
    }

    #[test]
    fn english_table_and_language_selection() {
        let c = KeywordClassifier::for_language("en-US");
        assert_eq!(c.classify("Next chapter, please"), Some(Intent::Next));
        assert_eq!(c.classify("Pause."), Some(Intent::PlayPause));
        assert_eq!(c.classify("go back"), Some(Intent::GoBack));
        assert_eq!(c.classify("what is next on the list"), None);

        let fallback = KeywordClassifier::for_language("ja-JP");
        assert_eq!(fallback.classify("다음"), Some(Intent::Next));
    }

    #[test]
    fn blank_input_is_unclassified() {
        assert_eq!(KeywordClassifier::default().classify("  ?! "), None);
    }
}
