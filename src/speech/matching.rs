//! Transcript-vs-target judgement shared by every evaluator.

use super::Verdict;

const CORRECT_FEEDBACK: &str = "Excellent pronunciation!";
const INCORRECT_FEEDBACK: &str = "Try again. Listen carefully to the pronunciation.";
const EMPTY_FEEDBACK: &str = "We could not hear anything. Press the microphone and try again.";

/// Shared words shorter than this do not count as a partial match.
const MIN_SHARED_WORD_LEN: usize = 4;

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '\''))
        .filter(|word| !word.is_empty())
}

/// Judge what the learner said against the phrase they were asked to repeat.
///
/// Lenient on purpose for young learners: either text containing the other counts, and so does
/// sharing one word of four or more characters.
pub fn judge(transcript: &str, target: &str) -> Verdict {
    let heard = normalize(transcript);
    let expected = normalize(target);

    if heard.is_empty() {
        return Verdict {
            is_correct: false,
            confidence: 0.0,
            feedback: EMPTY_FEEDBACK.into(),
            transcript: heard,
        };
    }

    let shares_long_word = words(&heard)
        .any(|word| word.chars().count() >= MIN_SHARED_WORD_LEN && expected.contains(word));
    let is_correct = heard.contains(&expected) || expected.contains(&heard) || shares_long_word;

    let confidence = if heard == expected {
        1.0
    } else {
        word_coverage(&heard, &expected)
    };

    Verdict {
        is_correct,
        confidence,
        feedback: if is_correct {
            CORRECT_FEEDBACK
        } else {
            INCORRECT_FEEDBACK
        }
        .into(),
        transcript: heard,
    }
}

/// Fraction of target words that also appear in the transcript.
fn word_coverage(heard: &str, expected: &str) -> f32 {
    let heard_words: Vec<&str> = words(heard).collect();
    let expected_words: Vec<&str> = words(expected).collect();
    if expected_words.is_empty() {
        return 0.0;
    }
    let hits = expected_words
        .iter()
        .filter(|word| heard_words.contains(word))
        .count();
    hits as f32 / expected_words.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_ignores_case_and_padding() {
        let verdict = judge("  The Sky is Blue ", "The sky is blue");
        assert!(verdict.is_correct);
        assert_eq!(verdict.confidence, 1.0);
        assert_eq!(verdict.transcript, "the sky is blue");
    }

    #[test]
    fn containment_either_way_is_correct() {
        assert!(judge("i said apple", "apple").is_correct);
        assert!(judge("the dog", "The dog is running").is_correct);
    }

    #[test]
    fn one_long_shared_word_is_enough() {
        let verdict = judge("rabbit hop", "The rabbit liked to hop and play");
        assert!(verdict.is_correct);
        assert!(verdict.confidence > 0.0 && verdict.confidence < 1.0);
    }

    #[test]
    fn short_shared_words_do_not_count() {
        let verdict = judge("a cat sat", "The dog is running");
        assert!(!verdict.is_correct);
        assert_eq!(verdict.feedback, INCORRECT_FEEDBACK);
    }

    #[test]
    fn empty_transcript_is_incorrect() {
        let verdict = judge("   ", "apple");
        assert!(!verdict.is_correct);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn hindi_phrases_are_matched() {
        assert!(judge("आकाश नीला है", "आकाश नीला है").is_correct);
    }
}
