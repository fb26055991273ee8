//! Final-answer extraction for reasoning-model output.
//!
//! Reasoning models tend to answer with the whole derivation. When the
//! user opts in, [`process_model_response`] trims that down to the
//! conclusion. The caller decides what to do with the discarded part;
//! the chat use case shows the full text first and then replaces it.

use regex::Regex;
use std::sync::LazyLock;

static MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\b(?:final answer|answer|conclusion|therefore|thus|hence|result)\b:?\s*(.*?)(?:\n\n|$)",
    )
    .ok()
});

static STEP: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bStep\s+\d+:?\s*").ok());

static CALCULATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:=|\bequals\b|\bis\b)\s*(\d[\d.]*(?:\s*[A-Za-z]+)?)").ok()
});

/// Whether `model` produces separate reasoning (e.g. `deepseek-reasoner`).
pub fn is_reasoning_model(model: &str) -> bool {
    model.to_lowercase().contains("reasoner")
}

/// Extract just the conclusion from a step-by-step response.
///
/// Tried in order: an explicit marker (`Answer:`, `Conclusion:`,
/// `Therefore`, ...), the last `Step N` block, the sentence holding the
/// last computed value, the last paragraph. Falls back to the input.
pub fn extract_final_answer(response: &str) -> String {
    if response.trim().is_empty() {
        return response.to_string();
    }

    if let Some(answer) = marker_answer(response) {
        return answer;
    }
    if let Some(step) = last_step(response) {
        return step;
    }
    if let Some(sentence) = calculation_sentence(response) {
        return sentence;
    }

    response
        .rsplit("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}

/// Apply answer extraction when enabled and the model is a reasoning model.
pub fn process_model_response(response: &str, model: &str, extract_answer_only: bool) -> String {
    if extract_answer_only && is_reasoning_model(model) {
        extract_final_answer(response)
    } else {
        response.to_string()
    }
}

fn marker_answer(response: &str) -> Option<String> {
    let re = MARKER.as_ref()?;
    let captured = re.captures(response)?.get(1)?.as_str();
    let answer = captured
        .trim()
        .trim_start_matches([',', ':', '-'])
        .trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

fn last_step(response: &str) -> Option<String> {
    let re = STEP.as_ref()?;
    let last = re.find_iter(response).last()?;
    let body = response[last.end()..].trim();
    (!body.is_empty()).then(|| body.to_string())
}

fn calculation_sentence(response: &str) -> Option<String> {
    let re = CALCULATION.as_ref()?;
    let value = re.captures_iter(response).last()?.get(1)?.as_str().trim();
    split_sentences(response)
        .into_iter()
        .rev()
        .find(|s| s.contains(value))
        .map(str::to_string)
}

/// Split after `.`, `!` or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?')
            && let Some(&(next_i, next_c)) = chars.peek()
            && next_c.is_whitespace()
        {
            let sentence = text[start..next_i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = next_i;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_wins() {
        let text = "Let me think.\n\nFirst we add.\n\nAnswer: 42\n\nThat is all.";
        assert_eq!(extract_final_answer(text), "42");
    }

    #[test]
    fn test_therefore_marker() {
        let text = "12 times 7 is 84.\nTherefore, the product is 84.";
        assert_eq!(extract_final_answer(text), "the product is 84.");
    }

    #[test]
    fn test_last_step() {
        let text = "Step 1: read the input\nStep 2: add the numbers\nStep 3: report 7";
        assert_eq!(extract_final_answer(text), "report 7");
    }

    #[test]
    fn test_calculation_sentence() {
        let text = "We drive 120 km at 60 km/h. The travel time equals 2 hours. Nice trip!";
        assert_eq!(extract_final_answer(text), "The travel time equals 2 hours.");
    }

    #[test]
    fn test_last_paragraph_fallback() {
        let text = "Some musing here.\n\nAnd a closing remark";
        assert_eq!(extract_final_answer(text), "And a closing remark");
    }

    #[test]
    fn test_trailing_blank_paragraphs_skipped() {
        let text = "First thought.\n\nClosing remark\n\n   \n\n";
        assert_eq!(extract_final_answer(text), "Closing remark");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_final_answer("   "), "   ");
    }

    #[test]
    fn test_process_only_for_reasoners() {
        let text = "Thinking...\n\nAnswer: yes";
        assert_eq!(process_model_response(text, "deepseek-reasoner", true), "yes");
        assert_eq!(process_model_response(text, "deepseek-chat", true), text);
        assert_eq!(process_model_response(text, "deepseek-reasoner", false), text);
    }

    #[test]
    fn test_split_sentences() {
        let parts = split_sentences("One. Two! Three? Four");
        assert_eq!(parts, vec!["One.", "Two!", "Three?", "Four"]);
    }
}
