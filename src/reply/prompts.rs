//! Prompt templates and the output parsing contract
//!
//! The templates are an interface with the model: the classifier depends on
//! the model answering with an `Intent:` line, and both rewriting stages
//! depend on the label prefixes stripped by [`strip_label_artifacts`].
//! Bump [`PROMPT_VERSION`] whenever either side of that contract changes.

use std::sync::LazyLock;

use regex::Regex;

/// Version of the prompt/parsing contract below
pub const PROMPT_VERSION: &str = "2024-06.1";

/// Marker preceding the label in classifier output
pub const INTENT_MARKER: &str = "Intent:";

/// Labels a normalizer answer may be prefixed with
pub const NORMALIZER_LABELS: &[&str] = &["English:", "Normalized:"];

/// Labels a generator answer may be prefixed with
pub const RESPONSE_LABELS: &[&str] = &["Hinglish Response:", "Response:"];

const QUOTES: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}'];

/// Rewrite mixed Hinglish into English
pub fn normalization_prompt(text: &str) -> String {
    format!(
        "Convert this Hinglish (Hindi+English mix) text to clean English while preserving the exact meaning and intent.\n\
         \n\
         Hinglish: {text}\n\
         \n\
         Output ONLY the normalized English text, nothing else:"
    )
}

/// Classify a concern into one of the closed intent categories
pub fn intent_prompt(text: &str) -> String {
    format!(
        r#"You are a spiritual intent classifier for Lord Krishna's guidance system.

CRITICAL RULES:
1. First, determine if the user input is ONLY a casual greeting, small talk, or filler (e.g., "Hi", "Hello", "How are you", "Hey", "What's up", "Good morning", etc.)
2. If it is ONLY a greeting/small talk with NO spiritual concern or personal problem, classify as: "No-Intent / Casual Greeting"
3. ONLY classify into spiritual intent categories if the user expresses a genuine personal problem, struggle, question, or concern that requires spiritual guidance.

SPIRITUAL INTENT CATEGORIES (use ONLY for meaningful personal problems):
- Career/Purpose: Questions about life purpose, career confusion, professional struggles, calling
- Relationships: Interpersonal conflicts, family issues, romantic struggles, friendship problems
- Inner Conflict: Self-doubt, guilt, moral dilemmas, inner turmoil, spiritual confusion
- Life Transitions: Major life changes, loss, grief, moving, career shifts, identity crises
- Daily Struggles: Stress, anxiety, overwhelm, daily challenges affecting well-being

CLASSIFICATION LOGIC:
- "Hi", "Hello", "How are you" → No-Intent / Casual Greeting
- "Hi, I'm struggling with my career" → Career/Purpose
- "Hello, my relationship is falling apart" → Relationships
- "Hey, I feel lost" → Inner Conflict (if expressing genuine struggle)
- "What's up?" → No-Intent / Casual Greeting
- "Good morning, I need guidance" → Check if there's a real concern, otherwise No-Intent

Format your response as:
{INTENT_MARKER} <category or "No-Intent / Casual Greeting">

User: {text}
"#
    )
}

/// Answer a classified concern in the persona's Hinglish voice
pub fn response_prompt(intent: &str, text: &str) -> String {
    format!(
        r#"You are Lord Krishna speaking to a devotee. The user has expressed a concern classified as: {intent}

CRITICAL: Respond ONLY in warm, natural Hinglish (Hindi + English mix). This is how modern Indians speak - mixing Hindi and English naturally.

RESPONSE REQUIREMENTS:
1. Use warm, compassionate Hinglish (e.g., "Arjun", "beta", "tumhara", "yeh", "voh", "hain", "hai", "ka", "ki", "ko", "se", "mein", "par")
2. Mix Hindi and English naturally like: "Yeh Career/Purpose ka vichaar hai. Arjun, jo tumhara man sach mein chahta hai, wahi tumhara dharm hai."
3. Be spiritually wise but conversational
4. Address their specific concern with empathy
5. Keep response concise (2-3 sentences max for voice)

EXAMPLES:
- Career/Purpose: "Yeh Career/Purpose ka vichaar hai. Arjun, jo tumhara man sach mein chahta hai, wahi tumhara dharm hai. Karma karo, phal ki chinta mat karo."
- Relationships: "Yeh Relationships ka mudda hai. Prem aur samman dono zaroori hain. Jab tum apne aap ko samjho, tabhi doosron ko bhi samajh sakte ho."
- Inner Conflict: "Yeh Inner Conflict hai. Jab man mein confusion ho, toh dhyan se suno apne andar ki awaaz. Satya hamesha jeetega."
- Life Transitions: "Yeh Life Transitions ka samay hai. Parivartan hi sansaar ka niyam hai, beta. Jo chala gaya uska shok mat karo, jo aane wala hai uska swagat karo."
- Daily Struggles: "Yeh Daily Struggles ki baat hai. Har din ek naya yudh hai, Arjun. Saans lo, apna karma karo, aur baaki mujh par chhod do."

User's concern: {text}

Respond in warm Hinglish:
"#
    )
}

static LABEL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    NORMALIZER_LABELS
        .iter()
        .chain(RESPONSE_LABELS)
        .filter_map(|label| {
            Regex::new(&format!(r"(?i)^\s*{}", regex::escape(label)))
                .ok()
                .map(|re| (*label, re))
        })
        .collect()
});

/// Strip a leading label from model output, then surrounding quotes
///
/// Only the labels listed in `labels` are considered. Returns an empty
/// string when nothing but artifacts remain.
#[must_use]
pub fn strip_label_artifacts(raw: &str, labels: &[&str]) -> String {
    let mut text = raw.trim();

    if let Some((_, re)) = LABEL_PATTERNS
        .iter()
        .find(|(label, re)| labels.contains(label) && re.is_match(text))
    {
        let end = re.find(text).map_or(0, |m| m.end());
        text = text[end..].trim();
    }

    text.trim_matches(|c: char| QUOTES.contains(&c)).trim().to_string()
}

/// Extract the label following [`INTENT_MARKER`] from classifier output
///
/// Uses the first line carrying the marker; `None` when no line does.
#[must_use]
pub fn extract_intent_label(raw: &str) -> Option<String> {
    raw.lines()
        .find(|line| line.contains(INTENT_MARKER))
        .and_then(|line| line.rsplit(INTENT_MARKER).next())
        .map(|label| {
            label
                .trim_matches(|c: char| c.is_whitespace() || c == '*' || QUOTES.contains(&c))
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_normalizer_labels_and_quotes() {
        assert_eq!(
            strip_label_artifacts("English: \"I feel lost\"", NORMALIZER_LABELS),
            "I feel lost"
        );
        assert_eq!(
            strip_label_artifacts("normalized:   my job is hard", NORMALIZER_LABELS),
            "my job is hard"
        );
        assert_eq!(strip_label_artifacts("'quoted'", NORMALIZER_LABELS), "quoted");
    }

    #[test]
    fn strips_response_labels() {
        assert_eq!(
            strip_label_artifacts("Hinglish Response: \"Beta, shanti rakho.\"", RESPONSE_LABELS),
            "Beta, shanti rakho."
        );
        assert_eq!(
            strip_label_artifacts("RESPONSE: Karma karo.", RESPONSE_LABELS),
            "Karma karo."
        );
    }

    #[test]
    fn labels_of_other_stage_are_kept() {
        assert_eq!(
            strip_label_artifacts("Response: keep me", NORMALIZER_LABELS),
            "Response: keep me"
        );
    }

    #[test]
    fn label_only_output_becomes_empty() {
        assert_eq!(strip_label_artifacts("Response: \"\"", RESPONSE_LABELS), "");
        assert_eq!(strip_label_artifacts("   ", RESPONSE_LABELS), "");
    }

    #[test]
    fn label_inside_text_is_not_stripped() {
        assert_eq!(
            strip_label_artifacts("My English: is weak", NORMALIZER_LABELS),
            "My English: is weak"
        );
    }

    #[test]
    fn extracts_intent_line() {
        let raw = "Let me think.\nIntent: Career/Purpose\nBecause...";
        assert_eq!(extract_intent_label(raw).as_deref(), Some("Career/Purpose"));
    }

    #[test]
    fn extracts_decorated_intent_line() {
        assert_eq!(
            extract_intent_label("**Intent:** \"Inner Conflict\"").as_deref(),
            Some("Inner Conflict")
        );
    }

    #[test]
    fn missing_marker_yields_none() {
        assert_eq!(extract_intent_label("Career/Purpose"), None);
        assert_eq!(extract_intent_label(""), None);
    }

    #[test]
    fn prompts_embed_user_text() {
        assert!(normalization_prompt("mera mann").contains("Hinglish: mera mann"));
        assert!(intent_prompt("I feel lost").contains("User: I feel lost"));
        let prompt = response_prompt("Relationships", "my partner left");
        assert!(prompt.contains("classified as: Relationships"));
        assert!(prompt.contains("User's concern: my partner left"));
    }
}
