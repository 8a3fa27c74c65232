//! Fixed replies and the trivial-greeting pre-filter

/// Warm reply used for greetings, empty input, no-intent and failed generation
pub const FALLBACK_GREETING: &str = "Welcome, dear one. Speak what troubles your heart.";

/// Reply used when the model quota is exhausted
pub const UNAVAILABLE_MESSAGE: &str =
    "Krishna is momentarily unavailable due to API quota limits. Please try again shortly.";

/// Small talk answered without consulting the model
pub const TRIVIAL_GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hi there",
    "hello there",
    "hey there",
    "namaste",
    "namaskar",
    "how are you",
    "how are you?",
    "what's up",
    "what's up?",
    "good morning",
    "good afternoon",
    "good evening",
    "kaise ho",
    "kaise hain",
];

/// Exact, case-insensitive match against [`TRIVIAL_GREETINGS`]
#[must_use]
pub fn is_trivial_greeting(text: &str) -> bool {
    let folded = text.trim().to_lowercase();
    TRIVIAL_GREETINGS.contains(&folded.as_str())
}
