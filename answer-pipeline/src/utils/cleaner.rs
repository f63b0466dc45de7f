use once_cell::sync::Lazy;
use regex::Regex;

/// Replies shorter than this that contain a refusal phrase are discarded.
const REFUSAL_MAX_CHARS: usize = 30;

static CLEANUP_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\*\*([^*]+)\*\*", "$1"),
        (r"\*([^*]+)\*", "$1"),
        (r"\*+", ""),
        (r"\n\s*\n\s*\n", "\n\n"),
        (r"\s+", " "),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

const REFUSAL_PHRASES: [&str; 8] = [
    "لا يمكنني تشخيص",
    "لا أستطيع تقديم تشخيص طبي",
    "أعتذر، لا يمكنني",
    "غير قادر على تقديم معلومات طبية",
    "i cannot diagnose",
    "i can't diagnose",
    "i cannot provide medical",
    "i'm unable to provide medical",
];

const FAILURE_MARKERS: [&str; 4] = [
    "غير قادر على توليد استجابة",
    "لا يمكنني تقديم",
    "unable to generate a response",
    "i cannot provide",
];

/// Strips markdown emphasis and collapses whitespace. Short refusals become empty.
pub fn clean(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut text = raw.to_string();
    for (re, replacement) in CLEANUP_RULES.iter() {
        text = re.replace_all(&text, *replacement).into_owned();
    }
    let text = text.trim().to_string();

    if text.chars().count() < REFUSAL_MAX_CHARS && is_refusal(&text) {
        return String::new();
    }
    text
}

pub fn is_refusal(text: &str) -> bool {
    let lowered = text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|p| lowered.contains(p))
}

/// Markers that a directive-stage reply is itself a failure notice.
pub fn contains_failure_marker(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FAILURE_MARKERS.iter().any(|m| lowered.contains(m))
}
