//! Gemini reply parsing into summary and question sections.
//!
//! The model is prompted to answer with `**Summary:**` and `**Question:**`
//! sections, but real replies drift: markers change case, swap order, or go
//! missing entirely. Parsing is forgiving and always yields a structurally
//! complete [`Analysis`]; transport and server failures are folded in via
//! [`Analysis::failure`] so callers never deal with a half-built result.

/// Markers that introduce the summary section, in match priority order.
const SUMMARY_MARKERS: [&str; 2] = ["**summary:**", "summary:"];

/// Markers that introduce the question section, in match priority order.
const QUESTION_MARKERS: [&str; 3] = [
    "**question:**",
    "**multiple choice question:**",
    "question:",
];

/// Fallback question when the reply carried a summary but no question.
const FALLBACK_QUESTION_SUMMARY_ONLY: &str =
    "What is the main concept shown?\nA) Option A\nB) Option B\nC) Option C\nD) Option D";

/// Fallback question when no markers were recognized at all.
const FALLBACK_QUESTION_NO_MARKERS: &str =
    "What is the main idea in this image?\nA) Option A\nB) Option B\nC) Option C\nD) Option D";

/// Fallback question for failed analysis runs.
const FALLBACK_QUESTION_ERROR: &str =
    "What do you see in this image?\nA) Option A\nB) Option B\nC) Option C\nD) Option D";

const NO_SUMMARY: &str = "No summary available.";
const NO_QUESTION: &str = "No question generated.";

/// Outcome of one image analysis.
///
/// Always structurally complete: `summary` and `question` are non-empty even
/// when the model reply was degenerate or the call failed. `success == false`
/// means `summary` holds a human-readable error description and `question`
/// the generic fallback.
#[derive(Debug, Clone)]
pub(crate) struct Analysis {
    pub(crate) summary: String,
    pub(crate) question: String,
    pub(crate) raw_response: String,
    pub(crate) success: bool,
}

impl Analysis {
    /// Build a successful analysis from the raw model reply.
    pub(crate) fn from_reply(reply: &str) -> Self {
        let (summary, question) = split_reply(reply);
        Self {
            summary: non_empty_or(summary, NO_SUMMARY),
            question: non_empty_or(question, NO_QUESTION),
            raw_response: reply.to_string(),
            success: true,
        }
    }

    /// Build a failed analysis from any error.
    pub(crate) fn failure(error: impl std::fmt::Display) -> Self {
        let detail = error.to_string();
        Self {
            summary: format!("Error during image analysis: {}", detail),
            question: FALLBACK_QUESTION_ERROR.to_string(),
            raw_response: detail,
            success: false,
        }
    }
}

/// Split the reply into `(summary, question)` around the section markers.
///
/// Marker search is case-insensitive; each marker list is tried in priority
/// order and the first hit wins. Offsets point past the matched marker, so
/// when the summary section precedes the question section the summary slice
/// absorbs the question marker text and it is stripped back out afterwards.
fn split_reply(reply: &str) -> (String, String) {
    let summary_hit = find_marker(reply, &SUMMARY_MARKERS);
    let question_hit = find_marker(reply, &QUESTION_MARKERS);

    let (summary, question) = match (summary_hit, question_hit) {
        (Some((_, sum_content)), Some((_, quest_content))) => {
            if sum_content < quest_content {
                let mut summary = reply[sum_content..quest_content].trim().to_string();
                for marker in QUESTION_MARKERS {
                    summary = remove_ignore_ascii_case(&summary, marker);
                }
                let summary = summary.trim().trim_end_matches('*').trim().to_string();
                (summary, reply[quest_content..].trim().to_string())
            } else {
                let question = reply[quest_content..sum_content].trim().to_string();
                (reply[sum_content..].trim().to_string(), question)
            }
        }
        (Some((_, sum_content)), None) => (
            reply[sum_content..].trim().to_string(),
            FALLBACK_QUESTION_SUMMARY_ONLY.to_string(),
        ),
        (None, Some((quest_match, quest_content))) => (
            reply[..quest_match].trim().to_string(),
            reply[quest_content..].trim().to_string(),
        ),
        (None, None) => (
            reply.trim().to_string(),
            FALLBACK_QUESTION_NO_MARKERS.to_string(),
        ),
    };

    (strip_stars(&summary), strip_stars(&question))
}

/// Find the first marker from `markers` present in `haystack`.
///
/// Returns `(match_start, content_start)` byte offsets. All markers are
/// ASCII, so both offsets are guaranteed char boundaries in `haystack`.
fn find_marker(haystack: &str, markers: &[&str]) -> Option<(usize, usize)> {
    for marker in markers {
        if let Some(idx) = find_ignore_ascii_case(haystack, marker) {
            return Some((idx, idx + marker.len()));
        }
    }
    None
}

/// Byte offset of the first case-insensitive occurrence of an ASCII needle.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Remove every case-insensitive occurrence of an ASCII needle.
fn remove_ignore_ascii_case(text: &str, needle: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = find_ignore_ascii_case(rest, needle) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + needle.len()..];
    }
    out.push_str(rest);
    out
}

fn strip_stars(text: &str) -> String {
    text.trim().trim_matches('*').trim().to_string()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_then_question() {
        let reply = "**Summary:**\nPhotosynthesis converts light into chemical energy.\n\n\
**Question:**\nWhat does photosynthesis produce?\nA) Light\nB) Glucose\nC) Soil\nD) Heat\n\n\
**Correct Answer:** B";

        let analysis = Analysis::from_reply(reply);
        assert!(analysis.success);
        assert_eq!(
            analysis.summary,
            "Photosynthesis converts light into chemical energy."
        );
        assert!(analysis
            .question
            .starts_with("What does photosynthesis produce?"));
        assert!(analysis.question.contains("Correct Answer:"));
        assert_eq!(analysis.raw_response, reply);
    }

    #[test]
    fn test_parse_question_before_summary() {
        let reply = "**Question:**\nWhich planet is red?\nA) Mars\nB) Venus\nC) Earth\nD) Pluto\n\n\
**Summary:**\nMars appears red due to iron oxide.";

        let analysis = Analysis::from_reply(reply);
        assert!(analysis.success);
        assert_eq!(analysis.summary, "Mars appears red due to iron oxide.");
        assert!(analysis.question.contains("Which planet is red?"));
        assert!(analysis.question.contains("D) Pluto"));
    }

    #[test]
    fn test_parse_no_markers_uses_whole_reply_as_summary() {
        let reply = "A diagram of the water cycle with labeled arrows.";

        let analysis = Analysis::from_reply(reply);
        assert!(analysis.success);
        assert_eq!(analysis.summary, reply);
        assert_eq!(analysis.question, FALLBACK_QUESTION_NO_MARKERS);
    }

    #[test]
    fn test_parse_summary_only_falls_back_question() {
        let reply = "**Summary:** The water cycle moves water through evaporation and rain.";

        let analysis = Analysis::from_reply(reply);
        assert_eq!(
            analysis.summary,
            "The water cycle moves water through evaporation and rain."
        );
        assert_eq!(analysis.question, FALLBACK_QUESTION_SUMMARY_ONLY);
    }

    #[test]
    fn test_parse_question_only_keeps_leading_text_as_summary() {
        let reply = "Intro text about cells.\n**Question:**\nWhat is the powerhouse of the \
cell?\nA) Nucleus\nB) Mitochondria\nC) Ribosome\nD) Golgi";

        let analysis = Analysis::from_reply(reply);
        assert_eq!(analysis.summary, "Intro text about cells.");
        assert!(analysis
            .question
            .starts_with("What is the powerhouse of the cell?"));
        assert!(!analysis.summary.contains("Question"));
    }

    #[test]
    fn test_parse_title_case_markers() {
        let reply = "Summary: Plants need sunlight.\nQuestion: What do plants need?\n\
A) Darkness\nB) Sunlight\nC) Sand\nD) Smoke";

        let analysis = Analysis::from_reply(reply);
        assert_eq!(analysis.summary, "Plants need sunlight.");
        assert!(analysis.question.starts_with("What do plants need?"));
    }

    #[test]
    fn test_parse_multiple_choice_question_marker() {
        let reply = "**Summary:** Volcanoes release magma.\n\n\
**Multiple Choice Question:** Which rock forms from lava?\nA) Basalt\nB) Chalk\nC) Marble\nD) Slate";

        let analysis = Analysis::from_reply(reply);
        assert_eq!(analysis.summary, "Volcanoes release magma.");
        assert!(analysis.question.starts_with("Which rock forms from lava?"));
    }

    #[test]
    fn test_parse_strips_decorative_stars() {
        let reply = "**Summary:** *Energy flows through food chains.*\n\n\
**Question:** *Which way does energy flow?*\nA) Up\nB) Down\nC) Both\nD) None";

        let analysis = Analysis::from_reply(reply);
        assert_eq!(analysis.summary, "Energy flows through food chains.");
        assert!(analysis.question.starts_with("Which way does energy flow?"));
    }

    #[test]
    fn test_empty_reply_backfills_both_fields() {
        let analysis = Analysis::from_reply("");
        assert!(analysis.success);
        assert_eq!(analysis.summary, NO_SUMMARY);
        assert!(!analysis.question.is_empty());

        let analysis = Analysis::from_reply("**Summary:**");
        assert_eq!(analysis.summary, NO_SUMMARY);
        assert_eq!(analysis.question, FALLBACK_QUESTION_SUMMARY_ONLY);
    }

    #[test]
    fn test_failure_is_structurally_complete() {
        let analysis = Analysis::failure("connection refused");
        assert!(!analysis.success);
        assert_eq!(
            analysis.summary,
            "Error during image analysis: connection refused"
        );
        assert_eq!(analysis.question, FALLBACK_QUESTION_ERROR);
        assert_eq!(analysis.raw_response, "connection refused");
    }

    #[test]
    fn test_remove_ignore_ascii_case() {
        assert_eq!(
            remove_ignore_ascii_case("before Question: after QUESTION: end", "question:"),
            "before  after  end"
        );
        assert_eq!(remove_ignore_ascii_case("untouched", "question:"), "untouched");
    }
}
