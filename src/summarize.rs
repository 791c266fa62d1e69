use crate::mail::decoders::normalize_snippet;

const SUMMARY_CHARS: usize = 140;

/// One-line digest: the subject followed by the start of the body.
pub fn summarize_email(subject: &str, body: &str) -> String {
    let snippet = normalize_snippet(body.trim(), SUMMARY_CHARS);
    if snippet.is_empty() {
        return format!("{subject}: (no content)");
    }
    format!("{subject}: {snippet}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_says_so() {
        assert_eq!(summarize_email("Hi", " \n\t"), "Hi: (no content)");
    }

    #[test]
    fn body_is_collapsed_and_cut() {
        let body = format!("line one\n\n  line two {}", "x".repeat(300));
        let out = summarize_email("S", &body);
        assert!(out.starts_with("S: line one line two x"));
        assert_eq!(out.chars().count(), "S: ".len() + SUMMARY_CHARS);
    }
}
