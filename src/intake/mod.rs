// Case-intake pipeline: raw text -> best-effort extraction -> case seed.
//
// Two entry points (authenticated manual entry and the signed webhook)
// converge on the same transition. Extraction failure of any kind
// downgrades to defaults; the caller never sees a parser error.

pub mod parser;

pub use parser::{default_parser, EmailParser, ParsedEmail, ParserError};

pub const DEFAULT_TITLE: &str = "Untitled case";
pub const DEFAULT_CANDIDATE_NAME: &str = "Unknown candidate";
pub const DEFAULT_STAGE: &str = "1st Interview";
pub const DEFAULT_STATUS: &str = "Scheduling";

/// Fully-populated case fields after merging overrides, extraction output
/// and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSeed {
    pub title: String,
    pub candidate_name: String,
    pub stage: String,
    pub status: String,
}

/// Run extraction, treating every failure as the empty record. The cause
/// is logged server-side only.
pub async fn extract_or_default(parser: &dyn EmailParser, text: &str) -> ParsedEmail {
    match parser.extract(text).await {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("Email extraction failed, falling back to defaults: {}", err);
            ParsedEmail::default()
        }
    }
}

/// Merge precedence: caller overrides, then extracted fields, then
/// defaults. Blank strings count as absent.
pub fn merge(overrides: &ParsedEmail, parsed: &ParsedEmail) -> CaseSeed {
    CaseSeed {
        title: pick(&overrides.title, &parsed.title, DEFAULT_TITLE),
        candidate_name: pick(
            &overrides.candidate_name,
            &parsed.candidate_name,
            DEFAULT_CANDIDATE_NAME,
        ),
        stage: pick(&overrides.stage, &parsed.stage, DEFAULT_STAGE),
        status: pick(&overrides.status, &parsed.status, DEFAULT_STATUS),
    }
}

fn pick(first: &Option<String>, second: &Option<String>, fallback: &str) -> String {
    present(first)
        .or_else(|| present(second))
        .unwrap_or(fallback)
        .to_string()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(title: Option<&str>, candidate: Option<&str>) -> ParsedEmail {
        ParsedEmail {
            title: title.map(String::from),
            candidate_name: candidate.map(String::from),
            stage: None,
            status: None,
        }
    }

    #[test]
    fn test_merge_all_defaults_on_empty_extraction() {
        let seed = merge(&ParsedEmail::default(), &ParsedEmail::default());
        assert_eq!(seed.title, DEFAULT_TITLE);
        assert_eq!(seed.candidate_name, DEFAULT_CANDIDATE_NAME);
        assert_eq!(seed.stage, DEFAULT_STAGE);
        assert_eq!(seed.status, DEFAULT_STATUS);
    }

    #[test]
    fn test_merge_prefers_extracted_fields_over_defaults() {
        let seed = merge(
            &ParsedEmail::default(),
            &parsed(Some("Data Engineer"), Some("Aya Tanaka")),
        );
        assert_eq!(seed.title, "Data Engineer");
        assert_eq!(seed.candidate_name, "Aya Tanaka");
        assert_eq!(seed.stage, DEFAULT_STAGE);
    }

    #[test]
    fn test_merge_overrides_win_over_extraction() {
        let overrides = parsed(Some("From webhook"), None);
        let extracted = parsed(Some("From model"), Some("Aya Tanaka"));
        let seed = merge(&overrides, &extracted);
        assert_eq!(seed.title, "From webhook");
        assert_eq!(seed.candidate_name, "Aya Tanaka");
    }

    #[test]
    fn test_merge_treats_blank_strings_as_absent() {
        let overrides = parsed(Some("   "), None);
        let extracted = parsed(Some(""), None);
        let seed = merge(&overrides, &extracted);
        assert_eq!(seed.title, DEFAULT_TITLE);
    }

    #[tokio::test]
    async fn test_extraction_failure_downgrades_to_empty() {
        struct FailingParser;

        #[async_trait::async_trait]
        impl EmailParser for FailingParser {
            async fn extract(&self, _text: &str) -> Result<ParsedEmail, ParserError> {
                Err(ParserError::NotConfigured)
            }
        }

        let parsed = extract_or_default(&FailingParser, "some email text").await;
        assert_eq!(parsed, ParsedEmail::default());
    }
}
