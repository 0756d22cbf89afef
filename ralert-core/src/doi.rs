//! Identifier handling: DOIs and ORCID iDs
//!
//! Only DOIs (prefix `10.`) are resolvable. The OSF namespace is excluded
//! because Crossref does not reliably carry retraction metadata for it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix shared by every DOI
pub const DOI_PREFIX: &str = "10.";

/// Namespaces that always resolve to `unknown`
pub const EXCLUDED_NAMESPACES: &[&str] = &["osf.io/"];

static DOI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"10\.\d{4,9}/[^\s"'>?#)]+"#).expect("DOI pattern is a valid regex")
});

static ORCID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$").expect("ORCID pattern is a valid regex"));

/// Trim and lower-case a DOI
pub fn normalize_doi(id: &str) -> String {
    id.trim().to_lowercase()
}

/// True when the id starts with the DOI prefix
pub fn is_doi(id: &str) -> bool {
    id.trim().starts_with(DOI_PREFIX)
}

/// True when a status lookup may be sent upstream for the id
pub fn is_resolvable(id: &str) -> bool {
    if !is_doi(id) {
        return false;
    }
    let normalized = normalize_doi(id);
    !EXCLUDED_NAMESPACES.iter().any(|ns| normalized.contains(ns))
}

/// `https://doi.org/` link for a DOI; absolute URLs pass through
pub fn doi_url(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        id.to_string()
    } else {
        format!("https://doi.org/{}", id)
    }
}

/// Find the first DOI in a link or text fragment
///
/// The input is percent-decoded first; malformed escapes yield `None`.
/// Trailing `]` and `.` are stripped since they usually belong to the
/// surrounding prose.
pub fn extract_doi(text: &str) -> Option<String> {
    let decoded = percent_decode(text)?;
    let found = DOI_PATTERN.find(&decoded)?;
    let doi = found.as_str().trim_end_matches([']', '.']);
    if doi.is_empty() {
        None
    } else {
        Some(doi.to_string())
    }
}

/// DOI carried in the path of a `doi.org` URL
pub fn doi_from_doi_org(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if !host.ends_with("doi.org") {
        return None;
    }
    let path = percent_decode(parsed.path().trim_start_matches('/'))?;
    let doi = path.trim();
    if doi.is_empty() {
        None
    } else {
        Some(doi.to_string())
    }
}

/// Canonical ORCID iD from a bare id or an orcid.org URL
///
/// Checks the shape and the ISO 7064 MOD 11-2 check character.
pub fn parse_orcid_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let bare = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.orcid.org/")
        .trim_start_matches("orcid.org/")
        .trim_end_matches('/')
        .to_uppercase();

    if !ORCID_PATTERN.is_match(&bare) {
        return None;
    }

    let digits: Vec<char> = bare.chars().filter(|c| *c != '-').collect();
    let mut total: u32 = 0;
    for c in &digits[..15] {
        total = (total + c.to_digit(10)?) * 2;
    }
    let check = (12 - total % 11) % 11;
    let expected = if check == 10 {
        'X'
    } else {
        char::from_digit(check, 10)?
    };

    if digits[15] == expected {
        Some(bare)
    } else {
        None
    }
}

pub fn is_orcid_id(input: &str) -> bool {
    parse_orcid_id(input).is_some()
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            // from_str_radix alone would accept a sign
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_doi_ids_are_not_resolvable() {
        assert!(!is_resolvable("38012345"));
        assert!(!is_resolvable("PMC1234567"));
        assert!(!is_resolvable(""));
        assert!(is_resolvable("10.1038/s41586-024-07219-0"));
        assert!(is_resolvable("  10.1038/ABC  "));
    }

    #[test]
    fn test_osf_namespace_excluded() {
        assert!(is_doi("10.31219/osf.io/abcde"));
        assert!(!is_resolvable("10.31219/osf.io/abcde"));
        assert!(!is_resolvable("10.31219/OSF.IO/ABCDE"));
    }

    #[test]
    fn test_normalize_lowercases() {
        assert_eq!(normalize_doi(" 10.1038/S41586 "), "10.1038/s41586");
    }

    #[test]
    fn test_extract_doi_from_encoded_href() {
        let href = "https://doi.org/10.1007%2Fs10668-019-00320-9#refs";
        assert_eq!(extract_doi(href).as_deref(), Some("10.1007/s10668-019-00320-9"));

        let href = "https://example.org/link?doi=10.1038%2Fs41586-024-07219-0";
        assert_eq!(extract_doi(href).as_deref(), Some("10.1038/s41586-024-07219-0"));
    }

    #[test]
    fn test_extract_doi_strips_trailing_punctuation() {
        let text = "see [10.1000/xyz123].";
        assert_eq!(extract_doi(text).as_deref(), Some("10.1000/xyz123"));
    }

    #[test]
    fn test_extract_doi_rejects_malformed_escape() {
        assert_eq!(extract_doi("10.1000/abc%G1"), None);
        assert_eq!(extract_doi("10.1000/abc%+1"), None);
        assert_eq!(extract_doi("10.1000/abc%-1"), None);
        assert_eq!(extract_doi("10.1000/abc%2"), None);
        assert_eq!(extract_doi("10.1000/a%2Fb").as_deref(), Some("10.1000/a/b"));
        assert_eq!(extract_doi("no identifier here"), None);
    }

    #[test]
    fn test_doi_from_doi_org() {
        assert_eq!(
            doi_from_doi_org("https://doi.org/10.1007/s10668-019-00320-9").as_deref(),
            Some("10.1007/s10668-019-00320-9")
        );
        assert_eq!(doi_from_doi_org("https://example.org/10.1/x"), None);
        assert_eq!(doi_from_doi_org("https://doi.org/"), None);
    }

    #[test]
    fn test_doi_url() {
        assert_eq!(doi_url("10.1/x"), "https://doi.org/10.1/x");
        assert_eq!(doi_url("https://doi.org/10.1/x"), "https://doi.org/10.1/x");
    }

    #[test]
    fn test_parse_orcid_id() {
        assert_eq!(
            parse_orcid_id("0000-0002-1825-0097").as_deref(),
            Some("0000-0002-1825-0097")
        );
        assert_eq!(
            parse_orcid_id("https://orcid.org/0000-0002-1694-233x").as_deref(),
            Some("0000-0002-1694-233X")
        );
        assert_eq!(
            parse_orcid_id("https://www.orcid.org/0000-0002-1825-0097/").as_deref(),
            Some("0000-0002-1825-0097")
        );
        assert_eq!(
            parse_orcid_id("www.orcid.org/0000-0002-1825-0097").as_deref(),
            Some("0000-0002-1825-0097")
        );
        // Bad check digit
        assert_eq!(parse_orcid_id("0000-0002-1825-0098"), None);
        assert_eq!(parse_orcid_id("1234"), None);
        assert!(is_orcid_id("0000-0002-1825-0097"));
        assert!(!is_orcid_id("0000-0002-1825-009"));
    }
}
