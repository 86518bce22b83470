use regex::Regex;
use tracing::warn;

use crate::models::SubstitutionEntry;

/// Document text after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Number of `src` attributes replaced.
    pub replacements: usize,
}

struct Claim<'a> {
    start: usize,
    end: usize,
    local_path: &'a str,
}

impl Claim<'_> {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.end && self.start < end
    }
}

/// Replace `src="<url>"` / `src='<url>'` (any case, optional spaces around
/// `=`) for every entry with `src="<local path>"`.
///
/// Matches are located against the original text, longest URL first, and a
/// span claimed by one entry is never claimed again. The output is then built
/// in a single pass, so replacement text is never searched.
pub fn rewrite_sources(document: &str, entries: &[SubstitutionEntry]) -> Rewrite {
    let mut ordered: Vec<&SubstitutionEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| b.original_url.len().cmp(&a.original_url.len()));

    let mut claims: Vec<Claim<'_>> = Vec::new();
    for entry in ordered {
        let pattern = match source_pattern(&entry.original_url) {
            Ok(re) => re,
            Err(e) => {
                warn!(url = %entry.original_url, error = %e, "skipping unmatchable url");
                continue;
            }
        };
        for m in pattern.find_iter(document) {
            if claims.iter().any(|c| c.overlaps(m.start(), m.end())) {
                continue;
            }
            claims.push(Claim {
                start: m.start(),
                end: m.end(),
                local_path: &entry.local_path,
            });
        }
    }

    claims.sort_by_key(|c| c.start);

    let mut text = String::with_capacity(document.len());
    let mut cursor = 0;
    for claim in &claims {
        text.push_str(&document[cursor..claim.start]);
        text.push_str("src=\"");
        text.push_str(claim.local_path);
        text.push('"');
        cursor = claim.end;
    }
    text.push_str(&document[cursor..]);

    Rewrite {
        text,
        replacements: claims.len(),
    }
}

/// Literal `src=` attribute pattern for one URL, either quote style. The
/// attribute name is case-insensitive and `=` may be padded, as HTML allows.
/// Parsers hand back entity-decoded values, so the `&amp;` spelling matches too.
fn source_pattern(url: &str) -> Result<Regex, regex::Error> {
    let mut spellings = vec![regex::escape(url)];
    let encoded = url.replace('&', "&amp;");
    if encoded != url {
        spellings.push(regex::escape(&encoded));
    }
    Regex::new(&format!(
        r#"(?i:src)\s*=\s*["'](?:{})["']"#,
        spellings.join("|")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, local: &str) -> SubstitutionEntry {
        SubstitutionEntry {
            original_url: url.to_string(),
            local_path: local.to_string(),
        }
    }

    #[test]
    fn shared_prefix_urls_are_replaced_independently() {
        let doc = r#"<img src="https://a.com/x.png"> <img src="https://a.com/x.png?v=2">"#;
        let entries = vec![
            entry("https://a.com/x.png", "images/image_f513f2d56c.png"),
            entry("https://a.com/x.png?v=2", "images/image_05d0b62e2f.png"),
        ];
        let out = rewrite_sources(doc, &entries);
        assert_eq!(
            out.text,
            r#"<img src="images/image_f513f2d56c.png"> <img src="images/image_05d0b62e2f.png">"#
        );
        assert_eq!(out.replacements, 2);
    }

    #[test]
    fn entry_order_does_not_matter() {
        let doc = r#"<img src="https://a.com/x.png?v=2"><img src="https://a.com/x.png">"#;
        let forward = vec![
            entry("https://a.com/x.png", "s.png"),
            entry("https://a.com/x.png?v=2", "l.png"),
        ];
        let backward: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(rewrite_sources(doc, &forward), rewrite_sources(doc, &backward));
        assert_eq!(
            rewrite_sources(doc, &forward).text,
            r#"<img src="l.png"><img src="s.png">"#
        );
    }

    #[test]
    fn special_characters_match_literally() {
        let doc = r#"<img src="https://a.com/img.php?w=100&h=200"><img src="https://a.com/imgXphp?w=100&h=200">"#;
        let entries = vec![entry("https://a.com/img.php?w=100&h=200", "images/p.jpg")];
        let out = rewrite_sources(doc, &entries);
        assert_eq!(
            out.text,
            r#"<img src="images/p.jpg"><img src="https://a.com/imgXphp?w=100&h=200">"#
        );
        assert_eq!(out.replacements, 1);
    }

    #[test]
    fn regex_metacharacters_are_inert() {
        let url = "https://a.com/(a)[b]{c}*+^$|\\.png";
        let doc = format!(r#"<img src="{}">"#, url);
        let out = rewrite_sources(&doc, &[entry(url, "images/m.png")]);
        assert_eq!(out.text, r#"<img src="images/m.png">"#);
    }

    #[test]
    fn both_quote_styles_become_double_quoted() {
        let doc = r#"<img src='https://a.com/x.png'><img src="https://a.com/x.png">"#;
        let out = rewrite_sources(doc, &[entry("https://a.com/x.png", "images/x.png")]);
        assert_eq!(out.text, r#"<img src="images/x.png"><img src="images/x.png">"#);
        assert_eq!(out.replacements, 2);
    }

    #[test]
    fn attribute_case_and_spacing_are_tolerated() {
        let doc = r#"<IMG SRC="https://a.com/x.png"><img Src = 'https://a.com/x.png'>"#;
        let out = rewrite_sources(doc, &[entry("https://a.com/x.png", "images/x.png")]);
        assert_eq!(out.text, r#"<IMG src="images/x.png"><img src="images/x.png">"#);
        assert_eq!(out.replacements, 2);
    }

    #[test]
    fn url_outside_src_attribute_is_untouched() {
        let doc = r#"<a href="https://a.com/x.png">link</a> https://a.com/x.png <img src="https://a.com/x.png">"#;
        let out = rewrite_sources(doc, &[entry("https://a.com/x.png", "images/x.png")]);
        assert_eq!(
            out.text,
            r#"<a href="https://a.com/x.png">link</a> https://a.com/x.png <img src="images/x.png">"#
        );
    }

    #[test]
    fn entity_encoded_ampersand_matches() {
        let doc = r#"<img src="https://a.com/i?w=1&amp;h=2">"#;
        let out = rewrite_sources(doc, &[entry("https://a.com/i?w=1&h=2", "images/i.jpg")]);
        assert_eq!(out.text, r#"<img src="images/i.jpg">"#);
    }

    #[test]
    fn duplicate_entries_replace_each_occurrence_once() {
        let doc = r#"<img src="https://a.com/x.png"><img src="https://a.com/x.png">"#;
        let entries = vec![
            entry("https://a.com/x.png", "images/x.png"),
            entry("https://a.com/x.png", "images/x.png"),
        ];
        let out = rewrite_sources(doc, &entries);
        assert_eq!(out.text, r#"<img src="images/x.png"><img src="images/x.png">"#);
        assert_eq!(out.replacements, 2);
    }

    #[test]
    fn no_entries_leaves_text_alone() {
        let doc = r#"<img src="https://a.com/x.png">"#;
        let out = rewrite_sources(doc, &[]);
        assert_eq!(out.text, doc);
        assert_eq!(out.replacements, 0);
    }
}
