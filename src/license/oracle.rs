use super::templates::{LicenseTemplate, TEMPLATES};

/// Classifies license text.
pub trait LicenseOracle {
    fn scan(&self, contents: &[u8]) -> Coverage;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coverage {
    /// Share of the text, in percent, covered by any match.
    pub percent: f64,
    /// Matches in order of appearance. Matches may overlap.
    pub matches: Vec<LicenseMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseMatch {
    /// SPDX identifier.
    pub id: String,
    pub start: usize,
    pub end: usize,
}

/// Recognizes the licenses commonly found in Go modules by looking for the
/// ordered key phrases of each license text.
///
/// Text is compared as a sequence of lower-case words, so line wrapping,
/// punctuation and markup do not matter. A match spans from the first word
/// of a license's first phrase to the last word of its last phrase; offsets
/// in [`LicenseMatch`] are word indices.
pub struct TemplateOracle {
    templates: Vec<Template>,
}

struct Template {
    id: &'static str,
    phrases: Vec<Vec<String>>,
    excludes: Vec<Vec<String>>,
}

impl Template {
    fn new(template: &LicenseTemplate) -> Self {
        Template {
            id: template.id,
            phrases: template.phrases.iter().map(|p| words(p)).collect(),
            excludes: template.excludes.iter().map(|p| words(p)).collect(),
        }
    }

    /// Every non-overlapping occurrence of the template in the document.
    fn find_all(&self, document: &[String]) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut position = 0;
        while let Some((start, end)) = self.find_from(document, position) {
            let span = &document[start..end];
            if !self.excludes.iter().any(|exclude| find(span, exclude, 0).is_some()) {
                found.push((start, end));
            }
            position = end;
        }
        found
    }

    fn find_from(&self, document: &[String], position: usize) -> Option<(usize, usize)> {
        let (first, rest) = self.phrases.split_first()?;
        let start = find(document, first, position)?;
        let mut end = start + first.len();
        for phrase in rest {
            end = find(document, phrase, end)? + phrase.len();
        }
        Some((start, end))
    }
}

impl TemplateOracle {
    pub fn new() -> Self {
        TemplateOracle {
            templates: TEMPLATES.iter().map(Template::new).collect(),
        }
    }
}

impl Default for TemplateOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseOracle for TemplateOracle {
    fn scan(&self, contents: &[u8]) -> Coverage {
        let document = words(&String::from_utf8_lossy(contents));
        if document.is_empty() {
            return Coverage::default();
        }

        let mut covered = vec![false; document.len()];
        let mut matches = Vec::new();
        for template in &self.templates {
            for (start, end) in template.find_all(&document) {
                covered[start..end].iter_mut().for_each(|word| *word = true);
                matches.push(LicenseMatch {
                    id: template.id.to_string(),
                    start,
                    end,
                });
            }
        }
        matches.sort_by_key(|m| m.start);

        let covered = covered.iter().filter(|word| **word).count();
        Coverage {
            percent: covered as f64 * 100.0 / document.len() as f64,
            matches,
        }
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn find(document: &[String], phrase: &[String], from: usize) -> Option<usize> {
    if phrase.is_empty() || from > document.len() {
        return None;
    }
    document[from..]
        .windows(phrase.len())
        .position(|window| window == phrase)
        .map(|index| from + index)
}
