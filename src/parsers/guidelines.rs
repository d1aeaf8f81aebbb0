//! Named-section extraction from Markdown guideline documents.

use serde::{Deserialize, Serialize};

/// One extracted `## Heading` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineSection {
    /// Heading as requested, not as written in the document.
    pub title: String,
    pub body: String,
}

/// Sections found in one document, in requested order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidelines {
    pub sections: Vec<GuidelineSection>,
}

impl Guidelines {
    /// Body of the section titled `title` (case-insensitive).
    pub fn get(&self, title: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.title.eq_ignore_ascii_case(title))
            .map(|s| s.body.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Renders the sections back to Markdown, as placed in generated file headers.
    pub fn to_markdown(&self) -> String {
        self.sections
            .iter()
            .map(|s| format!("## {}\n{}", s.title, s.body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Backend and frontend guidelines loaded in stage 4.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineSet {
    pub backend: Guidelines,
    pub frontend: Guidelines,
}

/// Level of a Markdown ATX heading line (`#` = 1), if it is one.
fn heading_level(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim()))
}

fn flush(current: &mut Option<(String, Vec<&str>)>, found: &mut Vec<(String, String)>) {
    if let Some((title, lines)) = current.take() {
        found.push((title, lines.join("\n").trim().to_string()));
    }
}

/// Extracts the requested `##` sections from `content`.
///
/// Headings match case-insensitively. A section runs until the next heading
/// of level 1 or 2; deeper headings stay inside it. Missing or empty sections
/// are omitted, and the first occurrence of a repeated heading wins.
pub fn parse_guidelines(content: &str, wanted: &[String]) -> Guidelines {
    let mut found: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in content.lines() {
        match heading_level(line) {
            Some((level, title)) if level <= 2 => {
                flush(&mut current, &mut found);
                if level == 2 {
                    current = Some((title.to_string(), Vec::new()));
                }
            }
            _ => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    flush(&mut current, &mut found);

    let sections = wanted
        .iter()
        .filter_map(|title| {
            found
                .iter()
                .find(|(heading, _)| heading.eq_ignore_ascii_case(title))
                .filter(|(_, body)| !body.is_empty())
                .map(|(_, body)| GuidelineSection {
                    title: title.clone(),
                    body: body.clone(),
                })
        })
        .collect();

    Guidelines { sections }
}
