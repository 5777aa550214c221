//! Txtar-style archive parsing
//!
//! An archive is plain text split into named sections by header lines of the
//! form `-- name --`. Anything before the first header lands in a leading
//! section with an empty name, so archives without headers still parse.

use std::collections::HashMap;
use std::fmt;

use crate::common::{Error, Result};

/// Name of the implicit leading section
///
/// Headers require a non-empty name, so no header can collide with it.
pub const ROOT_SECTION: &str = "";

/// A single named section of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub content: String,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            content: String::new(),
        }
    }
}

/// Ordered collection of sections with lookup by name
#[derive(Debug, Default, Clone)]
pub struct Archive {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl Archive {
    /// Parse archive text
    ///
    /// Every line is trimmed before it is inspected and is stored trimmed,
    /// terminated with `\n`. With `strip_blank_lines`, lines that are empty
    /// after trimming are dropped.
    pub fn parse(text: &str, strip_blank_lines: bool) -> Result<Self> {
        let mut archive = Archive::default();
        let mut current = Section::new(ROOT_SECTION);

        for line in text.lines() {
            let line = line.trim();
            if strip_blank_lines && line.is_empty() {
                continue;
            }

            if let Some(name) = header_name(line) {
                let finished = std::mem::replace(&mut current, Section::new(name));
                archive.push(finished)?;
                continue;
            }

            current.content.push_str(line);
            current.content.push('\n');
        }

        archive.push(current)?;
        Ok(archive)
    }

    fn push(&mut self, section: Section) -> Result<()> {
        if self.index.contains_key(&section.name) {
            return Err(Error::DuplicateSection { name: section.name });
        }
        self.index.insert(section.name.clone(), self.sections.len());
        self.sections.push(section);
        Ok(())
    }

    /// Look up a section by name
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.index.get(name).map(|&i| &self.sections[i])
    }

    /// Sections in archive order, the leading section first
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Re-emits the archive: leading content, then each section under its header
impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            if section.name != ROOT_SECTION {
                writeln!(f, "-- {} --", section.name)?;
            }
            f.write_str(&section.content)?;
        }
        Ok(())
    }
}

/// Extract the name from a `-- name --` header line
fn header_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix("-- ")?.strip_suffix(" --")?;
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some(name)
}
