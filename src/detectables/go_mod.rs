//! Go modules (`go.mod`)

use crate::fs::FileFinder;
use crate::plugin::{Dependency, Extraction, ExtractionEnvironment, Plugin};
use crate::result::PhaseResult;
use crate::{DetectableError, Forge};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const GO_MOD_FILENAME: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoRequirement {
    pub path: String,
    pub version: String,
    /// Marked `// indirect`
    pub indirect: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GoModFile {
    pub module: Option<String>,
    pub go_version: Option<String>,
    pub requires: Vec<GoRequirement>,
}

fn unquote(token: &str) -> &str {
    token.trim_matches(|c| c == '"' || c == '`')
}

fn parse_requirement(line: &str) -> Option<GoRequirement> {
    let (spec, comment) = match line.split_once("//") {
        Some((spec, comment)) => (spec, comment),
        None => (line, ""),
    };
    let mut tokens = spec.split_whitespace();
    let path = unquote(tokens.next()?);
    let version = tokens.next()?;
    Some(GoRequirement {
        path: path.to_string(),
        version: version.to_string(),
        indirect: comment.split_whitespace().any(|word| word.trim_end_matches(';') == "indirect"),
    })
}

/// `old [version] => new [version]`
fn parse_replacement(line: &str) -> Option<(String, Option<String>, String, Option<String>)> {
    let line = line.split("//").next()?.trim();
    let (left, right) = line.split_once("=>")?;
    let mut left = left.split_whitespace();
    let mut right = right.split_whitespace();
    Some((
        unquote(left.next()?).to_string(),
        left.next().map(str::to_string),
        unquote(right.next()?).to_string(),
        right.next().map(str::to_string),
    ))
}

/// Parses `module`, `go`, `require` and `replace` directives.
///
/// Replacements pointing at a local path (no version) keep the required
/// version.
pub fn parse_go_mod(content: &str) -> GoModFile {
    let mut file = GoModFile::default();
    let mut replacements = Vec::new();
    let mut block: Option<&str> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some(directive) = block {
            if line == ")" {
                block = None;
            } else if directive == "require" {
                file.requires.extend(parse_requirement(line));
            } else if directive == "replace" {
                replacements.extend(parse_replacement(line));
            }
            continue;
        }

        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match keyword {
            "module" => file.module = Some(unquote(rest).to_string()),
            "go" => file.go_version = Some(rest.to_string()),
            "require" | "replace" if rest == "(" => block = Some(keyword),
            "require" => file.requires.extend(parse_requirement(rest)),
            "replace" => replacements.extend(parse_replacement(rest)),
            _ => {}
        }
    }

    for (old, old_version, new, new_version) in replacements {
        for requirement in file.requires.iter_mut() {
            let matches_version = old_version.as_ref().map_or(true, |v| *v == requirement.version);
            if requirement.path == old && matches_version {
                if let Some(version) = &new_version {
                    requirement.path = new.clone();
                    requirement.version = version.clone();
                }
            }
        }
    }

    file
}

pub struct GoModDetectable {
    directory: PathBuf,
    finder: FileFinder,
    go_mod: Option<PathBuf>,
}

impl GoModDetectable {
    pub fn new(directory: impl Into<PathBuf>, finder: FileFinder) -> Self {
        Self {
            directory: directory.into(),
            finder,
            go_mod: None,
        }
    }
}

impl Plugin for GoModDetectable {
    fn applicable(&mut self) -> PhaseResult {
        self.go_mod = self.finder.find_file(&self.directory, GO_MOD_FILENAME);
        match self.go_mod {
            Some(_) => PhaseResult::Passed,
            None => PhaseResult::file_not_found(GO_MOD_FILENAME),
        }
    }

    fn extractable(&mut self) -> Result<PhaseResult, DetectableError> {
        Ok(PhaseResult::Passed)
    }

    fn extract(&mut self, _environment: &ExtractionEnvironment) -> Result<Extraction> {
        let path = self
            .go_mod
            .as_ref()
            .context("go.mod was not located during the applicable check")?;
        let content = self
            .finder
            .file_system()
            .read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let parsed = parse_go_mod(&content);

        // Last requirement of a module wins, as with the go tool
        let mut unique: BTreeMap<String, GoRequirement> = BTreeMap::new();
        for requirement in parsed.requires {
            unique.insert(requirement.path.clone(), requirement);
        }

        let dependencies = unique
            .into_values()
            .map(|requirement| {
                let dependency =
                    Dependency::new(Forge::Golang, requirement.path, Some(requirement.version));
                if requirement.indirect {
                    dependency.transitive()
                } else {
                    dependency
                }
            })
            .collect();

        let extraction = Extraction::success(dependencies);
        Ok(match parsed.module {
            Some(module) => extraction.with_project(module, None),
            None => extraction,
        })
    }
}
