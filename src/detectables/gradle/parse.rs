use super::BUILD_GRADLE_FILENAMES;
use crate::fs::FileFinder;
use crate::plugin::{Dependency, Extraction, ExtractionEnvironment, Plugin};
use crate::result::PhaseResult;
use crate::{DetectableError, Forge};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;

const SETTINGS_FILENAMES: &[&str] = &["settings.gradle", "settings.gradle.kts"];

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?m)^\s*(implementation|api|compile|compileOnly|runtimeOnly|runtime|testImplementation|testCompile|testRuntimeOnly|annotationProcessor|kapt)\s*\(?\s*['"]([^'":\s]+):([^'":\s]+)(?::([^'":@\s]+))?(?:@[^'"]*)?['"]"#,
        )
        .expect("valid regex")
    })
}

fn root_project_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^\s*rootProject\.name\s*=\s*['"]([^'"]+)['"]"#).expect("valid regex")
    })
}

/// String-notation declarations such as `implementation 'g:a:v'`.
///
/// Map notation, version catalogs and variables are not resolved.
pub fn parse_build_file(content: &str) -> Vec<Dependency> {
    let mut dependencies = BTreeSet::new();
    for captures in declaration_pattern().captures_iter(content) {
        let (Some(group), Some(artifact)) = (captures.get(2), captures.get(3)) else {
            continue;
        };
        let version = captures.get(4).map(|m| m.as_str().to_string());
        dependencies.insert(Dependency::new(
            Forge::Maven,
            format!("{}:{}", group.as_str(), artifact.as_str()),
            version,
        ));
    }
    dependencies.into_iter().collect()
}

fn parse_root_project_name(settings: &str) -> Option<String> {
    root_project_pattern()
        .captures(settings)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

pub struct GradleParseDetectable {
    directory: PathBuf,
    finder: FileFinder,
    build_file: Option<PathBuf>,
}

impl GradleParseDetectable {
    pub fn new(directory: impl Into<PathBuf>, finder: FileFinder) -> Self {
        Self {
            directory: directory.into(),
            finder,
            build_file: None,
        }
    }
}

impl Plugin for GradleParseDetectable {
    fn applicable(&mut self) -> PhaseResult {
        self.build_file = self.finder.find_first(&self.directory, BUILD_GRADLE_FILENAMES);
        match self.build_file {
            Some(_) => PhaseResult::Passed,
            None => PhaseResult::file_not_found(BUILD_GRADLE_FILENAMES[0]),
        }
    }

    fn extractable(&mut self) -> Result<PhaseResult, DetectableError> {
        Ok(PhaseResult::Passed)
    }

    fn extract(&mut self, _environment: &ExtractionEnvironment) -> Result<Extraction> {
        let path = self
            .build_file
            .as_ref()
            .context("Build file was not located during the applicable check")?;
        let fs = self.finder.file_system();
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let extraction = Extraction::success(parse_build_file(&content));
        let project_name = self
            .finder
            .find_first(&self.directory, SETTINGS_FILENAMES)
            .and_then(|settings| fs.read_to_string(&settings).ok())
            .and_then(|settings| parse_root_project_name(&settings));

        Ok(match project_name {
            Some(name) => extraction.with_project(name, None),
            None => extraction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use std::sync::Arc;

    const BUILD_GRADLE: &str = r#"
plugins {
    id 'java'
}

dependencies {
    implementation 'com.google.guava:guava:31.1-jre'
    implementation("org.slf4j:slf4j-api:2.0.7")
    api "org.apache.commons:commons-lang3:3.12.0@jar"
    compileOnly 'org.projectlombok:lombok'
    testImplementation 'junit:junit:4.13.2'
    implementation group: 'ignored', name: 'map-notation', version: '1.0'
    // implementation 'commented:out:1.0'
}
"#;

    #[test]
    fn test_parse_build_file() {
        let names: Vec<_> = parse_build_file(BUILD_GRADLE)
            .into_iter()
            .map(|d| format!("{}@{}", d.name, d.version.unwrap_or_default()))
            .collect();
        assert_eq!(
            names,
            vec![
                "com.google.guava:guava@31.1-jre",
                "junit:junit@4.13.2",
                "org.apache.commons:commons-lang3@3.12.0",
                "org.projectlombok:lombok@",
                "org.slf4j:slf4j-api@2.0.7",
            ]
        );
    }

    #[test]
    fn test_extract_uses_settings_project_name() {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/repo")));
        fs.add_file("build.gradle.kts", "dependencies {\n    implementation(\"io.ktor:ktor-server-core:2.3.0\")\n}\n");
        fs.add_file("settings.gradle.kts", "rootProject.name = \"server\"\n");
        let mut plugin = GradleParseDetectable::new("/repo", FileFinder::new(fs));

        assert!(plugin.applicable().passed());
        assert!(plugin.extractable().unwrap().passed());
        let extraction = plugin.extract(&ExtractionEnvironment::new("/out")).unwrap();
        assert_eq!(extraction.project_name.as_deref(), Some("server"));
        assert_eq!(extraction.dependencies.len(), 1);
        assert_eq!(extraction.dependencies[0].forge, Forge::Maven);
    }

    #[test]
    fn test_not_applicable_without_build_file() {
        let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/repo")));
        fs.add_file("pom.xml", "<project/>");
        let mut plugin = GradleParseDetectable::new("/repo", FileFinder::new(fs));
        assert!(!plugin.applicable().passed());
    }
}
