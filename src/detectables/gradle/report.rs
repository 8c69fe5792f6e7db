//! Parser for the dependency tree Gradle prints with the inspector init script

use crate::plugin::Dependency;
use crate::Forge;
use std::collections::BTreeMap;

/// Line the inspector init script prints for the root project
pub const PROJECT_MARKER: &str = "bomscan-project:";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GradleReport {
    pub project_name: Option<String>,
    pub project_version: Option<String>,
    pub dependencies: Vec<Dependency>,
}

const BRANCHES: [&str; 2] = ["+--- ", "\\--- "];
const INDENT: usize = 5;

/// `group:artifact[:version][ -> resolved][ (*)|(c)]` at its tree depth
fn parse_dependency_line(line: &str) -> Option<(usize, Dependency)> {
    let start = BRANCHES.iter().filter_map(|branch| line.find(branch)).min()?;
    let depth = start / INDENT;
    let mut text = line[start + INDENT..].trim();

    if text.starts_with("project ") || text.ends_with("(n)") {
        return None;
    }
    for suffix in [" (*)", " (c)", " FAILED"] {
        text = text.strip_suffix(suffix).unwrap_or(text);
    }

    let (coordinate, resolved) = match text.split_once(" -> ") {
        Some((coordinate, resolved)) => (coordinate.trim(), Some(resolved.trim())),
        None => (text, None),
    };

    let parts: Vec<&str> = coordinate.split(':').collect();
    let (group, artifact, declared) = match parts.as_slice() {
        [group, artifact, version] => (*group, *artifact, Some(*version)),
        [group, artifact] => (*group, *artifact, None),
        _ => return None,
    };
    if group.is_empty() || artifact.is_empty() {
        return None;
    }

    let version = resolved.or(declared).map(str::to_string);
    let dependency = Dependency::new(Forge::Maven, format!("{}:{}", group, artifact), version);
    Some((depth, dependency))
}

fn parse_project_line(line: &str) -> Option<(String, Option<String>)> {
    let rest = line.trim().strip_prefix(PROJECT_MARKER)?.trim();
    let (name, version) = match rest.split_once(char::is_whitespace) {
        Some((name, version)) => (name, Some(version.trim())),
        None => (rest, None),
    };
    let version = version
        .filter(|v| !v.is_empty() && *v != "unspecified")
        .map(str::to_string);
    Some((name.to_string(), version))
}

/// Merges every configuration's tree into one flat dependency list.
///
/// A dependency reached directly in any configuration is reported as
/// direct.
pub fn parse_report(output: &str) -> GradleReport {
    let mut report = GradleReport::default();
    let mut seen: BTreeMap<(String, Option<String>), bool> = BTreeMap::new();

    for line in output.lines() {
        if let Some((name, version)) = parse_project_line(line) {
            report.project_name = Some(name);
            report.project_version = version;
            continue;
        }
        if let Some((depth, dependency)) = parse_dependency_line(line) {
            let direct = seen.entry((dependency.name, dependency.version)).or_insert(false);
            *direct |= depth == 0;
        }
    }

    report.dependencies = seen
        .into_iter()
        .map(|((name, version), direct)| {
            let dependency = Dependency::new(Forge::Maven, name, version);
            if direct {
                dependency
            } else {
                dependency.transitive()
            }
        })
        .collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = r#"
> Task :dependencies

------------------------------------------------------------
Root project 'demo'
------------------------------------------------------------
bomscan-project: demo 1.4.0

compileClasspath - Compile classpath for source set 'main'.
+--- org.springframework:spring-core:5.0.0.RELEASE -> 5.1.0.RELEASE
|    \--- org.springframework:spring-jcl:5.1.0.RELEASE
+--- project :shared
\--- com.google.guava:guava -> 30.1-jre
     +--- com.google.guava:failureaccess:1.0.1
     \--- org.springframework:spring-jcl:5.1.0.RELEASE (*)

testCompileClasspath - Compile classpath for source set 'test'.
+--- junit:junit:4.13.2
|    \--- org.hamcrest:hamcrest-core:1.3
+--- com.google.guava:failureaccess:1.0.1
\--- org.mockito:mockito-core:4.0.0 (n)

BUILD SUCCESSFUL in 1s
"#;

    fn summary(report: &GradleReport) -> Vec<(String, Option<String>, bool)> {
        report
            .dependencies
            .iter()
            .map(|d| (d.name.clone(), d.version.clone(), d.direct))
            .collect()
    }

    #[test]
    fn test_parse_report() {
        let report = parse_report(OUTPUT);
        assert_eq!(report.project_name.as_deref(), Some("demo"));
        assert_eq!(report.project_version.as_deref(), Some("1.4.0"));

        let v = |s: &str| Some(s.to_string());
        assert_eq!(
            summary(&report),
            vec![
                ("com.google.guava:failureaccess".to_string(), v("1.0.1"), true),
                ("com.google.guava:guava".to_string(), v("30.1-jre"), true),
                ("junit:junit".to_string(), v("4.13.2"), true),
                ("org.hamcrest:hamcrest-core".to_string(), v("1.3"), false),
                ("org.springframework:spring-core".to_string(), v("5.1.0.RELEASE"), true),
                ("org.springframework:spring-jcl".to_string(), v("5.1.0.RELEASE"), false),
            ]
        );
    }

    #[test]
    fn test_unspecified_version_is_dropped() {
        let report = parse_report("bomscan-project: demo unspecified\n");
        assert_eq!(report.project_name.as_deref(), Some("demo"));
        assert_eq!(report.project_version, None);
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_report(""), GradleReport::default());
    }
}
