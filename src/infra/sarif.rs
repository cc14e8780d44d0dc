//! Loads the subset of a SARIF 2.1 log that annotation needs.
//!
//! Each result becomes an [`AnalysisResult`] whose locations are the steps of
//! its first thread flow, or its primary locations when it has no code flow.

use crate::domain::{
    AnalysisLog, AnalysisResult, ArtifactUri, LogLoadError, RegionSpec, ResultId, ResultLocation,
    RevisionKey, TextRange,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SarifLog {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifRun {
    #[serde(default)]
    version_control_provenance: Vec<VersionControlDetails>,
    #[serde(default)]
    artifacts: Vec<SarifArtifact>,
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionControlDetails {
    #[serde(default)]
    revision_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SarifArtifact {
    #[serde(default)]
    location: Option<ArtifactLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    message: Option<SarifMessage>,
    #[serde(default)]
    locations: Vec<SarifLocation>,
    #[serde(default)]
    code_flows: Vec<CodeFlow>,
}

#[derive(Debug, Deserialize)]
struct SarifMessage {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeFlow {
    #[serde(default)]
    thread_flows: Vec<ThreadFlow>,
}

#[derive(Debug, Deserialize)]
struct ThreadFlow {
    #[serde(default)]
    locations: Vec<ThreadFlowLocation>,
}

#[derive(Debug, Deserialize)]
struct ThreadFlowLocation {
    #[serde(default)]
    location: Option<SarifLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    #[serde(default)]
    physical_location: Option<PhysicalLocation>,
    #[serde(default)]
    message: Option<SarifMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhysicalLocation {
    #[serde(default)]
    artifact_location: Option<ArtifactLocation>,
    #[serde(default)]
    region: Option<SarifRegion>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtifactLocation {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    #[serde(default)]
    start_line: Option<usize>,
    #[serde(default)]
    start_column: Option<usize>,
    #[serde(default)]
    end_line: Option<usize>,
    #[serde(default)]
    end_column: Option<usize>,
    #[serde(default)]
    char_offset: Option<usize>,
    #[serde(default)]
    char_length: Option<usize>,
}

impl SarifRegion {
    fn to_spec(&self) -> Option<RegionSpec> {
        if let Some(start_line) = self.start_line {
            return Some(RegionSpec::Lines {
                start_line,
                start_column: self.start_column,
                end_line: self.end_line,
                end_column: self.end_column,
            });
        }
        let start = self.char_offset?;
        let end = start.checked_add(self.char_length.unwrap_or(0))?;
        Some(RegionSpec::Offsets(TextRange::new(start, end)))
    }
}

pub fn load_log(path: &Path) -> Result<AnalysisLog, LogLoadError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| LogLoadError::Io {
        path: display.clone(),
        source,
    })?;
    parse_log(&display, &contents)
}

pub fn parse_log(log_id: &str, contents: &str) -> Result<AnalysisLog, LogLoadError> {
    let sarif: SarifLog = serde_json::from_str(contents).map_err(|source| LogLoadError::Parse {
        path: log_id.to_string(),
        source,
    })?;

    if let Some(version) = sarif.version.as_deref()
        && !version.starts_with("2.")
    {
        return Err(LogLoadError::UnsupportedVersion(version.to_string()));
    }

    let mut results = Vec::new();
    for (run_index, run) in sarif.runs.iter().enumerate() {
        let revision = run
            .version_control_provenance
            .iter()
            .find_map(|vcs| vcs.revision_id.clone())
            .map(RevisionKey::new);

        for (index, result) in run.results.iter().enumerate() {
            // Steps without a physical location stay in place so later steps
            // keep their numbers.
            let steps: Vec<Option<&SarifLocation>> = match first_thread_flow(result) {
                Some(flow) => flow
                    .locations
                    .iter()
                    .map(|step| step.location.as_ref())
                    .collect(),
                None => result.locations.iter().map(Some).collect(),
            };

            let locations = steps
                .into_iter()
                .map(|location| convert_location(run, location))
                .collect();

            results.push(AnalysisResult {
                id: ResultId::new(log_id, run_index, index),
                rule_id: result.rule_id.clone(),
                message: result.message.as_ref().and_then(|m| m.text.clone()),
                revision: revision.clone(),
                locations,
            });
        }
    }

    log::debug!("loaded {} results from {}", results.len(), log_id);
    Ok(AnalysisLog {
        id: log_id.to_string(),
        results,
    })
}

fn first_thread_flow(result: &SarifResult) -> Option<&ThreadFlow> {
    result
        .code_flows
        .iter()
        .flat_map(|flow| flow.thread_flows.iter())
        .find(|flow| !flow.locations.is_empty())
}

fn convert_location(run: &SarifRun, location: Option<&SarifLocation>) -> ResultLocation {
    let physical = location.and_then(|location| location.physical_location.as_ref());
    let region = physical
        .and_then(|physical| physical.region.as_ref())
        .and_then(SarifRegion::to_spec);
    let artifact = physical
        .and_then(|physical| physical.artifact_location.as_ref())
        .and_then(|artifact| resolve_uri(run, artifact))
        .map(ArtifactUri::new);

    ResultLocation {
        artifact,
        region,
        message: location
            .and_then(|location| location.message.as_ref())
            .and_then(|m| m.text.clone()),
    }
}

/// Uri of an artifact location, following `index` into the run's artifact
/// table when the uri is not inline.
fn resolve_uri(run: &SarifRun, artifact: &ArtifactLocation) -> Option<String> {
    if let Some(uri) = &artifact.uri {
        return Some(uri.clone());
    }
    run.artifacts
        .get(artifact.index?)?
        .location
        .as_ref()?
        .uri
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"{
      "version": "2.1.0",
      "runs": [{
        "versionControlProvenance": [{ "repositoryUri": "https://example.com/r", "revisionId": "abc123" }],
        "artifacts": [{ "location": { "uri": "src/db.rs" } }],
        "results": [
          {
            "ruleId": "sql-injection",
            "message": { "text": "Tainted query" },
            "locations": [{ "physicalLocation": {
              "artifactLocation": { "uri": "src/db.rs" },
              "region": { "startLine": 9 } } }],
            "codeFlows": [{ "threadFlows": [{ "locations": [
              { "location": { "physicalLocation": {
                  "artifactLocation": { "uri": "src/http.rs" },
                  "region": { "startLine": 3, "startColumn": 5, "endColumn": 12 } },
                "message": { "text": "source" } } },
              { "location": { "physicalLocation": {
                  "artifactLocation": { "index": 0 },
                  "region": { "charOffset": 40, "charLength": 6 } },
                "message": { "text": "sink" } } }
            ] }] }]
          },
          {
            "ruleId": "unused",
            "locations": [{ "physicalLocation": {
              "artifactLocation": { "uri": "src/lib.rs" },
              "region": { "startLine": 1 } } }]
          }
        ]
      }]
    }"#;

    #[test]
    fn test_parse_log_prefers_code_flow_steps() {
        let log = parse_log("scan.sarif", LOG).unwrap();
        assert_eq!(log.results.len(), 2);

        let first = &log.results[0];
        assert_eq!(first.id, ResultId::new("scan.sarif", 0, 0));
        assert_eq!(first.revision, Some(RevisionKey::new("abc123")));
        assert_eq!(first.locations.len(), 2);
        assert_eq!(
            first.locations[0].artifact,
            Some(ArtifactUri::new("src/http.rs"))
        );
        assert_eq!(first.locations[0].message.as_deref(), Some("source"));
        assert_eq!(
            first.locations[1],
            ResultLocation::new("src/db.rs", RegionSpec::Offsets(TextRange::new(40, 46)))
                .with_message("sink")
        );
    }

    #[test]
    fn test_parse_log_falls_back_to_primary_locations() {
        let log = parse_log("scan.sarif", LOG).unwrap();
        let second = &log.results[1];
        assert_eq!(second.rule_id.as_deref(), Some("unused"));
        assert_eq!(
            second.locations,
            vec![ResultLocation::new("src/lib.rs", RegionSpec::line(1))]
        );
    }

    #[test]
    fn test_logical_steps_keep_their_place_in_the_flow() {
        let log = parse_log(
            "flow.sarif",
            r#"{
              "version": "2.1.0",
              "runs": [{ "results": [{ "codeFlows": [{ "threadFlows": [{ "locations": [
                { "location": { "physicalLocation": {
                    "artifactLocation": { "uri": "a.c" }, "region": { "startLine": 1 } },
                  "message": { "text": "one" } } },
                { "location": { "message": { "text": "two" } } },
                { "kinds": ["exit"] },
                { "location": { "physicalLocation": {
                    "artifactLocation": { "uri": "a.c" },
                    "region": { "charOffset": 18446744073709551615, "charLength": 4 } } } },
                { "location": { "physicalLocation": {
                    "artifactLocation": { "uri": "a.c" }, "region": { "startLine": 3 } },
                  "message": { "text": "three" } } }
              ] }] }] }] }]
            }"#,
        )
        .unwrap();

        let locations = &log.results[0].locations;
        assert_eq!(locations.len(), 5);
        assert_eq!(locations[1].region, None);
        assert_eq!(locations[1].artifact, None);
        assert_eq!(locations[1].message.as_deref(), Some("two"));
        assert_eq!(locations[2].region, None);
        assert_eq!(locations[3].region, None);
        assert_eq!(locations[3].artifact, Some(ArtifactUri::new("a.c")));
        assert_eq!(
            locations[4],
            ResultLocation::new("a.c", RegionSpec::line(3)).with_message("three")
        );
    }

    #[test]
    fn test_parse_log_rejects_old_versions() {
        let err = parse_log("old.sarif", r#"{ "version": "1.0.0", "runs": [] }"#).unwrap_err();
        assert!(matches!(err, LogLoadError::UnsupportedVersion(v) if v == "1.0.0"));
    }

    #[test]
    fn test_load_log_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_log(&dir.path().join("absent.sarif")).unwrap_err();
        assert!(matches!(err, LogLoadError::Io { .. }));
    }
}
