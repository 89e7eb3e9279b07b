use serde_json::Value;

/// `GET /job/<name>/api/json`. Jenkins sends many more fields; only the ones
/// the trigger reads are modelled.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JenkinsJobResponse {
    #[serde(rename = "lastBuild", default)]
    pub last_build: Option<JenkinsBuildRef>,

    // Only its presence matters, so the payload is kept opaque.
    #[serde(rename = "queueItem", default)]
    pub queue_item: Option<Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JenkinsBuildRef {
    pub number: u64,
}

impl JenkinsJobResponse {
    /// Number of the most recent build, or 0 for a job that has never run.
    pub fn last_build_number(&self) -> u64 {
        self.last_build.as_ref().map(|build| build.number).unwrap_or(0)
    }

    pub fn is_queued(&self) -> bool {
        self.queue_item.is_some()
    }
}

/// `GET /job/<name>/<number>/api/json`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JenkinsBuildResult {
    pub building: bool,

    #[serde(rename = "result", default)]
    pub build_result: Option<String>,
}

impl JenkinsBuildResult {
    pub fn outcome(&self) -> BuildOutcome {
        BuildOutcome::from_result(self.build_result.as_ref().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failure,
}

impl BuildOutcome {
    /// Jenkins reports SUCCESS, FAILURE, UNSTABLE, ABORTED, NOT_BUILT or null.
    /// Only an exact SUCCESS counts.
    pub fn from_result(result: Option<&str>) -> BuildOutcome {
        match result {
            Some("SUCCESS") => BuildOutcome::Success,
            _ => BuildOutcome::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_without_builds_has_baseline_zero() {
        let job: JenkinsJobResponse =
            serde_json::from_str(r#"{"lastBuild":null,"queueItem":null}"#).unwrap();

        assert_eq!(job.last_build_number(), 0);
        assert!(!job.is_queued());
    }

    #[test]
    fn reads_last_build_and_queue_item() {
        let job: JenkinsJobResponse = serde_json::from_str(
            r#"{
                "_class": "hudson.model.FreeStyleProject",
                "name": "app-build",
                "lastBuild": {"_class": "hudson.model.FreeStyleBuild", "number": 41, "url": "https://ci/job/app-build/41/"},
                "queueItem": {"_class": "hudson.model.Queue$WaitingItem", "id": 12, "why": "In the quiet period."}
            }"#,
        )
        .unwrap();

        assert_eq!(job.last_build_number(), 41);
        assert!(job.is_queued());
    }

    #[test]
    fn non_null_queue_item_counts_as_queued() {
        let job: JenkinsJobResponse =
            serde_json::from_str(r#"{"lastBuild":{"number":3},"queueItem":false}"#).unwrap();

        assert!(job.is_queued());
    }

    #[test]
    fn last_build_without_number_is_rejected() {
        let parsed = serde_json::from_str::<JenkinsJobResponse>(r#"{"lastBuild":{"url":"x"}}"#);

        assert!(parsed.is_err());
    }

    #[test]
    fn build_without_building_flag_is_rejected() {
        let parsed = serde_json::from_str::<JenkinsBuildResult>(r#"{"result":"SUCCESS"}"#);

        assert!(parsed.is_err());
    }

    #[test]
    fn only_exact_success_is_a_success() {
        assert_eq!(BuildOutcome::from_result(Some("SUCCESS")), BuildOutcome::Success);
        for result in [Some("FAILURE"), Some("ABORTED"), Some("UNSTABLE"), Some("success"), None].iter() {
            assert_eq!(BuildOutcome::from_result(*result), BuildOutcome::Failure);
        }
    }

    #[test]
    fn finished_build_reports_its_outcome() {
        let build: JenkinsBuildResult =
            serde_json::from_str(r#"{"building":false,"result":"FAILURE","number":6}"#).unwrap();

        assert!(!build.building);
        assert_eq!(build.outcome(), BuildOutcome::Failure);
    }
}
