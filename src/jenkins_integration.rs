use std::io::Write;

use failure::Error;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::console::Console;
use crate::errors::JenkinsError;
use crate::jenkins_response::*;
use crate::network::{HttpResponse, Method, RequestClient, Transport};
use crate::retry::Retrier;

/// Where a job lives on the Jenkins server. Built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEndpoint {
    base_url: String,
    job_name: String,
}

impl JobEndpoint {
    /// Applications are built by a job called `<app_name>-build`.
    pub fn new(base_url: &str, app_name: &str) -> Result<JobEndpoint, Error> {
        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url).map_err(|_| JenkinsError::InvalidUrl {
            url: base_url.to_string(),
        })?;

        Ok(JobEndpoint {
            base_url: base_url.to_string(),
            job_name: format!("{}-build", app_name),
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn job_api_url(&self) -> String {
        format!("{base}/job/{job}/api/json", base = self.base_url, job = self.job_name)
    }

    pub fn build_api_url(&self, build_number: u64) -> String {
        format!(
            "{base}/job/{job}/{number}/api/json",
            base = self.base_url,
            job = self.job_name,
            number = build_number
        )
    }

    pub fn trigger_url(&self) -> String {
        format!("{base}/job/{job}/build", base = self.base_url, job = self.job_name)
    }
}

pub struct JenkinsJob<T> {
    endpoint: JobEndpoint,
    client: RequestClient<T>,
}

impl<T: Transport> JenkinsJob<T> {
    pub fn new(endpoint: JobEndpoint, transport: T, retrier: Retrier) -> JenkinsJob<T> {
        JenkinsJob {
            endpoint: endpoint,
            client: RequestClient::new(transport, retrier),
        }
    }

    pub fn endpoint(&self) -> &JobEndpoint {
        &self.endpoint
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        self.client.transport()
    }

    /// A missing job is an answer, not an error: anything but 200 is `false`.
    pub fn job_available<W: Write>(&self, out: &mut Console<W>) -> bool {
        let url = self.endpoint.job_api_url();
        let response = self.client.request(out, Method::Get, &url, "job availability check");
        if response.status != 200 {
            info!(
                "--Jenkins--: {} answered HTTP {} {}",
                url, response.status, response.status_text
            );
        }
        response.status == 200
    }

    pub fn jobs_info<W: Write>(&self, out: &mut Console<W>) -> Result<JenkinsJobResponse, Error> {
        let url = self.endpoint.job_api_url();
        self.get_json(out, &url, "job lookup")
    }

    pub fn job_info<W: Write>(
        &self,
        out: &mut Console<W>,
        build_number: u64,
    ) -> Result<JenkinsBuildResult, Error> {
        let url = self.endpoint.build_api_url(build_number);
        self.get_json(out, &url, &format!("build #{} lookup", build_number))
    }

    pub fn schedule_build<W: Write>(&self, out: &mut Console<W>) -> Result<(), Error> {
        let url = self.endpoint.trigger_url();
        let response = self.client.request(out, Method::Post, &url, "build scheduling");
        match response.status {
            200 | 201 | 302 => {
                info!("--Jenkins--: Scheduled a build of {}.", self.endpoint.job_name);
                Ok(())
            }
            _ => Err(unexpected_status("Scheduling a build", &url, response).into()),
        }
    }

    fn get_json<W, R>(&self, out: &mut Console<W>, url: &str, label: &str) -> Result<R, Error>
    where
        W: Write,
        R: DeserializeOwned,
    {
        let response = self.client.request(out, Method::Get, url, label);
        if response.status != 200 {
            return Err(unexpected_status(label, url, response).into());
        }

        let parsed = serde_json::from_str::<R>(&response.body).map_err(|e| {
            JenkinsError::ParseError {
                url: url.to_string(),
                detail: e.to_string(),
            }
        })?;
        Ok(parsed)
    }
}

fn unexpected_status(operation: &str, url: &str, response: HttpResponse) -> JenkinsError {
    warn!(
        "--Jenkins--: {} at {} failed with HTTP {}.",
        operation, url, response.status
    );
    JenkinsError::UnexpectedStatus {
        operation: operation.to_string(),
        url: url.to_string(),
        status: response.status,
        status_text: response.status_text,
    }
}
