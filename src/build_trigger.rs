use std::fmt::Display;
use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::console::Console;
use crate::jenkins_integration::JenkinsJob;
use crate::jenkins_response::{BuildOutcome, JenkinsBuildResult};
use crate::network::Transport;

/// How a trigger run ended. Several endings share a process exit code; the
/// codes are relied upon by deployment scripts and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildExit {
    Success,
    JobUnavailable,
    BaselineLookupFailed,
    BuildFailed,
    ScheduleFailed,
    ScheduleConfirmLookupFailed,
    ScheduleConfirmStatusFailed,
    ScheduleRecheckFailed,
    CompletionLookupFailed,
    BuildCancelled,
}

impl BuildExit {
    pub fn code(self) -> i32 {
        match self {
            BuildExit::Success => 0,
            BuildExit::JobUnavailable
            | BuildExit::BaselineLookupFailed
            | BuildExit::BuildFailed => 1,
            BuildExit::ScheduleFailed => 2,
            BuildExit::ScheduleConfirmLookupFailed => 3,
            BuildExit::ScheduleConfirmStatusFailed => 4,
            BuildExit::ScheduleRecheckFailed | BuildExit::CompletionLookupFailed => 5,
            BuildExit::BuildCancelled => 6,
        }
    }
}

/// Schedules one build of a job and follows it to completion:
/// preflight, baseline snapshot, schedule, wait for start, wait for finish.
pub struct BuildTrigger<T> {
    job: JenkinsJob<T>,
    poll_interval: Duration,
}

impl<T: Transport> BuildTrigger<T> {
    pub fn new(job: JenkinsJob<T>, poll_interval: Duration) -> BuildTrigger<T> {
        BuildTrigger {
            job: job,
            poll_interval: poll_interval,
        }
    }

    #[cfg(test)]
    pub fn job(&self) -> &JenkinsJob<T> {
        &self.job
    }

    pub fn run<W: Write>(&self, out: &mut W) -> BuildExit {
        self.sequence(&mut Console::new(out))
    }

    fn sequence<W: Write>(&self, out: &mut Console<W>) -> BuildExit {
        let job_name = self.job.endpoint().job_name().to_string();

        if !self.job.job_available(out) {
            let _ = writeln!(out, "Job {} does not exist or is not reachable.", job_name);
            error!("--Jenkins--: {} is unavailable.", job_name);
            return BuildExit::JobUnavailable;
        }

        let baseline = match self.job.jobs_info(out) {
            Ok(snapshot) => snapshot.last_build_number(),
            Err(e) => {
                return abort(
                    out,
                    BuildExit::BaselineLookupFailed,
                    &format!("Unable to read the last build number of {}.", job_name),
                    e,
                )
            }
        };
        let next_build = match baseline.checked_add(1) {
            Some(next_build) => next_build,
            None => {
                return abort(
                    out,
                    BuildExit::BaselineLookupFailed,
                    &format!("Unable to read the last build number of {}.", job_name),
                    format!("build number {} cannot be followed by another build", baseline),
                )
            }
        };
        info!(
            "--Jenkins--: {} last built #{}, expecting #{}.",
            job_name, baseline, next_build
        );

        if let Err(e) = self.job.schedule_build(out) {
            return abort(
                out,
                BuildExit::ScheduleFailed,
                &format!("Unable to schedule a build of {}.", job_name),
                e,
            );
        }
        let _ = writeln!(out, "Scheduled build #{} of {}.", next_build, job_name);

        if let Err(exit) = self.wait_until_started(out, next_build) {
            return exit;
        }

        let build = match self.wait_until_finished(out, next_build) {
            Ok(build) => build,
            Err(exit) => return exit,
        };

        info!(
            "--Jenkins--: Build #{} of {} finished with result {:?}.",
            next_build, job_name, build.build_result
        );
        match build.outcome() {
            BuildOutcome::Success => {
                let _ = writeln!(out, "SUCCESS");
                BuildExit::Success
            }
            BuildOutcome::Failure => {
                let _ = writeln!(out, "FAILED");
                BuildExit::BuildFailed
            }
        }
    }

    /// Polls until the job's last build is `next_build`. If the queue entry
    /// disappears without the build number moving, Jenkins dropped the
    /// request and the build will never run.
    fn wait_until_started<W: Write>(
        &self,
        out: &mut Console<W>,
        next_build: u64,
    ) -> Result<(), BuildExit> {
        let _ = write!(out, "Waiting for build #{} to start", next_build);
        let _ = out.flush();

        loop {
            let last_build = match self.job.jobs_info(out) {
                Ok(snapshot) => snapshot.last_build_number(),
                Err(e) => {
                    return Err(abort(
                        out,
                        BuildExit::ScheduleConfirmLookupFailed,
                        &format!("Unable to look up build #{} while waiting for it to start.", next_build),
                        e,
                    ));
                }
            };
            if last_build == next_build {
                break;
            }

            let queued = match self.job.jobs_info(out) {
                Ok(snapshot) => snapshot.is_queued(),
                Err(e) => {
                    return Err(abort(
                        out,
                        BuildExit::ScheduleConfirmStatusFailed,
                        &format!("Unable to check the queue status of build #{}.", next_build),
                        e,
                    ));
                }
            };

            if !queued {
                let rechecked = match self.job.jobs_info(out) {
                    Ok(snapshot) => snapshot.last_build_number(),
                    Err(e) => {
                        return Err(abort(
                            out,
                            BuildExit::ScheduleRecheckFailed,
                            &format!("Unable to look up build #{} after it left the queue.", next_build),
                            e,
                        ));
                    }
                };
                if rechecked != next_build {
                    let _ = out.start_line();
                    let _ = writeln!(out, "BUILD FAILED/CANCELLED");
                    error!(
                        "--Jenkins--: Build #{} left the queue without starting (last build is #{}).",
                        next_build, rechecked
                    );
                    return Err(BuildExit::BuildCancelled);
                }
                break;
            }

            let _ = write!(out, ".");
            let _ = out.flush();
            thread::sleep(self.poll_interval);
        }

        let _ = writeln!(out, " Done.");
        Ok(())
    }

    fn wait_until_finished<W: Write>(
        &self,
        out: &mut Console<W>,
        build_number: u64,
    ) -> Result<JenkinsBuildResult, BuildExit> {
        let _ = write!(out, "Waiting for build #{} to finish", build_number);
        let _ = out.flush();

        loop {
            let build = match self.job.job_info(out, build_number) {
                Ok(build) => build,
                Err(e) => {
                    return Err(abort(
                        out,
                        BuildExit::CompletionLookupFailed,
                        &format!("Unable to look up build #{} while waiting for it to finish.", build_number),
                        e,
                    ));
                }
            };
            if !build.building {
                let _ = writeln!(out, " Done.");
                return Ok(build);
            }

            let _ = write!(out, ".");
            let _ = out.flush();
            thread::sleep(self.poll_interval);
        }
    }
}

fn abort<W: Write, E: Display>(
    out: &mut Console<W>,
    exit: BuildExit,
    message: &str,
    err: E,
) -> BuildExit {
    let _ = out.start_line();
    let _ = writeln!(out, "{}", message);
    let _ = writeln!(out, "Error: {}", err);
    error!("--Jenkins--: {} {} (exit code {})", message, err, exit.code());
    exit
}
