#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate log;

#[macro_use]
extern crate failure;

mod build_trigger;
mod config_file;
mod console;
mod errors;
mod jenkins_integration;
mod jenkins_response;
mod logging;
mod network;
mod retry;

use std::io;
use std::process;

use build_trigger::BuildTrigger;
use config_file::Config;
use failure::Error;
use jenkins_integration::{JenkinsJob, JobEndpoint};
use network::{Credentials, HttpTransport};
use retry::Retrier;

// Nothing has been asked of Jenkins yet; shares the code of an unavailable job.
const SETUP_FAILED: i32 = 1;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            println!("Unable to load the build trigger configuration.");
            println!("Error: {}", e);
            process::exit(SETUP_FAILED);
        }
    };

    if let Err(e) = logging::init(&config.log_level) {
        eprintln!("Logging is disabled: {}", e);
    }

    if let Some(notice) = config.insecure_tls_notice() {
        eprintln!("WARNING: {}", notice);
        warn!("{}", notice);
    }

    let trigger = match trigger_from_config(&config) {
        Ok(trigger) => trigger,
        Err(e) => {
            println!("Unable to set up the Jenkins client.");
            println!("Error: {}", e);
            process::exit(SETUP_FAILED);
        }
    };

    let exit = trigger.run(&mut io::stdout());
    info!("Exiting with {:?} ({}).", exit, exit.code());
    process::exit(exit.code());
}

fn trigger_from_config(config: &Config) -> Result<BuildTrigger<HttpTransport>, Error> {
    let endpoint = JobEndpoint::new(&config.jenkins_base_url, &config.app_name)?;
    let transport = HttpTransport::new(
        Credentials {
            username: config.jenkins_username.clone(),
            password: config.jenkins_password.clone(),
        },
        config.accept_invalid_certs,
        config.request_timeout(),
    )?;
    let job = JenkinsJob::new(endpoint, transport, Retrier::new(config.retry_interval()));

    Ok(BuildTrigger::new(job, config.poll_interval()))
}
