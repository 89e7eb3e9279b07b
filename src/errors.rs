use failure::Fail;

#[derive(Debug, Fail)]
pub enum JenkinsError {
    #[fail(
        display = "{} failed: HTTP {} {} from {}",
        operation, status, status_text, url
    )]
    UnexpectedStatus {
        operation: String,
        url: String,
        status: u16,
        status_text: String,
    },

    #[fail(display = "Unable to parse the response from {}: {}", url, detail)]
    ParseError { url: String, detail: String },

    // Only ever seen by the retry loop in network.rs.
    #[fail(display = "Jenkins is temporarily unavailable: HTTP {} {}", status, status_text)]
    TransientStatus { status: u16, status_text: String },

    #[fail(display = "Unable to parse url: {}", url)]
    InvalidUrl { url: String },
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "Missing required setting: {}", name)]
    MissingSetting { name: String },

    #[fail(display = "Invalid value '{}' for setting {}", value, name)]
    InvalidSetting { name: String, value: String },

    #[fail(display = "Config file named by {} does not exist: {}", name, path)]
    MissingConfigFile { name: String, path: String },
}
