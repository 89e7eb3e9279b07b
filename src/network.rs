use std::fmt;
use std::io::Write;
use std::time::Duration;

use failure::Error;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Url;

use crate::console::Console;
use crate::errors::JenkinsError;
use crate::retry::Retrier;

/// Gateway errors that mean "Jenkins is momentarily unreachable", not "the
/// request was wrong".
pub const RETRYABLE_STATUSES: [u16; 3] = [502, 503, 504];

const USER_AGENT: &str = concat!("rusty_build_trigger/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_retryable(&self) -> bool {
        RETRYABLE_STATUSES.contains(&self.status)
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sends exactly one HTTP request. Errors are connection-level failures only;
/// every status code, good or bad, comes back as an `HttpResponse`.
pub trait Transport {
    fn send(&self, method: Method, url: &str) -> Result<HttpResponse, Error>;
}

pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(
        credentials: Credentials,
        accept_invalid_certs: bool,
        timeout: Duration,
    ) -> Result<HttpTransport, Error> {
        // No idle connections are kept, so every request opens a fresh one.
        let client = Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .pool_max_idle_per_host(0)
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(HttpTransport {
            client: client,
            credentials: credentials,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: Method, url_string: &str) -> Result<HttpResponse, Error> {
        let url = Url::parse(url_string).map_err(|_| JenkinsError::InvalidUrl {
            url: url_string.to_string(),
        })?;
        let request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        let response = request
            .basic_auth(
                &self.credentials.username,
                Some(&self.credentials.password),
            )
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!("{} {} -> {}", method, url_string, status);

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body: body,
        })
    }
}

/// Wraps a `Transport` so that gateway errors and dropped connections are
/// retried until the server answers with something meaningful.
pub struct RequestClient<T> {
    transport: T,
    retrier: Retrier,
}

impl<T: Transport> RequestClient<T> {
    pub fn new(transport: T, retrier: Retrier) -> RequestClient<T> {
        RequestClient {
            transport: transport,
            retrier: retrier,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn request<W: Write>(
        &self,
        out: &mut Console<W>,
        method: Method,
        url: &str,
        label: &str,
    ) -> HttpResponse {
        self.retrier.run_until_success(out, label, || -> Result<HttpResponse, Error> {
            let response = self.transport.send(method, url)?;
            if response.is_retryable() {
                return Err(JenkinsError::TransientStatus {
                    status: response.status,
                    status_text: response.status_text,
                }
                .into());
            }
            Ok(response)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use httpmock::prelude::*;
    use std::io;

    fn instant_client(transport: ScriptedTransport) -> RequestClient<ScriptedTransport> {
        RequestClient::new(transport, Retrier::new(Duration::from_millis(0)))
    }

    #[test]
    fn gateway_errors_are_retried_until_the_server_recovers() {
        for status in RETRYABLE_STATUSES.iter() {
            let client = instant_client(ScriptedTransport::new(vec![
                reply(*status, ""),
                reply(*status, ""),
                reply(200, "{}"),
            ]));

            let response = client.request(
                &mut Console::new(io::sink()),
                Method::Get,
                "https://ci/job/app-build/api/json",
                "job lookup",
            );

            assert_eq!(response.status, 200);
            assert_eq!(client.transport().requests().len(), 3);
        }
    }

    #[test]
    fn connection_failures_are_retried() {
        let client = instant_client(ScriptedTransport::new(vec![
            connection_refused(),
            reply(502, ""),
            reply(201, ""),
        ]));

        let response = client.request(
            &mut Console::new(io::sink()),
            Method::Post,
            "https://ci/job/app-build/build",
            "build scheduling",
        );

        assert_eq!(response.status, 201);
        assert_eq!(client.transport().remaining(), 0);
    }

    #[test]
    fn other_statuses_are_returned_untouched() {
        for status in [200u16, 401, 404, 500].iter() {
            let client = instant_client(ScriptedTransport::new(vec![reply(*status, "body")]));

            let response = client.request(
                &mut Console::new(io::sink()),
                Method::Get,
                "https://ci/job/app-build/api/json",
                "job lookup",
            );

            assert_eq!(response.status, *status);
            assert_eq!(response.body, "body");
            assert_eq!(client.transport().requests().len(), 1);
        }
    }

    #[test]
    fn http_transport_sends_basic_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/job/app-build/api/json")
                .header("authorization", "Basic dXNlcjpwYXNz");
            then.status(200).body("{\"lastBuild\":null}");
        });

        let transport = HttpTransport::new(
            Credentials {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
            false,
            Duration::from_secs(5),
        )
        .unwrap();
        let response = transport
            .send(Method::Get, &server.url("/job/app-build/api/json"))
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.body, "{\"lastBuild\":null}");
    }

    #[test]
    fn http_transport_does_not_follow_redirects() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/job/app-build/build");
            then.status(302).header("location", "/job/app-build/");
        });

        let transport = HttpTransport::new(
            Credentials {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
            false,
            Duration::from_secs(5),
        )
        .unwrap();
        let response = transport
            .send(Method::Post, &server.url("/job/app-build/build"))
            .unwrap();

        mock.assert();
        assert_eq!(response.status, 302);
    }

    #[test]
    fn http_transport_rejects_malformed_urls() {
        let transport = HttpTransport::new(
            Credentials {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
            false,
            Duration::from_secs(5),
        )
        .unwrap();

        let err = transport.send(Method::Get, "not a url").unwrap_err();
        assert!(err.to_string().contains("not a url"));
    }
}
