//! Authorization code flow with PKCE over a loopback redirect.
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a random state
//! 2. Bind a local listener on the first free port of a range
//! 3. Send the user's browser to the consent page
//! 4. Google redirects to `http://127.0.0.1:<port>/callback`
//! 5. The first callback request resolves a oneshot channel
//!
//! The code exchange itself lives in [`crate::identity`], which knows the
//! token endpoint.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{GoogleError, GoogleResult};

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

const CALLBACK_PATH: &str = "/callback";

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization Successful</h1>\
    <p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
    <html><body><h1>Authorization Failed</h1>\
    <p>You can close this window.</p></body></html>";

const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// PKCE flow state (RFC 7636).
#[derive(Debug, Clone)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state echoed back by the provider.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    /// Computes the S256 challenge for a code verifier.
    pub fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the consent page URL from the discovered authorization endpoint.
    pub fn build_auth_url(
        &self,
        authorization_endpoint: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> GoogleResult<String> {
        let mut url = url::Url::parse(authorization_endpoint).map_err(|e| {
            GoogleError::configuration(format!(
                "invalid authorization endpoint {:?}: {}",
                authorization_endpoint, e
            ))
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scopes.join(" "))
            .append_pair("code_challenge", &self.challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", &self.state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url.into())
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parses an HTTP request target such as `/callback?code=..&state=..`.
    ///
    /// Returns `None` for any path other than the callback.
    pub fn parse(target: &str) -> Option<Self> {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        if path != CALLBACK_PATH {
            return None;
        }

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        Some(params)
    }

    /// True when the provider reported a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.code.as_deref().is_none_or(str::is_empty)
    }

    /// Extracts the authorization code, checking the echoed state.
    pub fn into_code(self, expected_state: &str) -> GoogleResult<String> {
        if let Some(error) = self.error {
            let description = self
                .error_description
                .unwrap_or_else(|| "no description".to_string());
            return Err(GoogleError::authentication(format!(
                "authorization denied: {}: {}",
                error, description
            )));
        }

        if self.state.as_deref() != Some(expected_state) {
            return Err(GoogleError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        match self.code {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(GoogleError::authentication(
                "missing authorization code in callback",
            )),
        }
    }
}

/// A local listener awaiting the OAuth redirect.
#[derive(Debug)]
pub struct LoopbackServer {
    listener: TcpListener,
    port: u16,
}

impl LoopbackServer {
    /// Binds to the first available port in `port_range` (inclusive).
    pub async fn bind(port_range: (u16, u16)) -> GoogleResult<Self> {
        for port in port_range.0..=port_range.1 {
            if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)).await {
                let port = listener.local_addr().map(|a| a.port()).unwrap_or(port);
                debug!("bound loopback server on port {}", port);
                return Ok(Self { listener, port });
            }
        }
        Err(GoogleError::configuration(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// The port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The redirect URI to register in the authorization request.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, CALLBACK_PATH)
    }

    /// Waits for the callback request.
    ///
    /// Requests for other paths (favicon and the like) get a 404 and are
    /// skipped. With `timeout` set, gives up with an authentication error
    /// once it elapses; otherwise waits indefinitely.
    pub async fn wait_for_callback(
        self,
        timeout: Option<Duration>,
    ) -> GoogleResult<CallbackParams> {
        let (tx, rx) = oneshot::channel();
        let listener = self.listener;

        let task = tokio::spawn(async move {
            loop {
                let stream = match listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        warn!("failed to accept connection: {}", e);
                        continue;
                    }
                };
                if let Some(params) = handle_connection(stream).await {
                    let _ = tx.send(params);
                    return;
                }
            }
        });

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    task.abort();
                    return Err(GoogleError::authentication(format!(
                        "no response from the consent page after {}s",
                        limit.as_secs()
                    )));
                }
            },
            None => rx.await,
        };

        received.map_err(|_| GoogleError::internal("callback listener stopped"))
    }
}

async fn handle_connection(mut stream: TcpStream) -> Option<CallbackParams> {
    let mut request_line = String::new();
    {
        let mut reader = BufReader::new(&mut stream);
        if reader.read_line(&mut request_line).await.is_err() {
            return None;
        }
    }

    // GET /callback?code=...&state=... HTTP/1.1
    let mut parts = request_line.split_whitespace();
    let params = match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => CallbackParams::parse(target),
        _ => None,
    };

    let page = match &params {
        Some(params) if params.is_error() => FAILURE_PAGE,
        Some(_) => SUCCESS_PAGE,
        None => NOT_FOUND,
    };
    let _ = stream.write_all(page.as_bytes()).await;
    let _ = stream.flush().await;

    params
}

/// Opens `url` in the default browser, printing it when that fails.
pub fn open_browser(url: &str) {
    if let Err(e) = open::that(url) {
        warn!("failed to open browser: {}", e);
        eprintln!("\nPlease open this URL in your browser:\n\n{}\n", url);
    }
}
