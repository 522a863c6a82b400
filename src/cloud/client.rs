use alloc::format;
use alloc::string::String;
use core::fmt;

use defmt_or_log::{debug, error, info, warn};
use serde_json::Value;

use super::buffer::ResponseBuffer;
use super::transport::{Exchange, Method, Transport};
use crate::config::{CloudConfig, CREDENTIAL_CAPACITY, HOST_CAPACITY, MAX_API_KEY_LEN, MAX_HOST_LEN};
use crate::error::{CloudError, TransportError};

pub const SIGN_UP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";
const SIGN_UP_BODY: &str = r#"{"returnSecureToken": true}"#;
const ID_TOKEN_FIELD: &str = "idToken";
const CONTENT_TYPE: &str = "application/json";

/* ------------------------------------------------------------------------- */
/*  Host                                                                     */
/* ------------------------------------------------------------------------- */

/// Database authority in its stored form, `<authority>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host(heapless::String<HOST_CAPACITY>);

impl Host {
    /// Strips any `<scheme>://` prefix and leaves exactly one trailing `/`.
    /// `https://x.y/`, `x.y` and `x.y/` all normalize to `x.y/`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let authority = match raw.find("://") {
            Some(at) => &raw[at + 3..],
            None => raw,
        };
        let authority = authority.trim_end_matches('/');
        if authority.is_empty() || authority.len() > MAX_HOST_LEN {
            return None;
        }

        let mut host = heapless::String::new();
        host.push_str(authority).ok()?;
        host.push('/').ok()?;
        Some(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/* ------------------------------------------------------------------------- */
/*  Credential                                                               */
/* ------------------------------------------------------------------------- */

/// Session token from anonymous sign-in, sent verbatim with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: heapless::String<CREDENTIAL_CAPACITY>,
    truncated: bool,
}

impl Credential {
    /// Keeps as much of `token` as fits, never splitting a character.
    pub fn new(token: &str) -> Self {
        let mut kept = heapless::String::new();
        let mut truncated = false;
        for c in token.chars() {
            if kept.push(c).is_err() {
                truncated = true;
                break;
            }
        }
        Self {
            token: kept,
            truncated,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Whether the server's token was longer than the stored one.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }
}

/* ------------------------------------------------------------------------- */
/*  Client                                                                   */
/* ------------------------------------------------------------------------- */

#[derive(Debug)]
struct Endpoint {
    api_key: heapless::String<MAX_API_KEY_LEN>,
    host: Host,
}

impl Endpoint {
    fn from_config(config: &CloudConfig<'_>) -> Option<Self> {
        let Some(api_key) = config.api_key.filter(|k| !k.is_empty() && k.len() <= MAX_API_KEY_LEN)
        else {
            error!("API key not set.");
            return None;
        };
        let Some(host) = config
            .host
            .filter(|h| h.len() <= MAX_HOST_LEN)
            .and_then(Host::normalize)
        else {
            error!("Host not set.");
            return None;
        };

        let mut key = heapless::String::new();
        key.push_str(api_key).ok()?;
        Some(Self { api_key: key, host })
    }

    fn sign_up_url(&self) -> String {
        format!("{}?key={}", SIGN_UP_URL, self.api_key)
    }

    fn resource_url(&self, path: &str, credential: &Credential) -> String {
        format!(
            "https://{}{}.json?auth={}",
            self.host,
            path.trim_start_matches('/'),
            credential.as_str()
        )
    }
}

/// Realtime-database client: one endpoint, one session, one request in
/// flight at a time.
///
/// A client built from an incomplete or oversized configuration stays
/// unauthenticated forever; check [`CloudClient::is_authenticated`] before
/// relying on it.
pub struct CloudClient<T> {
    transport: T,
    endpoint: Option<Endpoint>,
    credential: Option<Credential>,
    response: ResponseBuffer,
}

impl<T: Transport> CloudClient<T> {
    pub fn new(config: &CloudConfig<'_>, transport: T) -> Self {
        let endpoint = Endpoint::from_config(config);
        if let Some(endpoint) = &endpoint {
            debug!("Cloud client initialized for {}", endpoint.host.as_str());
        } else {
            warn!("Cloud client has no usable endpoint, requests are disabled");
        }

        Self {
            transport,
            endpoint,
            credential: None,
            response: ResponseBuffer::with_capacity(config.response_capacity),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn host(&self) -> Option<&Host> {
        self.endpoint.as_ref().map(|e| &e.host)
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn response(&self) -> &ResponseBuffer {
        &self.response
    }

    /// For resizing or clearing between exchanges.
    pub fn response_mut(&mut self) -> &mut ResponseBuffer {
        &mut self.response
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn release(self) -> T {
        self.transport
    }

    /// Obtains a session token. Once authenticated the client stays so for
    /// its lifetime and further calls are no-ops.
    pub fn sign_in_anonymously(&mut self) -> Result<(), CloudError> {
        if self.is_authenticated() {
            debug!("Already signed in");
            return Ok(());
        }
        let Some(url) = self.endpoint.as_ref().map(Endpoint::sign_up_url) else {
            error!("Cannot sign in without API key and host.");
            return Err(CloudError::AuthFailed);
        };

        let exchange = self.perform_request(&url, Method::Post, Some(SIGN_UP_BODY));
        if !exchange.is_success() {
            error!("Error while performing anonymous sign-in request.");
            return Err(CloudError::AuthFailed);
        }
        if self.response.overflowed() {
            error!(
                "Sign-in response larger than {} bytes.",
                self.response.capacity()
            );
            return Err(CloudError::AuthFailed);
        }

        let json: Value = serde_json::from_slice(self.response.contents()).map_err(|_| {
            error!("Failed to parse JSON.");
            CloudError::AuthFailed
        })?;
        let Some(token) = json.get(ID_TOKEN_FIELD).and_then(Value::as_str) else {
            error!("Sign-in response has no string idToken.");
            return Err(CloudError::AuthFailed);
        };

        let credential = Credential::new(token);
        if credential.was_truncated() {
            warn!(
                "Session token truncated from {} to {} bytes",
                token.len(),
                credential.as_str().len()
            );
        }
        self.credential = Some(credential);
        info!("Anonymous sign-in successful.");
        Ok(())
    }

    /// PUTs `json` at `path`.
    pub fn send(&mut self, path: &str, json: &str) -> Result<(), CloudError> {
        let url = self.resource_url(path)?;
        let exchange = self.perform_request(&url, Method::Put, Some(json));
        if !exchange.is_success() {
            error!("Error while sending to {}.", path);
            return Err(exchange.into_error());
        }

        info!("Data sent; HTTP status = {}", exchange.status);
        Ok(())
    }

    /// GETs `path`. The returned body is valid until the next request.
    pub fn read(&mut self, path: &str) -> Result<&[u8], CloudError> {
        let url = self.resource_url(path)?;
        let exchange = self.perform_request(&url, Method::Get, None);
        if !exchange.is_success() {
            error!("Error while reading {}.", path);
            return Err(exchange.into_error());
        }
        if self.response.overflowed() {
            error!("Response larger than {} bytes.", self.response.capacity());
            return Err(CloudError::ResponseOverflow {
                capacity: self.response.capacity(),
            });
        }
        if self.response.is_empty() {
            error!("No response data.");
            return Err(CloudError::EmptyResponse);
        }

        debug!(
            "Received data: {}",
            self.response.as_str().unwrap_or("<binary>")
        );
        Ok(self.response.contents())
    }

    /// Issues one exchange against the shared response buffer. The body is
    /// attached only for methods that carry one.
    pub fn perform_request(&mut self, url: &str, method: Method, body: Option<&str>) -> Exchange {
        // every exchange starts from an empty buffer, connected or not
        self.response.clear();
        let exchange = match self.prepare(url, method, body) {
            Ok(()) => self.transport.perform(&mut self.response),
            Err(e) => Exchange::failed(e),
        };

        if !exchange.is_success() {
            error!(
                "Error while performing request transport={:?} status={}",
                exchange.transport, exchange.status
            );
            error!(
                "request: method={} url={} body={}",
                method.as_str(),
                url,
                body.unwrap_or("")
            );
            if !self.response.is_empty() {
                error!(
                    "response={}",
                    self.response.as_str().unwrap_or("<binary>")
                );
            }
        }
        exchange
    }

    fn prepare(
        &mut self,
        url: &str,
        method: Method,
        body: Option<&str>,
    ) -> Result<(), TransportError> {
        self.transport.set_url(url)?;
        self.transport.set_method(method)?;
        self.transport.set_header("Content-Type", CONTENT_TYPE)?;
        if let Some(body) = body.filter(|_| method.carries_body()) {
            self.transport.set_body(body.as_bytes())?;
        }
        Ok(())
    }

    fn resource_url(&self, path: &str) -> Result<String, CloudError> {
        match (&self.endpoint, &self.credential) {
            (Some(endpoint), Some(credential)) => Ok(endpoint.resource_url(path, credential)),
            _ => {
                error!("Host or ID token not set.");
                Err(CloudError::NotAuthenticated)
            }
        }
    }
}
