pub mod models;

use std::{sync::Arc, time::Duration};

use reqwest::{
    cookie::{CookieStore, Jar},
    header::CONNECTION,
    redirect::Policy,
    Client, StatusCode, Url,
};
use serde::Serialize;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest, handshake::client::Request, http::header::COOKIE,
};
use tracing::{debug, error, info};

use crate::{
    config::{Config, Credentials},
    error::BridgeError,
};

use self::models::{SetStateRequest, SetTemperatureRequest};

pub const LOGIN_PATH: &str = "/api/Account/Login";
pub const SET_TEMPERATURE_PATH: &str = "/api/flatboiler/setTemperature";
pub const SET_STATE_PATH: &str = "/api/flatboiler/setState";

/// HTTP and WebSocket access to one MyEldom account.
///
/// Cheap to clone; all clones share the connection pool and the session
/// cookie jar populated by [`EldomClient::login`].
#[derive(Debug, Clone)]
pub struct EldomClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    cookies: Arc<Jar>,
    base_url: Url,
    ws_url: String,
    handshake_timeout: Duration,
}

impl EldomClient {
    pub fn new(config: &Config) -> Result<Self, BridgeError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| BridgeError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            // Login success is the redirect itself, so it must never be followed.
            .redirect(Policy::none())
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                cookies,
                base_url,
                ws_url: config.ws_url.clone(),
                handshake_timeout: config.http_timeout(),
            }),
        })
    }

    pub fn ws_url(&self) -> &str {
        &self.inner.ws_url
    }

    /// Upper bound for opening the telemetry socket and sending the
    /// subscription, same as for any REST call.
    pub fn handshake_timeout(&self) -> Duration {
        self.inner.handshake_timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Form-login with the account credentials.
    ///
    /// Only a 3xx response counts as success; the session cookie it sets is
    /// kept in the shared jar. Nothing is retried.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), BridgeError> {
        let url = self.endpoint(LOGIN_PATH);
        debug!(url = %url, email = %credentials.email, "Logging in to MyEldom");

        let form = [
            ("Email", credentials.email.as_str()),
            ("Password", credentials.password.as_str()),
        ];
        let response = self
            .inner
            .http
            .post(&url)
            .header(CONNECTION, "Keep-Alive")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "MyEldom login request failed");
                BridgeError::Transport(e)
            })?;

        let status = response.status();
        if status.is_redirection() {
            info!(status = %status, "MyEldom login succeeded");
            Ok(())
        } else {
            error!(status = %status, "MyEldom login rejected");
            Err(BridgeError::Auth { status })
        }
    }

    /// Change the boiler's target temperature (degrees Celsius).
    pub async fn set_temperature(&self, device_id: &str, temperature: u8) -> Result<(), BridgeError> {
        let body = SetTemperatureRequest {
            device_id,
            temperature,
        };
        self.post_command("set_temperature", SET_TEMPERATURE_PATH, device_id, &body)
            .await
    }

    /// Switch the boiler on or off.
    pub async fn set_state(&self, device_id: &str, on: bool) -> Result<(), BridgeError> {
        let body = SetStateRequest::new(device_id, on);
        self.post_command("set_state", SET_STATE_PATH, device_id, &body)
            .await
    }

    /// POST a control body and require `200 OK`. Failures are logged here so
    /// callers that ignore the result still leave a trace.
    async fn post_command<T: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        device_id: &str,
        body: &T,
    ) -> Result<(), BridgeError> {
        let url = self.endpoint(path);
        debug!(device_id = %device_id, operation, url = %url, "Sending control command");

        let response = match self.inner.http.post(&url).json(body).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(device_id = %device_id, operation, error = %e, "Control request failed");
                return Err(BridgeError::Transport(e));
            }
        };

        let status = response.status();
        if status == StatusCode::OK {
            info!(device_id = %device_id, operation, "Control command accepted");
            Ok(())
        } else {
            error!(device_id = %device_id, operation, status = %status, "Control command rejected");
            Err(BridgeError::Control { operation, status })
        }
    }

    /// Handshake request for the telemetry socket, carrying the session
    /// cookies obtained at login.
    pub(crate) fn websocket_request(&self) -> Result<Request, BridgeError> {
        let mut request = self
            .inner
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(BridgeError::connect)?;

        if let Some(cookie) = self.inner.cookies.cookies(&self.inner.base_url) {
            request.headers_mut().insert(COOKIE, cookie);
        }
        Ok(request)
    }
}
