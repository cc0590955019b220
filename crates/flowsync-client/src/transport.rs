//! Request plumbing shared by the API clients

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use flowsync_interfaces::{ApiError, ApiResult};

use crate::config::HttpClientConfig;
use crate::session::Session;

/// HTTP connection plus session for one API
#[derive(Debug, Clone)]
pub struct ApiTransport {
    name: &'static str,
    base_url: String,
    client: Client,
    session: Session,
}

impl ApiTransport {
    /// Builds the transport for the client called `name`
    pub fn new(name: &'static str, config: &HttpClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("{}: {}", name, e)))?;

        Ok(Self {
            name,
            base_url: config.trimmed_base_url().to_string(),
            client,
            session: Session::for_client(config.anonymous),
        })
    }

    /// Current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchanges username and password for a bearer token
    pub async fn authenticate(&mut self, username: &str, password: &str) -> ApiResult<()> {
        let operation = "Authentication";
        debug!(client = self.name, "Requesting access token");

        let response = self
            .client
            .post(self.url("/access/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(operation, e))?;

        if !status.is_success() {
            error!(client = self.name, status = status.as_u16(), "Authentication failed");
            return Err(ApiError::Http {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        self.session = Session::Token(body.trim().to_string());
        Ok(())
    }

    /// `GET` a JSON document
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        method_name: &str,
        path: &str,
    ) -> ApiResult<T> {
        let request = self.client.get(self.url(path));
        self.execute(operation, method_name, request).await
    }

    /// Send a JSON body with `method` and decode the JSON answer
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        operation: &str,
        method_name: &str,
        path: &str,
        body: &B,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.request(method, self.url(path)).json(body);
        self.execute(operation, method_name, request).await
    }

    /// Rejects calls from a client that still needs to authenticate
    fn authorize(&self, method_name: &str) -> ApiResult<Option<String>> {
        if !self.session.is_usable() {
            return Err(ApiError::Unauthenticated {
                client: self.name.to_string(),
                operation: method_name.to_string(),
            });
        }
        Ok(self.session.authorization())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        method_name: &str,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        let mut request = request;
        if let Some(header) = self.authorize(method_name)? {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(operation, e))?;

        if !status.is_success() {
            error!(
                client = self.name,
                operation,
                status = status.as_u16(),
                "Request failed: {}",
                body
            );
            return Err(ApiError::Http {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> ApiError {
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    ApiError::Transport {
        operation: operation.to_string(),
        message,
    }
}
