//! Shared JSON-over-HTTP plumbing for the provider clients.
//!
//! Both providers follow the same pattern (build request → attach auth → execute →
//! decode → map errors); they only differ in the auth scheme and in whether the
//! payload is wrapped in a `{ret, msg, data}` envelope.

use std::{marker::PhantomData, time::Duration};

use serde::{de::DeserializeOwned, Deserialize};

use dtb_core::{
    errors::{CancelReason, Error},
    Result,
};

const USER_AGENT: &str = "dtb/0.1";
const ERROR_BODY_PREVIEW: usize = 200;

/// How requests authenticate.
#[derive(Clone)]
pub enum Auth {
    /// Credentials travel in the form body (session-token APIs).
    None,
    /// `Authorization: Bearer <key>` on every request.
    Bearer(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::None => f.write_str("None"),
            Auth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// How a successful (2xx) response body turns into `T`.
pub trait ResponseShape {
    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T>;
}

/// The body is the payload.
#[derive(Clone, Copy, Debug)]
pub struct PlainJson;

impl ResponseShape for PlainJson {
    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
        serde_json::from_slice(body)
            .map_err(|e| Error::Transport(format!("failed to decode response body: {e}")))
    }
}

/// `{"ret": <int>, "msg": <string>, "data": <payload>}`, success is `ret == 200`.
#[derive(Clone, Copy, Debug)]
pub struct RetEnvelope;

pub const ENVELOPE_OK: i64 = 200;

#[derive(Deserialize)]
struct Envelope {
    ret: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ResponseShape for RetEnvelope {
    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
        let env: Envelope = PlainJson::decode(body)?;
        if env.ret != ENVELOPE_OK {
            return Err(Error::Provider {
                code: env.ret,
                message: env.msg,
            });
        }
        serde_json::from_value(env.data)
            .map_err(|e| Error::Transport(format!("failed to decode response data: {e}")))
    }
}

/// A JSON API rooted at `base_url`, parameterized by auth scheme and response shape.
#[derive(Clone, Debug)]
pub struct JsonHttp<S> {
    http: reqwest::Client,
    base_url: String,
    auth: Auth,
    _shape: PhantomData<fn() -> S>,
}

impl<S: ResponseShape> JsonHttp<S> {
    /// `timeout` is a transport-level backstop; callers bound each call with a `CallContext`.
    pub fn new(base_url: impl Into<String>, auth: Auth, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http,
            base_url,
            auth,
            _shape: PhantomData,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let req = self.http.get(self.url(path));
        self.execute(req).await
    }

    /// POST `application/x-www-form-urlencoded`.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let req = self.http.post(self.url(path)).form(form);
        self.execute(req).await
    }

    async fn execute<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let req = match &self.auth {
            Auth::None => req,
            Auth::Bearer(key) => req.bearer_auth(key),
        };

        let resp = req
            .send()
            .await
            .map_err(|e| request_error(e, "request error"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "invalid response status: {status} {}",
                body.chars().take(ERROR_BODY_PREVIEW).collect::<String>()
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| request_error(e, "failed to read response body"))?;
        if body.is_empty() {
            return Err(Error::Transport("response body is empty".to_string()));
        }

        S::decode(&body)
    }
}

/// The client-level timeout is the same budget as the caller's `CallContext`, so when it
/// fires first it must still read as a timeout rather than a transport failure.
fn request_error(e: reqwest::Error, what: &str) -> Error {
    if e.is_timeout() {
        Error::Cancelled {
            op: "http request",
            reason: CancelReason::TimedOut,
        }
    } else {
        Error::Transport(format!("{what}: {e}"))
    }
}
