//! Dler Cloud account client (session-token auth, `{ret,msg,data}` envelope).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use dtb_core::{
    context::CallContext,
    domain::Session,
    errors::Error,
    usage::{ports::AccountApi, types::AccountUsage},
    Result,
};

use crate::http::{Auth, JsonHttp, RetEnvelope};

#[derive(Deserialize)]
struct LoginData {
    #[serde(default)]
    token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    #[serde(default)]
    plan: String,
    #[serde(default)]
    plan_time: String,
    #[serde(default)]
    money: String,
    #[serde(default)]
    aff_money: String,
    #[serde(default)]
    today_used: String,
    #[serde(default)]
    used: String,
    #[serde(default)]
    unused: String,
    #[serde(default)]
    traffic: String,
    #[serde(default)]
    integral: String,
}

impl From<UserInfo> for AccountUsage {
    fn from(u: UserInfo) -> Self {
        Self {
            plan: u.plan,
            plan_time: u.plan_time,
            money: u.money,
            aff_money: u.aff_money,
            today_used: u.today_used,
            used: u.used,
            unused: u.unused,
            traffic: u.traffic,
            integral: u.integral,
        }
    }
}

/// Account client holding the login session.
///
/// The session is written only by `login` (at startup) and read by every other call,
/// so concurrent `/info` commands share it through a read lock.
pub struct DlerCloudClient {
    http: JsonHttp<RetEnvelope>,
    email: String,
    password: String,
    session: RwLock<Option<Session>>,
}

impl DlerCloudClient {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: JsonHttp::new(base_url, Auth::None, timeout)?,
            email: email.into(),
            password: password.into(),
            session: RwLock::new(None),
        })
    }

    pub async fn has_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl AccountApi for DlerCloudClient {
    async fn login(&self, ctx: &CallContext) -> Result<Session> {
        let data: LoginData = ctx
            .run(
                "login",
                self.http.post_form(
                    "login",
                    &[("email", self.email.as_str()), ("passwd", self.password.as_str())],
                ),
            )
            .await
            .map_err(|e| match e {
                Error::Provider { code, message } => Error::Auth { code, message },
                other => other,
            })?;

        let session = Session::new(data.token).ok_or_else(|| Error::Auth {
            code: crate::http::ENVELOPE_OK,
            message: "login response carried no token".to_string(),
        })?;

        *self.session.write().await = Some(session.clone());
        info!("logged in to Dler Cloud as {}", self.email);
        Ok(session)
    }

    async fn get_usage(&self, ctx: &CallContext) -> Result<AccountUsage> {
        let session = self.session().await.ok_or(Error::NotAuthenticated)?;

        let info: UserInfo = ctx
            .run(
                "get_usage",
                self.http
                    .post_form("information", &[("access_token", session.token())]),
            )
            .await?;

        Ok(info.into())
    }
}
