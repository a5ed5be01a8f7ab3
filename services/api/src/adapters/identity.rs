//! services/api/src/adapters/identity.rs
//!
//! This module contains the adapter for the hosted identity provider (Firebase
//! Authentication, through its Identity Toolkit REST API).
//! It implements the `IdentityProvider` port from the `core` crate.

use async_trait::async_trait;
use authenticity_core::ports::{
    AuthError, AuthErrorCode, AuthResult, IdentityProvider, IdentityUser,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

//=========================================================================================
// Wire Types
//=========================================================================================

/// Returned by `signInWithPassword`, `signUp` and `update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct FirebaseIdentityAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseIdentityAdapter {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// POSTs `body` to `accounts:{method}` and decodes the reply.
    async fn call<B, R>(&self, method: &str, body: &B) -> AuthResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/accounts:{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.to_string(),
            };
            warn!(method, %status, %message, "Identity provider rejected the request");
            return Err(AuthError::new(code_for(&message)));
        }

        response.json::<R>().await.map_err(|e| {
            AuthError::new(AuthErrorCode::Unknown(format!(
                "invalid {method} response: {e}"
            )))
        })
    }

    async fn lookup(&self, id_token: &str) -> AuthResult<IdentityUser> {
        let response: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::new(AuthErrorCode::UserNotFound))?;
        Ok(IdentityUser {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name,
            email_verified: user.email_verified,
            id_token: id_token.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityAdapter {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<IdentityUser> {
        let account: AccountResponse = self
            .call(
                "signInWithPassword",
                &Credentials {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let id_token = require_token(account.id_token)?;
        // The sign-in reply does not carry the verification flag.
        self.lookup(&id_token).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<IdentityUser> {
        let account: AccountResponse = self
            .call(
                "signUp",
                &Credentials {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let id_token = require_token(account.id_token)?;

        let updated: AccountResponse = self
            .call(
                "update",
                &json!({
                    "idToken": id_token,
                    "displayName": display_name,
                    "returnSecureToken": false,
                }),
            )
            .await?;

        Ok(IdentityUser {
            uid: account.local_id,
            email: if updated.email.is_empty() { account.email } else { updated.email },
            display_name: updated.display_name.or(Some(display_name.to_string())),
            email_verified: false,
            id_token,
        })
    }

    async fn sign_out(&self, _user: &IdentityUser) -> AuthResult<()> {
        // Tokens are held client-side only; dropping the session is enough.
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn send_email_verification(&self, user: &IdentityUser) -> AuthResult<()> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": user.id_token }),
            )
            .await?;
        Ok(())
    }

    async fn reload(&self, user: &IdentityUser) -> AuthResult<IdentityUser> {
        self.lookup(&user.id_token).await
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn require_token(token: Option<String>) -> AuthResult<String> {
    token.filter(|t| !t.is_empty()).ok_or_else(|| {
        AuthError::new(AuthErrorCode::Unknown("missing idToken".to_string()))
    })
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_connect() || e.is_timeout() {
        AuthError::new(AuthErrorCode::NetworkRequestFailed)
    } else {
        AuthError::new(AuthErrorCode::Unknown(e.to_string()))
    }
}

/// Maps a provider error message such as `WEAK_PASSWORD : Password should be ...`
/// to its code. Only the leading token is significant.
pub fn code_for(message: &str) -> AuthErrorCode {
    let token = message
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    match token {
        "EMAIL_NOT_FOUND" => AuthErrorCode::UserNotFound,
        "INVALID_PASSWORD" => AuthErrorCode::WrongPassword,
        "INVALID_LOGIN_CREDENTIALS" => AuthErrorCode::InvalidCredentials,
        "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
        "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthErrorCode::InvalidEmail,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
        _ => AuthErrorCode::Unknown(message.to_string()),
    }
}
