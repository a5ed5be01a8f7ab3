//! Test doubles for the core ports.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use authenticity_core::{
    AuthError, AuthErrorCode, AuthResult, ClassificationProvider, ClassifierOutput,
    IdentityProvider, IdentityUser, InMemoryStore, KeyValueStore, PortError, PortResult,
    ProviderError,
};

//=========================================================================================
// Storage
//=========================================================================================

/// An in-memory store whose reads and writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `value` under `key`.
    pub fn holding(key: &str, value: &str) -> Self {
        Self {
            inner: InMemoryStore::with_entries([(key, value)]),
            ..Self::default()
        }
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk unavailable".into()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".into()));
        }
        self.inner.remove(key).await
    }
}

//=========================================================================================
// Classification
//=========================================================================================

pub enum Script {
    Answer(ClassifierOutput),
    Fail,
    NotConfigured,
}

pub struct ScriptedProvider {
    script: Script,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ClassificationProvider for ScriptedProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn classify(&self, _text: &str) -> Result<ClassifierOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.script {
            Script::Answer(output) => Ok(output.clone()),
            Script::Fail => Err(ProviderError::CallFailed("HTTP 503".into())),
            Script::NotConfigured => Err(ProviderError::NotConfigured),
        }
    }
}

/// A provider that reports itself as unconfigured and must never be called.
pub struct UnconfiguredProvider;

#[async_trait]
impl ClassificationProvider for UnconfiguredProvider {
    fn is_configured(&self) -> bool {
        false
    }

    async fn classify(&self, _text: &str) -> Result<ClassifierOutput, ProviderError> {
        panic!("unconfigured provider must not be called");
    }
}

//=========================================================================================
// Identity
//=========================================================================================

pub fn identity(email: &str, verified: bool) -> IdentityUser {
    IdentityUser {
        uid: format!("uid-{email}"),
        email: email.to_string(),
        display_name: Some("Test User".to_string()),
        email_verified: verified,
        id_token: "token".to_string(),
    }
}

/// An identity provider with one account whose verification flag tests can flip.
#[derive(Default)]
pub struct FakeIdentity {
    pub verified: AtomicBool,
    pub verification_emails: AtomicUsize,
    pub reset_emails: Mutex<Vec<String>>,
    pub fail_with: Mutex<Option<AuthErrorCode>>,
    pub fail_verification_send: AtomicBool,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, code: AuthErrorCode) {
        *self.fail_with.lock().unwrap() = Some(code);
    }

    fn check(&self) -> AuthResult<()> {
        match self.fail_with.lock().unwrap().take() {
            Some(code) => Err(AuthError::new(code)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<IdentityUser> {
        self.check()?;
        if password != "correct-horse" {
            return Err(AuthError::new(AuthErrorCode::WrongPassword));
        }
        Ok(identity(email, self.verified.load(Ordering::SeqCst)))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<IdentityUser> {
        self.check()?;
        if password.len() < 6 {
            return Err(AuthError::new(AuthErrorCode::WeakPassword));
        }
        self.verified.store(false, Ordering::SeqCst);
        let mut user = identity(email, false);
        user.display_name = Some(display_name.to_string());
        Ok(user)
    }

    async fn sign_out(&self, _user: &IdentityUser) -> AuthResult<()> {
        self.check()
    }

    async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        self.check()?;
        self.reset_emails.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn send_email_verification(&self, _user: &IdentityUser) -> AuthResult<()> {
        self.check()?;
        if self.fail_verification_send.load(Ordering::SeqCst) {
            return Err(AuthError::new(AuthErrorCode::TooManyRequests));
        }
        self.verification_emails.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reload(&self, user: &IdentityUser) -> AuthResult<IdentityUser> {
        self.check()?;
        let mut refreshed = user.clone();
        refreshed.email_verified = self.verified.load(Ordering::SeqCst);
        Ok(refreshed)
    }
}
