use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{AuthProvider, Credentials};
use crate::db::{Store, CREDENTIALS, IS_AUTHENTICATED, OTP, USER};
use crate::error::{FieldError, Result, TentlyError};
use crate::members::looks_like_email;
use crate::models::User;

pub const MIN_PASSWORD_LEN: usize = 6;
const OTP_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Signup,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOtp {
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub issued_at: DateTime<Utc>,
}

impl PendingOtp {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at > chrono::Duration::minutes(OTP_TTL_MINUTES)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Credential {
    name: String,
    salt: String,
    hash: String,
    verified: bool,
}

pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Zeroizing<String>,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn new_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

fn new_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !looks_like_email(email) {
        errors.push(FieldError::new("email", "Please enter a valid email"));
    }
}

fn check_password(errors: &mut Vec<FieldError>, field: &str, password: &str) {
    if password.is_empty() {
        errors.push(FieldError::new(field, "Password is required"));
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            field,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
}

fn into_result(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TentlyError::Validation(errors))
    }
}

/// Sleep for `latency` plus up to a quarter of it again, standing in for a
/// round trip to a backend.
pub fn simulate_network(latency: Duration) {
    if latency.is_zero() {
        return;
    }
    let base = latency.as_millis() as u64;
    let jitter = rand::thread_rng().gen_range(0..=base / 4);
    thread::sleep(Duration::from_millis(base + jitter));
}

/// Local stand-in for a real identity backend. Session state lives in the
/// store under `isAuthenticated` and `user`.
pub struct MockAuth<'a> {
    store: &'a Store,
    latency: Duration,
}

impl<'a> MockAuth<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency_ms(mut self, ms: u64) -> Self {
        self.latency = Duration::from_millis(ms);
        self
    }

    fn simulate_network(&self) {
        simulate_network(self.latency);
    }

    fn credentials(&self) -> Result<BTreeMap<String, Credential>> {
        Ok(self.store.get_json(CREDENTIALS)?.unwrap_or_default())
    }

    fn start_session(&self, user: &User) -> Result<()> {
        self.store.put_json(USER, user)?;
        self.store.put_raw(IS_AUTHENTICATED, "true")?;
        tracing::info!(email = %user.email, "signed in");
        Ok(())
    }

    fn issue_otp(&self, email: &str, purpose: OtpPurpose) -> Result<PendingOtp> {
        let otp = PendingOtp {
            email: email.to_string(),
            code: new_code(),
            purpose,
            issued_at: Utc::now(),
        };
        self.store.put_json(OTP, &otp)?;
        tracing::debug!(email, ?purpose, "verification code issued");
        Ok(otp)
    }

    /// Look up the pending code without consuming it.
    fn pending_otp(&self, code: &str) -> Result<PendingOtp> {
        let code = code.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(TentlyError::Validation(vec![FieldError::new(
                "otp",
                "Please enter a valid 6-digit code",
            )]));
        }
        match self.store.get_json::<PendingOtp>(OTP)? {
            Some(otp) if otp.code == code && !otp.is_expired(Utc::now()) => Ok(otp),
            _ => Err(TentlyError::InvalidOtp),
        }
    }

    /// Register an account and send (print) a verification code. The user is
    /// signed in once the code is confirmed with [`MockAuth::verify_otp`].
    pub fn signup(&self, form: &SignupForm) -> Result<PendingOtp> {
        let mut errors = Vec::new();
        if form.first_name.trim().is_empty() {
            errors.push(FieldError::new("firstName", "First name is required"));
        }
        if form.last_name.trim().is_empty() {
            errors.push(FieldError::new("lastName", "Last name is required"));
        }
        check_email(&mut errors, &form.email);
        check_password(&mut errors, "password", &form.password);
        into_result(errors)?;

        self.simulate_network();
        let email = form.email.trim().to_lowercase();
        let salt = new_salt();
        let mut creds = self.credentials()?;
        if creds.get(&email).is_some_and(|cred| cred.verified) {
            return Err(TentlyError::Validation(vec![FieldError::new(
                "email",
                "An account with this email already exists",
            )]));
        }
        creds.insert(
            email.clone(),
            Credential {
                name: format!("{} {}", form.first_name.trim(), form.last_name.trim()),
                hash: hash_password(&salt, &form.password),
                salt,
                verified: false,
            },
        );
        self.store.put_json(CREDENTIALS, &creds)?;
        self.issue_otp(&email, OtpPurpose::Signup)
    }

    /// Start a password reset. Unknown addresses still get a code, as a real
    /// backend would not reveal which emails are registered.
    pub fn request_password_reset(&self, email: &str) -> Result<PendingOtp> {
        let mut errors = Vec::new();
        check_email(&mut errors, email);
        into_result(errors)?;
        self.simulate_network();
        self.issue_otp(&email.trim().to_lowercase(), OtpPurpose::Reset)
    }

    /// Confirm a code. A signup code marks the account verified and signs the
    /// user in; a reset code stays pending until the new password is set.
    pub fn verify_otp(&self, code: &str) -> Result<PendingOtp> {
        let otp = self.pending_otp(code)?;
        self.simulate_network();
        if otp.purpose == OtpPurpose::Signup {
            let mut creds = self.credentials()?;
            let name = creds.get_mut(&otp.email).map(|cred| {
                cred.verified = true;
                cred.name.clone()
            });
            self.store.put_json(CREDENTIALS, &creds)?;
            self.store.remove(OTP)?;
            let user = User {
                name,
                ..User::with_email(&otp.email)
            };
            self.start_session(&user)?;
        }
        Ok(otp)
    }

    pub fn reset_password(&self, code: &str, password: &str, confirm: &str) -> Result<()> {
        let mut errors = Vec::new();
        check_password(&mut errors, "newPassword", password);
        if password != confirm {
            errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }
        into_result(errors)?;

        let otp = self.pending_otp(code)?;
        if otp.purpose != OtpPurpose::Reset {
            return Err(TentlyError::InvalidOtp);
        }
        self.simulate_network();
        let mut creds = self.credentials()?;
        let Some(cred) = creds.get_mut(&otp.email) else {
            self.store.remove(OTP)?;
            return Err(TentlyError::Other("No account is registered with this email".into()));
        };
        cred.salt = new_salt();
        cred.hash = hash_password(&cred.salt, password);
        // A redeemed reset code also verifies the address.
        cred.verified = true;
        self.store.put_json(CREDENTIALS, &creds)?;
        self.store.remove(OTP)?;
        tracing::info!(email = %otp.email, "password reset");
        Ok(())
    }
}

impl AuthProvider for MockAuth<'_> {
    /// Any well-formed email with a long enough password gets in, except that
    /// an address registered through `signup` must be verified and must
    /// present its own password.
    fn login(&self, credentials: Credentials) -> Result<User> {
        let user = match credentials {
            Credentials::Profile(user) => user,
            Credentials::Password { email, password } => {
                let mut errors = Vec::new();
                check_email(&mut errors, &email);
                check_password(&mut errors, "password", &password);
                into_result(errors)?;

                self.simulate_network();
                let email = email.trim().to_lowercase();
                let name = match self.credentials()?.remove(&email) {
                    Some(cred) if !cred.verified => {
                        return Err(TentlyError::Other(
                            "Please verify your email before signing in".into(),
                        ));
                    }
                    Some(cred) if cred.hash != hash_password(&cred.salt, &password) => {
                        return Err(TentlyError::Other("Invalid email or password".into()));
                    }
                    Some(cred) if !cred.name.is_empty() => Some(cred.name),
                    _ => None,
                };
                User {
                    name,
                    ..User::with_email(&email)
                }
            }
        };
        self.start_session(&user)?;
        Ok(user)
    }

    fn logout(&self) -> Result<()> {
        self.store.remove(IS_AUTHENTICATED)?;
        self.store.remove(USER)?;
        tracing::info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>> {
        if self.store.get_raw(IS_AUTHENTICATED)?.as_deref() != Some("true") {
            return Ok(None);
        }
        self.store.get_json(USER)
    }
}
