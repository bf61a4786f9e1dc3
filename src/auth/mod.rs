//! One login surface for both sign-in flows: the local mock flow that keeps
//! its state in the store, and OAuth sessions held by the auth server.

pub mod mock;

use zeroize::Zeroizing;

use crate::error::{Result, TentlyError};
use crate::models::User;

pub enum Credentials {
    Password {
        email: String,
        password: Zeroizing<String>,
    },
    /// Profile already vouched for by an identity provider.
    Profile(User),
}

pub trait AuthProvider {
    fn login(&self, credentials: Credentials) -> Result<User>;
    fn logout(&self) -> Result<()>;
    fn current_user(&self) -> Result<Option<User>>;

    #[cfg(test)]
    fn is_authenticated(&self) -> Result<bool> {
        Ok(self.current_user()?.is_some())
    }
}

/// The signed-in user, or `NotAuthenticated`.
pub fn require_user(provider: &dyn AuthProvider) -> Result<User> {
    provider.current_user()?.ok_or(TentlyError::NotAuthenticated)
}
