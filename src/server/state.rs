use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rand::Rng;

use super::config::Config;
use super::google::IdentityProvider;
use crate::auth::{AuthProvider, Credentials};
use crate::error::{Result, TentlyError};
use crate::models::User;

pub const SESSION_COOKIE: &str = "tently.sid";
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const STATE_TTL: Duration = Duration::from_secs(10 * 60);
/// Upper bound on nonces awaiting a callback; the oldest is evicted first.
const MAX_PENDING_STATES: usize = 1024;

fn random_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

struct Session {
    user: User,
    expires_at: Instant,
}

/// In-memory session table plus the OAuth `state` nonces still awaiting a
/// callback. Both expire; sessions do not survive a restart.
pub struct Sessions {
    live: RwLock<HashMap<String, Session>>,
    pending_states: RwLock<HashMap<String, Instant>>,
    session_ttl: Duration,
    state_ttl: Duration,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::with_ttls(SESSION_TTL, STATE_TTL)
    }
}

impl Sessions {
    pub fn with_ttls(session_ttl: Duration, state_ttl: Duration) -> Self {
        Self {
            live: RwLock::new(HashMap::new()),
            pending_states: RwLock::new(HashMap::new()),
            session_ttl,
            state_ttl,
        }
    }

    pub fn create(&self, user: User) -> String {
        let sid = random_token();
        let now = Instant::now();
        let mut live = self.live.write();
        live.retain(|_, s| s.expires_at > now);
        live.insert(
            sid.clone(),
            Session {
                user,
                expires_at: now + self.session_ttl,
            },
        );
        sid
    }

    pub fn get(&self, sid: &str) -> Option<User> {
        let now = Instant::now();
        {
            let live = self.live.read();
            match live.get(sid) {
                Some(s) if s.expires_at > now => return Some(s.user.clone()),
                None => return None,
                Some(_) => {}
            }
        }
        self.live.write().remove(sid);
        tracing::debug!("session expired");
        None
    }

    pub fn destroy(&self, sid: &str) -> bool {
        self.live.write().remove(sid).is_some()
    }

    pub fn issue_state(&self) -> String {
        let state = random_token();
        let now = Instant::now();
        let mut pending = self.pending_states.write();
        pending.retain(|_, issued| now.duration_since(*issued) < self.state_ttl);
        while pending.len() >= MAX_PENDING_STATES {
            let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, issued)| **issued)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            pending.remove(&oldest);
        }
        pending.insert(state.clone(), now);
        state
    }

    /// Consume a nonce; each one is good for a single callback within
    /// its lifetime.
    pub fn take_state(&self, state: &str) -> bool {
        match self.pending_states.write().remove(state) {
            Some(issued) => issued.elapsed() < self.state_ttl,
            None => false,
        }
    }
}

#[cfg(test)]
impl Sessions {
    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending_states.read().len()
    }
}

pub struct AppState {
    pub config: Config,
    pub sessions: Sessions,
    pub provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn IdentityProvider>) -> Arc<Self> {
        Arc::new(Self {
            config,
            sessions: Sessions::default(),
            provider,
        })
    }
}

/// Request-scoped view of one browser's session.
pub struct SessionAuth<'a> {
    sessions: &'a Sessions,
    sid: Mutex<Option<String>>,
}

impl<'a> SessionAuth<'a> {
    pub fn new(sessions: &'a Sessions, sid: Option<String>) -> Self {
        Self {
            sessions,
            sid: Mutex::new(sid),
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.sid.lock().clone()
    }
}

impl AuthProvider for SessionAuth<'_> {
    fn login(&self, credentials: Credentials) -> Result<User> {
        let Credentials::Profile(user) = credentials else {
            return Err(TentlyError::Other(
                "Password sign-in is not available on the auth server".into(),
            ));
        };
        let sid = self.sessions.create(user.clone());
        if let Some(old) = self.sid.lock().replace(sid) {
            self.sessions.destroy(&old);
        }
        tracing::info!(email = %user.email, "session started");
        Ok(user)
    }

    fn logout(&self) -> Result<()> {
        if let Some(sid) = self.sid.lock().take() {
            self.sessions.destroy(&sid);
        }
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>> {
        Ok(self
            .sid
            .lock()
            .as_deref()
            .and_then(|sid| self.sessions.get(sid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_user;

    #[test]
    fn test_state_is_single_use() {
        let sessions = Sessions::default();
        let state = sessions.issue_state();
        assert!(sessions.take_state(&state));
        assert!(!sessions.take_state(&state));
        assert!(!sessions.take_state("made-up"));
    }

    #[test]
    fn test_session_auth_lifecycle() {
        let sessions = Sessions::default();
        let auth = SessionAuth::new(&sessions, None);
        assert!(!auth.is_authenticated().unwrap());

        auth.login(Credentials::Profile(User::with_email("grace@coop.ng")))
            .unwrap();
        let sid = auth.session_id().unwrap();
        assert_eq!(sessions.get(&sid).unwrap().email, "grace@coop.ng");

        // Another request carrying the same cookie sees the same user.
        let later = SessionAuth::new(&sessions, Some(sid.clone()));
        assert_eq!(require_user(&later).unwrap().email, "grace@coop.ng");

        later.logout().unwrap();
        assert!(sessions.get(&sid).is_none());
        assert!(!auth.is_authenticated().unwrap());
    }

    #[test]
    fn test_password_login_is_refused() {
        let sessions = Sessions::default();
        let auth = SessionAuth::new(&sessions, None);
        let creds = Credentials::Password {
            email: "grace@coop.ng".into(),
            password: zeroize::Zeroizing::new("pw".into()),
        };
        assert!(auth.login(creds).is_err());
        assert_eq!(sessions.len(), 0);
    }

    #[test]
    fn test_abandoned_states_are_pruned() {
        let sessions = Sessions::with_ttls(SESSION_TTL, Duration::ZERO);
        let stale = sessions.issue_state();
        for _ in 0..100 {
            sessions.issue_state();
        }
        assert_eq!(sessions.pending_len(), 1);
        assert!(!sessions.take_state(&stale));
    }

    #[test]
    fn test_pending_states_are_capped() {
        let sessions = Sessions::default();
        for _ in 0..MAX_PENDING_STATES + 500 {
            sessions.issue_state();
        }
        assert_eq!(sessions.pending_len(), MAX_PENDING_STATES);
        let fresh = sessions.issue_state();
        assert!(sessions.take_state(&fresh));
    }

    #[test]
    fn test_sessions_expire() {
        let sessions = Sessions::with_ttls(Duration::ZERO, STATE_TTL);
        let sid = sessions.create(User::with_email("grace@coop.ng"));
        assert!(sessions.get(&sid).is_none());
        assert_eq!(sessions.len(), 0);

        // Expired sessions are swept when the next one is created.
        sessions.create(User::with_email("bryan@coop.ng"));
        sessions.create(User::with_email("amaka@coop.ng"));
        assert_eq!(sessions.len(), 1);
    }
}
