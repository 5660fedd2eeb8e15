//! Password login, cookie sessions and the login brute-force throttle.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use dashmap::DashMap;
use metrics::counter;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{StoreError, UserRepo};
use crate::cache::RecoverPoison;
use crate::domain::users::{Role, UserRecord};

pub const METRIC_LOGIN_THROTTLED: &str = "wijiwiki_login_throttled_total";

pub const SESSION_COOKIE: &str = "wijiwiki_session";

const ADMIN_USERNAME: &str = "admin";
const ADMIN_EMAIL: &str = "root@localhost";
const SOURCE: &str = "application::auth";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("no active session")]
    Unauthenticated,
    #[error("role `{required}` required")]
    Forbidden { required: Role },
    #[error("too many login attempts")]
    Throttled,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Logged-in user attached to a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub expires_at: OffsetDateTime,
}

impl Session {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
    sessions: Arc<DashMap<String, Session>>,
    throttle: Arc<LoginThrottle>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>, throttle: LoginThrottle, session_ttl: Duration) -> Self {
        Self {
            users,
            sessions: Arc::new(DashMap::new()),
            throttle: Arc::new(throttle),
            session_ttl,
        }
    }

    /// Count one login request against the throttle.
    pub fn admit_login_attempt(&self) -> Result<(), AuthError> {
        if self.throttle.hit() {
            Ok(())
        } else {
            counter!(METRIC_LOGIN_THROTTLED).increment(1);
            warn!(target = "wijiwiki::auth", "Login attempt throttled");
            Err(AuthError::Throttled)
        }
    }

    /// Check credentials and open a session. Returns the session token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self.users.find(username)?;

        let verified = match &user {
            Some(user) => verify_password(user, password),
            None => {
                // Hash anyway so unknown users take as long as known ones.
                let _ = std::hint::black_box(hash_password("", password));
                false
            }
        };

        let Some(user) = user.filter(|_| verified) else {
            info!(target = "wijiwiki::auth", username, "Login failed");
            return Err(AuthError::InvalidCredentials);
        };

        let token = generate_token();
        let session = Session {
            username: user.username.clone(),
            role: user.role,
            expires_at: OffsetDateTime::now_utc() + self.session_ttl,
        };
        self.sessions.insert(token.clone(), session);
        info!(
            target = "wijiwiki::auth",
            username = %user.username,
            role = %user.role,
            "User logged in"
        );
        Ok(token)
    }

    /// Drop the session behind `token`. Returns whether one existed.
    pub fn logout(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                info!(
                    target = "wijiwiki::auth",
                    username = %session.username,
                    "User logged out"
                );
                true
            }
            None => false,
        }
    }

    /// Live session for `token`. Expired sessions are removed on sight.
    pub fn current_user(&self, token: &str) -> Option<Session> {
        let now = OffsetDateTime::now_utc();
        let session = self.sessions.get(token).map(|entry| entry.value().clone())?;
        if session.is_expired(now) {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    pub fn authorize(&self, token: Option<&str>, required: Role) -> Result<Session, AuthError> {
        let session = token
            .and_then(|token| self.current_user(token))
            .ok_or(AuthError::Unauthenticated)?;
        if session.role.satisfies(required) {
            Ok(session)
        } else {
            Err(AuthError::Forbidden { required })
        }
    }

    /// Forget every expired session.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before - self.sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        role: Role,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        let salt = generate_salt();
        let record = UserRecord {
            username: username.to_string(),
            email: email.to_string(),
            role,
            hash: hash_password(&salt, password),
            salt,
        };
        self.users.save(record.clone())?;
        Ok(record)
    }

    /// Replace every account with a single `admin` user.
    pub fn init_admin(&self, password: &str) -> Result<UserRecord, AuthError> {
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        self.users.reset()?;
        self.sessions.clear();
        let record = self.create_user(ADMIN_USERNAME, ADMIN_EMAIL, Role::Admin, password)?;
        info!(
            target = "wijiwiki::auth",
            username = %record.username,
            "Initialized admin account"
        );
        Ok(record)
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn verify_password(user: &UserRecord, password: &str) -> bool {
    let candidate = hash_password(&user.salt, password);
    candidate.as_bytes().ct_eq(user.hash.as_bytes()).into()
}

fn generate_salt() -> String {
    hex::encode(Uuid::new_v4().as_bytes())
}

fn generate_token() -> String {
    let mut raw = [0_u8; 32];
    raw[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    raw[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(raw)
}

#[derive(Debug)]
struct ThrottleWindow {
    started: Instant,
    count: u32,
    locked: bool,
}

/// Fixed-window counter over all login requests.
///
/// When a window closes with at least `limit` hits, every request in the
/// following window is refused. Refused requests still count.
#[derive(Debug)]
pub struct LoginThrottle {
    limit: u32,
    window: Duration,
    state: Mutex<ThrottleWindow>,
}

impl LoginThrottle {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(ThrottleWindow {
                started: Instant::now(),
                count: 0,
                locked: false,
            }),
        }
    }

    /// Record one hit. Returns `false` when logins are currently locked.
    pub fn hit(&self) -> bool {
        self.hit_at(Instant::now())
    }

    pub(crate) fn hit_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().recover(SOURCE, "throttle_hit");

        let elapsed = now.saturating_duration_since(state.started);
        if elapsed >= self.window {
            let window_nanos = self.window.as_nanos().max(1);
            let passed = elapsed.as_nanos() / window_nanos;
            // Only the window right before the current one decides the lock.
            state.locked = passed == 1 && state.count >= self.limit;
            state.count = 0;
            let advance = u32::try_from(passed).unwrap_or(u32::MAX);
            state.started = state
                .started
                .checked_add(self.window.saturating_mul(advance))
                .unwrap_or(now);
        }

        state.count = state.count.saturating_add(1);
        !state.locked
    }
}
