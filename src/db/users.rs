use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use chrono::Utc;
use log::debug;
use lru_time_cache::LruCache;
use rmp_serde::{from_slice, to_vec_named};
use sled::{
    Transactional,
    transaction::{ConflictableTransactionError, TransactionError, TransactionResult},
};

use crate::{
    error::{AccountError, AppError, AppResult},
    models::User,
};

/// Accounts keyed by uid, with an email -> uid index and an LRU cache in
/// front of sled for the per-request user lookup done by the auth middleware.
pub struct CachedUserStorage {
    _db: sled::Db,
    users: sled::Tree,
    emails: sled::Tree,
    pub user_cache: Arc<RwLock<LruCache<String, User>>>,
    /// Signed-out session tokens, kept until they would have expired anyway.
    pub revoked_tokens: Arc<RwLock<LruCache<String, ()>>>,
}

impl CachedUserStorage {
    pub fn new(path: &str, user_cache_ttl: Duration, token_ttl: Duration) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        let users = db.open_tree("users")?;
        let emails = db.open_tree("user_emails")?;

        let user_cache = Arc::new(RwLock::new(LruCache::with_expiry_duration(user_cache_ttl)));
        let revoked_tokens = Arc::new(RwLock::new(LruCache::with_expiry_duration(token_ttl)));

        Ok(Self {
            _db: db,
            users,
            emails,
            user_cache,
            revoked_tokens,
        })
    }

    /// Stores a new account. The email index entry and the account record are
    /// written in one transaction, so an email is never claimed without an
    /// account behind it and two concurrent sign-ups cannot share an email.
    pub fn create_user(&self, user: &User) -> AppResult<()> {
        let data = to_vec_named(user)?;

        let result: TransactionResult<(), AccountError> =
            (&self.users, &self.emails).transaction(|(users, emails)| {
                if emails.get(user.email.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        AccountError::EmailAlreadyInUse,
                    ));
                }
                emails.insert(user.email.as_bytes(), user.uid.as_bytes())?;
                users.insert(user.uid.as_bytes(), data.as_slice())?;
                Ok(())
            });
        match result {
            Ok(()) => {}
            Err(TransactionError::Abort(e)) => return Err(e.into()),
            Err(TransactionError::Storage(e)) => return Err(e.into()),
        }
        self.users.flush()?;

        self.user_cache
            .write()
            .unwrap()
            .insert(user.uid.clone(), user.clone());
        Ok(())
    }

    pub fn get_user(&self, uid: &str) -> Option<User> {
        if let Some(user) = self.user_cache.write().unwrap().get(uid) {
            return Some(user.clone());
        }

        if let Ok(Some(data)) = self.users.get(uid.as_bytes()) {
            if let Ok(user) = from_slice::<User>(&data) {
                self.user_cache
                    .write()
                    .unwrap()
                    .insert(uid.to_string(), user.clone());
                return Some(user);
            }
        }

        None
    }

    /// Looks up an account by its (already normalized) email.
    pub fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let Some(uid) = self.emails.get(email.as_bytes())? else {
            return Ok(None);
        };
        let uid = String::from_utf8(uid.to_vec())
            .map_err(|e| AppError::serialization(format!("corrupt email index: {e}")))?;
        Ok(self.get_user(&uid))
    }

    pub fn update_user(&self, user: &User) -> AppResult<()> {
        if !self.users.contains_key(user.uid.as_bytes())? {
            return Err(AppError::not_found(format!("user {}", user.uid)));
        }

        let data = to_vec_named(user)?;
        self.users.insert(user.uid.as_bytes(), data)?;
        self.users.flush()?;

        self.user_cache
            .write()
            .unwrap()
            .insert(user.uid.clone(), user.clone());
        Ok(())
    }

    pub fn touch_last_login(&self, mut user: User) -> AppResult<User> {
        user.last_login_at = Utc::now();
        self.update_user(&user)?;
        debug!("User {} signed in", user.uid);
        Ok(user)
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    // Revoked session tokens

    pub fn is_token_revoked(&self, token: &str) -> bool {
        self.revoked_tokens.read().unwrap().peek(token).is_some()
    }

    pub fn revoke_token(&self, token: String) {
        self.revoked_tokens.write().unwrap().insert(token, ());
    }

    pub fn cleanup_expired(&self) {
        // Iterating makes the caches drop expired entries
        self.user_cache.write().unwrap().iter();
        self.revoked_tokens.write().unwrap().iter();
    }

    pub fn get_cache_stats(&self) -> (usize, usize) {
        let users = self.user_cache.read().unwrap().len();
        let tokens = self.revoked_tokens.read().unwrap().len();
        (users, tokens)
    }
}
