use tracing::debug;

use crate::error::Result;
use crate::models::User;
use crate::store::{keys, Store};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn user_key(email: &str) -> String {
    format!("{}{}", keys::USER_PREFIX, normalize_email(email))
}

/// Per-user records keyed by normalized email, plus the secondary index of
/// every email ever written.
pub struct IdentityStore<'a> {
    store: &'a Store,
}

impl<'a> IdentityStore<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Writes the record under its normalized email and indexes the email.
    /// Last write wins.
    pub fn upsert(&self, user: &User) -> Result<()> {
        let mut user = user.clone();
        user.email = normalize_email(&user.email);
        self.store.set(&user_key(&user.email), &user)?;
        self.index(&user.email)?;
        debug!(email = %user.email, "user saved");
        Ok(())
    }

    pub fn get(&self, email: &str) -> Result<Option<User>> {
        self.store.get(&user_key(email))
    }

    /// Removes the record only. The email stays in the index.
    pub fn remove(&self, email: &str) -> Result<()> {
        self.store.remove(&user_key(email))
    }

    pub fn index_contains(&self, email: &str) -> Result<bool> {
        let email = normalize_email(email);
        Ok(self.known_emails()?.contains(&email))
    }

    pub fn known_emails(&self) -> Result<Vec<String>> {
        self.store.get_or(keys::USERS, Vec::new())
    }

    fn index(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        self.store.update(keys::USERS, Vec::<String>::new(), |list| {
            if !list.contains(&email) {
                list.push(email);
            }
            Ok(())
        })
    }
}
