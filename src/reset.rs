use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{info, warn};

use crate::credential;
use crate::error::{PortalError, Result};
use crate::identity::{normalize_email, IdentityStore};
use crate::models::ResetTicket;
use crate::store::{keys, Store};

pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    Idle,
    Issued,
    Expired,
}

/// One outstanding password reset at a time. Expiry is only checked when a
/// code is redeemed; nothing sweeps stale tickets.
pub struct ResetFlow<'a> {
    store: &'a Store,
    ttl: Duration,
}

impl<'a> ResetFlow<'a> {
    pub fn new(store: &'a Store, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issues a fresh 6-digit code for a known account, replacing any
    /// outstanding ticket.
    pub fn issue(&self, email: &str, now: DateTime<Utc>) -> Result<ResetTicket> {
        let email = normalize_email(email);
        if IdentityStore::new(self.store).get(&email)?.is_none() {
            return Err(PortalError::NotFound(format!("Account {email}")));
        }
        let code = rand::thread_rng().gen_range(100_000..=999_999u32).to_string();
        let ticket = ResetTicket {
            code,
            email,
            expires_at: now + self.ttl,
        };
        self.store.set(keys::RESET, &ticket)?;
        info!(email = %ticket.email, expires_at = %ticket.expires_at, "reset code issued");
        Ok(ticket)
    }

    /// Checks the code and rewrites the credential. Returns the account's
    /// email. A wrong code leaves the ticket in place.
    pub fn redeem(&self, code: &str, new_password: &str, now: DateTime<Utc>) -> Result<String> {
        let ticket: ResetTicket = self
            .store
            .get(keys::RESET)?
            .ok_or(PortalError::NoPendingReset)?;

        if now > ticket.expires_at {
            warn!(email = %ticket.email, "reset code expired");
            return Err(PortalError::ExpiredTicket);
        }
        if code.trim() != ticket.code {
            warn!(email = %ticket.email, "reset code mismatch");
            return Err(PortalError::CredentialMismatch);
        }

        let identities = IdentityStore::new(self.store);
        let mut user = identities
            .get(&ticket.email)?
            .ok_or_else(|| PortalError::NotFound(format!("Account {}", ticket.email)))?;
        user.password_hash = credential::hash(new_password);
        user.password = None;
        identities.upsert(&user)?;
        self.store.remove(keys::RESET)?;

        info!(email = %ticket.email, "password reset");
        Ok(ticket.email)
    }

    pub fn state(&self, now: DateTime<Utc>) -> Result<ResetState> {
        let ticket: Option<ResetTicket> = self.store.get(keys::RESET)?;
        Ok(match ticket {
            None => ResetState::Idle,
            Some(t) if now > t.expires_at => ResetState::Expired,
            Some(_) => ResetState::Issued,
        })
    }
}
