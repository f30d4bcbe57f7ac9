use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::error::Result;
use crate::identity::normalize_email;
use crate::models::{Role, Session};
use crate::store::{keys, Store};

/// The "current user" pointer. At most one per store, no expiry.
pub struct SessionManager<'a> {
    store: &'a Store,
}

impl<'a> SessionManager<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn start(&self, email: &str, role: Role) -> Result<Session> {
        let session = Session {
            email: normalize_email(email),
            role,
            sid: random_token(),
        };
        self.store.set(keys::CURRENT, &session)?;
        Ok(session)
    }

    pub fn current(&self) -> Result<Option<Session>> {
        self.store.get(keys::CURRENT)
    }

    pub fn end(&self) -> Result<()> {
        self.store.remove(keys::CURRENT)
    }
}

/// 128 random bits as four hex-rendered `u32`s.
pub fn random_token() -> String {
    let mut bytes = [0u8; 16];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        warn!("OS entropy unavailable ({e}), using clock-seeded generator");
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        StdRng::seed_from_u64(nanos).fill_bytes(&mut bytes);
    }
    bytes
        .chunks_exact(4)
        .map(|c| format!("{:x}", u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect()
}
