//! Authentication collaborator. The login/OTP flow itself lives outside
//! the core; the core only needs to know whether a session is signed in.

use crate::{error::ConsoleResult, store::SettingsStore};

/// Settings key holding the signed-in flag.
pub const AUTH_KEY: &str = "isAuthenticated";

pub trait AuthProvider {
    fn is_authenticated(&self) -> ConsoleResult<bool>;

    /// Record a completed login.
    fn login(&mut self) -> ConsoleResult<()>;

    fn logout(&mut self) -> ConsoleResult<()>;
}

/// Keeps the signed-in flag in the settings store so it survives restarts.
pub struct StoredAuth<'a> {
    store: &'a SettingsStore,
}

impl<'a> StoredAuth<'a> {
    pub fn new(store: &'a SettingsStore) -> Self {
        Self { store }
    }
}

impl AuthProvider for StoredAuth<'_> {
    fn is_authenticated(&self) -> ConsoleResult<bool> {
        Ok(self.store.get_setting(AUTH_KEY)?.as_deref() == Some("true"))
    }

    fn login(&mut self) -> ConsoleResult<()> {
        log::info!("Console session signed in");
        self.store.put_setting(AUTH_KEY, "true")
    }

    fn logout(&mut self) -> ConsoleResult<()> {
        log::info!("Console session signed out");
        self.store.remove_setting(AUTH_KEY)?;
        Ok(())
    }
}
