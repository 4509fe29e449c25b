//! Authenticated principal
//!
//! The auth middleware resolves the session cookie and inserts a
//! [`CurrentAccount`] into the request extensions. Handlers in other crates
//! read it with `Extension<CurrentAccount>` and never touch session tokens.

use crate::id::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAccount {
    pub account_id: AccountId,
}

impl CurrentAccount {
    pub fn new(account_id: AccountId) -> Self {
        Self { account_id }
    }
}
