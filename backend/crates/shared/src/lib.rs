//! Shared Kernel - Domain-crossing minimal core
//!
//! The vocabulary every feature crate agrees on:
//! - Error taxonomy and result aliases
//! - Typed identifiers for the entities that cross crate boundaries
//! - The authenticated principal placed on requests by the auth middleware
//!
//! Only things that are hard to change and mean the same thing in every
//! domain belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
pub mod principal;
