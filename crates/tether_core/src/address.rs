//! Ledger addresses and subject resolution.
//!
//! Most views are parameterized by "whose state": either an address the
//! caller names explicitly (looking at someone else's stream) or the
//! connected wallet's own address. [`AddressResolver`] encodes that rule once.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::wallet::Identity;

/// An account address on the remote ledger.
///
/// Addresses are opaque strings to this layer; surrounding whitespace is
/// trimmed on construction and an all-whitespace address counts as empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Creates an address from any string-like value.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_owned())
        }
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the address carries no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Resolves the effective subject of a query.
///
/// Resolution never fails. An absent result means "not ready yet" and
/// consumers must treat it as such rather than as an error.
///
/// # Example
///
/// ```
/// use tether_core::address::{Address, AddressResolver};
///
/// let me = Address::new("0xme");
/// let them = Address::new("0xthem");
///
/// assert_eq!(AddressResolver::resolve(Some(&them), Some(&me)), Some(them.clone()));
/// assert_eq!(AddressResolver::resolve(Some(&Address::new("")), Some(&me)), Some(me.clone()));
/// assert_eq!(AddressResolver::resolve(None, None), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AddressResolver {
    /// Returns `explicit` when present and non-empty, else `fallback`, else `None`.
    #[must_use]
    pub fn resolve(explicit: Option<&Address>, fallback: Option<&Address>) -> Option<Address> {
        explicit
            .filter(|address| !address.is_empty())
            .or_else(|| fallback.filter(|address| !address.is_empty()))
            .cloned()
    }

    /// Resolves against the address of an injected [`Identity`].
    #[must_use]
    pub fn resolve_for(explicit: Option<&Address>, identity: &Identity) -> Option<Address> {
        Self::resolve(explicit, identity.address())
    }
}
