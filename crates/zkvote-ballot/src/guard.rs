//! # Address Guard
//!
//! Optional one-vote-per-network-address rule for plaintext sessions.
//! Requests without a known address are never blocked.

use std::net::IpAddr;

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct AddressGuard {
    enabled: bool,
    seen: DashSet<IpAddr>,
}

impl AddressGuard {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seen: DashSet::new(),
        }
    }

    /// Claim `addr` for one vote. Returns `false` if the guard is enabled
    /// and the address already voted.
    pub fn try_claim(&self, addr: Option<IpAddr>) -> bool {
        match addr {
            Some(addr) if self.enabled => self.seen.insert(addr),
            _ => true,
        }
    }

    pub fn is_claimed(&self, addr: &IpAddr) -> bool {
        self.seen.contains(addr)
    }

    pub(crate) fn clear(&self) {
        self.seen.clear();
    }
}
