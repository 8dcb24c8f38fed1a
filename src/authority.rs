//! Authority
//!
//! Callers present an opaque `Authority`; an injected `Authorizer` decides
//! whether it speaks for the network owner. The governor never looks inside.

use std::fmt;

use crate::error::{Result, ScheduleError};

/// Identity a caller signs with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Authority(String);

impl Authority {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn address(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides whether an authority may mutate network-wide configuration
pub trait Authorizer: Send + Sync {
    fn authorize(&self, authority: &Authority) -> Result<()>;
}

/// Accepts exactly one address: the network owner
#[derive(Debug, Clone)]
pub struct OwnerAuthorizer {
    owner: Authority,
}

impl OwnerAuthorizer {
    pub fn new(owner: Authority) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Authority {
        &self.owner
    }
}

impl Authorizer for OwnerAuthorizer {
    fn authorize(&self, authority: &Authority) -> Result<()> {
        if authority == &self.owner {
            Ok(())
        } else {
            Err(ScheduleError::Unauthorized(format!(
                "{} is not the network owner",
                authority
            )))
        }
    }
}
