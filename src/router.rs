//! Routing decision engine
//!
//! The destination depends on exactly one signal: whether the verdict
//! found sensitive data. File type, size, and provenance never factor in.

use crate::config::RoutingConfig;
use crate::types::{Destination, RoutingDecision, Verdict};

/// Map a verdict to its destination. Pure and total.
pub fn route(verdict: &Verdict) -> RoutingDecision {
    let destination = if verdict.has_sensitive_data() {
        Destination::Secure
    } else {
        Destination::Public
    };
    RoutingDecision { destination }
}

/// Concrete collection names for the two destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    public: String,
    secure: String,
}

impl Collections {
    pub fn new(public: impl Into<String>, secure: impl Into<String>) -> Self {
        Self {
            public: public.into(),
            secure: secure.into(),
        }
    }

    /// Collection backing a destination
    pub fn name(&self, destination: Destination) -> &str {
        match destination {
            Destination::Public => &self.public,
            Destination::Secure => &self.secure,
        }
    }
}

impl From<&RoutingConfig> for Collections {
    fn from(config: &RoutingConfig) -> Self {
        Self::new(&config.public_collection, &config.secure_collection)
    }
}
