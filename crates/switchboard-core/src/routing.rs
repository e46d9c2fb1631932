//! Routing selection and action script construction.
//!
//! A [`Router`] owns the directory and the fallback policy. Routing is a pure
//! function of the request and this immutable state, so the same request
//! always produces the same decision.

use std::sync::Arc;

use crate::{
    directory::Directory,
    error::{Result, RouterError},
    models::{ActionScript, EmployeeId, EmployeeRecord, RoutingKey, WebhookRequest},
};

/// Default announcement spoken before the call is connected.
pub const DEFAULT_ANNOUNCEMENT: &str = "Connecting you to our representative.";

/// Default announcement when nobody can take the call.
pub const DEFAULT_NO_ROUTE_MESSAGE: &str =
    "Sorry, no representative is available to take your call right now.";

/// How unmatched requests are handled and what the caller hears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    /// Spoken before connecting
    pub announcement: String,
    /// Spoken when no route exists and no fallback is configured
    pub no_route_message: String,
    /// Employee that receives unmatched and key-less calls
    pub fallback: Option<EmployeeId>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            announcement: DEFAULT_ANNOUNCEMENT.to_string(),
            no_route_message: DEFAULT_NO_ROUTE_MESSAGE.to_string(),
            fallback: None,
        }
    }
}

/// Why a record was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// The routing key matched directly
    Key,
    /// The configured fallback employee was used
    Fallback,
}

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    /// A routable employee was selected
    Matched {
        /// Selected record
        employee: &'a EmployeeRecord,
        /// Direct match or fallback
        source: MatchSource,
        /// Key extracted from the request
        key: Option<RoutingKey>,
    },
    /// Nothing matched and no fallback is configured
    NoRoute {
        /// Key extracted from the request
        key: Option<RoutingKey>,
    },
}

impl RouteDecision<'_> {
    /// Selected employee, if any.
    pub fn employee(&self) -> Option<&EmployeeRecord> {
        match self {
            Self::Matched { employee, .. } => Some(employee),
            Self::NoRoute { .. } => None,
        }
    }
}

/// Selects directory entries for call events.
#[derive(Debug, Clone)]
pub struct Router {
    directory: Arc<Directory>,
    policy: RoutingPolicy,
}

impl Router {
    /// Creates a router over `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidFallback`] when the policy names a
    /// fallback employee that is missing or has no phone number.
    pub fn new(directory: Arc<Directory>, policy: RoutingPolicy) -> Result<Self> {
        if let Some(id) = policy.fallback {
            if directory.routable(id).is_none() {
                return Err(RouterError::InvalidFallback { id });
            }
        }
        Ok(Self { directory, policy })
    }

    /// The underlying directory.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// The active policy.
    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Resolves the routing key to a record, falling back per policy.
    pub fn route(&self, request: &WebhookRequest) -> RouteDecision<'_> {
        let key = request.routing_key();

        if let Some(employee) = key.as_ref().and_then(|k| self.lookup(k)) {
            return RouteDecision::Matched { employee, source: MatchSource::Key, key };
        }

        match self.policy.fallback.and_then(|id| self.directory.routable(id)) {
            Some(employee) => RouteDecision::Matched { employee, source: MatchSource::Fallback, key },
            None => RouteDecision::NoRoute { key },
        }
    }

    /// Looks up a single key without applying the fallback.
    pub fn lookup(&self, key: &RoutingKey) -> Option<&EmployeeRecord> {
        match key {
            RoutingKey::Employee(id) => self.directory.routable(*id),
            RoutingKey::Department(department) => self.directory.first_in_department(department),
            RoutingKey::Name(name) => self.directory.find_by_name(name),
        }
    }

    /// Builds the action script for a decision.
    pub fn script(&self, decision: &RouteDecision<'_>) -> ActionScript {
        match decision.employee() {
            Some(employee) => {
                ActionScript::announce_and_connect(&self.policy.announcement, &employee.phone)
            },
            None => ActionScript::announce(&self.policy.no_route_message),
        }
    }
}
