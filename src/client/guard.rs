//! Protected-route gate.
//!
//! UX only: the API enforces access on every request. The gate never fails,
//! a role mismatch sends the user to the default landing page.

use super::SessionPhase;
use crate::store::Role;

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Verification still running; show a spinner and do not navigate.
    Loading,
    Redirect(&'static str),
    Render,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGate {
    roles: Vec<Role>,
}

impl RouteGate {
    /// Any authenticated user may pass.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Only users holding one of `roles` may pass.
    #[must_use]
    pub fn with_roles(roles: &[Role]) -> Self {
        Self {
            roles: roles.to_vec(),
        }
    }

    #[must_use]
    pub fn decide(&self, phase: &SessionPhase) -> GateDecision {
        match phase {
            SessionPhase::Verifying => GateDecision::Loading,
            SessionPhase::Anonymous => GateDecision::Redirect(LOGIN_PATH),
            SessionPhase::Authenticated(user) => {
                if self.roles.is_empty() || self.roles.contains(&user.role) {
                    GateDecision::Render
                } else {
                    GateDecision::Redirect(LANDING_PATH)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::types::UserResponse;
    use chrono::Utc;
    use uuid::Uuid;

    fn signed_in(role: Role) -> SessionPhase {
        let now = Utc::now();
        SessionPhase::Authenticated(UserResponse {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            role,
            verified: true,
            balance: 0.0,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn verifying_never_navigates() {
        for gate in [RouteGate::authenticated(), RouteGate::with_roles(&[Role::Admin])] {
            assert_eq!(gate.decide(&SessionPhase::Verifying), GateDecision::Loading);
        }
    }

    #[test]
    fn anonymous_goes_to_login() {
        assert_eq!(
            RouteGate::authenticated().decide(&SessionPhase::Anonymous),
            GateDecision::Redirect(LOGIN_PATH)
        );
    }

    #[test]
    fn role_mismatch_lands_on_dashboard() {
        let gate = RouteGate::with_roles(&[Role::Admin, Role::Moderator]);
        assert_eq!(
            gate.decide(&signed_in(Role::User)),
            GateDecision::Redirect(LANDING_PATH)
        );
        assert_eq!(gate.decide(&signed_in(Role::Moderator)), GateDecision::Render);
        assert_eq!(
            RouteGate::authenticated().decide(&signed_in(Role::Support)),
            GateDecision::Render
        );
    }
}
