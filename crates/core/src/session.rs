use serde::{Deserialize, Serialize};

/// Dealership roles, ordered roughly by authority. Every operation receives
/// the acting user explicitly; there is no ambient session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Consultant,
    TeamLead,
    SalesManager,
    Admin,
    ManagingDirector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultant => "consultant",
            Self::TeamLead => "team_lead",
            Self::SalesManager => "sales_manager",
            Self::Admin => "admin",
            Self::ManagingDirector => "managing_director",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "consultant" => Some(Self::Consultant),
            "team_lead" => Some(Self::TeamLead),
            "sales_manager" => Some(Self::SalesManager),
            "admin" => Some(Self::Admin),
            "managing_director" => Some(Self::ManagingDirector),
            _ => None,
        }
    }

    /// Roles allowed to approve or reject a booking request.
    pub fn can_decide_bookings(&self) -> bool {
        matches!(self, Self::TeamLead | Self::SalesManager | Self::Admin)
    }

    /// Roles that may enter manual discretionary (MDMR) discounts and that
    /// bypass the additional-discount cap entirely.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::ManagingDirector)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: String,
    pub role: Role,
    pub correlation_id: String,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, role: Role, correlation_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role, correlation_id: correlation_id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_round_trips_from_storage_encoding() {
        let cases = [
            Role::Consultant,
            Role::TeamLead,
            Role::SalesManager,
            Role::Admin,
            Role::ManagingDirector,
        ];

        for role in cases {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn only_lead_manager_and_admin_decide_bookings() {
        assert!(!Role::Consultant.can_decide_bookings());
        assert!(Role::TeamLead.can_decide_bookings());
        assert!(Role::SalesManager.can_decide_bookings());
        assert!(Role::Admin.can_decide_bookings());
        assert!(!Role::ManagingDirector.can_decide_bookings());
    }

    #[test]
    fn privileged_roles_are_admin_and_md() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::ManagingDirector.is_privileged());
        assert!(!Role::SalesManager.is_privileged());
    }
}
