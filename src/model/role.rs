#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    SuperAdmin = 1,
    Admin = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::SuperAdmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
        }
    }

    /// Human form used in notification texts, e.g. "super admin".
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ").to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Employee] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(4), None);
    }

    #[test]
    fn display_name_lowercases_and_unsnakes() {
        assert_eq!(Role::SuperAdmin.display_name(), "super admin");
        assert_eq!(Role::Employee.display_name(), "employee");
    }
}
