use uuid::Uuid;

const FALLBACK_DISPLAY_NAME: &str = "Someone";

/// Identity established from a validated bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
