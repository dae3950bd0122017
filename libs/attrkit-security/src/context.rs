use attrkit::ProjectContext;
use uuid::Uuid;

use crate::constants::{ADMIN_ROLE, DEFAULT_SERVICE_ROLES};

/// `SecurityContext` carries the caller identity for one request.
///
/// Built by the authentication layer and handed to the schema engine, which
/// reads it through [`ProjectContext`] when reconciling resource ownership.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    /// The authenticated user or service.
    user_id: Uuid,
    /// Project the caller authenticated against. `None` when running without
    /// authentication.
    project_id: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    is_admin: bool,
    /// Role names that mark a trusted service caller.
    #[serde(default = "default_service_roles")]
    service_roles: Vec<String>,
}

fn default_service_roles() -> Vec<String> {
    DEFAULT_SERVICE_ROLES.iter().map(|r| (*r).to_owned()).collect()
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// A context with no project, no roles and no privileges.
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    #[must_use]
    pub fn service_roles(&self) -> &[String] {
        &self.service_roles
    }
}

impl ProjectContext for SecurityContext {
    fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Explicit admin flag or the admin role.
    fn is_admin(&self) -> bool {
        self.is_admin || self.has_role(ADMIN_ROLE)
    }

    fn is_service_role(&self) -> bool {
        self.service_roles.iter().any(|r| self.has_role(r))
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    user_id: Option<Uuid>,
    project_id: Option<String>,
    roles: Vec<String>,
    is_admin: bool,
    service_roles: Option<Vec<String>>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn project_id(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_owned());
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn role(mut self, role: &str) -> Self {
        self.roles.push(role.to_owned());
        self
    }

    #[must_use]
    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Override the role names that mark a service caller.
    #[must_use]
    pub fn service_roles(mut self, roles: Vec<String>) -> Self {
        self.service_roles = Some(roles);
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            user_id: self.user_id.unwrap_or_default(),
            project_id: self.project_id,
            roles: self.roles,
            is_admin: self.is_admin,
            service_roles: self.service_roles.unwrap_or_else(default_service_roles),
        }
    }
}
