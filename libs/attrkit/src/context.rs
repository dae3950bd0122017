/// Caller identity consumed by project-id population.
///
/// Implemented by the request's security context. The engine only reads it.
pub trait ProjectContext {
    /// Project the caller authenticated against, if any.
    fn project_id(&self) -> Option<&str>;

    fn is_admin(&self) -> bool;

    /// True for trusted service callers that may act on other projects.
    fn is_service_role(&self) -> bool;

    /// May this caller specify a project other than its own?
    fn may_act_for_other_projects(&self) -> bool {
        self.is_admin() || self.is_service_role()
    }
}

impl<T: ProjectContext + ?Sized> ProjectContext for &T {
    fn project_id(&self) -> Option<&str> {
        (**self).project_id()
    }

    fn is_admin(&self) -> bool {
        (**self).is_admin()
    }

    fn is_service_role(&self) -> bool {
        (**self).is_service_role()
    }
}
