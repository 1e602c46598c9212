//! Attribute-based authorization for registry operations.
//!
//! Rule evaluation is external: the authorizer only asks an injected
//! [`AbacRuleChecker`] for a grant and turns a deny into [`NotAuthorized`].

/// Scope required to register or unregister entries.
pub const WRITE_SCOPE: &str = "urn:basyx:scope:aas-registry:write";
/// Scope required to look up entries.
pub const READ_SCOPE: &str = "urn:basyx:scope:aas-registry:read";

/// External rule evaluation.
pub trait AbacRuleChecker: Send + Sync {
    /// Whether any rule grants `scope` to one of `roles` on the given entities.
    fn grants_permission(
        &self,
        roles: &[String],
        scope: &str,
        shell_id: &str,
        submodel_id: Option<&str>,
    ) -> bool;
}

/// Source of the caller's roles.
pub trait RoleAuthenticator: Send + Sync {
    /// Roles of the current caller.
    fn roles(&self) -> Vec<String>;
}

/// A guarded operation was denied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not authorized: {scope} on {target}")]
pub struct NotAuthorized {
    /// Scope that was required
    pub scope: String,
    /// Entity the operation targeted
    pub target: String,
}

/// Enforces access to registry operations on shells and submodels.
pub struct RegistryAuthorizer<C, R> {
    checker: C,
    authenticator: R,
}

impl<C: AbacRuleChecker, R: RoleAuthenticator> RegistryAuthorizer<C, R> {
    /// Create an authorizer from a rule checker and a role source.
    #[must_use]
    pub fn new(checker: C, authenticator: R) -> Self {
        Self {
            checker,
            authenticator,
        }
    }

    fn enforce(
        &self,
        scope: &str,
        shell_id: &str,
        submodel_id: Option<&str>,
    ) -> Result<(), NotAuthorized> {
        let roles = self.authenticator.roles();
        if self
            .checker
            .grants_permission(&roles, scope, shell_id, submodel_id)
        {
            return Ok(());
        }

        let target = match submodel_id {
            Some(sm) => format!("{shell_id}/{sm}"),
            None => shell_id.to_string(),
        };
        tracing::warn!(scope, target = %target, ?roles, "Access denied");
        Err(NotAuthorized {
            scope: scope.to_string(),
            target,
        })
    }

    /// Guard registering a shell.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] if write access is denied.
    pub fn enforce_register_shell(&self, shell_id: &str) -> Result<(), NotAuthorized> {
        self.enforce(WRITE_SCOPE, shell_id, None)
    }

    /// Guard registering a submodel under a shell.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] if write access is denied.
    pub fn enforce_register_submodel(
        &self,
        shell_id: &str,
        submodel_id: &str,
    ) -> Result<(), NotAuthorized> {
        self.enforce(WRITE_SCOPE, shell_id, Some(submodel_id))
    }

    /// Guard unregistering a shell.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] if write access is denied.
    pub fn enforce_unregister_shell(&self, shell_id: &str) -> Result<(), NotAuthorized> {
        self.enforce(WRITE_SCOPE, shell_id, None)
    }

    /// Guard unregistering a submodel.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] if write access is denied.
    pub fn enforce_unregister_submodel(
        &self,
        shell_id: &str,
        submodel_id: &str,
    ) -> Result<(), NotAuthorized> {
        self.enforce(WRITE_SCOPE, shell_id, Some(submodel_id))
    }

    /// Guard a shell lookup, passing the descriptor through on success.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] if read access is denied.
    pub fn enforce_lookup_shell<T>(&self, shell_id: &str, descriptor: T) -> Result<T, NotAuthorized> {
        self.enforce(READ_SCOPE, shell_id, None)?;
        Ok(descriptor)
    }

    /// Guard a submodel lookup, passing the descriptor through on success.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] if read access is denied.
    pub fn enforce_lookup_submodel<T>(
        &self,
        shell_id: &str,
        submodel_id: &str,
        descriptor: T,
    ) -> Result<T, NotAuthorized> {
        self.enforce(READ_SCOPE, shell_id, Some(submodel_id))?;
        Ok(descriptor)
    }
}
