use super::access::{Module, ModuleAccess};
use super::scope::{ResolvedScope, ScopeError, ScopeResolver, TenantScope, UserAccess};
use super::store::{ScopeStore, ScopeStoreError};
use crate::fleet::domain::{Subsidiary, TenantId, UserId};
use tracing::{info, warn};

/// Per-user scope context passed explicitly to every fetch.
#[derive(Debug, Clone)]
pub struct TenantSession {
    resolver: ScopeResolver,
    scope: ResolvedScope,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Store(#[from] ScopeStoreError),
}

impl TenantSession {
    /// Restore the user's last selection, falling back to the first permitted subsidiary.
    ///
    /// An unreadable stored preference is logged and ignored. The resolved scope is written
    /// back so the next session starts from the same place.
    pub fn open<S: ScopeStore + ?Sized>(
        access: UserAccess,
        subsidiaries: &[Subsidiary],
        store: &S,
    ) -> Result<Self, SessionError> {
        let resolver = ScopeResolver::new(access, subsidiaries);
        let user_id = resolver.user_id().clone();

        let preference = match store.load(&user_id) {
            Ok(preference) => preference,
            Err(err) => {
                warn!(user = %user_id, error = %err, "ignoring unreadable scope preference");
                None
            }
        };

        let scope = resolver.resolve(preference.as_ref())?;
        if preference.as_ref() != Some(&scope.scope) {
            if let Err(err) = store.save(&user_id, &scope.scope) {
                warn!(user = %user_id, error = %err, "failed to persist resolved scope");
            }
        }

        Ok(Self { resolver, scope })
    }

    /// Apply an explicit switcher selection and persist it.
    pub fn switch<S: ScopeStore + ?Sized>(
        &mut self,
        requested: &TenantScope,
        store: &S,
    ) -> Result<&ResolvedScope, SessionError> {
        let scope = self.resolver.select(requested)?;
        store.save(self.resolver.user_id(), &scope.scope)?;
        info!(user = %self.resolver.user_id(), scope = ?scope.scope, "subsidiary scope switched");
        self.scope = scope;
        Ok(&self.scope)
    }

    pub fn user_id(&self) -> &UserId {
        self.resolver.user_id()
    }

    pub fn scope(&self) -> &ResolvedScope {
        &self.scope
    }

    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    pub fn module_access(&self, module: Module, tenant: Option<&TenantId>) -> ModuleAccess {
        self.resolver.module_access(module, tenant, &self.scope)
    }

    pub fn can_access_module(&self, module: Module, tenant: Option<&TenantId>) -> bool {
        self.module_access(module, tenant).allows_read()
    }

    pub fn require(&self, module: Module) -> Result<ModuleAccess, ScopeError> {
        match self.module_access(module, None) {
            ModuleAccess::Denied => Err(ScopeError::ModuleDenied {
                module: module.key(),
            }),
            access => Ok(access),
        }
    }
}
