use super::access::{access_for_level, level_grants, Module, ModuleAccess, PermissionLevel};
use crate::fleet::domain::{Subsidiary, TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// One permission row tying a user to a subsidiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantGrant {
    pub tenant_id: TenantId,
    pub level: PermissionLevel,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Everything the resolver needs to know about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccess {
    pub user_id: UserId,
    #[serde(default)]
    pub super_admin: bool,
    #[serde(default)]
    pub grants: Vec<TenantGrant>,
}

/// Selection a user makes in the subsidiary switcher, persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TenantScope {
    Single { tenant_id: TenantId },
    All,
}

impl TenantScope {
    pub fn single(tenant_id: impl Into<String>) -> Self {
        Self::Single {
            tenant_id: TenantId::new(tenant_id),
        }
    }

    pub fn is_consolidated(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Scope after validation against the user's grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedScope {
    pub scope: TenantScope,
    /// Tenants whose rows may be returned under this scope, in ascending id order.
    pub tenants: Vec<TenantId>,
}

impl ResolvedScope {
    pub fn contains(&self, tenant_id: &TenantId) -> bool {
        self.tenants.binary_search(tenant_id).is_ok()
    }

    pub fn is_consolidated(&self) -> bool {
        self.scope.is_consolidated()
    }

    pub fn current_tenant(&self) -> Option<&TenantId> {
        match &self.scope {
            TenantScope::Single { tenant_id } => Some(tenant_id),
            TenantScope::All => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("user {0} holds no active subsidiary grant")]
    NoActiveGrant(UserId),
    #[error("user {user} may not access subsidiary {tenant}")]
    TenantNotPermitted { user: UserId, tenant: TenantId },
    #[error("access to the {module} module was denied")]
    ModuleDenied { module: &'static str },
}

/// Resolves which subsidiaries a user may see and what each permission level unlocks.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    access: UserAccess,
    accessible: Vec<(TenantId, PermissionLevel)>,
}

impl ScopeResolver {
    pub fn new(access: UserAccess, subsidiaries: &[Subsidiary]) -> Self {
        let active_subsidiaries: BTreeSet<&TenantId> = subsidiaries
            .iter()
            .filter(|subsidiary| subsidiary.active)
            .map(|subsidiary| &subsidiary.id)
            .collect();

        let mut accessible: Vec<(TenantId, PermissionLevel)> = if access.super_admin {
            active_subsidiaries
                .iter()
                .map(|tenant_id| ((*tenant_id).clone(), PermissionLevel::FullAccess))
                .collect()
        } else {
            access
                .grants
                .iter()
                .filter(|grant| grant.active && active_subsidiaries.contains(&grant.tenant_id))
                .map(|grant| (grant.tenant_id.clone(), grant.level))
                .collect()
        };

        accessible.sort_by(|a, b| a.0.cmp(&b.0));
        accessible.dedup_by(|a, b| a.0 == b.0);

        Self { access, accessible }
    }

    pub fn user_id(&self) -> &UserId {
        &self.access.user_id
    }

    pub fn accessible_tenants(&self) -> Vec<TenantId> {
        self.accessible
            .iter()
            .map(|(tenant_id, _)| tenant_id.clone())
            .collect()
    }

    pub fn effective_level(&self, tenant_id: &TenantId) -> Option<PermissionLevel> {
        self.accessible
            .iter()
            .find(|(candidate, _)| candidate == tenant_id)
            .map(|(_, level)| *level)
    }

    /// Resolve a requested or persisted scope.
    ///
    /// A missing or no-longer-permitted single-tenant preference falls back to the first
    /// accessible subsidiary in id order. With no accessible subsidiary at all the call fails.
    pub fn resolve(&self, preference: Option<&TenantScope>) -> Result<ResolvedScope, ScopeError> {
        let Some((first, _)) = self.accessible.first() else {
            warn!(user = %self.access.user_id, "no active subsidiary grant; denying access");
            return Err(ScopeError::NoActiveGrant(self.access.user_id.clone()));
        };

        let scope = match preference {
            Some(TenantScope::All) => TenantScope::All,
            Some(TenantScope::Single { tenant_id }) if self.effective_level(tenant_id).is_some() => {
                TenantScope::Single {
                    tenant_id: tenant_id.clone(),
                }
            }
            Some(TenantScope::Single { tenant_id }) => {
                debug!(user = %self.access.user_id, tenant = %tenant_id, "stored subsidiary no longer permitted");
                TenantScope::Single {
                    tenant_id: first.clone(),
                }
            }
            None => TenantScope::Single {
                tenant_id: first.clone(),
            },
        };

        Ok(self.scoped(scope))
    }

    /// Validate an explicit switcher selection; unlike `resolve` this never falls back.
    pub fn select(&self, requested: &TenantScope) -> Result<ResolvedScope, ScopeError> {
        if self.accessible.is_empty() {
            return Err(ScopeError::NoActiveGrant(self.access.user_id.clone()));
        }

        if let TenantScope::Single { tenant_id } = requested {
            if self.effective_level(tenant_id).is_none() {
                return Err(ScopeError::TenantNotPermitted {
                    user: self.access.user_id.clone(),
                    tenant: tenant_id.clone(),
                });
            }
        }

        Ok(self.scoped(requested.clone()))
    }

    fn scoped(&self, scope: TenantScope) -> ResolvedScope {
        let tenants = match &scope {
            TenantScope::Single { tenant_id } => vec![tenant_id.clone()],
            TenantScope::All => self.accessible_tenants(),
        };
        ResolvedScope { scope, tenants }
    }

    /// Gate a module for an explicit tenant or, when none is given, for the current scope.
    ///
    /// Consolidated scope only ever yields read access: a module is readable when at least
    /// one accessible subsidiary's level grants it.
    pub fn module_access(
        &self,
        module: Module,
        tenant: Option<&TenantId>,
        current: &ResolvedScope,
    ) -> ModuleAccess {
        let target = tenant.or_else(|| current.current_tenant());

        match target {
            Some(tenant_id) => self
                .effective_level(tenant_id)
                .map(|level| access_for_level(level, module))
                .unwrap_or(ModuleAccess::Denied),
            None => {
                let readable = self
                    .accessible
                    .iter()
                    .filter(|(tenant_id, _)| current.contains(tenant_id))
                    .any(|(_, level)| level_grants(*level, module));
                if readable {
                    ModuleAccess::ReadOnly
                } else {
                    ModuleAccess::Denied
                }
            }
        }
    }

    pub fn can_access_module(
        &self,
        module: Module,
        tenant: Option<&TenantId>,
        current: &ResolvedScope,
    ) -> bool {
        self.module_access(module, tenant, current).allows_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subsidiary(id: &str, active: bool) -> Subsidiary {
        Subsidiary {
            id: TenantId::new(id),
            name: format!("{id} Logistics"),
            code: id.to_ascii_uppercase(),
            business_type: "transport".to_string(),
            active,
        }
    }

    fn grant(tenant: &str, level: PermissionLevel) -> TenantGrant {
        TenantGrant {
            tenant_id: TenantId::new(tenant),
            level,
            active: true,
        }
    }

    fn user(grants: Vec<TenantGrant>) -> UserAccess {
        UserAccess {
            user_id: UserId::new("u-1"),
            super_admin: false,
            grants,
        }
    }

    fn subsidiaries() -> Vec<Subsidiary> {
        vec![
            subsidiary("north", true),
            subsidiary("south", true),
            subsidiary("closed", false),
        ]
    }

    #[test]
    fn fails_closed_without_grants() {
        let resolver = ScopeResolver::new(user(Vec::new()), &subsidiaries());
        assert_eq!(
            resolver.resolve(None),
            Err(ScopeError::NoActiveGrant(UserId::new("u-1")))
        );
        assert_eq!(
            resolver.resolve(Some(&TenantScope::All)),
            Err(ScopeError::NoActiveGrant(UserId::new("u-1")))
        );
    }

    #[test]
    fn inactive_grants_and_subsidiaries_are_ignored() {
        let mut revoked = grant("north", PermissionLevel::FullAccess);
        revoked.active = false;
        let resolver = ScopeResolver::new(
            user(vec![revoked, grant("closed", PermissionLevel::FullAccess)]),
            &subsidiaries(),
        );
        assert!(resolver.accessible_tenants().is_empty());
        assert!(resolver.resolve(None).is_err());
    }

    #[test]
    fn super_admin_sees_every_active_subsidiary_with_full_access() {
        let access = UserAccess {
            user_id: UserId::new("root"),
            super_admin: true,
            grants: Vec::new(),
        };
        let resolver = ScopeResolver::new(access, &subsidiaries());
        assert_eq!(
            resolver.accessible_tenants(),
            vec![TenantId::new("north"), TenantId::new("south")]
        );
        assert_eq!(
            resolver.effective_level(&TenantId::new("south")),
            Some(PermissionLevel::FullAccess)
        );
    }

    #[test]
    fn stale_preference_falls_back_to_first_permitted_tenant() {
        let resolver = ScopeResolver::new(
            user(vec![grant("south", PermissionLevel::OperationalAccess)]),
            &subsidiaries(),
        );
        let resolved = resolver
            .resolve(Some(&TenantScope::single("north")))
            .expect("resolves");
        assert_eq!(resolved.scope, TenantScope::single("south"));
        assert_eq!(resolved.tenants, vec![TenantId::new("south")]);
    }

    #[test]
    fn explicit_selection_of_foreign_tenant_is_rejected() {
        let resolver = ScopeResolver::new(
            user(vec![grant("south", PermissionLevel::OperationalAccess)]),
            &subsidiaries(),
        );
        assert!(matches!(
            resolver.select(&TenantScope::single("north")),
            Err(ScopeError::TenantNotPermitted { .. })
        ));
    }

    #[test]
    fn consolidated_scope_is_read_only() {
        let resolver = ScopeResolver::new(
            user(vec![
                grant("north", PermissionLevel::FullAccess),
                grant("south", PermissionLevel::FuelOnlyAccess),
            ]),
            &subsidiaries(),
        );
        let all = resolver.resolve(Some(&TenantScope::All)).expect("resolves");
        assert_eq!(all.tenants.len(), 2);
        assert_eq!(
            resolver.module_access(Module::Settings, None, &all),
            ModuleAccess::ReadOnly
        );
        assert!(!resolver
            .module_access(Module::Fuel, None, &all)
            .allows_write());
    }

    #[test]
    fn explicit_tenant_overrides_current_scope() {
        let resolver = ScopeResolver::new(
            user(vec![
                grant("north", PermissionLevel::FullAccess),
                grant("south", PermissionLevel::MaintenanceOnlyAccess),
            ]),
            &subsidiaries(),
        );
        let north = resolver
            .resolve(Some(&TenantScope::single("north")))
            .expect("resolves");
        let south = TenantId::new("south");
        assert!(resolver.can_access_module(Module::Settings, None, &north));
        assert!(!resolver.can_access_module(Module::Settings, Some(&south), &north));
        assert!(resolver.can_access_module(Module::Maintenance, Some(&south), &north));
        assert!(!resolver.can_access_module(Module::Fuel, Some(&TenantId::new("closed")), &north));
    }
}
