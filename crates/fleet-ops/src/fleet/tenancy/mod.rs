//! Subsidiary scoping and permission gating.

pub mod access;
mod scope;
mod session;
mod store;

pub use access::{Module, ModuleAccess, PermissionLevel, MODULE_ACCESS};
pub use scope::{ResolvedScope, ScopeError, ScopeResolver, TenantGrant, TenantScope, UserAccess};
pub use session::{SessionError, TenantSession};
pub use store::{InMemoryScopeStore, JsonFileScopeStore, ScopeStore, ScopeStoreError};
