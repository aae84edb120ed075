use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::fleet::alerts::{AlertGenerator, AlertPolicy, AlertReport};
use crate::fleet::domain::{TenantId, UserId};
use crate::fleet::fetch::{EntityFetcher, FetchError, FetchFilter, FleetRepository, UnavailableSlice};
use crate::fleet::metrics::FleetMetrics;
use crate::fleet::tenancy::{
    Module, ModuleAccess, ResolvedScope, ScopeError, ScopeStore, SessionError, TenantScope,
    TenantSession,
};

/// Service composing scope resolution, the scoped fetcher, alerts and metrics.
pub struct FleetDashboardService<R, S> {
    fetcher: EntityFetcher<R>,
    store: Arc<S>,
    alerts: AlertGenerator,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("user {0} is not known to the fleet backend")]
    UnknownUser(UserId),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
}

/// Current selection plus what the switcher may offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeView {
    pub user_id: UserId,
    pub scope: ResolvedScope,
    pub accessible: Vec<TenantId>,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub scope: ResolvedScope,
    /// Consolidated views never allow writes.
    pub read_only: bool,
    pub as_of: NaiveDate,
    pub metrics: FleetMetrics,
    pub alerts: AlertReport,
    /// Entity slices that failed to load; the rest of the summary is still valid.
    pub unavailable: Vec<UnavailableSlice>,
}

impl DashboardSummary {
    pub fn is_partial(&self) -> bool {
        !self.unavailable.is_empty()
    }
}

impl<R, S> FleetDashboardService<R, S>
where
    R: FleetRepository + 'static,
    S: ScopeStore + 'static,
{
    pub fn new(repository: Arc<R>, store: Arc<S>, policy: AlertPolicy) -> Self {
        Self {
            fetcher: EntityFetcher::new(repository),
            store,
            alerts: AlertGenerator::new(policy),
        }
    }

    pub fn fetcher(&self) -> &EntityFetcher<R> {
        &self.fetcher
    }

    /// Look up the user's grants and restore their persisted scope.
    pub async fn open_session(&self, user_id: &UserId) -> Result<TenantSession, DashboardError> {
        let repository = self.fetcher.repository();
        let (access, subsidiaries) =
            tokio::join!(repository.user_access(user_id), repository.subsidiaries());

        let access = access?.ok_or_else(|| DashboardError::UnknownUser(user_id.clone()))?;
        let subsidiaries = subsidiaries?;
        let session = TenantSession::open(access, &subsidiaries, self.store.as_ref())?;

        debug!(user = %user_id, scope = ?session.scope().scope, "session opened");
        Ok(session)
    }

    pub async fn scope(&self, user_id: &UserId) -> Result<ScopeView, DashboardError> {
        let session = self.open_session(user_id).await?;
        Ok(scope_view(&session))
    }

    /// Switch the user's scope and persist it for later sessions.
    pub async fn select_scope(
        &self,
        user_id: &UserId,
        requested: &TenantScope,
    ) -> Result<ScopeView, DashboardError> {
        let mut session = self.open_session(user_id).await?;
        session.switch(requested, self.store.as_ref())?;
        Ok(scope_view(&session))
    }

    pub async fn module_access(
        &self,
        user_id: &UserId,
        module: Module,
        tenant: Option<&TenantId>,
    ) -> Result<ModuleAccess, DashboardError> {
        let session = self.open_session(user_id).await?;
        Ok(session.module_access(module, tenant))
    }

    pub async fn alerts(
        &self,
        user_id: &UserId,
        today: NaiveDate,
    ) -> Result<AlertReport, DashboardError> {
        let session = self.open_session(user_id).await?;
        session.require(Module::Alerts)?;

        let snapshot = self
            .fetcher
            .snapshot(session.scope(), &FetchFilter::default())
            .await;
        let report = self.alerts.generate(&snapshot, today);

        info!(
            user = %user_id,
            alerts = report.alerts.len(),
            degraded = report.unavailable.len(),
            "alerts generated"
        );
        Ok(report)
    }

    pub async fn dashboard(
        &self,
        user_id: &UserId,
        today: NaiveDate,
    ) -> Result<DashboardSummary, DashboardError> {
        let session = self.open_session(user_id).await?;
        session.require(Module::Dashboard)?;
        let scope = session.scope().clone();

        let snapshot = self.fetcher.snapshot(&scope, &FetchFilter::default()).await;
        let alerts = self.alerts.generate(&snapshot, today);
        let metrics = FleetMetrics::compute(&snapshot, today);
        let unavailable = snapshot.unavailable();

        info!(
            user = %user_id,
            tenants = scope.tenants.len(),
            alerts = alerts.alerts.len(),
            unavailable = unavailable.len(),
            "dashboard assembled"
        );

        Ok(DashboardSummary {
            read_only: scope.is_consolidated(),
            scope,
            as_of: today,
            metrics,
            alerts,
            unavailable,
        })
    }
}

fn scope_view(session: &TenantSession) -> ScopeView {
    ScopeView {
        user_id: session.user_id().clone(),
        scope: session.scope().clone(),
        accessible: session.resolver().accessible_tenants(),
        read_only: session.scope().is_consolidated(),
    }
}
