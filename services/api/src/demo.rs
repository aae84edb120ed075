use crate::infra::{demo_dataset, DEMO_TENANTS};
use chrono::NaiveDate;
use clap::Args;
use fleet_ops::error::AppError;
use fleet_ops::fleet::alerts::{AlertPolicy, AlertReport, Severity};
use fleet_ops::fleet::dashboard::{current_date, DashboardSummary, FleetDashboardService};
use fleet_ops::fleet::domain::{TenantId, UserId};
use fleet_ops::fleet::fetch::{FleetDataset, InMemoryFleetRepository};
use fleet_ops::fleet::import::FuelLogImporter;
use fleet_ops::fleet::tenancy::{InMemoryScopeStore, TenantScope};
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = FleetDashboardService<InMemoryFleetRepository, InMemoryScopeStore>;

#[derive(Args, Debug)]
pub(crate) struct AlertArgs {
    /// Demo user to act as (admin, metro-ops, fuel-desk, auditor)
    #[arg(long)]
    pub(crate) user: String,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Switch to the consolidated view before generating alerts
    #[arg(long)]
    pub(crate) all: bool,
    /// Switch to a single subsidiary before generating alerts
    #[arg(long, conflicts_with = "all")]
    pub(crate) tenant: Option<String>,
    /// Fuel log CSV export replacing the demo fills of the selected subsidiary
    #[arg(long)]
    pub(crate) fuel_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run_alerts(args: AlertArgs) -> Result<(), AppError> {
    let AlertArgs {
        user,
        today,
        all,
        tenant,
        fuel_csv,
    } = args;

    let today = today.unwrap_or_else(current_date);
    let mut dataset = demo_dataset(today);
    if let Some(path) = fuel_csv {
        let target = TenantId::new(tenant.as_deref().unwrap_or(DEMO_TENANTS[0]));
        let imported = replace_fuel_logs(&mut dataset, &target, path)?;
        println!("Imported {imported} fuel log rows for {target}");
    }

    let service = demo_service(dataset);
    let user = UserId::new(user);
    let requested = match (all, tenant) {
        (true, _) => Some(TenantScope::All),
        (false, Some(tenant)) => Some(TenantScope::single(tenant)),
        (false, None) => None,
    };
    let view = match requested {
        Some(scope) => service.select_scope(&user, &scope).await?,
        None => service.scope(&user).await?,
    };

    let report = service.alerts(&user, today).await?;
    println!(
        "Fleet alerts for {} over {} (evaluated {})",
        user,
        tenant_list(&view.scope.tenants),
        today
    );
    for line in alert_lines(&report) {
        println!("{line}");
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(current_date);
    let service = demo_service(demo_dataset(today));
    let admin = UserId::new("admin");

    println!("Fleet dashboard demo (evaluated {today})");
    let scopes = DEMO_TENANTS
        .iter()
        .map(|tenant| TenantScope::single(*tenant))
        .chain(std::iter::once(TenantScope::All));
    for scope in scopes {
        service.select_scope(&admin, &scope).await?;
        let summary = service.dashboard(&admin, today).await?;
        render_dashboard(&summary);
    }

    Ok(())
}

fn demo_service(dataset: FleetDataset) -> DemoService {
    FleetDashboardService::new(
        Arc::new(InMemoryFleetRepository::new(dataset)),
        Arc::new(InMemoryScopeStore::default()),
        AlertPolicy::default(),
    )
}

fn replace_fuel_logs(
    dataset: &mut FleetDataset,
    tenant_id: &TenantId,
    path: PathBuf,
) -> Result<usize, AppError> {
    let imported = FuelLogImporter::new(tenant_id.clone()).import_path(path)?;
    let count = imported.len();
    dataset.fuel_logs.retain(|entry| &entry.tenant_id != tenant_id);
    dataset.fuel_logs.extend(imported);
    Ok(count)
}

fn tenant_list(tenants: &[TenantId]) -> String {
    tenants
        .iter()
        .map(TenantId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn alert_lines(report: &AlertReport) -> Vec<String> {
    let mut lines = Vec::new();

    for severity in [Severity::Critical, Severity::Warning, Severity::Info] {
        let matching: Vec<_> = report
            .alerts
            .iter()
            .filter(|alert| alert.severity == severity)
            .collect();
        if matching.is_empty() {
            continue;
        }
        lines.push(format!("\n{} ({})", severity.label(), matching.len()));
        for alert in matching {
            lines.push(format!("- {}: {} [{}]", alert.title, alert.message, alert.date));
        }
    }

    if report.alerts.is_empty() {
        lines.push("\nAlerts: none".to_string());
    }

    if report.is_partial() {
        lines.push("\nUnavailable categories".to_string());
        for category in &report.unavailable {
            lines.push(format!("- {}: {}", category.kind.label(), category.reason));
        }
    }

    lines
}

fn render_dashboard(summary: &DashboardSummary) {
    let totals = &summary.metrics.totals;

    println!(
        "\n== {}{} ==",
        tenant_list(&summary.scope.tenants),
        if summary.read_only { " (read only)" } else { "" }
    );
    println!(
        "Vehicles {} ({} active) | Drivers {} ({} active)",
        totals.vehicles, totals.active_vehicles, totals.drivers, totals.active_drivers
    );
    println!(
        "Distance {:.0} | Fuel {:.1} ({:.2}) | Maintenance {:.2}",
        totals.distance, totals.fuel_volume, totals.fuel_cost, totals.maintenance_cost
    );
    println!(
        "Average mileage {:.2} | Cost per distance {:.2}",
        totals.average_mileage, totals.cost_per_distance
    );

    if !summary.metrics.most_efficient_vehicles.is_empty() {
        let ids: Vec<&str> = summary
            .metrics
            .most_efficient_vehicles
            .iter()
            .map(|id| id.as_str())
            .collect();
        println!("Most efficient vehicles: {}", ids.join(", "));
    }
    if !summary.metrics.top_drivers.is_empty() {
        let ids: Vec<&str> = summary
            .metrics
            .top_drivers
            .iter()
            .map(|id| id.as_str())
            .collect();
        println!("Top drivers: {}", ids.join(", "));
    }

    for budget in &summary.metrics.budgets {
        println!(
            "Budget {}: {:.0}% used{}",
            budget.category,
            budget.utilization,
            if budget.over_budget { " (over)" } else { "" }
        );
    }

    for line in alert_lines(&summary.alerts) {
        println!("{line}");
    }
}
