use crate::infra::{blocking, build_services, interest_forms};
use clap::Args;
use faculty_roles::config::AppConfig;
use faculty_roles::dashboard::Dashboard;
use faculty_roles::error::AppError;
use faculty_roles::telemetry;
use faculty_roles::workflows::listings::DashboardSummary;
use faculty_roles::workflows::notifications::Delivery;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct PrefillArgs {
    /// Role title exactly as it appears in the roles sheet
    #[arg(long)]
    pub(crate) role_title: String,
    /// Division the role belongs to
    #[arg(long)]
    pub(crate) division: String,
    /// Respondent email used to look up profile answers
    #[arg(long)]
    pub(crate) email: String,
}

#[derive(Args, Debug)]
pub(crate) struct ProfileArgs {
    /// Email address to resolve
    pub(crate) email: String,
}

async fn load_dashboard() -> Result<Arc<Dashboard>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(Arc::new(build_services(&config).await?.dashboard))
}

/// Loads the dashboard and runs `work` against it off the async workers.
async fn with_dashboard<F>(work: F) -> Result<(), AppError>
where
    F: FnOnce(&Dashboard) -> Result<(), AppError> + Send + 'static,
{
    blocking(load_dashboard().await?, work).await
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) async fn run_roles_list() -> Result<(), AppError> {
    with_dashboard(|dashboard| print_json(&dashboard.list_open_roles())).await
}

pub(crate) async fn run_roles_divisions() -> Result<(), AppError> {
    with_dashboard(|dashboard| {
        for division in dashboard.list_divisions() {
            println!("{division}");
        }
        Ok(())
    })
    .await
}

pub(crate) async fn run_roles_check() -> Result<(), AppError> {
    with_dashboard(|dashboard| {
        render_summary(&dashboard.summary());
        Ok(())
    })
    .await
}

fn render_summary(summary: &DashboardSummary) {
    println!("Faculty roles data check");
    println!("- {} open roles", summary.role_count);
    println!(
        "- {} roles link their own interest form",
        summary.roles_with_form_url
    );
    if summary.divisions.is_empty() {
        println!("- no divisions with open roles");
        return;
    }
    println!("- divisions:");
    for division in &summary.divisions {
        println!("  - {division}");
    }
}

pub(crate) async fn run_form_provision() -> Result<(), AppError> {
    with_dashboard(|dashboard| print_json(&interest_forms(dashboard)?.provision_form()?)).await
}

pub(crate) async fn run_form_info() -> Result<(), AppError> {
    with_dashboard(|dashboard| print_json(&interest_forms(dashboard)?.management_info()?)).await
}

pub(crate) async fn run_form_prefill(args: PrefillArgs) -> Result<(), AppError> {
    let PrefillArgs {
        role_title,
        division,
        email,
    } = args;

    with_dashboard(move |dashboard| {
        match interest_forms(dashboard)?.prefilled_url(&role_title, &division, &email) {
            Some(url) => println!("{url}"),
            None => println!("No interest form link available for {division} - {role_title}"),
        }
        Ok(())
    })
    .await
}

pub(crate) async fn run_profile(args: ProfileArgs) -> Result<(), AppError> {
    with_dashboard(move |dashboard| {
        print_json(&interest_forms(dashboard)?.resolve_profile(&args.email))
    })
    .await
}

pub(crate) async fn run_notify_latest() -> Result<(), AppError> {
    with_dashboard(|dashboard| {
        match interest_forms(dashboard)?.notify_latest_response() {
            Some(Delivery::Sent) => println!("HR notified about the latest response"),
            Some(Delivery::Dropped) => println!("HR notification was not delivered; see logs"),
            None => println!("No responses recorded yet"),
        }
        Ok(())
    })
    .await
}
