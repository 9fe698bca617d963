use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use needs_assessment::config::AssessmentConfig;
use needs_assessment::error::AppError;
use needs_assessment::workflows::assessment::{
    AssessmentPeriod, AssessmentService, InMemoryAssessmentRepository, RequiredPages,
    TemplateCatalog, TemplateSnapshot,
};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type MemoryAssessmentService =
    AssessmentService<TemplateCatalog, InMemoryAssessmentRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seasons covered by the built-in questionnaire, counted from the one containing startup.
const BUILT_IN_SEASONS: usize = 4;

/// Read the configured snapshot, or fall back to the built-in questionnaire for the season
/// containing `today` and the seasons after it.
pub(crate) fn load_snapshot(
    path: Option<&Path>,
    today: NaiveDate,
) -> Result<TemplateSnapshot, AppError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading assessment templates");
            Ok(TemplateSnapshot::from_path(path)?)
        }
        None => {
            let period = AssessmentPeriod::current(today);
            info!(%period, seasons = BUILT_IN_SEASONS, "using built-in assessment template");
            Ok(TemplateSnapshot::standard_seasons(period, BUILT_IN_SEASONS))
        }
    }
}

pub(crate) fn build_service(
    snapshot: TemplateSnapshot,
    required_pages: &[String],
) -> Result<Arc<MemoryAssessmentService>, AppError> {
    let catalog = TemplateCatalog::from_snapshot(&snapshot)?;
    let repository =
        InMemoryAssessmentRepository::with_directory(snapshot.organizations, snapshot.sites);
    Ok(Arc::new(AssessmentService::new(
        Arc::new(catalog),
        Arc::new(repository),
        RequiredPages::new(required_pages.iter().cloned()),
    )))
}

pub(crate) fn service_from_config(
    config: &AssessmentConfig,
    today: NaiveDate,
) -> Result<Arc<MemoryAssessmentService>, AppError> {
    let snapshot = load_snapshot(config.template_path.as_deref(), today)?;
    build_service(snapshot, &config.required_pages)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
