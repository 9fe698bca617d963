use crate::infra::{build_service, load_snapshot, MemoryAssessmentService};
use chrono::{Local, NaiveDate};
use clap::Args;
use needs_assessment::error::AppError;
use needs_assessment::workflows::assessment::{
    standard_items, QuestionType, ResponseInput, SaveOutcome, SiteAssessmentView, SiteId,
    SummaryView, SERVICE_AREAS,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Assessment date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Optional JSON template snapshot; the built-in questionnaire is used otherwise.
    #[arg(long)]
    pub(crate) template: Option<PathBuf>,
    /// Site to fill in. Must exist in the template's site list.
    #[arg(long, default_value_t = 1)]
    pub(crate) site: u64,
    /// Service areas to request on the profile page (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub(crate) areas: Vec<String>,
    /// Print every stored answer at the end.
    #[arg(long)]
    pub(crate) summary: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        template,
        site,
        areas,
        summary,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let areas = if areas.is_empty() {
        vec![SERVICE_AREAS[0].to_string()]
    } else {
        areas
    };

    let snapshot = load_snapshot(template.as_deref(), today)?;
    let service = build_service(
        snapshot,
        &["Basic Info".to_string(), "Demographics".to_string()],
    )?;

    println!("Needs assessment demo for {today}");
    let instance = service.ensure_current_instance(SiteId(site), today)?;
    let view = service.instance_view(instance.id)?;
    render_pages("Materialized pages", &view);

    let mut pending: VecDeque<_> = view
        .site_pages
        .iter()
        .filter(|page| !page.progress.is_locked())
        .map(|page| page.id)
        .collect();
    let mut filled = 0;
    while let Some(site_page_id) = pending.pop_front() {
        let page = service.page_view(instance.id, site_page_id)?;
        let responses: Vec<ResponseInput> = page
            .questions
            .iter()
            .map(|question| {
                let value = sample_answer(
                    question.question_type,
                    &question.text,
                    &question.options,
                    &areas,
                );
                ResponseInput::new(question.id, value)
            })
            .collect();

        let outcome = service.save_page(instance.id, site_page_id, responses, true)?;
        render_outcome(&page.title, &outcome);
        filled += 1;

        if !outcome.unlocked.is_empty() {
            let view = service.instance_view(instance.id)?;
            render_pages("After unlock", &view);
            pending.extend(
                view.site_pages
                    .iter()
                    .filter(|page| page.required || page.is_confirmation_page)
                    .filter(|page| outcome.unlocked.contains(&page.id))
                    .map(|page| page.id),
            );
        }
    }

    let view = service.instance_view(instance.id)?;
    render_pages("Final state", &view);
    println!(
        "Completed {filled} page(s); assessment confirmed: {}",
        if view.confirmed { "yes" } else { "no" }
    );
    if let Some(site) = &view.site {
        let served = site
            .people_served
            .map_or_else(|| "unknown".to_string(), |count| count.to_string());
        println!("Site record: {} ({served} people served)", site.name);
    }

    if summary {
        render_summary(&service.summary(instance.id)?);
    }
    render_catalog(&service, &areas);

    Ok(())
}

/// Plausible answer for a question so every required field validates.
fn sample_answer(
    question_type: QuestionType,
    text: &str,
    options: &[String],
    areas: &[String],
) -> Value {
    match question_type {
        QuestionType::Numeric | QuestionType::YesNoWithNumericEntry => json!(120),
        QuestionType::MultiSelect | QuestionType::MultiSelectWithOther => {
            let wants_areas = options
                .iter()
                .any(|option| SERVICE_AREAS.contains(&option.as_str()));
            if wants_areas {
                json!(areas)
            } else {
                json!(options.iter().take(2).collect::<Vec<_>>())
            }
        }
        QuestionType::SingleSelect | QuestionType::Dropdown | QuestionType::DropdownWithOther => {
            options.first().map_or(Value::Null, |option| json!(option))
        }
        QuestionType::YesNo | QuestionType::Confirm => json!(true),
        QuestionType::ShortAnswer if text.to_ascii_lowercase().contains("name") => {
            json!("Demo Community Pantry")
        }
        QuestionType::ShortAnswer
        | QuestionType::LongAnswer
        | QuestionType::SizingGrid
        | QuestionType::DemoGrid => json!("Provided during the demo walkthrough"),
    }
}

fn render_pages(heading: &str, view: &SiteAssessmentView) {
    println!("\n{heading} ({} {}):", view.season, view.year);
    for page in &view.site_pages {
        let marker = if page.required { "*" } else { " " };
        println!(
            "  {marker} {:>2}. {:<22} {}",
            page.order,
            page.title,
            page.progress.label()
        );
    }
}

fn render_outcome(title: &str, outcome: &SaveOutcome) {
    println!(
        "- {title}: {} -> {}",
        outcome.message,
        outcome.progress.label()
    );
    if !outcome.promoted.is_empty() {
        println!("    promoted {} page(s) to required", outcome.promoted.len());
    }
    if !outcome.unlocked.is_empty() {
        println!("    unlocked {} page(s)", outcome.unlocked.len());
    }
}

fn render_summary(summary: &SummaryView) {
    println!("\nSummary for site {}:", summary.site_id);
    for page in summary.pages.iter().filter(|page| !page.rows.is_empty()) {
        println!("  {}", page.title);
        for row in &page.rows {
            println!("    {}: {}", row.question, row.value);
        }
    }
}

fn render_catalog(service: &MemoryAssessmentService, areas: &[String]) {
    println!("\nStandard items for requested areas:");
    for area in areas {
        let items = standard_items(area);
        if items.is_empty() {
            println!("  {area}: no catalog entries");
        } else {
            let preview: Vec<&str> = items.iter().take(5).copied().collect();
            println!("  {area}: {}", preview.join(", "));
        }
    }
    let assessments = service.templates().assessments().count();
    println!("Templates loaded: {assessments} assessment(s)");
}
