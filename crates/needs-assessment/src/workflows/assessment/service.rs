use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    AssessmentId, AssessmentPeriod, ProfileTarget, Season, SiteAssessment, SiteAssessmentId,
    SiteId, SitePage, SitePageId,
};
use super::instance::plan_instance;
use super::progress::RequiredPages;
use super::repository::{AssessmentRepository, ProfileChangeset, RepositoryError, SaveChangeset};
use super::requirements::{apply_profile_answers, derive_profile_write, ProfileSentinels};
use super::template::TemplateStore;
use super::validation::{validate_responses, QuestionIndex, ResponseInput, ValidationError};
use super::views::{
    PageView, ProfilePageView, ProfileSaveOutcome, ResponseView, SaveOutcome, SiteAssessmentView,
    SitePageView, SummaryPage, SummaryRow, SummaryView, TemplatePageView,
};

/// Service composing the template catalog, the repository and the progress rules.
pub struct AssessmentService<T, R> {
    templates: Arc<T>,
    repository: Arc<R>,
    required_pages: RequiredPages,
    sentinels: ProfileSentinels,
}

impl<T, R> AssessmentService<T, R>
where
    T: TemplateStore + 'static,
    R: AssessmentRepository + 'static,
{
    pub fn new(templates: Arc<T>, repository: Arc<R>, required_pages: RequiredPages) -> Self {
        Self::with_sentinels(templates, repository, required_pages, ProfileSentinels::default())
    }

    pub fn with_sentinels(
        templates: Arc<T>,
        repository: Arc<R>,
        required_pages: RequiredPages,
        sentinels: ProfileSentinels,
    ) -> Self {
        Self {
            templates,
            repository,
            required_pages,
            sentinels,
        }
    }

    pub fn templates(&self) -> &T {
        &self.templates
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Return the site's instance for the season `today` falls in, creating it if needed.
    pub fn ensure_current_instance(
        &self,
        site_id: SiteId,
        today: NaiveDate,
    ) -> Result<SiteAssessment, WorkflowError> {
        let period = AssessmentPeriod::current(today);
        let assessment = self
            .templates
            .assessment_for(period.year, period.season)
            .ok_or(WorkflowError::TemplateMissing {
                year: period.year,
                season: period.season,
            })?;
        self.ensure_instance(site_id, assessment.id)
    }

    /// Get-or-create the instance for (site, assessment). Safe to call concurrently: a
    /// duplicate insert loses the race and returns the winner's instance.
    pub fn ensure_instance(
        &self,
        site_id: SiteId,
        assessment_id: AssessmentId,
    ) -> Result<SiteAssessment, WorkflowError> {
        let assessment = self
            .templates
            .assessment(assessment_id)
            .ok_or_else(|| WorkflowError::not_found("assessment", assessment_id.0))?;
        if self.repository.site(site_id)?.is_none() {
            return Err(WorkflowError::not_found("site", site_id.0));
        }

        if let Some(existing) = self.repository.find_instance(site_id, assessment_id)? {
            return Ok(existing);
        }

        let pages = self.templates.pages_for(assessment_id);
        let plan = plan_instance(
            site_id,
            &assessment,
            &pages,
            &self.required_pages,
            Utc::now(),
        );

        match self.repository.insert_instance(plan) {
            Ok(instance) => {
                info!(
                    site_id = %site_id,
                    site_assessment_id = %instance.id,
                    period = %assessment.period(),
                    pages = pages.len(),
                    "created site assessment"
                );
                Ok(instance)
            }
            Err(RepositoryError::Conflict) => {
                debug!(
                    site_id = %site_id,
                    assessment_id = %assessment_id,
                    "instance created concurrently"
                );
                self.repository
                    .find_instance(site_id, assessment_id)?
                    .ok_or(WorkflowError::Repository(RepositoryError::Conflict))
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn instance_view(&self, id: SiteAssessmentId) -> Result<SiteAssessmentView, WorkflowError> {
        let instance = self.load_instance(id)?;
        self.render_instance(instance)
    }

    /// The most recently created instance of a site.
    pub fn latest_instance_view(&self, site_id: SiteId) -> Result<SiteAssessmentView, WorkflowError> {
        let instance = self
            .repository
            .instances_for_site(site_id)?
            .pop()
            .ok_or_else(|| WorkflowError::not_found("site assessment for site", site_id.0))?;
        self.render_instance(instance)
    }

    pub fn page_view(
        &self,
        site_assessment_id: SiteAssessmentId,
        site_page_id: SitePageId,
    ) -> Result<PageView, WorkflowError> {
        self.load_instance(site_assessment_id)?;
        let site_page = self
            .repository
            .site_pages(site_assessment_id)?
            .into_iter()
            .find(|page| page.id == site_page_id)
            .ok_or_else(|| WorkflowError::not_found("site page", site_page_id.0))?;
        let questions = self.templates.questions_for(site_page.page_id);
        let responses = self.repository.responses(site_page_id)?;

        Ok(PageView {
            site_assessment_id,
            site_page_id,
            title: site_page.title,
            progress: site_page.progress,
            required: site_page.required,
            is_confirmation_page: site_page.is_confirmation_page,
            questions: questions.iter().map(Into::into).collect(),
            responses: responses.into_iter().map(ResponseView::from).collect(),
        })
    }

    /// Validate and persist one page of answers.
    ///
    /// Nothing is written unless the whole batch validates. A confirmed save completes the
    /// page, runs the unlock scan, and confirms the instance when the page is the
    /// confirmation page. Answers on the profile page may promote sibling pages to required
    /// and update the site record.
    pub fn save_page(
        &self,
        site_assessment_id: SiteAssessmentId,
        site_page_id: SitePageId,
        mut responses: Vec<ResponseInput>,
        confirmed: bool,
    ) -> Result<SaveOutcome, WorkflowError> {
        let instance = self.load_instance(site_assessment_id)?;
        let snapshot = self.repository.site_pages(site_assessment_id)?;
        let index = snapshot
            .iter()
            .position(|page| page.id == site_page_id)
            .ok_or_else(|| WorkflowError::not_found("site page", site_page_id.0))?;
        // Pages never relock, so a stale unlocked row is safe to accept here.
        if snapshot[index].progress.is_locked() {
            warn!(site_page_id = %site_page_id, "rejected save to locked page");
            return Err(WorkflowError::PageLocked(site_page_id));
        }

        let questions = self.assessment_questions(instance.assessment_id);
        let errors = validate_responses(&questions, &mut responses, confirmed);
        if !errors.is_empty() {
            warn!(
                site_page_id = %site_page_id,
                errors = errors.len(),
                "page save failed validation"
            );
            return Err(WorkflowError::ValidationFailed(errors));
        }

        let is_profile_page = self
            .templates
            .page(snapshot[index].page_id)
            .is_some_and(|page| page.is_profile_page);
        let confirm_instance = confirmed && snapshot[index].is_confirmation_page;

        // Transitions are recomputed from the stored rows inside the commit.
        let mut progress = snapshot[index].progress;
        let mut promoted = Vec::new();
        let mut unlocked = Vec::new();
        let saved = responses.len();
        let changeset = SaveChangeset {
            site_assessment_id,
            site_page_id,
            responses: responses.clone(),
            confirm_instance,
        };
        self.repository.commit(changeset, &mut |pages: &mut [SitePage]| {
            let mut site_update = None;
            if let Some(target) = pages.iter_mut().find(|page| page.id == site_page_id) {
                target.progress = target.progress.after_save(target.required, confirmed);
                progress = target.progress;
            }
            if is_profile_page {
                let derivation = apply_profile_answers(
                    pages,
                    site_page_id,
                    &responses,
                    &questions,
                    &self.sentinels,
                );
                promoted = derivation.promoted;
                site_update = Some(derivation.site_update).filter(|update| !update.is_empty());
            }
            unlocked = if confirmed {
                self.unlock_scan(pages)
            } else {
                Vec::new()
            };
            site_update
        })?;

        if !promoted.is_empty() {
            info!(
                site_assessment_id = %site_assessment_id,
                promoted = ?promoted,
                "promoted service area pages"
            );
        }
        info!(
            site_assessment_id = %site_assessment_id,
            site_page_id = %site_page_id,
            progress = progress.label(),
            responses = saved,
            unlocked = unlocked.len(),
            "saved site page"
        );

        Ok(SaveOutcome {
            message: if confirmed {
                SaveOutcome::COMPLETED
            } else {
                SaveOutcome::SAVED
            }
            .to_string(),
            progress,
            unlocked,
            promoted,
            confirmed: instance.confirmed || confirm_instance,
        })
    }

    /// Ordered pages with the stored answers of each, labelled by question text.
    pub fn summary(&self, site_assessment_id: SiteAssessmentId) -> Result<SummaryView, WorkflowError> {
        let instance = self.load_instance(site_assessment_id)?;
        let assessment = self
            .templates
            .assessment(instance.assessment_id)
            .ok_or_else(|| WorkflowError::not_found("assessment", instance.assessment_id.0))?;
        let site = self.repository.site(instance.site_id)?;

        let mut pages = Vec::new();
        for site_page in self.repository.site_pages(site_assessment_id)? {
            let mut rows: Vec<(u32, SummaryRow)> = self
                .repository
                .responses(site_page.id)?
                .into_iter()
                .map(|response| {
                    let question = self.templates.question(response.question_id);
                    let order = question.as_ref().map_or(u32::MAX, |question| question.order);
                    let text = question.map_or_else(
                        || format!("Question {}", response.question_id),
                        |question| question.text,
                    );
                    (
                        order,
                        SummaryRow {
                            question_id: response.question_id,
                            question: text,
                            value: response.value,
                        },
                    )
                })
                .collect();
            rows.sort_by_key(|(order, row)| (*order, row.question_id));

            pages.push(SummaryPage {
                site_page_id: site_page.id,
                title: site_page.title,
                progress: site_page.progress,
                required: site_page.required,
                rows: rows.into_iter().map(|(_, row)| row).collect(),
            });
        }

        Ok(SummaryView {
            site_assessment_id,
            site_id: instance.site_id,
            site_name: site.map(|site| site.name),
            year: assessment.year,
            season: assessment.season,
            confirmed: instance.confirmed,
            pages,
        })
    }

    pub fn template_pages(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<Vec<TemplatePageView>, WorkflowError> {
        self.templates
            .assessment(assessment_id)
            .ok_or_else(|| WorkflowError::not_found("assessment", assessment_id.0))?;
        Ok(self
            .templates
            .pages_for(assessment_id)
            .iter()
            .map(|page| TemplatePageView::new(page, &self.templates.questions_for(page.id)))
            .collect())
    }

    pub fn profile_page(&self, target: ProfileTarget) -> Result<ProfilePageView, WorkflowError> {
        let name = self.profile_name(target)?;
        let questions = self.templates.profile_questions(target.scope());
        let responses = self.repository.profile_responses(target)?;
        Ok(ProfilePageView::new(target, name, &questions, responses))
    }

    /// Save an organization or site questionnaire and write name and size answers through
    /// to the directory record.
    pub fn save_profile(
        &self,
        target: ProfileTarget,
        mut responses: Vec<ResponseInput>,
    ) -> Result<ProfileSaveOutcome, WorkflowError> {
        self.profile_name(target)?;
        let questions = QuestionIndex::new(self.templates.profile_questions(target.scope()));
        let errors = validate_responses(&questions, &mut responses, false);
        if !errors.is_empty() {
            warn!(target = target.label(), errors = errors.len(), "profile save failed validation");
            return Err(WorkflowError::ValidationFailed(errors));
        }

        let write = derive_profile_write(&responses, &questions, &self.sentinels);
        let (site_update, organization_name) = match target {
            ProfileTarget::Site(site_id) => (
                Some((site_id, write.site_update)).filter(|(_, update)| !update.is_empty()),
                None,
            ),
            ProfileTarget::Organization(organization_id) => (
                None,
                write.organization_name.map(|name| (organization_id, name)),
            ),
        };

        let saved = responses.len();
        self.repository.commit_profile(ProfileChangeset {
            target,
            responses,
            site_update,
            organization_name,
        })?;
        info!(target = target.label(), responses = saved, "saved profile");

        Ok(ProfileSaveOutcome {
            message: format!("{} profile saved successfully", target.label()),
            saved,
        })
    }

    fn load_instance(&self, id: SiteAssessmentId) -> Result<SiteAssessment, WorkflowError> {
        self.repository
            .instance(id)?
            .ok_or_else(|| WorkflowError::not_found("site assessment", id.0))
    }

    fn render_instance(&self, instance: SiteAssessment) -> Result<SiteAssessmentView, WorkflowError> {
        let assessment = self
            .templates
            .assessment(instance.assessment_id)
            .ok_or_else(|| WorkflowError::not_found("assessment", instance.assessment_id.0))?;
        let site = self.repository.site(instance.site_id)?;
        let site_pages = self
            .repository
            .site_pages(instance.id)?
            .into_iter()
            .map(|site_page| {
                let page = self.templates.page(site_page.page_id).map(|page| {
                    TemplatePageView::new(&page, &self.templates.questions_for(page.id))
                });
                SitePageView::new(site_page, page)
            })
            .collect();

        Ok(SiteAssessmentView {
            id: instance.id,
            site_id: instance.site_id,
            assessment_id: instance.assessment_id,
            year: assessment.year,
            season: assessment.season,
            created_at: instance.created_at,
            confirmed: instance.confirmed,
            site,
            site_pages,
        })
    }

    /// Every question of the assessment, so a batch may reference any page's questions.
    fn assessment_questions(&self, assessment_id: AssessmentId) -> QuestionIndex {
        QuestionIndex::new(
            self.templates
                .pages_for(assessment_id)
                .iter()
                .flat_map(|page| self.templates.questions_for(page.id)),
        )
    }

    fn unlock_scan(&self, pages: &mut [SitePage]) -> Vec<SitePageId> {
        let unlocked = super::progress::unlock_remaining(pages, &self.required_pages);
        if !unlocked.is_empty() {
            let titles: HashMap<SitePageId, &str> = pages
                .iter()
                .map(|page| (page.id, page.title.as_str()))
                .collect();
            let unlocked_titles: Vec<&str> = unlocked
                .iter()
                .filter_map(|id| titles.get(id).copied())
                .collect();
            info!(pages = ?unlocked_titles, "unlocked remaining pages");
        }
        unlocked
    }

    fn profile_name(&self, target: ProfileTarget) -> Result<String, WorkflowError> {
        match target {
            ProfileTarget::Organization(id) => self
                .repository
                .organization(id)?
                .map(|organization| organization.name)
                .ok_or_else(|| WorkflowError::not_found("organization", id.0)),
            ProfileTarget::Site(id) => self
                .repository
                .site(id)?
                .map(|site| site.name)
                .ok_or_else(|| WorkflowError::not_found("site", id.0)),
        }
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("{} response(s) failed validation", .0.len())]
    ValidationFailed(Vec<ValidationError>),
    #[error("no assessment template for {season} {year}")]
    TemplateMissing { year: i32, season: Season },
    #[error("site page {0} is locked")]
    PageLocked(SitePageId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}
