use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::assessment::domain::{
    AssessmentId, AssessmentPeriod, Organization, OrganizationId, ProfileResponse, ProfileTarget,
    QuestionResponse, Site, SiteAssessment, SiteAssessmentId, SiteId, SitePage, SitePageId,
};
use crate::workflows::assessment::instance::InstancePlan;
use crate::workflows::assessment::repository::{
    AssessmentRepository, PageUpdate, ProfileChangeset, RepositoryError, SaveChangeset,
};
use crate::workflows::assessment::{
    AssessmentService, InMemoryAssessmentRepository, RequiredPages, SiteAssessmentView,
    TemplateCatalog, TemplateSnapshot,
};

pub(super) type MemoryService = AssessmentService<TemplateCatalog, InMemoryAssessmentRepository>;

pub(super) const SITE_NAME: u64 = 1;
pub(super) const PEOPLE_SERVED: u64 = 2;
pub(super) const SERVICE_AREAS: u64 = 3;
pub(super) const AGE_GROUPS: u64 = 4;
pub(super) const HOUSEHOLDS: u64 = 5;
pub(super) const CLOTHING_ITEMS: u64 = 7;
pub(super) const CLOTHING_COUNT: u64 = 8;
pub(super) const CONFIRM: u64 = 21;
pub(super) const ORGANIZATION_NAME: u64 = 1001;
pub(super) const PROFILE_SITE_NAME: u64 = 2001;
pub(super) const PROFILE_PEOPLE_SERVED: u64 = 2002;

pub(super) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(super) fn snapshot() -> TemplateSnapshot {
    TemplateSnapshot::standard(AssessmentPeriod::current(today()))
}

pub(super) fn catalog() -> Arc<TemplateCatalog> {
    Arc::new(TemplateCatalog::from_snapshot(&snapshot()).expect("standard template valid"))
}

pub(super) fn memory_repository() -> Arc<InMemoryAssessmentRepository> {
    let snapshot = snapshot();
    Arc::new(InMemoryAssessmentRepository::with_directory(
        snapshot.organizations,
        snapshot.sites,
    ))
}

pub(super) fn build_service() -> (MemoryService, Arc<InMemoryAssessmentRepository>) {
    let repository = memory_repository();
    let service = AssessmentService::new(catalog(), repository.clone(), RequiredPages::standard());
    (service, repository)
}

pub(super) fn demo_site() -> SiteId {
    SiteId(1)
}

pub(super) fn demo_organization() -> OrganizationId {
    OrganizationId(1)
}

pub(super) fn site_page(view: &SiteAssessmentView, title: &str) -> SitePageId {
    view.site_pages
        .iter()
        .find(|page| page.title == title)
        .map(|page| page.id)
        .unwrap_or_else(|| panic!("site page {title} present"))
}

pub(super) fn open_instance(service: &MemoryService) -> SiteAssessmentView {
    let instance = service
        .ensure_current_instance(demo_site(), today())
        .expect("instance created");
    service.instance_view(instance.id).expect("instance view")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Simulates losing a creation race: the first lookup misses, and the insert finds the
/// winner's row already there.
#[derive(Default)]
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryAssessmentRepository,
    missed_lookup: AtomicBool,
}

impl RacingRepository {
    pub(super) fn seeded() -> Self {
        let snapshot = snapshot();
        Self {
            inner: InMemoryAssessmentRepository::with_directory(
                snapshot.organizations,
                snapshot.sites,
            ),
            missed_lookup: AtomicBool::new(false),
        }
    }
}

impl AssessmentRepository for RacingRepository {
    fn find_instance(
        &self,
        site_id: SiteId,
        assessment_id: AssessmentId,
    ) -> Result<Option<SiteAssessment>, RepositoryError> {
        if !self.missed_lookup.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_instance(site_id, assessment_id)
    }

    fn insert_instance(&self, plan: InstancePlan) -> Result<SiteAssessment, RepositoryError> {
        self.inner.insert_instance(plan)?;
        Err(RepositoryError::Conflict)
    }

    fn instance(&self, id: SiteAssessmentId) -> Result<Option<SiteAssessment>, RepositoryError> {
        self.inner.instance(id)
    }

    fn instances_for_site(&self, site_id: SiteId) -> Result<Vec<SiteAssessment>, RepositoryError> {
        self.inner.instances_for_site(site_id)
    }

    fn site_pages(&self, id: SiteAssessmentId) -> Result<Vec<SitePage>, RepositoryError> {
        self.inner.site_pages(id)
    }

    fn responses(&self, site_page_id: SitePageId) -> Result<Vec<QuestionResponse>, RepositoryError> {
        self.inner.responses(site_page_id)
    }

    fn commit(
        &self,
        changeset: SaveChangeset,
        update_pages: &mut PageUpdate<'_>,
    ) -> Result<(), RepositoryError> {
        self.inner.commit(changeset, update_pages)
    }

    fn site(&self, id: SiteId) -> Result<Option<Site>, RepositoryError> {
        self.inner.site(id)
    }

    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError> {
        self.inner.organization(id)
    }

    fn profile_responses(
        &self,
        target: ProfileTarget,
    ) -> Result<Vec<ProfileResponse>, RepositoryError> {
        self.inner.profile_responses(target)
    }

    fn commit_profile(&self, changeset: ProfileChangeset) -> Result<(), RepositoryError> {
        self.inner.commit_profile(changeset)
    }
}

/// Holds page commits at a barrier until `parties` saves have arrived, so every save of a
/// round reads its page rows before any of them writes. Commits must come in full rounds.
pub(super) struct GatedRepository {
    pub(super) inner: InMemoryAssessmentRepository,
    gate: Barrier,
}

impl GatedRepository {
    pub(super) fn seeded(parties: usize) -> Self {
        let snapshot = snapshot();
        Self {
            inner: InMemoryAssessmentRepository::with_directory(
                snapshot.organizations,
                snapshot.sites,
            ),
            gate: Barrier::new(parties),
        }
    }
}

impl AssessmentRepository for GatedRepository {
    fn find_instance(
        &self,
        site_id: SiteId,
        assessment_id: AssessmentId,
    ) -> Result<Option<SiteAssessment>, RepositoryError> {
        self.inner.find_instance(site_id, assessment_id)
    }

    fn insert_instance(&self, plan: InstancePlan) -> Result<SiteAssessment, RepositoryError> {
        self.inner.insert_instance(plan)
    }

    fn instance(&self, id: SiteAssessmentId) -> Result<Option<SiteAssessment>, RepositoryError> {
        self.inner.instance(id)
    }

    fn instances_for_site(&self, site_id: SiteId) -> Result<Vec<SiteAssessment>, RepositoryError> {
        self.inner.instances_for_site(site_id)
    }

    fn site_pages(&self, id: SiteAssessmentId) -> Result<Vec<SitePage>, RepositoryError> {
        self.inner.site_pages(id)
    }

    fn responses(&self, site_page_id: SitePageId) -> Result<Vec<QuestionResponse>, RepositoryError> {
        self.inner.responses(site_page_id)
    }

    fn commit(
        &self,
        changeset: SaveChangeset,
        update_pages: &mut PageUpdate<'_>,
    ) -> Result<(), RepositoryError> {
        self.gate.wait();
        self.inner.commit(changeset, update_pages)
    }

    fn site(&self, id: SiteId) -> Result<Option<Site>, RepositoryError> {
        self.inner.site(id)
    }

    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError> {
        self.inner.organization(id)
    }

    fn profile_responses(
        &self,
        target: ProfileTarget,
    ) -> Result<Vec<ProfileResponse>, RepositoryError> {
        self.inner.profile_responses(target)
    }

    fn commit_profile(&self, changeset: ProfileChangeset) -> Result<(), RepositoryError> {
        self.inner.commit_profile(changeset)
    }
}

pub(super) struct UnavailableRepository;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl AssessmentRepository for UnavailableRepository {
    fn find_instance(
        &self,
        _site_id: SiteId,
        _assessment_id: AssessmentId,
    ) -> Result<Option<SiteAssessment>, RepositoryError> {
        unavailable()
    }

    fn insert_instance(&self, _plan: InstancePlan) -> Result<SiteAssessment, RepositoryError> {
        unavailable()
    }

    fn instance(&self, _id: SiteAssessmentId) -> Result<Option<SiteAssessment>, RepositoryError> {
        unavailable()
    }

    fn instances_for_site(&self, _site_id: SiteId) -> Result<Vec<SiteAssessment>, RepositoryError> {
        unavailable()
    }

    fn site_pages(&self, _id: SiteAssessmentId) -> Result<Vec<SitePage>, RepositoryError> {
        unavailable()
    }

    fn responses(&self, _site_page_id: SitePageId) -> Result<Vec<QuestionResponse>, RepositoryError> {
        unavailable()
    }

    fn commit(
        &self,
        _changeset: SaveChangeset,
        _update_pages: &mut PageUpdate<'_>,
    ) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn site(&self, _id: SiteId) -> Result<Option<Site>, RepositoryError> {
        unavailable()
    }

    fn organization(&self, _id: OrganizationId) -> Result<Option<Organization>, RepositoryError> {
        unavailable()
    }

    fn profile_responses(
        &self,
        _target: ProfileTarget,
    ) -> Result<Vec<ProfileResponse>, RepositoryError> {
        unavailable()
    }

    fn commit_profile(&self, _changeset: ProfileChangeset) -> Result<(), RepositoryError> {
        unavailable()
    }
}
