use super::domain::{
    AssessmentId, Organization, OrganizationId, ProfileResponse, ProfileTarget, QuestionResponse,
    Site, SiteAssessment, SiteAssessmentId, SiteId, SitePage, SitePageId,
};
use super::instance::InstancePlan;
use super::requirements::SiteUpdate;
use super::validation::ResponseInput;

/// The page-independent writes of one save, applied all-or-nothing by
/// [`AssessmentRepository::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveChangeset {
    pub site_assessment_id: SiteAssessmentId,
    pub site_page_id: SitePageId,
    /// Validated responses upserted by (site page, question).
    pub responses: Vec<ResponseInput>,
    pub confirm_instance: bool,
}

/// Rewrites the site pages of one instance for a save and returns the changes it derived for
/// the instance's site.
///
/// Receives the stored pages sorted by `order` and runs while the repository holds its write
/// lock, so concurrent saves to one instance always build on each other's page rows.
pub type PageUpdate<'a> = dyn FnMut(&mut [SitePage]) -> Option<SiteUpdate> + 'a;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChangeset {
    pub target: ProfileTarget,
    pub responses: Vec<ResponseInput>,
    pub site_update: Option<(SiteId, SiteUpdate)>,
    pub organization_name: Option<(OrganizationId, String)>,
}

/// Storage abstraction so the service can be exercised against any backend.
pub trait AssessmentRepository: Send + Sync {
    fn find_instance(
        &self,
        site_id: SiteId,
        assessment_id: AssessmentId,
    ) -> Result<Option<SiteAssessment>, RepositoryError>;
    /// Fails with [`RepositoryError::Conflict`] when the (site, assessment) pair exists.
    fn insert_instance(&self, plan: InstancePlan) -> Result<SiteAssessment, RepositoryError>;
    fn instance(&self, id: SiteAssessmentId) -> Result<Option<SiteAssessment>, RepositoryError>;
    fn instances_for_site(&self, site_id: SiteId) -> Result<Vec<SiteAssessment>, RepositoryError>;
    /// Site pages of an instance sorted by `order`.
    fn site_pages(&self, id: SiteAssessmentId) -> Result<Vec<SitePage>, RepositoryError>;
    fn responses(&self, site_page_id: SitePageId) -> Result<Vec<QuestionResponse>, RepositoryError>;
    /// Stores the changeset together with every page `update_pages` changed and its site
    /// update. Fails with [`RepositoryError::NotFound`] before any write when a reference is
    /// missing.
    fn commit(
        &self,
        changeset: SaveChangeset,
        update_pages: &mut PageUpdate<'_>,
    ) -> Result<(), RepositoryError>;

    fn site(&self, id: SiteId) -> Result<Option<Site>, RepositoryError>;
    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError>;
    fn profile_responses(
        &self,
        target: ProfileTarget,
    ) -> Result<Vec<ProfileResponse>, RepositoryError>;
    fn commit_profile(&self, changeset: ProfileChangeset) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
