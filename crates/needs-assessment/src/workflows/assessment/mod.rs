//! Seasonal needs-assessment questionnaires: template catalog, per-site instances, page
//! progress and the answers that feed back into site records.

pub mod catalog;
pub mod domain;
pub mod instance;
pub mod memory;
pub mod progress;
pub mod repository;
pub mod requirements;
pub mod router;
pub mod service;
mod standard;
pub mod template;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use catalog::standard_items;
pub use domain::{
    Assessment, AssessmentId, AssessmentPeriod, Organization, OrganizationId, Page, PageId,
    ProfileTarget, Question, QuestionId, QuestionResponse, QuestionScope, QuestionType, Season,
    Site, SiteAssessment, SiteAssessmentId, SiteId, SitePage, SitePageId,
};
pub use memory::InMemoryAssessmentRepository;
pub use progress::{unlock_remaining, PageProgress, RequiredPages};
pub use repository::{
    AssessmentRepository, PageUpdate, ProfileChangeset, RepositoryError, SaveChangeset,
};
pub use requirements::{ProfileSentinels, Sentinel, SiteUpdate};
pub use router::assessment_router;
pub use service::{AssessmentService, WorkflowError};
pub use standard::SERVICE_AREAS;
pub use template::{TemplateCatalog, TemplateError, TemplateSnapshot, TemplateStore};
pub use validation::{ResponseInput, ValidationError, ValidationErrorKind};
pub use views::{
    PageView, ProfilePageView, ProfileSaveOutcome, SaveOutcome, SiteAssessmentView, SummaryView,
};
