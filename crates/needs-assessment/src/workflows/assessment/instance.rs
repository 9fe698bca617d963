use chrono::{DateTime, Utc};

use super::domain::{Assessment, AssessmentId, Page, PageId, SiteId};
use super::progress::{PageProgress, RequiredPages};

/// A site assessment ready to be inserted; the repository assigns the ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstancePlan {
    pub site_id: SiteId,
    pub assessment_id: AssessmentId,
    pub created_at: DateTime<Utc>,
    pub pages: Vec<SitePagePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePagePlan {
    pub page_id: PageId,
    pub order: u32,
    pub title: String,
    pub is_confirmation_page: bool,
    pub required: bool,
    pub progress: PageProgress,
}

impl SitePagePlan {
    fn from_template(page: &Page, required_pages: &RequiredPages) -> Self {
        let required = required_pages.contains(&page.title);
        Self {
            page_id: page.id,
            order: page.order,
            title: page.title.clone(),
            is_confirmation_page: page.is_confirmation_page,
            required,
            progress: PageProgress::initial(required),
        }
    }
}

/// Build one site page per template page, copying the fields an instance keeps frozen.
pub fn plan_instance(
    site_id: SiteId,
    assessment: &Assessment,
    pages: &[Page],
    required_pages: &RequiredPages,
    created_at: DateTime<Utc>,
) -> InstancePlan {
    InstancePlan {
        site_id,
        assessment_id: assessment.id,
        created_at,
        pages: pages
            .iter()
            .filter(|page| page.assessment_id == assessment.id)
            .map(|page| SitePagePlan::from_template(page, required_pages))
            .collect(),
    }
}
