use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::domain::{
    AssessmentId, Page, PageId, ProfileResponse, ProfileTarget, Question, QuestionId,
    QuestionResponse, QuestionType, ResponseId, Season, Site, SiteAssessmentId, SiteId, SitePage,
    SitePageId,
};
use super::progress::PageProgress;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub subtext: Option<String>,
    pub required: bool,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub order: u32,
    pub allows_additional_input: bool,
    pub parent_question_id: Option<QuestionId>,
    pub slug: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            subtext: question.subtext.clone(),
            required: question.required,
            question_type: question.question_type,
            options: question.options.clone(),
            order: question.order,
            allows_additional_input: question.allows_additional_input,
            parent_question_id: question.parent_question_id,
            slug: question.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub id: ResponseId,
    pub question_id: QuestionId,
    pub value: Value,
}

impl From<QuestionResponse> for ResponseView {
    fn from(response: QuestionResponse) -> Self {
        Self {
            id: response.id,
            question_id: response.question_id,
            value: response.value,
        }
    }
}

impl From<ProfileResponse> for ResponseView {
    fn from(response: ProfileResponse) -> Self {
        Self {
            id: response.id,
            question_id: response.question_id,
            value: response.value,
        }
    }
}

/// A template page with its ordered questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePageView {
    pub id: PageId,
    pub title: String,
    pub order: u32,
    pub is_confirmation_page: bool,
    pub is_profile_page: bool,
    pub questions: Vec<QuestionView>,
}

impl TemplatePageView {
    pub fn new(page: &Page, questions: &[Question]) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            order: page.order,
            is_confirmation_page: page.is_confirmation_page,
            is_profile_page: page.is_profile_page,
            questions: questions.iter().map(QuestionView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePageView {
    pub id: SitePageId,
    pub title: String,
    pub order: u32,
    pub required: bool,
    pub progress: PageProgress,
    pub is_confirmation_page: bool,
    /// `None` when the template page has since been removed from the catalog.
    pub page: Option<TemplatePageView>,
}

impl SitePageView {
    pub fn new(site_page: SitePage, page: Option<TemplatePageView>) -> Self {
        Self {
            id: site_page.id,
            title: site_page.title,
            order: site_page.order,
            required: site_page.required,
            progress: site_page.progress,
            is_confirmation_page: site_page.is_confirmation_page,
            page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAssessmentView {
    pub id: SiteAssessmentId,
    pub site_id: SiteId,
    pub assessment_id: AssessmentId,
    pub year: i32,
    pub season: Season,
    pub created_at: DateTime<Utc>,
    pub confirmed: bool,
    pub site: Option<Site>,
    pub site_pages: Vec<SitePageView>,
}

/// Everything a client needs to render and fill one site page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub site_assessment_id: SiteAssessmentId,
    pub site_page_id: SitePageId,
    pub title: String,
    pub progress: PageProgress,
    pub required: bool,
    pub is_confirmation_page: bool,
    pub questions: Vec<QuestionView>,
    pub responses: Vec<ResponseView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub message: String,
    pub progress: PageProgress,
    pub unlocked: Vec<SitePageId>,
    pub promoted: Vec<SitePageId>,
    /// Whether the whole site assessment is confirmed after this save.
    pub confirmed: bool,
}

impl SaveOutcome {
    pub const SAVED: &'static str = "SitePage saved successfully";
    pub const COMPLETED: &'static str = "SitePage completed successfully";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    pub question_id: QuestionId,
    pub question: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPage {
    pub site_page_id: SitePageId,
    pub title: String,
    pub progress: PageProgress,
    pub required: bool,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub site_assessment_id: SiteAssessmentId,
    pub site_id: SiteId,
    pub site_name: Option<String>,
    pub year: i32,
    pub season: Season,
    pub confirmed: bool,
    pub pages: Vec<SummaryPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePageView {
    pub target: &'static str,
    pub id: u64,
    pub name: String,
    pub questions: Vec<QuestionView>,
    pub responses: Vec<ResponseView>,
}

impl ProfilePageView {
    pub fn new(
        target: ProfileTarget,
        name: String,
        questions: &[Question],
        responses: Vec<ProfileResponse>,
    ) -> Self {
        let id = match target {
            ProfileTarget::Organization(id) => id.0,
            ProfileTarget::Site(id) => id.0,
        };
        Self {
            target: target.label(),
            id,
            name,
            questions: questions.iter().map(QuestionView::from).collect(),
            responses: responses.into_iter().map(ResponseView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSaveOutcome {
    pub message: String,
    pub saved: usize,
}
