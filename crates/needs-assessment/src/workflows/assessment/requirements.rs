use serde_json::Value;
use tracing::debug;

use super::domain::{Question, SitePage, SitePageId};
use super::validation::{QuestionIndex, ResponseInput};

pub const SERVICE_AREAS_QUESTION: &str = "Which of the following areas do you have needs in?";
pub const SITE_NAME_QUESTION: &str = "Organization Name";
pub const PEOPLE_SERVED_QUESTION: &str = "Number of People Served";
pub const ORGANIZATION_NAME_QUESTION: &str = "What is the name of your organization?";

/// A question recognised by its literal text, or by its slug when the template has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    pub text: String,
    pub slug: String,
}

impl Sentinel {
    pub fn new(text: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            slug: slug.into(),
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        question.text == self.text || question.slug.as_deref() == Some(self.slug.as_str())
    }
}

/// Questions whose answers reach outside the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSentinels {
    pub service_areas: Sentinel,
    pub site_name: Sentinel,
    pub people_served: Sentinel,
    pub organization_name: Sentinel,
}

impl Default for ProfileSentinels {
    fn default() -> Self {
        Self {
            service_areas: Sentinel::new(SERVICE_AREAS_QUESTION, "serviceareas"),
            site_name: Sentinel::new(SITE_NAME_QUESTION, "sitename"),
            people_served: Sentinel::new(PEOPLE_SERVED_QUESTION, "sitenumserved"),
            organization_name: Sentinel::new(ORGANIZATION_NAME_QUESTION, "orgname"),
        }
    }
}

/// Field changes for a site derived from questionnaire answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteUpdate {
    pub name: Option<String>,
    pub people_served: Option<u32>,
}

impl SiteUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.people_served.is_none()
    }

    fn absorb(&mut self, question: &Question, value: &Value, sentinels: &ProfileSentinels) {
        if sentinels.site_name.matches(question) {
            if let Some(name) = value_as_text(value) {
                self.name = Some(name);
            }
        } else if sentinels.people_served.matches(question) {
            if let Some(count) = value_as_count(value) {
                self.people_served = Some(count);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDerivation {
    /// Sibling pages whose `required` flag was switched on.
    pub promoted: Vec<SitePageId>,
    pub site_update: SiteUpdate,
}

/// Apply answers saved on the profile page.
///
/// The service-areas answer lists page titles; every sibling page with a listed title
/// becomes required. Promotion never clears the flag and never touches progress. Site
/// name and people-served answers are collected into a [`SiteUpdate`].
pub fn apply_profile_answers(
    pages: &mut [SitePage],
    profile_page: SitePageId,
    responses: &[ResponseInput],
    questions: &QuestionIndex,
    sentinels: &ProfileSentinels,
) -> ProfileDerivation {
    let mut derivation = ProfileDerivation::default();

    for response in responses {
        let Some(question) = questions.get(response.question_id) else {
            continue;
        };

        if sentinels.service_areas.matches(question) {
            let Some(titles) = response.value.as_array() else {
                debug!(question_id = %question.id, "service areas answer is not a list");
                continue;
            };
            let titles: Vec<&str> = titles.iter().filter_map(Value::as_str).collect();
            for page in pages.iter_mut() {
                if page.id != profile_page && !page.required && titles.contains(&page.title.as_str())
                {
                    page.required = true;
                    derivation.promoted.push(page.id);
                }
            }
        } else {
            derivation
                .site_update
                .absorb(question, &response.value, sentinels);
        }
    }

    derivation
}

/// Site or organization changes carried by a profile questionnaire save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileWrite {
    pub site_update: SiteUpdate,
    pub organization_name: Option<String>,
}

pub fn derive_profile_write(
    responses: &[ResponseInput],
    questions: &QuestionIndex,
    sentinels: &ProfileSentinels,
) -> ProfileWrite {
    let mut write = ProfileWrite::default();
    for response in responses {
        let Some(question) = questions.get(response.question_id) else {
            continue;
        };
        if sentinels.organization_name.matches(question) {
            if let Some(name) = value_as_text(&response.value) {
                write.organization_name = Some(name);
            }
        } else {
            write
                .site_update
                .absorb(question, &response.value, sentinels);
        }
    }
    write
}

fn value_as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn value_as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.is_finite() && *float >= 0.0)
                    .map(|float| float.round() as u64)
            })
            .and_then(|count| u32::try_from(count).ok()),
        Value::String(raw) => raw.trim().parse::<u32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::{
        PageId, QuestionId, QuestionScope, QuestionType, SiteAssessmentId,
    };
    use crate::workflows::assessment::progress::PageProgress;
    use serde_json::json;

    fn question(id: u64, text: &str, slug: Option<&str>, scope: QuestionScope) -> Question {
        Question {
            id: QuestionId(id),
            scope,
            text: text.to_string(),
            subtext: None,
            required: false,
            question_type: QuestionType::ShortAnswer,
            options: Vec::new(),
            order: id as u32,
            allows_additional_input: false,
            parent_question_id: None,
            slug: slug.map(str::to_string),
        }
    }

    fn site_page(id: u64, title: &str, required: bool, progress: PageProgress) -> SitePage {
        SitePage {
            id: SitePageId(id),
            site_assessment_id: SiteAssessmentId(1),
            page_id: PageId(id),
            order: id as u32,
            required,
            progress,
            is_confirmation_page: false,
            title: title.to_string(),
        }
    }

    fn profile_questions() -> QuestionIndex {
        let scope = QuestionScope::Page(PageId(1));
        QuestionIndex::new([
            question(1, SERVICE_AREAS_QUESTION, None, scope),
            question(2, SITE_NAME_QUESTION, None, scope),
            question(3, "How many people come each week?", Some("sitenumserved"), scope),
            question(4, "Favourite colour", None, scope),
        ])
    }

    #[test]
    fn service_areas_promote_matching_pages_only() {
        let mut pages = vec![
            site_page(1, "Basic Info", true, PageProgress::StartedRequired),
            site_page(2, "Clothing", false, PageProgress::Locked),
            site_page(3, "Food", false, PageProgress::UnstartedOptional),
            site_page(4, "Shelter", false, PageProgress::Locked),
        ];
        let responses = vec![ResponseInput::new(
            QuestionId(1),
            json!(["Clothing", "Food", "Basic Info"]),
        )];

        let derivation = apply_profile_answers(
            &mut pages,
            SitePageId(1),
            &responses,
            &profile_questions(),
            &ProfileSentinels::default(),
        );

        assert_eq!(derivation.promoted, vec![SitePageId(2), SitePageId(3)]);
        assert!(pages[1].required && pages[2].required);
        assert!(!pages[3].required);
        assert_eq!(pages[1].progress, PageProgress::Locked);
        assert_eq!(pages[2].progress, PageProgress::UnstartedOptional);
        assert!(derivation.site_update.is_empty());
    }

    #[test]
    fn sentinel_answers_update_the_site() {
        let mut pages = vec![site_page(1, "Basic Info", true, PageProgress::StartedRequired)];
        let responses = vec![
            ResponseInput::new(QuestionId(2), " Northside Pantry "),
            ResponseInput::new(QuestionId(3), json!(120)),
            ResponseInput::new(QuestionId(4), "Blue"),
        ];

        let derivation = apply_profile_answers(
            &mut pages,
            SitePageId(1),
            &responses,
            &profile_questions(),
            &ProfileSentinels::default(),
        );

        assert_eq!(
            derivation.site_update,
            SiteUpdate {
                name: Some("Northside Pantry".to_string()),
                people_served: Some(120),
            }
        );
        assert!(derivation.promoted.is_empty());
    }

    #[test]
    fn non_list_service_areas_are_ignored() {
        let mut pages = vec![site_page(2, "Clothing", false, PageProgress::Locked)];
        let responses = vec![ResponseInput::new(QuestionId(1), "Clothing")];

        let derivation = apply_profile_answers(
            &mut pages,
            SitePageId(1),
            &responses,
            &profile_questions(),
            &ProfileSentinels::default(),
        );

        assert!(derivation.promoted.is_empty());
        assert!(!pages[0].required);
    }

    #[test]
    fn profile_write_picks_up_organization_name_by_slug() {
        let questions = QuestionIndex::new([
            question(10, "Org?", Some("orgname"), QuestionScope::Organization),
            question(11, "Site?", Some("sitename"), QuestionScope::Site),
        ]);
        let responses = vec![
            ResponseInput::new(QuestionId(10), "Harbor Relief"),
            ResponseInput::new(QuestionId(11), ""),
        ];

        let write = derive_profile_write(&responses, &questions, &ProfileSentinels::default());

        assert_eq!(write.organization_name.as_deref(), Some("Harbor Relief"));
        assert!(write.site_update.is_empty());
    }

    #[test]
    fn counts_accept_numbers_and_strings() {
        assert_eq!(value_as_count(&json!(12)), Some(12));
        assert_eq!(value_as_count(&json!(12.6)), Some(13));
        assert_eq!(value_as_count(&json!("40")), Some(40));
        assert_eq!(value_as_count(&json!(-3)), None);
        assert_eq!(value_as_count(&json!(["1"])), None);
    }
}
