use super::domain::{
    Assessment, AssessmentId, AssessmentPeriod, Organization, OrganizationId, Page, PageId,
    QuestionId, QuestionType, Site, SiteId,
};
use super::requirements::{
    PEOPLE_SERVED_QUESTION, SERVICE_AREAS_QUESTION, SITE_NAME_QUESTION,
};
use super::template::{QuestionRecord, TemplateSnapshot};

/// Service areas a site can ask for; each one has a page of the same title.
pub const SERVICE_AREAS: [&str; 7] = [
    "Clothing",
    "Food",
    "Household",
    "Hygiene",
    "Infants and Children",
    "Infrastructure",
    "Shelter",
];

/// Id distance between the page and question rows of consecutive seasons in
/// [`TemplateSnapshot::standard_seasons`]. Stays below the profile question ids.
const SEASON_ID_STRIDE: u64 = 100;

impl TemplateSnapshot {
    /// The stock questionnaire for `count` consecutive seasons starting at `first`.
    ///
    /// The first season keeps the ids of [`TemplateSnapshot::standard`]; every later season
    /// gets the next assessment id and its pages and questions are shifted by a fixed stride.
    /// At most nine seasons are generated.
    pub fn standard_seasons(first: AssessmentPeriod, count: usize) -> Self {
        let mut snapshot = Self::standard(first);
        let base_pages = snapshot.pages.clone();
        let base_questions = snapshot.questions.clone();

        let mut period = first;
        for season in 1..count.min(9) as u64 {
            period = period.next();
            let offset = season * SEASON_ID_STRIDE;
            let assessment_id = AssessmentId(season + 1);
            snapshot.assessments.push(Assessment {
                id: assessment_id,
                year: period.year,
                season: period.season,
            });
            snapshot
                .pages
                .extend(base_pages.iter().cloned().map(|page| Page {
                    id: PageId(page.id.0 + offset),
                    assessment_id,
                    ..page
                }));
            snapshot
                .questions
                .extend(base_questions.iter().cloned().map(|question| QuestionRecord {
                    id: QuestionId(question.id.0 + offset),
                    page_id: question.page_id.map(|id| PageId(id.0 + offset)),
                    parent_question_id: question
                        .parent_question_id
                        .map(|id| QuestionId(id.0 + offset)),
                    ..question
                }));
        }
        snapshot
    }

    /// The stock questionnaire for one season, plus a demo organization and site.
    pub fn standard(period: AssessmentPeriod) -> Self {
        let assessment_id = AssessmentId(1);
        let mut pages = vec![
            Page {
                id: PageId(1),
                title: "Basic Info".to_string(),
                assessment_id,
                order: 1,
                is_confirmation_page: false,
                is_profile_page: true,
            },
            Page {
                id: PageId(2),
                title: "Demographics".to_string(),
                assessment_id,
                order: 2,
                is_confirmation_page: false,
                is_profile_page: false,
            },
        ];
        let mut next_page = 3;
        for area in SERVICE_AREAS {
            pages.push(Page {
                id: PageId(next_page),
                title: area.to_string(),
                assessment_id,
                order: next_page as u32,
                is_confirmation_page: false,
                is_profile_page: false,
            });
            next_page += 1;
        }
        pages.push(Page {
            id: PageId(next_page),
            title: "Confirmation".to_string(),
            assessment_id,
            order: next_page as u32,
            is_confirmation_page: true,
            is_profile_page: false,
        });

        let mut questions = vec![
            record(1, Some(1), SITE_NAME_QUESTION, QuestionType::ShortAnswer, 1, true),
            record(2, Some(1), PEOPLE_SERVED_QUESTION, QuestionType::Numeric, 2, true),
            QuestionRecord {
                options: SERVICE_AREAS.iter().map(|area| area.to_string()).collect(),
                ..record(3, Some(1), SERVICE_AREAS_QUESTION, QuestionType::MultiSelect, 3, true)
            },
            QuestionRecord {
                options: vec![
                    "0-5".to_string(),
                    "6-17".to_string(),
                    "18-64".to_string(),
                    "65+".to_string(),
                ],
                ..record(
                    4,
                    Some(2),
                    "Which age groups do you serve?",
                    QuestionType::MultiSelectWithOther,
                    1,
                    true,
                )
            },
            record(
                5,
                Some(2),
                "How many households did you serve last month?",
                QuestionType::Numeric,
                2,
                true,
            ),
            QuestionRecord {
                subtext: Some("Languages beyond English, if any.".to_string()),
                ..record(
                    6,
                    Some(2),
                    "Which languages do the people you serve speak?",
                    QuestionType::ShortAnswer,
                    3,
                    false,
                )
            },
        ];

        let mut next_question = 7;
        for page in pages
            .iter()
            .filter(|page| SERVICE_AREAS.contains(&page.title.as_str()))
        {
            let page_id = page.id.0;
            questions.push(QuestionRecord {
                options: super::catalog::standard_items(&page.title)
                    .iter()
                    .map(|item| item.to_string())
                    .collect(),
                allows_additional_input: true,
                ..record(
                    next_question,
                    Some(page_id),
                    &format!("Which {} items do you need most?", page.title.to_lowercase()),
                    QuestionType::MultiSelectWithOther,
                    1,
                    false,
                )
            });
            questions.push(QuestionRecord {
                parent_question_id: Some(QuestionId(next_question)),
                ..record(
                    next_question + 1,
                    Some(page_id),
                    "Roughly how many people need these items?",
                    QuestionType::Numeric,
                    2,
                    false,
                )
            });
            next_question += 2;
        }

        questions.push(record(
            next_question,
            Some(next_page),
            "I confirm these answers are accurate for this season.",
            QuestionType::Confirm,
            1,
            true,
        ));

        Self {
            assessments: vec![Assessment {
                id: assessment_id,
                year: period.year,
                season: period.season,
            }],
            pages,
            questions,
            organization_questions: vec![QuestionRecord {
                slug: Some("orgname".to_string()),
                ..record(
                    1001,
                    None,
                    "What is the name of your organization?",
                    QuestionType::ShortAnswer,
                    1,
                    true,
                )
            }],
            site_questions: vec![
                QuestionRecord {
                    slug: Some("sitename".to_string()),
                    ..record(
                        2001,
                        None,
                        "What is the name of this site?",
                        QuestionType::ShortAnswer,
                        1,
                        true,
                    )
                },
                QuestionRecord {
                    slug: Some("sitenumserved".to_string()),
                    ..record(
                        2002,
                        None,
                        "How many people does this site serve?",
                        QuestionType::Numeric,
                        2,
                        false,
                    )
                },
            ],
            organizations: vec![Organization {
                id: OrganizationId(1),
                name: "Demo Organization".to_string(),
            }],
            sites: vec![Site {
                id: SiteId(1),
                name: "Demo Site".to_string(),
                organization_id: Some(OrganizationId(1)),
                people_served: None,
            }],
        }
    }
}

fn record(
    id: u64,
    page_id: Option<u64>,
    text: &str,
    question_type: QuestionType,
    order: u32,
    required: bool,
) -> QuestionRecord {
    QuestionRecord {
        id: QuestionId(id),
        page_id: page_id.map(PageId),
        text: text.to_string(),
        subtext: None,
        required,
        question_type,
        options: Vec::new(),
        order,
        allows_additional_input: false,
        parent_question_id: None,
        slug: None,
    }
}
