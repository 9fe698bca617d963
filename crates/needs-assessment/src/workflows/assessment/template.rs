use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use super::domain::{
    Assessment, AssessmentId, Organization, Page, PageId, Question, QuestionId, QuestionScope,
    QuestionType, Season, Site,
};

/// Read-only access to the seasonal templates.
///
/// Implementations hand out owned snapshots; the engine never mutates a template.
pub trait TemplateStore: Send + Sync {
    fn assessment_for(&self, year: i32, season: Season) -> Option<Assessment>;
    fn assessment(&self, id: AssessmentId) -> Option<Assessment>;
    /// Pages of an assessment sorted by `order`.
    fn pages_for(&self, assessment_id: AssessmentId) -> Vec<Page>;
    fn page(&self, id: PageId) -> Option<Page>;
    /// Questions of a page sorted by `order`.
    fn questions_for(&self, page_id: PageId) -> Vec<Question>;
    fn question(&self, id: QuestionId) -> Option<Question>;
    /// Organization- or site-scoped profile questions sorted by `order`.
    fn profile_questions(&self, scope: QuestionScope) -> Vec<Question>;
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid template snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: u64 },
    #[error("more than one assessment for {season} {year}")]
    DuplicatePeriod { year: i32, season: Season },
    #[error("{entity} {id} references missing {target} {target_id}")]
    DanglingReference {
        entity: &'static str,
        id: u64,
        target: &'static str,
        target_id: u64,
    },
    #[error("question {0} has a parent in a different scope")]
    CrossScopeParent(u64),
    #[error("question {0} is part of a parent cycle")]
    ParentCycle(u64),
}

/// Question row as authored in a snapshot. The table it sits in decides its scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(default)]
    pub page_id: Option<PageId>,
    pub text: String,
    #[serde(default)]
    pub subtext: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub order: u32,
    #[serde(default)]
    pub allows_additional_input: bool,
    #[serde(default)]
    pub parent_question_id: Option<QuestionId>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl QuestionRecord {
    fn into_question(self, scope: QuestionScope) -> Question {
        Question {
            id: self.id,
            scope,
            text: self.text,
            subtext: self.subtext,
            required: self.required,
            question_type: self.question_type,
            options: self.options,
            order: self.order,
            allows_additional_input: self.allows_additional_input,
            parent_question_id: self.parent_question_id,
            slug: self.slug,
        }
    }
}

/// Serialized seed of templates plus the sites and organizations that answer them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSnapshot {
    #[serde(default)]
    pub assessments: Vec<Assessment>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub organization_questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub site_questions: Vec<QuestionRecord>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl TemplateSnapshot {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TemplateError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// In-memory [`TemplateStore`] built from a validated snapshot.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    assessments: BTreeMap<AssessmentId, Assessment>,
    pages: BTreeMap<PageId, Page>,
    questions: BTreeMap<QuestionId, Question>,
}

impl TemplateCatalog {
    pub fn from_snapshot(snapshot: &TemplateSnapshot) -> Result<Self, TemplateError> {
        let mut catalog = Self::default();
        let mut periods = HashSet::new();

        for assessment in &snapshot.assessments {
            if !periods.insert((assessment.year, assessment.season)) {
                return Err(TemplateError::DuplicatePeriod {
                    year: assessment.year,
                    season: assessment.season,
                });
            }
            if catalog
                .assessments
                .insert(assessment.id, assessment.clone())
                .is_some()
            {
                return Err(TemplateError::DuplicateId {
                    entity: "assessment",
                    id: assessment.id.0,
                });
            }
        }

        for page in &snapshot.pages {
            if !catalog.assessments.contains_key(&page.assessment_id) {
                return Err(TemplateError::DanglingReference {
                    entity: "page",
                    id: page.id.0,
                    target: "assessment",
                    target_id: page.assessment_id.0,
                });
            }
            if catalog.pages.insert(page.id, page.clone()).is_some() {
                return Err(TemplateError::DuplicateId {
                    entity: "page",
                    id: page.id.0,
                });
            }
        }

        for record in &snapshot.questions {
            let page_id = record.page_id.ok_or(TemplateError::DanglingReference {
                entity: "question",
                id: record.id.0,
                target: "page",
                target_id: 0,
            })?;
            if !catalog.pages.contains_key(&page_id) {
                return Err(TemplateError::DanglingReference {
                    entity: "question",
                    id: record.id.0,
                    target: "page",
                    target_id: page_id.0,
                });
            }
            catalog.insert_question(record.clone().into_question(QuestionScope::Page(page_id)))?;
        }
        for record in &snapshot.organization_questions {
            catalog.insert_question(record.clone().into_question(QuestionScope::Organization))?;
        }
        for record in &snapshot.site_questions {
            catalog.insert_question(record.clone().into_question(QuestionScope::Site))?;
        }

        catalog.check_parents()?;
        Ok(catalog)
    }

    fn insert_question(&mut self, question: Question) -> Result<(), TemplateError> {
        let id = question.id;
        if self.questions.insert(id, question).is_some() {
            return Err(TemplateError::DuplicateId {
                entity: "question",
                id: id.0,
            });
        }
        Ok(())
    }

    fn check_parents(&self) -> Result<(), TemplateError> {
        let parents: HashMap<QuestionId, QuestionId> = self
            .questions
            .values()
            .filter_map(|question| question.parent_question_id.map(|parent| (question.id, parent)))
            .collect();

        for (&child, &parent) in &parents {
            let Some(parent_question) = self.questions.get(&parent) else {
                return Err(TemplateError::DanglingReference {
                    entity: "question",
                    id: child.0,
                    target: "parent question",
                    target_id: parent.0,
                });
            };
            let child_scope = self.questions[&child].scope;
            let same_scope = match (child_scope, parent_question.scope) {
                (QuestionScope::Page(_), QuestionScope::Page(_)) => true,
                (left, right) => left == right,
            };
            if !same_scope {
                return Err(TemplateError::CrossScopeParent(child.0));
            }

            let mut seen = HashSet::from([child]);
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if !seen.insert(current) {
                    return Err(TemplateError::ParentCycle(child.0));
                }
                cursor = parents.get(&current).copied();
            }
        }

        Ok(())
    }

    pub fn assessments(&self) -> impl Iterator<Item = &Assessment> {
        self.assessments.values()
    }
}

fn sorted_questions<'a>(questions: impl Iterator<Item = &'a Question>) -> Vec<Question> {
    let mut questions: Vec<Question> = questions.cloned().collect();
    questions.sort_by_key(|question| (question.order, question.id));
    questions
}

impl TemplateStore for TemplateCatalog {
    fn assessment_for(&self, year: i32, season: Season) -> Option<Assessment> {
        self.assessments
            .values()
            .find(|assessment| assessment.year == year && assessment.season == season)
            .cloned()
    }

    fn assessment(&self, id: AssessmentId) -> Option<Assessment> {
        self.assessments.get(&id).cloned()
    }

    fn pages_for(&self, assessment_id: AssessmentId) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .pages
            .values()
            .filter(|page| page.assessment_id == assessment_id)
            .cloned()
            .collect();
        pages.sort_by_key(|page| (page.order, page.id));
        pages
    }

    fn page(&self, id: PageId) -> Option<Page> {
        self.pages.get(&id).cloned()
    }

    fn questions_for(&self, page_id: PageId) -> Vec<Question> {
        sorted_questions(
            self.questions
                .values()
                .filter(|question| question.scope == QuestionScope::Page(page_id)),
        )
    }

    fn question(&self, id: QuestionId) -> Option<Question> {
        self.questions.get(&id).cloned()
    }

    fn profile_questions(&self, scope: QuestionScope) -> Vec<Question> {
        if scope.page_id().is_some() {
            return Vec::new();
        }
        sorted_questions(
            self.questions
                .values()
                .filter(|question| question.scope == scope),
        )
    }
}
