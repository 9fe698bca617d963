use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::progress::PageProgress;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Template assessment identifier (one per year and season).
    AssessmentId
);
record_id!(PageId);
record_id!(QuestionId);
record_id!(SiteId);
record_id!(OrganizationId);
record_id!(
    /// Identifier of a site's seasonal assessment instance.
    SiteAssessmentId
);
record_id!(SitePageId);
record_id!(ResponseId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Fall,
}

impl Season {
    /// January through June belong to the spring assessment, the rest of the year to fall.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.month() < 7 {
            Self::Spring
        } else {
            Self::Fall
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The (year, season) pair that uniquely identifies a template assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentPeriod {
    pub year: i32,
    pub season: Season,
}

impl AssessmentPeriod {
    pub fn current(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            season: Season::for_date(today),
        }
    }

    /// The period that follows this one; fall rolls over into the next year's spring.
    pub fn next(self) -> Self {
        match self.season {
            Season::Spring => Self {
                year: self.year,
                season: Season::Fall,
            },
            Season::Fall => Self {
                year: self.year + 1,
                season: Season::Spring,
            },
        }
    }
}

impl fmt::Display for AssessmentPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season, self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(alias = "Short Answer", alias = "Short Response")]
    ShortAnswer,
    #[serde(alias = "Long Answer", alias = "Long Response")]
    LongAnswer,
    Numeric,
    SingleSelect,
    Dropdown,
    DropdownWithOther,
    MultiSelect,
    #[serde(alias = "MultiselectWithOther")]
    MultiSelectWithOther,
    YesNo,
    YesNoWithNumericEntry,
    SizingGrid,
    DemoGrid,
    Confirm,
}

impl QuestionType {
    pub const fn expects_list(self) -> bool {
        matches!(self, Self::MultiSelect | Self::MultiSelectWithOther)
    }
}

/// Which table a question belongs to: a template page, or the once-per-entity
/// organization and site profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionScope {
    Page(PageId),
    Organization,
    Site,
}

impl QuestionScope {
    pub fn page_id(self) -> Option<PageId> {
        match self {
            Self::Page(page_id) => Some(page_id),
            Self::Organization | Self::Site => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: AssessmentId,
    pub year: i32,
    pub season: Season,
}

impl Assessment {
    pub fn period(&self) -> AssessmentPeriod {
        AssessmentPeriod {
            year: self.year,
            season: self.season,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub assessment_id: AssessmentId,
    pub order: u32,
    #[serde(default)]
    pub is_confirmation_page: bool,
    #[serde(default)]
    pub is_profile_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub scope: QuestionScope,
    pub text: String,
    pub subtext: Option<String>,
    pub required: bool,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub order: u32,
    pub allows_additional_input: bool,
    pub parent_question_id: Option<QuestionId>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAssessment {
    pub id: SiteAssessmentId,
    pub site_id: SiteId,
    pub assessment_id: AssessmentId,
    pub created_at: DateTime<Utc>,
    pub confirmed: bool,
}

/// A site's copy of a template page. Title, order and the confirmation flag are frozen
/// at materialization so later template edits never reshape an open instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePage {
    pub id: SitePageId,
    pub site_assessment_id: SiteAssessmentId,
    pub page_id: PageId,
    pub order: u32,
    pub required: bool,
    pub progress: PageProgress,
    pub is_confirmation_page: bool,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: ResponseId,
    pub site_page_id: SitePageId,
    pub question_id: QuestionId,
    pub value: Value,
}

/// Owner of a profile-style response collected once per organization or site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileTarget {
    Organization(OrganizationId),
    Site(SiteId),
}

impl ProfileTarget {
    pub fn scope(self) -> QuestionScope {
        match self {
            Self::Organization(_) => QuestionScope::Organization,
            Self::Site(_) => QuestionScope::Site,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Organization(_) => "organization",
            Self::Site(_) => "site",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResponse {
    pub id: ResponseId,
    pub target: ProfileTarget,
    pub question_id: QuestionId,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub people_served: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_splits_the_year_at_july() {
        let june = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
        let july = NaiveDate::from_ymd_opt(2025, 7, 1).expect("valid date");
        assert_eq!(Season::for_date(june), Season::Spring);
        assert_eq!(Season::for_date(july), Season::Fall);
        assert_eq!(
            AssessmentPeriod::current(july),
            AssessmentPeriod {
                year: 2025,
                season: Season::Fall
            }
        );
    }

    #[test]
    fn question_type_accepts_legacy_spellings() {
        let parsed: QuestionType =
            serde_json::from_str("\"Short Answer\"").expect("legacy short answer");
        assert_eq!(parsed, QuestionType::ShortAnswer);
        let parsed: QuestionType =
            serde_json::from_str("\"MultiselectWithOther\"").expect("legacy multiselect");
        assert!(parsed.expects_list());
        assert!(!QuestionType::Numeric.expects_list());
    }
}
