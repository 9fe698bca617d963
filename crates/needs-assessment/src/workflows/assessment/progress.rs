use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::domain::{SitePage, SitePageId};

/// Workflow state of a single site page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageProgress {
    Locked,
    UnstartedRequired,
    UnstartedOptional,
    StartedRequired,
    StartedOptional,
    Complete,
}

impl PageProgress {
    /// State assigned at materialization.
    pub const fn initial(always_required: bool) -> Self {
        if always_required {
            Self::UnstartedRequired
        } else {
            Self::Locked
        }
    }

    /// State a locked page moves to once the always-required pages are complete.
    pub const fn unlocked(required: bool, is_confirmation_page: bool) -> Self {
        if required || is_confirmation_page {
            Self::UnstartedRequired
        } else {
            Self::UnstartedOptional
        }
    }

    pub const fn started(required: bool) -> Self {
        if required {
            Self::StartedRequired
        } else {
            Self::StartedOptional
        }
    }

    /// Transition applied by a save. Confirming always lands on `Complete`; a draft save
    /// moves the page to its started state, except that a completed page stays complete.
    pub const fn after_save(self, required: bool, confirmed: bool) -> Self {
        if confirmed {
            return Self::Complete;
        }
        match self {
            Self::Complete => Self::Complete,
            _ => Self::started(required),
        }
    }

    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::UnstartedRequired => "UNSTARTEDREQUIRED",
            Self::UnstartedOptional => "UNSTARTEDOPTIONAL",
            Self::StartedRequired => "STARTEDREQUIRED",
            Self::StartedOptional => "STARTEDOPTIONAL",
            Self::Complete => "COMPLETE",
        }
    }
}

/// Page titles that are required in every instance and gate the unlock of everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPages {
    titles: BTreeSet<String>,
}

impl RequiredPages {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            titles: titles
                .into_iter()
                .map(Into::into)
                .map(|title: String| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(["Basic Info", "Demographics"])
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.titles.iter().map(String::as_str)
    }
}

impl Default for RequiredPages {
    fn default() -> Self {
        Self::standard()
    }
}

/// Unlock every locked page once all always-required pages are complete.
///
/// Runs over the full page set of one instance and returns the ids it moved. Only
/// `Locked` pages are touched, so re-running the scan is a no-op.
pub fn unlock_remaining(pages: &mut [SitePage], required: &RequiredPages) -> Vec<SitePageId> {
    let ready = pages
        .iter()
        .filter(|page| required.contains(&page.title))
        .all(|page| page.progress.is_complete());
    if !ready {
        return Vec::new();
    }

    pages
        .iter_mut()
        .filter(|page| page.progress.is_locked())
        .map(|page| {
            page.progress = PageProgress::unlocked(page.required, page.is_confirmation_page);
            page.id
        })
        .collect()
}
