use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    AssessmentId, Organization, OrganizationId, ProfileResponse, ProfileTarget, QuestionId,
    QuestionResponse, ResponseId, Site, SiteAssessment, SiteAssessmentId, SiteId, SitePage,
    SitePageId,
};
use super::instance::InstancePlan;
use super::repository::{
    AssessmentRepository, PageUpdate, ProfileChangeset, RepositoryError, SaveChangeset,
};
use super::requirements::SiteUpdate;
use super::validation::ResponseInput;

/// Process-local repository. One mutex serializes every operation, which gives the
/// uniqueness and all-or-nothing guarantees the service relies on.
#[derive(Debug, Default)]
pub struct InMemoryAssessmentRepository {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    instances: BTreeMap<SiteAssessmentId, SiteAssessment>,
    instance_keys: HashMap<(SiteId, AssessmentId), SiteAssessmentId>,
    pages: BTreeMap<SitePageId, SitePage>,
    responses: BTreeMap<(SitePageId, QuestionId), QuestionResponse>,
    sites: BTreeMap<SiteId, Site>,
    organizations: BTreeMap<OrganizationId, Organization>,
    profile_responses: BTreeMap<(ProfileTarget, QuestionId), ProfileResponse>,
}

impl MemoryState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn apply_site_update(&mut self, site_id: SiteId, update: &SiteUpdate) {
        if let Some(site) = self.sites.get_mut(&site_id) {
            if let Some(name) = &update.name {
                site.name = name.clone();
            }
            if let Some(people_served) = update.people_served {
                site.people_served = Some(people_served);
            }
        }
    }

    fn instance_pages(&self, id: SiteAssessmentId) -> Vec<SitePage> {
        let mut pages: Vec<SitePage> = self
            .pages
            .values()
            .filter(|page| page.site_assessment_id == id)
            .cloned()
            .collect();
        pages.sort_by_key(|page| (page.order, page.id));
        pages
    }

    fn upsert_response(&mut self, site_page_id: SitePageId, input: ResponseInput) {
        let key = (site_page_id, input.question_id);
        if let Some(existing) = self.responses.get_mut(&key) {
            existing.value = input.value;
            return;
        }
        let id = ResponseId(self.allocate());
        self.responses.insert(
            key,
            QuestionResponse {
                id,
                site_page_id,
                question_id: input.question_id,
                value: input.value,
            },
        );
    }

    fn upsert_profile_response(&mut self, target: ProfileTarget, input: ResponseInput) {
        let key = (target, input.question_id);
        if let Some(existing) = self.profile_responses.get_mut(&key) {
            existing.value = input.value;
            return;
        }
        let id = ResponseId(self.allocate());
        self.profile_responses.insert(
            key,
            ProfileResponse {
                id,
                target,
                question_id: input.question_id,
                value: input.value,
            },
        );
    }
}

impl InMemoryAssessmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with the given sites and organizations.
    pub fn with_directory(
        organizations: impl IntoIterator<Item = Organization>,
        sites: impl IntoIterator<Item = Site>,
    ) -> Self {
        let repository = Self::default();
        if let Ok(mut state) = repository.state.lock() {
            state.organizations.extend(
                organizations
                    .into_iter()
                    .map(|organization| (organization.id, organization)),
            );
            state
                .sites
                .extend(sites.into_iter().map(|site| (site.id, site)));
        }
        repository
    }

    pub fn insert_site(&self, site: Site) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.sites.contains_key(&site.id) {
            return Err(RepositoryError::Conflict);
        }
        state.sites.insert(site.id, site);
        Ok(())
    }

    pub fn insert_organization(&self, organization: Organization) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.organizations.contains_key(&organization.id) {
            return Err(RepositoryError::Conflict);
        }
        state.organizations.insert(organization.id, organization);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn find_instance(
        &self,
        site_id: SiteId,
        assessment_id: AssessmentId,
    ) -> Result<Option<SiteAssessment>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .instance_keys
            .get(&(site_id, assessment_id))
            .and_then(|id| state.instances.get(id))
            .cloned())
    }

    fn insert_instance(&self, plan: InstancePlan) -> Result<SiteAssessment, RepositoryError> {
        let mut state = self.lock()?;
        let key = (plan.site_id, plan.assessment_id);
        if state.instance_keys.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }

        let instance = SiteAssessment {
            id: SiteAssessmentId(state.allocate()),
            site_id: plan.site_id,
            assessment_id: plan.assessment_id,
            created_at: plan.created_at,
            confirmed: false,
        };
        for page in plan.pages {
            let id = SitePageId(state.allocate());
            state.pages.insert(
                id,
                SitePage {
                    id,
                    site_assessment_id: instance.id,
                    page_id: page.page_id,
                    order: page.order,
                    required: page.required,
                    progress: page.progress,
                    is_confirmation_page: page.is_confirmation_page,
                    title: page.title,
                },
            );
        }
        state.instance_keys.insert(key, instance.id);
        state.instances.insert(instance.id, instance.clone());
        Ok(instance)
    }

    fn instance(&self, id: SiteAssessmentId) -> Result<Option<SiteAssessment>, RepositoryError> {
        Ok(self.lock()?.instances.get(&id).cloned())
    }

    fn instances_for_site(&self, site_id: SiteId) -> Result<Vec<SiteAssessment>, RepositoryError> {
        let state = self.lock()?;
        let mut instances: Vec<SiteAssessment> = state
            .instances
            .values()
            .filter(|instance| instance.site_id == site_id)
            .cloned()
            .collect();
        instances.sort_by_key(|instance| (instance.created_at, instance.id));
        Ok(instances)
    }

    fn site_pages(&self, id: SiteAssessmentId) -> Result<Vec<SitePage>, RepositoryError> {
        Ok(self.lock()?.instance_pages(id))
    }

    fn responses(&self, site_page_id: SitePageId) -> Result<Vec<QuestionResponse>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .responses
            .values()
            .filter(|response| response.site_page_id == site_page_id)
            .cloned()
            .collect())
    }

    fn commit(
        &self,
        changeset: SaveChangeset,
        update_pages: &mut PageUpdate<'_>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;

        // Check every reference before the first write.
        let site_id = state
            .instances
            .get(&changeset.site_assessment_id)
            .map(|instance| instance.site_id)
            .ok_or(RepositoryError::NotFound)?;
        let mut pages = state.instance_pages(changeset.site_assessment_id);
        if !pages.iter().any(|page| page.id == changeset.site_page_id) {
            return Err(RepositoryError::NotFound);
        }
        let site_update = update_pages(pages.as_mut_slice());
        if site_update.is_some() && !state.sites.contains_key(&site_id) {
            return Err(RepositoryError::NotFound);
        }

        for page in pages {
            state.pages.insert(page.id, page);
        }
        for response in changeset.responses {
            state.upsert_response(changeset.site_page_id, response);
        }
        if let Some(update) = &site_update {
            state.apply_site_update(site_id, update);
        }
        if changeset.confirm_instance {
            if let Some(instance) = state.instances.get_mut(&changeset.site_assessment_id) {
                instance.confirmed = true;
            }
        }
        Ok(())
    }

    fn site(&self, id: SiteId) -> Result<Option<Site>, RepositoryError> {
        Ok(self.lock()?.sites.get(&id).cloned())
    }

    fn organization(&self, id: OrganizationId) -> Result<Option<Organization>, RepositoryError> {
        Ok(self.lock()?.organizations.get(&id).cloned())
    }

    fn profile_responses(
        &self,
        target: ProfileTarget,
    ) -> Result<Vec<ProfileResponse>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .profile_responses
            .values()
            .filter(|response| response.target == target)
            .cloned()
            .collect())
    }

    fn commit_profile(&self, changeset: ProfileChangeset) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;

        let target_exists = match changeset.target {
            ProfileTarget::Organization(id) => state.organizations.contains_key(&id),
            ProfileTarget::Site(id) => state.sites.contains_key(&id),
        };
        let site_exists = changeset
            .site_update
            .as_ref()
            .map_or(true, |(id, _)| state.sites.contains_key(id));
        let organization_exists = changeset
            .organization_name
            .as_ref()
            .map_or(true, |(id, _)| state.organizations.contains_key(id));
        if !(target_exists && site_exists && organization_exists) {
            return Err(RepositoryError::NotFound);
        }

        for response in changeset.responses {
            state.upsert_profile_response(changeset.target, response);
        }
        if let Some((site_id, update)) = &changeset.site_update {
            state.apply_site_update(*site_id, update);
        }
        if let Some((organization_id, name)) = changeset.organization_name {
            if let Some(organization) = state.organizations.get_mut(&organization_id) {
                organization.name = name;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::PageId;
    use crate::workflows::assessment::instance::SitePagePlan;
    use crate::workflows::assessment::progress::PageProgress;
    use chrono::Utc;
    use serde_json::json;

    fn plan(site: u64) -> InstancePlan {
        InstancePlan {
            site_id: SiteId(site),
            assessment_id: AssessmentId(1),
            created_at: Utc::now(),
            pages: vec![
                SitePagePlan {
                    page_id: PageId(2),
                    order: 2,
                    title: "Clothing".to_string(),
                    is_confirmation_page: false,
                    required: false,
                    progress: PageProgress::Locked,
                },
                SitePagePlan {
                    page_id: PageId(1),
                    order: 1,
                    title: "Demographics".to_string(),
                    is_confirmation_page: false,
                    required: true,
                    progress: PageProgress::UnstartedRequired,
                },
            ],
        }
    }

    #[test]
    fn duplicate_instances_conflict() {
        let repository = InMemoryAssessmentRepository::new();
        let first = repository.insert_instance(plan(1)).expect("first insert");

        assert!(matches!(
            repository.insert_instance(plan(1)),
            Err(RepositoryError::Conflict)
        ));
        let found = repository
            .find_instance(SiteId(1), AssessmentId(1))
            .expect("lookup succeeds")
            .expect("instance present");
        assert_eq!(found.id, first.id);
        assert_eq!(repository.site_pages(first.id).expect("pages").len(), 2);
    }

    #[test]
    fn site_pages_come_back_in_template_order() {
        let repository = InMemoryAssessmentRepository::new();
        let instance = repository.insert_instance(plan(1)).expect("insert");
        let titles: Vec<String> = repository
            .site_pages(instance.id)
            .expect("pages")
            .into_iter()
            .map(|page| page.title)
            .collect();
        assert_eq!(titles, vec!["Demographics", "Clothing"]);
    }

    #[test]
    fn commit_upserts_responses_by_question() {
        let repository = InMemoryAssessmentRepository::new();
        let instance = repository.insert_instance(plan(1)).expect("insert");
        let page = repository.site_pages(instance.id).expect("pages")[0].clone();

        for value in [json!("first"), json!("second")] {
            repository
                .commit(
                    SaveChangeset {
                        site_assessment_id: instance.id,
                        site_page_id: page.id,
                        responses: vec![ResponseInput::new(QuestionId(5), value)],
                        confirm_instance: false,
                    },
                    &mut |_: &mut [SitePage]| None,
                )
                .expect("commit succeeds");
        }

        let responses = repository.responses(page.id).expect("responses");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].value, json!("second"));
    }

    #[test]
    fn commit_writes_nothing_when_a_reference_is_missing() {
        let repository = InMemoryAssessmentRepository::new();
        let instance = repository.insert_instance(plan(1)).expect("insert");
        let page = repository.site_pages(instance.id).expect("pages")[0].clone();

        // The instance's site was never added to the directory.
        let result = repository.commit(
            SaveChangeset {
                site_assessment_id: instance.id,
                site_page_id: page.id,
                responses: vec![ResponseInput::new(QuestionId(5), "kept out")],
                confirm_instance: true,
            },
            &mut |pages: &mut [SitePage]| {
                pages[0].progress = PageProgress::Complete;
                Some(SiteUpdate::default())
            },
        );

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert!(repository.responses(page.id).expect("responses").is_empty());
        let stored = repository.site_pages(instance.id).expect("pages");
        assert_eq!(stored[0].progress, PageProgress::UnstartedRequired);
        let instance = repository
            .instance(instance.id)
            .expect("lookup")
            .expect("present");
        assert!(!instance.confirmed);
    }

    #[test]
    fn page_updates_see_rows_written_by_earlier_commits() {
        let repository = InMemoryAssessmentRepository::new();
        let instance = repository.insert_instance(plan(1)).expect("insert");
        let stale = repository.site_pages(instance.id).expect("pages");
        let save = |site_page_id| SaveChangeset {
            site_assessment_id: instance.id,
            site_page_id,
            responses: Vec::new(),
            confirm_instance: false,
        };

        repository
            .commit(save(stale[1].id), &mut |pages: &mut [SitePage]| {
                pages[1].required = true;
                None
            })
            .expect("first commit");
        let mut seen = Vec::new();
        repository
            .commit(save(stale[0].id), &mut |pages: &mut [SitePage]| {
                seen = pages.to_vec();
                pages[0].progress = PageProgress::Complete;
                None
            })
            .expect("second commit");

        assert!(!stale[1].required);
        assert!(seen[1].required);
        let stored = repository.site_pages(instance.id).expect("pages");
        assert_eq!(stored[0].progress, PageProgress::Complete);
        assert!(stored[1].required);
    }

    #[test]
    fn commit_rejects_pages_of_other_instances() {
        let repository = InMemoryAssessmentRepository::new();
        let first = repository.insert_instance(plan(1)).expect("insert");
        let second = repository.insert_instance(plan(2)).expect("insert");
        let foreign = repository.site_pages(second.id).expect("pages")[0].id;
        let mut called = false;

        let result = repository.commit(
            SaveChangeset {
                site_assessment_id: first.id,
                site_page_id: foreign,
                responses: vec![ResponseInput::new(QuestionId(5), "misrouted")],
                confirm_instance: false,
            },
            &mut |_: &mut [SitePage]| {
                called = true;
                None
            },
        );

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert!(!called);
        assert!(repository.responses(foreign).expect("responses").is_empty());
    }

    #[test]
    fn profile_commit_updates_directory_entries() {
        let repository = InMemoryAssessmentRepository::with_directory(
            [Organization {
                id: OrganizationId(1),
                name: "Old".to_string(),
            }],
            [Site {
                id: SiteId(2),
                name: "Old Site".to_string(),
                organization_id: Some(OrganizationId(1)),
                people_served: None,
            }],
        );

        repository
            .commit_profile(ProfileChangeset {
                target: ProfileTarget::Site(SiteId(2)),
                responses: vec![ResponseInput::new(QuestionId(9), "Riverside")],
                site_update: Some((
                    SiteId(2),
                    SiteUpdate {
                        name: Some("Riverside".to_string()),
                        people_served: Some(75),
                    },
                )),
                organization_name: None,
            })
            .expect("profile commit");

        let site = repository.site(SiteId(2)).expect("lookup").expect("present");
        assert_eq!(site.name, "Riverside");
        assert_eq!(site.people_served, Some(75));
        assert_eq!(
            repository
                .profile_responses(ProfileTarget::Site(SiteId(2)))
                .expect("responses")
                .len(),
            1
        );
        assert!(repository
            .profile_responses(ProfileTarget::Organization(OrganizationId(1)))
            .expect("responses")
            .is_empty());
    }
}
