use super::common::*;
use serde_json::json;

use crate::workflows::assessment::domain::{OrganizationId, ProfileTarget, QuestionId};
use crate::workflows::assessment::repository::AssessmentRepository;
use crate::workflows::assessment::{ResponseInput, ValidationErrorKind, WorkflowError};

#[test]
fn site_profile_writes_through_to_the_site() {
    let (service, repository) = build_service();
    let target = ProfileTarget::Site(demo_site());

    let outcome = service
        .save_profile(
            target,
            vec![
                ResponseInput::new(QuestionId(PROFILE_SITE_NAME), "Eastside Shelter"),
                ResponseInput::new(QuestionId(PROFILE_PEOPLE_SERVED), "64"),
            ],
        )
        .expect("profile saves");
    assert_eq!(outcome.saved, 2);

    let site = repository
        .site(demo_site())
        .expect("lookup")
        .expect("site present");
    assert_eq!(site.name, "Eastside Shelter");
    assert_eq!(site.people_served, Some(64));

    let page = service.profile_page(target).expect("profile page");
    assert_eq!(page.target, "site");
    assert_eq!(page.name, "Eastside Shelter");
    assert_eq!(page.questions.len(), 2);
    assert_eq!(page.responses.len(), 2);
    let stored = page
        .responses
        .iter()
        .find(|response| response.question_id == QuestionId(PROFILE_PEOPLE_SERVED))
        .expect("people served stored");
    assert_eq!(stored.value, json!(64));
}

#[test]
fn organization_profile_renames_the_organization() {
    let (service, repository) = build_service();
    let target = ProfileTarget::Organization(demo_organization());

    service
        .save_profile(
            target,
            vec![ResponseInput::new(
                QuestionId(ORGANIZATION_NAME),
                "Harbor Relief Network",
            )],
        )
        .expect("profile saves");

    let organization = repository
        .organization(demo_organization())
        .expect("lookup")
        .expect("organization present");
    assert_eq!(organization.name, "Harbor Relief Network");
}

#[test]
fn profile_saves_resave_the_same_answer() {
    let (service, _) = build_service();
    let target = ProfileTarget::Organization(demo_organization());

    for name in ["First Name", "Second Name"] {
        service
            .save_profile(
                target,
                vec![ResponseInput::new(QuestionId(ORGANIZATION_NAME), name)],
            )
            .expect("profile saves");
    }

    let page = service.profile_page(target).expect("profile page");
    assert_eq!(page.responses.len(), 1);
    assert_eq!(page.responses[0].value, json!("Second Name"));
}

#[test]
fn profile_questions_are_scoped() {
    let (service, _) = build_service();

    let error = service
        .save_profile(
            ProfileTarget::Organization(demo_organization()),
            vec![ResponseInput::new(QuestionId(PROFILE_SITE_NAME), "Wrong scope")],
        )
        .expect_err("site question on organization profile");
    let WorkflowError::ValidationFailed(errors) = error else {
        panic!("expected validation failure");
    };
    assert_eq!(errors[0].kind, ValidationErrorKind::UnknownQuestion);

    let error = service
        .save_profile(
            ProfileTarget::Site(demo_site()),
            vec![ResponseInput::new(QuestionId(PROFILE_PEOPLE_SERVED), "many")],
        )
        .expect_err("non-numeric count");
    let WorkflowError::ValidationFailed(errors) = error else {
        panic!("expected validation failure");
    };
    assert_eq!(errors[0].kind, ValidationErrorKind::InvalidNumeric);
}

#[test]
fn unknown_profile_targets_are_not_found() {
    let (service, _) = build_service();
    let target = ProfileTarget::Organization(OrganizationId(77));

    assert!(matches!(
        service.profile_page(target),
        Err(WorkflowError::NotFound {
            entity: "organization",
            id: 77
        })
    ));
    assert!(matches!(
        service.save_profile(target, Vec::new()),
        Err(WorkflowError::NotFound { .. })
    ));
}
