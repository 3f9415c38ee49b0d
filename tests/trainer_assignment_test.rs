// ABOUTME: Integration tests for owner decisions on trainer access requests
// ABOUTME: Approve, decline and remove, including the teardown of served memberships
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{create_test_user, trainer_request, GymFixture};
use gymhub_server::errors::ErrorCode;
use gymhub_server::models::{
    AssignmentStatus, MembershipPlan, MembershipStatus, PlanCategory, UserRole,
};
use gymhub_server::services::JoinOutcome;

#[tokio::test]
async fn test_approve_activates_assignment_and_access() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();

    assert_eq!(assignment.status, AssignmentStatus::Active);
    assert!(assignment.approved_at.is_some());

    let gym = fixture.reload_gym().await.unwrap();
    assert_eq!(gym.analytics.trainers, 1);
    assert_eq!(gym.trainers, vec![trainer.id]);

    let access: Vec<_> = fixture
        .database()
        .list_memberships_for_trainee(trainer.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.plan == MembershipPlan::TrainerAccess)
        .collect();
    assert_eq!(access.len(), 1);
    assert_eq!(access[0].status, MembershipStatus::Active);
    assert_eq!(access[0].category(), PlanCategory::TrainerAccess);

    let again = fixture
        .resources
        .assignments
        .approve(fixture.owner_principal(), assignment.id)
        .await
        .unwrap();
    assert_eq!(again.status, AssignmentStatus::Active);
    assert_eq!(fixture.reload_gym().await.unwrap().analytics.trainers, 1);
}

#[tokio::test]
async fn test_only_owner_can_decide() {
    let fixture = GymFixture::new(999).await.unwrap();
    let trainer = create_test_user(fixture.database(), UserRole::Trainer)
        .await
        .unwrap();
    let outcome = fixture
        .resources
        .memberships
        .join_gym(trainer.principal(), fixture.gym.id, trainer_request())
        .await
        .unwrap();
    let JoinOutcome::AccessRequested { assignment, .. } = outcome else {
        panic!("expected an access request");
    };

    let other_owner = create_test_user(fixture.database(), UserRole::GymOwner)
        .await
        .unwrap();
    for result in [
        fixture
            .resources
            .assignments
            .approve(other_owner.principal(), assignment.id)
            .await
            .map(|_| ()),
        fixture
            .resources
            .assignments
            .decline(trainer.principal(), assignment.id)
            .await,
    ] {
        assert_eq!(result.unwrap_err().code, ErrorCode::PermissionDenied);
    }

    let stored = fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AssignmentStatus::Pending);
}

#[tokio::test]
async fn test_decline_deletes_request_and_cancels_access() {
    let fixture = GymFixture::new(999).await.unwrap();
    let trainer = create_test_user(fixture.database(), UserRole::Trainer)
        .await
        .unwrap();
    let outcome = fixture
        .resources
        .memberships
        .join_gym(trainer.principal(), fixture.gym.id, trainer_request())
        .await
        .unwrap();
    let JoinOutcome::AccessRequested {
        membership,
        assignment,
    } = outcome
    else {
        panic!("expected an access request");
    };

    fixture
        .resources
        .assignments
        .decline(fixture.owner_principal(), assignment.id)
        .await
        .unwrap();

    assert!(fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .is_none());
    let access = fixture
        .database()
        .get_membership(membership.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(access.status, MembershipStatus::Cancelled);
    assert_eq!(fixture.reload_gym().await.unwrap().analytics.trainers, 0);

    let retry = fixture
        .resources
        .memberships
        .join_gym(trainer.principal(), fixture.gym.id, trainer_request())
        .await
        .unwrap();
    assert!(matches!(retry, JoinOutcome::AccessRequested { .. }));
}

#[tokio::test]
async fn test_decline_rejects_active_assignment() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (_, assignment) = fixture.approved_trainer().await.unwrap();

    let err = fixture
        .resources
        .assignments
        .decline(fixture.owner_principal(), assignment.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStateTransition);
}

#[tokio::test]
async fn test_remove_ends_served_memberships() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    let (first, first_join) = fixture.paying_trainee(trainer.id).await.unwrap();
    let (second, _) = fixture.paying_trainee(trainer.id).await.unwrap();
    assert_eq!(fixture.reload_gym().await.unwrap().analytics.memberships, 2);
    let serving = fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serving.counted_trainees(), 2);
    assert_eq!(
        fixture.reload_user(trainer.id).await.unwrap().metrics.active_trainees,
        2
    );

    let removed = fixture
        .resources
        .assignments
        .remove(fixture.owner_principal(), assignment.id)
        .await
        .unwrap();
    assert_eq!(removed.status, AssignmentStatus::Inactive);
    assert!(removed.approved_at.is_some());
    assert!(removed.trainees.is_empty());

    let gym = fixture.reload_gym().await.unwrap();
    assert_eq!(gym.analytics.trainers, 0);
    assert_eq!(gym.analytics.memberships, 0);
    assert!(gym.trainers.is_empty());

    let served = fixture
        .database()
        .get_membership(first_join.membership().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(served.status, MembershipStatus::Cancelled);
    for trainee_id in [first.id, second.id] {
        let trainee = fixture.reload_user(trainee_id).await.unwrap();
        assert_eq!(trainee.metrics.active_memberships, 0);
    }

    let trainer_after = fixture.reload_user(trainer.id).await.unwrap();
    assert_eq!(trainer_after.metrics.active_trainees, 0);
    assert_eq!(trainer_after.metrics.total_earnings, 1000);

    let open_access = fixture
        .database()
        .list_memberships_for_trainee(trainer.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.status.is_open())
        .count();
    assert_eq!(open_access, 0);

    let ledger = fixture
        .database()
        .list_revenue_for_gym(fixture.gym.id)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 4);

    let again = fixture
        .resources
        .assignments
        .remove(fixture.owner_principal(), assignment.id)
        .await
        .unwrap();
    assert_eq!(again.status, AssignmentStatus::Inactive);
    assert_eq!(fixture.reload_gym().await.unwrap().analytics.trainers, 0);
}

#[tokio::test]
async fn test_remove_rejects_pending_assignment() {
    let fixture = GymFixture::new(999).await.unwrap();
    let trainer = create_test_user(fixture.database(), UserRole::Trainer)
        .await
        .unwrap();
    let outcome = fixture
        .resources
        .memberships
        .join_gym(trainer.principal(), fixture.gym.id, trainer_request())
        .await
        .unwrap();
    let JoinOutcome::AccessRequested { assignment, .. } = outcome else {
        panic!("expected an access request");
    };

    let err = fixture
        .resources
        .assignments
        .remove(fixture.owner_principal(), assignment.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    assert_eq!(err.context.details["hint"], "decline pending requests");
}

#[tokio::test]
async fn test_removed_trainer_can_request_again() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    fixture
        .resources
        .assignments
        .remove(fixture.owner_principal(), assignment.id)
        .await
        .unwrap();

    let outcome = fixture
        .resources
        .memberships
        .join_gym(trainer.principal(), fixture.gym.id, trainer_request())
        .await
        .unwrap();
    let JoinOutcome::AccessRequested {
        assignment: requested,
        ..
    } = outcome
    else {
        panic!("expected an access request");
    };
    assert_eq!(requested.id, assignment.id);
    assert_eq!(requested.status, AssignmentStatus::Pending);

    let approved = fixture
        .resources
        .assignments
        .approve(fixture.owner_principal(), requested.id)
        .await
        .unwrap();
    assert_eq!(approved.status, AssignmentStatus::Active);
    assert_eq!(fixture.reload_gym().await.unwrap().analytics.trainers, 1);
}

#[tokio::test]
async fn test_trainer_leaving_access_membership_ends_assignment() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    let (trainee, _) = fixture.paying_trainee(trainer.id).await.unwrap();
    let access = fixture
        .database()
        .list_memberships_for_trainee(trainer.id)
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.plan == MembershipPlan::TrainerAccess && m.status.is_open())
        .unwrap();

    let left = fixture
        .resources
        .memberships
        .leave_gym(trainer.principal(), access.id)
        .await
        .unwrap();
    assert!(left.changed);

    let stored = fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, AssignmentStatus::Inactive);
    let gym = fixture.reload_gym().await.unwrap();
    assert_eq!(gym.analytics.trainers, 0);
    assert_eq!(gym.analytics.memberships, 0);
    let trainee = fixture.reload_user(trainee.id).await.unwrap();
    assert_eq!(trainee.metrics.active_memberships, 0);
}

#[tokio::test]
async fn test_owner_lists_gym_assignments() {
    let fixture = GymFixture::new(999).await.unwrap();
    fixture.approved_trainer().await.unwrap();
    let pending = create_test_user(fixture.database(), UserRole::Trainer)
        .await
        .unwrap();
    fixture
        .resources
        .memberships
        .join_gym(pending.principal(), fixture.gym.id, trainer_request())
        .await
        .unwrap();

    let listed = fixture
        .resources
        .assignments
        .list_for_gym(fixture.owner_principal(), fixture.gym.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    let err = fixture
        .resources
        .assignments
        .list_for_gym(pending.principal(), fixture.gym.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let own_request = listed
        .iter()
        .find(|a| a.trainer_id == pending.id)
        .unwrap();
    let own = fixture
        .resources
        .assignments
        .get(pending.principal(), own_request.id)
        .await
        .unwrap();
    assert_eq!(own.status, AssignmentStatus::Pending);

    let other = listed.iter().find(|a| a.trainer_id != pending.id).unwrap();
    let err = fixture
        .resources
        .assignments
        .get(pending.principal(), other.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}
