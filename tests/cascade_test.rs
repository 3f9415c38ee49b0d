// ABOUTME: Integration tests for admin deletion cascades and counter reconciliation
// ABOUTME: Deleting trainees, trainers, owners and gym listings leaves no dangling state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use chrono::{Duration, Utc};
use common::{create_test_user, GymFixture};
use gymhub_server::errors::ErrorCode;
use gymhub_server::models::{
    AssignmentStatus, GymStatus, ListingStatus, ListingSubscription, MarketplaceOrder,
    MembershipStatus, OrderStatus, PlanCategory, ProgressRecord, User, UserRole,
};
use uuid::Uuid;

async fn admin(fixture: &GymFixture) -> User {
    create_test_user(fixture.database(), UserRole::Admin)
        .await
        .unwrap()
}

fn order(buyer_id: Uuid, seller_id: Uuid, status: OrderStatus) -> MarketplaceOrder {
    MarketplaceOrder {
        id: Uuid::new_v4(),
        buyer_id,
        seller_id,
        total: 2_500,
        status,
        created_at: Utc::now(),
    }
}

fn progress(trainer_id: Uuid, trainee_id: Uuid, gym_id: Uuid) -> ProgressRecord {
    ProgressRecord {
        id: Uuid::new_v4(),
        trainer_id,
        trainee_id,
        gym_id,
        notes: "Deadlift 120kg x5".to_owned(),
        recorded_at: Utc::now(),
    }
}

fn listing(gym_id: Uuid, owner_id: Uuid) -> ListingSubscription {
    ListingSubscription {
        id: Uuid::new_v4(),
        gym_id,
        owner_id,
        plan: "featured".to_owned(),
        status: ListingStatus::Active,
        expires_at: Utc::now() + Duration::days(30),
    }
}

#[tokio::test]
async fn test_delete_user_requires_admin() {
    let fixture = GymFixture::new(999).await.unwrap();
    let trainee = create_test_user(fixture.database(), UserRole::Trainee)
        .await
        .unwrap();
    let cascade = &fixture.resources.cascade;

    let err = cascade
        .delete_user(fixture.owner_principal(), trainee.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let admin = admin(&fixture).await;
    let err = cascade
        .delete_user(admin.principal(), admin.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let other_admin = create_test_user(fixture.database(), UserRole::Admin)
        .await
        .unwrap();
    let err = cascade
        .delete_user(admin.principal(), other_admin.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let err = cascade
        .delete_user(admin.principal(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    assert!(fixture
        .database()
        .get_user(trainee.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_delete_trainee_cancels_memberships_and_orders() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, _) = fixture.approved_trainer().await.unwrap();
    let (trainee, joined) = fixture.paying_trainee(trainer.id).await.unwrap();
    let seller = create_test_user(fixture.database(), UserRole::Seller)
        .await
        .unwrap();
    let open_order = order(trainee.id, seller.id, OrderStatus::Paid);
    let delivered = order(trainee.id, seller.id, OrderStatus::Delivered);
    fixture.database().create_order(&open_order).await.unwrap();
    fixture.database().create_order(&delivered).await.unwrap();
    let admin = admin(&fixture).await;

    let report = fixture
        .resources
        .cascade
        .delete_user(admin.principal(), trainee.id)
        .await
        .unwrap();
    assert_eq!(report.root_id, trainee.id);
    assert_eq!(report.memberships_cancelled, 1);
    assert_eq!(report.orders_cancelled, 1);

    assert!(fixture
        .database()
        .get_user(trainee.id)
        .await
        .unwrap()
        .is_none());
    let membership = fixture
        .database()
        .get_membership(joined.membership().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.status, MembershipStatus::Cancelled);

    let open_order = fixture
        .database()
        .get_order(open_order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open_order.status, OrderStatus::Cancelled);
    let delivered = fixture
        .database()
        .get_order(delivered.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    assert_eq!(fixture.reload_gym().await.unwrap().analytics.memberships, 0);
    let trainer = fixture.reload_user(trainer.id).await.unwrap();
    assert_eq!(trainer.metrics.active_trainees, 0);
    assert_eq!(trainer.metrics.total_earnings, 500);

    let assignment = fixture
        .database()
        .get_assignment_for(trainer.id, fixture.gym.id)
        .await
        .unwrap()
        .unwrap();
    assert!(assignment.trainees.is_empty());
    assert_eq!(assignment.status, AssignmentStatus::Active);

    let ledger = fixture
        .database()
        .list_revenue_for_gym(fixture.gym.id)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 2);
}

#[tokio::test]
async fn test_delete_trainer_releases_trainees() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    let (trainee, joined) = fixture.paying_trainee(trainer.id).await.unwrap();
    fixture
        .database()
        .create_progress_record(&progress(trainer.id, trainee.id, fixture.gym.id))
        .await
        .unwrap();
    let admin = admin(&fixture).await;

    let report = fixture
        .resources
        .cascade
        .delete_user(admin.principal(), trainer.id)
        .await
        .unwrap();
    assert_eq!(report.memberships_cancelled, 2);
    assert_eq!(report.assignments_ended, 1);
    assert_eq!(report.progress_records_deleted, 1);

    let assignment = fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Inactive);
    assert!(assignment.trainees.is_empty());

    let served = fixture
        .database()
        .get_membership(joined.membership().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(served.status, MembershipStatus::Cancelled);

    let gym = fixture.reload_gym().await.unwrap();
    assert_eq!(gym.analytics.trainers, 0);
    assert_eq!(gym.analytics.memberships, 0);
    assert!(gym.trainers.is_empty());

    let trainee = fixture.reload_user(trainee.id).await.unwrap();
    assert_eq!(trainee.metrics.active_memberships, 0);
    assert!(fixture
        .database()
        .list_progress_for_trainer(trainer.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_owner_suspends_gyms_and_purges_revenue() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    let (trainee, joined) = fixture.paying_trainee(trainer.id).await.unwrap();
    let (second, _) = fixture.paying_trainee(trainer.id).await.unwrap();
    fixture
        .database()
        .create_listing(&listing(fixture.gym.id, fixture.owner.id))
        .await
        .unwrap();
    fixture
        .database()
        .create_progress_record(&progress(trainer.id, trainee.id, fixture.gym.id))
        .await
        .unwrap();
    let admin = admin(&fixture).await;

    let report = fixture
        .resources
        .cascade
        .delete_user(admin.principal(), fixture.owner.id)
        .await
        .unwrap();
    assert_eq!(report.gyms_affected, 1);
    assert_eq!(report.listings_closed, 1);
    assert_eq!(report.revenue_events_purged, 4);
    assert_eq!(report.progress_records_deleted, 1);
    assert_eq!(report.assignments_ended, 1);
    assert_eq!(report.memberships_cancelled, 3);

    assert!(fixture
        .database()
        .get_user(fixture.owner.id)
        .await
        .unwrap()
        .is_none());

    let gym = fixture.reload_gym().await.unwrap();
    assert_eq!(gym.status, GymStatus::Suspended);
    assert!(!gym.is_published);
    assert_eq!(gym.analytics.memberships, 0);
    assert_eq!(gym.analytics.trainers, 0);
    assert!(gym.trainers.is_empty());

    assert!(fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .is_none());
    let served = fixture
        .database()
        .get_membership(joined.membership().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(served.status, MembershipStatus::Cancelled);

    let listings = fixture
        .database()
        .list_listings_for_gym(fixture.gym.id)
        .await
        .unwrap();
    assert_eq!(listings[0].status, ListingStatus::Cancelled);
    assert!(fixture
        .database()
        .list_revenue_for_gym(fixture.gym.id)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        fixture
            .database()
            .count_progress_for_gym(fixture.gym.id)
            .await
            .unwrap(),
        0
    );

    assert!(fixture
        .database()
        .list_memberships_for_gym(fixture.gym.id)
        .await
        .unwrap()
        .iter()
        .all(|m| m.status == MembershipStatus::Cancelled));

    let trainer = fixture.reload_user(trainer.id).await.unwrap();
    assert_eq!(trainer.metrics.active_trainees, 0);
    for trainee_id in [trainee.id, second.id] {
        let trainee = fixture.reload_user(trainee_id).await.unwrap();
        assert_eq!(trainee.metrics.active_memberships, 0);
    }
}

#[tokio::test]
async fn test_failed_owner_deletion_keeps_everything() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    fixture.paying_trainee(trainer.id).await.unwrap();
    fixture.paying_trainee(trainer.id).await.unwrap();
    let admin = admin(&fixture).await;

    // The user row is deleted last, after every other step has run
    sqlx::query(
        r"
        CREATE TRIGGER block_user_delete BEFORE DELETE ON users
        BEGIN
            SELECT RAISE(ABORT, 'user deletion blocked');
        END
        ",
    )
    .execute(fixture.database().pool())
    .await
    .unwrap();

    let err = fixture
        .resources
        .cascade
        .delete_user(admin.principal(), fixture.owner.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);

    assert!(fixture
        .database()
        .get_user(fixture.owner.id)
        .await
        .unwrap()
        .is_some());
    let gym = fixture.reload_gym().await.unwrap();
    assert_eq!(gym.status, GymStatus::Active);
    assert!(gym.is_published);
    assert_eq!(gym.analytics.memberships, 2);
    assert_eq!(gym.analytics.trainers, 1);

    let assignment = fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Active);
    assert_eq!(assignment.counted_trainees(), 2);

    let memberships = fixture
        .database()
        .list_memberships_for_gym(fixture.gym.id)
        .await
        .unwrap();
    let active = memberships
        .iter()
        .filter(|m| m.status == MembershipStatus::Active && m.category() == PlanCategory::Ordinary)
        .count();
    assert_eq!(active, 2);
    assert_eq!(
        fixture
            .database()
            .list_revenue_for_gym(fixture.gym.id)
            .await
            .unwrap()
            .len(),
        4
    );
}

#[tokio::test]
async fn test_owner_deletion_skips_removed_trainers() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (_, live) = fixture.approved_trainer().await.unwrap();
    let (_, removed) = fixture.approved_trainer().await.unwrap();
    fixture
        .resources
        .assignments
        .remove(fixture.owner_principal(), removed.id)
        .await
        .unwrap();
    let admin = admin(&fixture).await;

    let report = fixture
        .resources
        .cascade
        .delete_user(admin.principal(), fixture.owner.id)
        .await
        .unwrap();
    assert_eq!(report.assignments_ended, 1);
    assert_eq!(report.memberships_cancelled, 1);

    for id in [live.id, removed.id] {
        assert!(fixture.database().get_assignment(id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_delete_gym_listing_removes_gym() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, assignment) = fixture.approved_trainer().await.unwrap();
    let (trainee, joined) = fixture.paying_trainee(trainer.id).await.unwrap();
    fixture
        .database()
        .create_listing(&listing(fixture.gym.id, fixture.owner.id))
        .await
        .unwrap();
    let admin = admin(&fixture).await;
    let cascade = &fixture.resources.cascade;

    let err = cascade
        .delete_gym_listing(fixture.owner_principal(), fixture.gym.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let report = cascade
        .delete_gym_listing(admin.principal(), fixture.gym.id)
        .await
        .unwrap();
    assert_eq!(report.root_id, fixture.gym.id);
    assert_eq!(report.gyms_affected, 1);
    assert_eq!(report.listings_closed, 1);
    assert_eq!(report.revenue_events_purged, 2);

    assert!(fixture
        .database()
        .get_gym(fixture.gym.id)
        .await
        .unwrap()
        .is_none());
    assert!(fixture
        .database()
        .get_assignment(assignment.id)
        .await
        .unwrap()
        .is_none());
    assert!(fixture
        .database()
        .list_listings_for_gym(fixture.gym.id)
        .await
        .unwrap()
        .is_empty());
    let served = fixture
        .database()
        .get_membership(joined.membership().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(served.status, MembershipStatus::Cancelled);

    let trainee = fixture.reload_user(trainee.id).await.unwrap();
    assert_eq!(trainee.metrics.active_memberships, 0);
    let trainer = fixture.reload_user(trainer.id).await.unwrap();
    assert_eq!(trainer.metrics.active_trainees, 0);
    assert!(fixture
        .database()
        .get_user(fixture.owner.id)
        .await
        .unwrap()
        .is_some());

    let err = cascade
        .delete_gym_listing(admin.principal(), fixture.gym.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_reconcile_repairs_drifted_counters() {
    let fixture = GymFixture::new(999).await.unwrap();
    let (trainer, _) = fixture.approved_trainer().await.unwrap();
    fixture.paying_trainee(trainer.id).await.unwrap();
    fixture.paying_trainee(trainer.id).await.unwrap();
    sqlx::query(
        "UPDATE gyms SET analytics_memberships = 17, analytics_trainers = 0 WHERE id = $1",
    )
    .bind(fixture.gym.id.to_string())
    .execute(fixture.database().pool())
    .await
    .unwrap();
    let admin = admin(&fixture).await;

    let err = fixture
        .resources
        .cascade
        .reconcile_gym(fixture.owner_principal(), fixture.gym.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let analytics = fixture
        .resources
        .cascade
        .reconcile_gym(admin.principal(), fixture.gym.id)
        .await
        .unwrap();
    assert_eq!(analytics.memberships, 2);
    assert_eq!(analytics.trainers, 1);
    assert_eq!(fixture.reload_gym().await.unwrap().analytics, analytics);
}
