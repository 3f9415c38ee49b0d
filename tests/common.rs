// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory databases, seeded users and gyms, and approved trainers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `gymhub_server`

use std::env;
use std::sync::{Arc, Once};

use anyhow::Result;
use gymhub_server::{
    config::{MembershipConfig, ServerConfig},
    database::Database,
    models::{
        Gym, GymPricing, GymStatus, JoinRequest, Principal, TrainerAssignment, User, UserRole,
    },
    resources::ServerResources,
    services::JoinOutcome,
};
use tracing::Level;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory test database
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:", 1).await?)
}

/// Test resources over a fresh database with default policies
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    create_test_resources_with(MembershipConfig::default()).await
}

/// Test resources over a fresh database with custom policies
pub async fn create_test_resources_with(
    membership: MembershipConfig,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    let config = ServerConfig {
        membership,
        ..ServerConfig::default()
    };
    Ok(Arc::new(ServerResources::new(database, Arc::new(config))))
}

/// Create and store a user with the given role
pub async fn create_test_user(database: &Database, role: UserRole) -> Result<User> {
    let id = Uuid::new_v4();
    let mut user = User::new(
        format!("{}_{id}@example.com", role.as_str()),
        Some(format!("Test {role}")),
        role,
    );
    user.id = id;
    database.create_user(&user).await?;
    Ok(user)
}

/// Create an active, published gym with the given discounted monthly fee
pub async fn create_test_gym(database: &Database, owner_id: Uuid, fee: i64) -> Result<Gym> {
    let mut gym = Gym::new(
        owner_id,
        "Iron Temple".to_owned(),
        GymPricing {
            mrp: Some(fee + 500),
            discounted: Some(fee),
            ..GymPricing::default()
        },
    );
    gym.status = GymStatus::Active;
    gym.is_published = true;
    database.create_gym(&gym).await?;
    Ok(gym)
}

/// A gym with an owner, ready for trainers and trainees
pub struct GymFixture {
    pub resources: Arc<ServerResources>,
    pub owner: User,
    pub gym: Gym,
}

impl GymFixture {
    /// Seed an owner and a gym charging `fee`
    pub async fn new(fee: i64) -> Result<Self> {
        Self::with_resources(create_test_resources().await?, fee).await
    }

    /// Seed an owner and a gym into existing resources
    pub async fn with_resources(resources: Arc<ServerResources>, fee: i64) -> Result<Self> {
        let owner = create_test_user(&resources.database, UserRole::GymOwner).await?;
        let gym = create_test_gym(&resources.database, owner.id, fee).await?;
        Ok(Self {
            resources,
            owner,
            gym,
        })
    }

    pub fn database(&self) -> &Database {
        &self.resources.database
    }

    pub const fn owner_principal(&self) -> Principal {
        self.owner.principal()
    }

    /// A trainer who requested access and was approved by the owner
    pub async fn approved_trainer(&self) -> Result<(User, TrainerAssignment)> {
        let trainer = create_test_user(self.database(), UserRole::Trainer).await?;
        let outcome = self
            .resources
            .memberships
            .join_gym(trainer.principal(), self.gym.id, trainer_request())
            .await?;
        let JoinOutcome::AccessRequested { assignment, .. } = outcome else {
            anyhow::bail!("trainer join did not request access");
        };
        let assignment = self
            .resources
            .assignments
            .approve(self.owner_principal(), assignment.id)
            .await?;
        Ok((trainer, assignment))
    }

    /// A trainee with an active membership served by `trainer_id`
    pub async fn paying_trainee(&self, trainer_id: Uuid) -> Result<(User, JoinOutcome)> {
        let trainee = create_test_user(self.database(), UserRole::Trainee).await?;
        let outcome = self
            .resources
            .memberships
            .join_gym(
                trainee.principal(),
                self.gym.id,
                trainee_request(trainer_id, &format!("pay_{}", Uuid::new_v4())),
            )
            .await?;
        Ok((trainee, outcome))
    }

    pub async fn reload_gym(&self) -> Result<Gym> {
        Ok(self
            .database()
            .get_gym(self.gym.id)
            .await?
            .expect("gym exists"))
    }

    pub async fn reload_user(&self, user_id: Uuid) -> Result<User> {
        Ok(self
            .database()
            .get_user(user_id)
            .await?
            .expect("user exists"))
    }
}

/// Join request for a trainer asking for gym access
pub fn trainer_request() -> JoinRequest {
    JoinRequest {
        as_trainer: true,
        ..JoinRequest::default()
    }
}

/// Join request for a paying trainee
pub fn trainee_request(trainer_id: Uuid, payment_reference: &str) -> JoinRequest {
    JoinRequest {
        trainer_id: Some(trainer_id),
        payment_reference: Some(payment_reference.to_owned()),
        ..JoinRequest::default()
    }
}

pub const fn admin_principal() -> Principal {
    Principal::new(Uuid::nil(), UserRole::Admin)
}
