//! # Messaging Service
//!
//! Tier-targeted broadcast fan-out.
//!
//! A broadcast enumerates every identity, drops administrative roles
//! (Owner, Proprietor), and creates one read receipt per included user.
//! Selector parsing is case-insensitive, with unrecognized input
//! widening to everyone.

use chrono::Utc;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use emporia_core::{BroadcastTarget, CoreError, Message, Role, User, ValidationError};
use emporia_db::repository::message::generate_message_id;
use emporia_db::Database;

/// Result of a broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastSummary {
    pub message: Message,
    /// How many users received a receipt.
    pub recipients: usize,
}

/// Service for broadcast messaging.
#[derive(Debug, Clone)]
pub struct MessagingService {
    db: Database,
}

impl MessagingService {
    /// Creates a new MessagingService.
    pub fn new(db: Database) -> Self {
        MessagingService { db }
    }

    /// Whether a user belongs to the broadcast audience.
    fn includes(target: BroadcastTarget, user: &User) -> bool {
        if user.role.is_administrative() {
            return false;
        }

        match target {
            BroadcastTarget::All => true,
            BroadcastTarget::CustomersOnly => user.role == Role::Customer,
            BroadcastTarget::Tier(tier) => user.tier == tier,
        }
    }

    /// Sends a broadcast to the selected audience.
    pub async fn broadcast(
        &self,
        subject: &str,
        body: &str,
        target_raw: &str,
    ) -> EngineResult<BroadcastSummary> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "subject".to_string(),
            })
            .into());
        }

        let target = BroadcastTarget::parse(target_raw);

        let message = Message {
            id: generate_message_id(),
            subject: subject.to_string(),
            body: body.to_string(),
            target: target_raw.trim().to_string(),
            created_at: Utc::now(),
        };
        self.db.messages().insert(&message).await?;

        let mut recipients = 0;
        for user in self.db.users().list().await? {
            if !Self::includes(target, &user) {
                continue;
            }
            if self.db.messages().add_receipt(&message.id, &user.id).await? {
                recipients += 1;
            }
        }

        info!(
            message_id = %message.id,
            target = ?target,
            recipients = recipients,
            "Broadcast delivered"
        );

        Ok(BroadcastSummary {
            message,
            recipients,
        })
    }

    /// A user's unread messages, newest first.
    pub async fn unread_for(&self, user_id: &str) -> EngineResult<Vec<Message>> {
        Ok(self.db.messages().unread_for_user(user_id).await?)
    }

    /// Marks a message as read for a user.
    pub async fn mark_read(&self, message_id: &str, user_id: &str) -> EngineResult<()> {
        self.db.messages().mark_read(message_id, user_id).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testutil;
    use emporia_core::Tier;

    #[tokio::test]
    async fn test_broadcast_excludes_administrative_roles() {
        let engine = testutil::engine().await;
        let messaging = engine.messaging();

        let customer = testutil::seed_customer(&engine, "sam@example.com", None).await;
        testutil::seed_user(&engine, "owner@example.com", Role::Owner).await;
        testutil::seed_user(&engine, "prop@example.com", Role::Proprietor).await;
        let admin = testutil::seed_user(&engine, "admin@example.com", Role::Admin).await;

        let summary = messaging.broadcast("Spring sale", "Body", "all").await.unwrap();
        assert_eq!(summary.recipients, 2); // customer + admin

        assert_eq!(messaging.unread_for(&customer.id).await.unwrap().len(), 1);
        assert_eq!(messaging.unread_for(&admin.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_customers_only_excludes_admin() {
        let engine = testutil::engine().await;
        let messaging = engine.messaging();

        let customer = testutil::seed_customer(&engine, "sam@example.com", None).await;
        let admin = testutil::seed_user(&engine, "admin@example.com", Role::Admin).await;

        let summary = messaging
            .broadcast("Spring sale", "Body", "users_only")
            .await
            .unwrap();
        assert_eq!(summary.recipients, 1);
        assert_eq!(messaging.unread_for(&customer.id).await.unwrap().len(), 1);
        assert!(messaging.unread_for(&admin.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tier_targeting_matches_stored_tier() {
        let engine = testutil::engine().await;
        let messaging = engine.messaging();

        let bronze = testutil::seed_customer(&engine, "bronze@example.com", None).await;
        let silver = testutil::seed_customer(&engine, "silver@example.com", None).await;
        testutil::seed_history(&engine, &silver.id, 500_000, 210_000).await;
        engine.customers().recompute_tier(&silver.id).await.unwrap();

        // Case-insensitive selector
        let summary = messaging.broadcast("For Silver", "Body", "SILVER").await.unwrap();
        assert_eq!(summary.recipients, 1);
        assert_eq!(messaging.unread_for(&silver.id).await.unwrap().len(), 1);
        assert!(messaging.unread_for(&bronze.id).await.unwrap().is_empty());

        assert_eq!(
            engine.customers().current_tier(&silver.id).await.unwrap(),
            Tier::Silver
        );
    }

    #[tokio::test]
    async fn test_unrecognized_selector_falls_back_to_all() {
        let engine = testutil::engine().await;
        let messaging = engine.messaging();

        testutil::seed_customer(&engine, "sam@example.com", None).await;
        testutil::seed_user(&engine, "admin@example.com", Role::Admin).await;

        let summary = messaging.broadcast("Hello", "Body", "vip-list").await.unwrap();
        assert_eq!(summary.recipients, 2);
    }

    #[tokio::test]
    async fn test_mark_read_clears_unread() {
        let engine = testutil::engine().await;
        let messaging = engine.messaging();
        let customer = testutil::seed_customer(&engine, "sam@example.com", None).await;

        let summary = messaging.broadcast("Hello", "Body", "all").await.unwrap();
        messaging
            .mark_read(&summary.message.id, &customer.id)
            .await
            .unwrap();
        assert!(messaging.unread_for(&customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_subject_rejected() {
        let engine = testutil::engine().await;
        let err = engine
            .messaging()
            .broadcast("   ", "Body", "all")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
