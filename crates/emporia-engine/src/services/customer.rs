//! # Customer Service
//!
//! Customer identity resolution, POS guest signup, and tier
//! recomputation.
//!
//! Tier recomputation is the only writer of the user tier column. It
//! runs after every completed sale with a resolvable customer, sums the
//! sales ledger, and stores the derived tier with a single assignment -
//! recomputing against unchanged history is a no-op.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use emporia_core::validation::{validate_email, validate_phone};
use emporia_core::{CoreError, Role, Tier, User};
use emporia_db::repository::user::generate_user_id;
use emporia_db::Database;

/// How a POS sale identifies its customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerRef {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// When no matching identity exists, create a guest account.
    pub signup_if_missing: bool,
}

/// Service for customer identity and tier operations.
#[derive(Debug, Clone)]
pub struct CustomerService {
    db: Database,
    guest_email_domain: String,
    guest_default_password: String,
}

impl CustomerService {
    /// Creates a new CustomerService.
    pub fn new(db: Database, guest_email_domain: String, guest_default_password: String) -> Self {
        CustomerService {
            db,
            guest_email_domain,
            guest_default_password,
        }
    }

    /// Looks up a customer by email first, then phone.
    pub async fn resolve(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> EngineResult<Option<User>> {
        if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
            if let Some(user) = self.db.users().get_by_email(email).await? {
                return Ok(Some(user));
            }
        }

        if let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) {
            if let Some(user) = self.db.users().get_by_phone(phone).await? {
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    /// Resolves a customer reference, optionally signing up a guest
    /// identity when nothing matches.
    pub async fn resolve_or_signup(&self, customer: &CustomerRef) -> EngineResult<Option<User>> {
        if let Some(user) = self
            .resolve(customer.email.as_deref(), customer.phone.as_deref())
            .await?
        {
            return Ok(Some(user));
        }

        if !customer.signup_if_missing {
            return Ok(None);
        }

        let has_contact = customer.email.as_deref().is_some_and(|e| !e.trim().is_empty())
            || customer.phone.as_deref().is_some_and(|p| !p.trim().is_empty());
        if !has_contact {
            return Ok(None);
        }

        let user = self
            .signup_guest(customer.email.as_deref(), customer.phone.as_deref())
            .await?;
        Ok(Some(user))
    }

    /// Creates a guest identity keyed by the given email, or
    /// `{phone}@{guest domain}` when only a phone is known. The account
    /// gets the fixed default password, hashed.
    pub async fn signup_guest(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> EngineResult<User> {
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());
        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => {
                validate_email(email).map_err(CoreError::from)?;
                email.to_string()
            }
            None => {
                let phone = phone.ok_or_else(|| {
                    EngineError::validation("Guest signup needs an email or phone")
                })?;
                validate_phone(phone).map_err(CoreError::from)?;
                format!("{}@{}", phone, self.guest_email_domain)
            }
        };

        let display_name = email
            .split('@')
            .next()
            .unwrap_or("guest")
            .to_string();

        let user = User {
            id: generate_user_id(),
            email,
            phone: phone.map(|p| p.to_string()),
            display_name,
            password_hash: hash_password(&self.guest_default_password)?,
            role: Role::Customer,
            tier: Tier::Bronze,
            created_at: Utc::now(),
        };

        self.db.users().insert(&user).await?;
        info!(user_id = %user.id, email = %user.email, "Guest customer signed up");

        Ok(user)
    }

    /// Recomputes the user's tier from the sales ledger and stores it.
    ///
    /// Idempotent: unchanged history derives the same tier, and an
    /// unchanged tier skips the write entirely.
    pub async fn recompute_tier(&self, user_id: &str) -> EngineResult<Tier> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("User", user_id))?;

        let profit = self.db.history().total_profit(user_id).await?;
        let tier = Tier::from_profit(profit);

        if tier != user.tier {
            info!(
                user_id = %user_id,
                from = %user.tier,
                to = %tier,
                profit_cents = profit.cents(),
                "Tier changed"
            );
            self.db.users().set_tier(user_id, tier).await?;
        } else {
            debug!(user_id = %user_id, tier = %tier, "Tier unchanged");
        }

        Ok(tier)
    }

    /// The user's current stored tier.
    pub async fn current_tier(&self, user_id: &str) -> EngineResult<Tier> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("User", user_id))?;
        Ok(user.tier)
    }
}

/// Hashes a password with Argon2 and a fresh random salt.
fn hash_password(password: &str) -> EngineResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| EngineError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testutil;

    #[tokio::test]
    async fn test_resolve_by_email_then_phone() {
        let engine = testutil::engine().await;
        let customers = engine.customers();
        let user = testutil::seed_customer(&engine, "sam@example.com", Some("5550001")).await;

        let by_email = customers
            .resolve(Some("sam@example.com"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);

        let by_phone = customers.resolve(None, Some("5550001")).await.unwrap().unwrap();
        assert_eq!(by_phone.id, user.id);

        assert!(customers
            .resolve(Some("nobody@example.com"), None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_guest_signup_from_phone() {
        let engine = testutil::engine().await;
        let customers = engine.customers();

        let user = customers.signup_guest(None, Some("5550199")).await.unwrap();
        assert_eq!(user.email, "5550199@guest.local");
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.tier, Tier::Bronze);
        // Stored hash is argon2, never the raw default password
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_resolve_or_signup_respects_opt_in() {
        let engine = testutil::engine().await;
        let customers = engine.customers();

        let none = customers
            .resolve_or_signup(&CustomerRef {
                email: None,
                phone: Some("5550199".to_string()),
                signup_if_missing: false,
            })
            .await
            .unwrap();
        assert!(none.is_none());

        let created = customers
            .resolve_or_signup(&CustomerRef {
                email: None,
                phone: Some("5550199".to_string()),
                signup_if_missing: true,
            })
            .await
            .unwrap()
            .unwrap();

        // Second resolution finds the same identity instead of creating
        // another
        let resolved = customers
            .resolve_or_signup(&CustomerRef {
                email: None,
                phone: Some("5550199".to_string()),
                signup_if_missing: true,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.id, resolved.id);
    }

    #[tokio::test]
    async fn test_recompute_tier_follows_ledger() {
        let engine = testutil::engine().await;
        let customers = engine.customers();
        let user = testutil::seed_customer(&engine, "sam@example.com", None).await;

        assert_eq!(customers.recompute_tier(&user.id).await.unwrap(), Tier::Bronze);

        testutil::seed_history(&engine, &user.id, 500_000, 210_000).await;
        assert_eq!(customers.recompute_tier(&user.id).await.unwrap(), Tier::Silver);
        assert_eq!(customers.current_tier(&user.id).await.unwrap(), Tier::Silver);

        testutil::seed_history(&engine, &user.id, 900_000, 800_000).await;
        assert_eq!(
            customers.recompute_tier(&user.id).await.unwrap(),
            Tier::Platinum
        );
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let engine = testutil::engine().await;
        let customers = engine.customers();
        let user = testutil::seed_customer(&engine, "sam@example.com", None).await;

        testutil::seed_history(&engine, &user.id, 100_000, 250_000).await;

        let first = customers.recompute_tier(&user.id).await.unwrap();
        let second = customers.recompute_tier(&user.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(customers.current_tier(&user.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_recompute_missing_user() {
        let engine = testutil::engine().await;
        let err = engine.customers().recompute_tier("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
