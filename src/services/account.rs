//! Account service
//!
//! Registration, login through the lockout guard, and the password reset
//! and change flows. A user's data key is provisioned exactly once, at
//! registration, and is never touched by password changes.

use crate::audit::{AuditEntry, EntityType, Operation};
use crate::auth::{
    validate_new_password, validate_password, AttemptStore, InMemoryAttemptStore, LoginGuard,
};
use crate::crypto::password::verify_decoy;
use crate::crypto::KeyManager;
use crate::error::{ExpenseError, ExpenseResult};
use crate::models::{User, UserId};
use crate::storage::Storage;

/// Service for user accounts and authentication
pub struct AccountService<'a, S: AttemptStore = InMemoryAttemptStore> {
    storage: &'a Storage,
    keys: &'a KeyManager,
    guard: &'a LoginGuard<S>,
}

impl<'a, S: AttemptStore> AccountService<'a, S> {
    pub fn new(storage: &'a Storage, keys: &'a KeyManager, guard: &'a LoginGuard<S>) -> Self {
        Self {
            storage,
            keys,
            guard,
        }
    }

    /// Register a new user and provision their data key
    pub fn register(&self, username: &str, email: &str, password: &str) -> ExpenseResult<User> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ExpenseError::Validation("Please fill out all fields.".into()));
        }
        if !looks_like_email(email) {
            return Err(ExpenseError::Validation(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        validate_password(password)?;

        for handle in [username, email] {
            if self.storage.users.find_by_identifier(handle)?.is_some() {
                return Err(ExpenseError::Duplicate {
                    entity_type: "User",
                    identifier: handle.to_string(),
                });
            }
        }

        let mut user = User::new(username, email);
        user.set_password(password)?;
        // The key is dropped (and zeroed) straight away; only the wrapped form is kept
        self.keys.provision_user_key(&mut user)?;

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        self.storage.log_audit(
            &AuditEntry::event(Operation::Create, EntityType::User, user.id.full(), "registered")
                .named(&user.username)
                .by(user.id),
        )?;
        self.storage.log_audit(
            &AuditEntry::event(
                Operation::ProvisionKey,
                EntityType::DataKey,
                user.id.full(),
                "data key generated and wrapped",
            )
            .by(user.id),
        )?;

        Ok(user)
    }

    /// Authenticate by username or email
    ///
    /// Failures are counted against the identifier as typed (trimmed and
    /// lower-cased), so a username and its email lock independently and a
    /// lockout says nothing about which identifiers belong together. Unknown
    /// identifiers fail exactly like a wrong password and cost the same
    /// Argon2 verification. A user flagged for a password change still logs
    /// in; see [`AccountService::require_active`].
    pub fn login(&self, identifier: &str, password: &str) -> ExpenseResult<User> {
        let user = self.storage.users.find_by_identifier(identifier)?;
        let attempt_key = identifier.trim().to_lowercase();

        let outcome = self.guard.attempt(&attempt_key, || match &user {
            Some(user) => user.check_password(password),
            None => Ok(verify_decoy(password)),
        });

        match outcome {
            Ok(()) => {
                let user = user.ok_or_else(|| ExpenseError::user_not_found(identifier))?;
                self.storage.log_audit(
                    &AuditEntry::event(
                        Operation::LoginSuccess,
                        EntityType::User,
                        user.id.full(),
                        "login succeeded",
                    )
                    .named(&user.username)
                    .by(user.id),
                )?;
                Ok(user)
            }
            Err(err) => {
                let mut entry = match &err {
                    ExpenseError::InvalidCredentials { attempts_remaining } => AuditEntry::event(
                        Operation::LoginFailure,
                        EntityType::User,
                        &attempt_key,
                        format!("invalid credentials, {} attempts left", attempts_remaining),
                    ),
                    ExpenseError::LockedOut { remaining_secs } => AuditEntry::event(
                        Operation::Lockout,
                        EntityType::User,
                        &attempt_key,
                        format!("locked out for {} more seconds", remaining_secs),
                    ),
                    _ => return Err(err),
                };
                if let Some(user) = &user {
                    entry = entry.by(user.id);
                }
                self.storage.log_audit(&entry)?;
                Err(err)
            }
        }
    }

    /// Refuse users that still have to replace a reset password
    pub fn require_active(&self, user: &User) -> ExpenseResult<()> {
        if user.must_change_password {
            Err(ExpenseError::PasswordChangeRequired)
        } else {
            Ok(())
        }
    }

    /// Flag the account with this email as needing a new password
    pub fn request_password_reset(&self, email: &str) -> ExpenseResult<User> {
        let mut user = self.find_by_email(email)?;
        user.invalidate_password();

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;
        self.storage.log_audit(
            &AuditEntry::event(
                Operation::PasswordResetRequested,
                EntityType::User,
                user.id.full(),
                "password reset requested",
            )
            .named(&user.username)
            .by(user.id),
        )?;

        Ok(user)
    }

    /// Complete a reset started with [`AccountService::request_password_reset`]
    pub fn reset_password(&self, email: &str, new_password: &str, confirm: &str) -> ExpenseResult<User> {
        let user = self.find_by_email(email)?;
        if !user.must_change_password {
            return Err(ExpenseError::Validation(
                "Please submit a password reset request first.".into(),
            ));
        }
        self.replace_password(user, new_password, confirm)
    }

    /// Set a new password for an authenticated user
    pub fn change_password(&self, user_id: UserId, new_password: &str, confirm: &str) -> ExpenseResult<User> {
        let user = self
            .storage
            .users
            .get(user_id)?
            .ok_or_else(|| ExpenseError::user_not_found(user_id.to_string()))?;
        self.replace_password(user, new_password, confirm)
    }

    fn replace_password(&self, mut user: User, new_password: &str, confirm: &str) -> ExpenseResult<User> {
        validate_new_password(new_password, confirm)?;
        user.set_password(new_password)?;
        user.must_change_password = false;

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;
        self.storage.log_audit(
            &AuditEntry::event(
                Operation::PasswordChanged,
                EntityType::User,
                user.id.full(),
                "password changed",
            )
            .named(&user.username)
            .by(user.id),
        )?;

        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> ExpenseResult<User> {
        self.storage
            .users
            .find_by_identifier(email)?
            .filter(|user| user.email.eq_ignore_ascii_case(email.trim()))
            .ok_or_else(|| ExpenseError::user_not_found(email.trim()))
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
