use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::errors::{Error, Result, ValidationError};
use crate::users::password::{hash_password, verify_password};
use crate::users::users_model::{normalize_email, NewUser, User, UserSummary};
use crate::users::users_traits::{UserRepositoryTrait, UserServiceTrait};

pub struct UserService {
    repository: Arc<dyn UserRepositoryTrait>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn validate(new_user: &NewUser) -> Result<()> {
        let email = new_user.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingField("email".into()).into());
        }
        if !email.contains('@') {
            return Err(ValidationError::invalid("email", "must contain '@'").into());
        }
        if new_user.password.is_empty() {
            return Err(ValidationError::MissingField("password".into()).into());
        }
        if new_user.full_name.trim().is_empty() {
            return Err(ValidationError::MissingField("full_name".into()).into());
        }
        Ok(())
    }
}

impl UserServiceTrait for UserService {
    fn register(&self, new_user: NewUser) -> Result<User> {
        Self::validate(&new_user)?;
        let email = normalize_email(&new_user.email);

        if self.repository.find_user(&email)?.is_some() {
            return Err(Error::ConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let user = User {
            email,
            password_hash: hash_password(&new_user.password)?,
            full_name: new_user.full_name.trim().to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.repository.insert_user(&user)?;
        info!("Registered trainee account {}", user.email);
        Ok(user)
    }

    fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let Some(user) = self.repository.find_user(&email)? else {
            debug!("Login attempt for unknown account");
            return Err(Error::InvalidCredentials);
        };
        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            Err(Error::InvalidCredentials)
        }
    }

    fn list_users(&self) -> Result<Vec<UserSummary>> {
        Ok(self
            .repository
            .list_users()?
            .iter()
            .map(UserSummary::from)
            .collect())
    }

    fn delete_user(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if self.repository.delete_user(&email)? {
            info!("Deleted trainee account {}", email);
            Ok(())
        } else {
            Err(Error::NotFound("User not found".to_string()))
        }
    }

    fn export_csv(&self) -> Result<Vec<u8>> {
        self.repository.export_raw()
    }
}
