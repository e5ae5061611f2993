use crate::errors::Result;
use crate::users::users_model::{NewUser, User, UserSummary};

/// Trait for user storage operations
pub trait UserRepositoryTrait: Send + Sync {
    fn list_users(&self) -> Result<Vec<User>>;
    fn find_user(&self, email: &str) -> Result<Option<User>>;
    fn insert_user(&self, user: &User) -> Result<()>;
    /// Returns `false` when no row matched.
    fn delete_user(&self, email: &str) -> Result<bool>;
    fn export_raw(&self) -> Result<Vec<u8>>;
}

/// Trait for user service operations
pub trait UserServiceTrait: Send + Sync {
    fn register(&self, new_user: NewUser) -> Result<User>;
    fn authenticate(&self, email: &str, password: &str) -> Result<User>;
    fn list_users(&self) -> Result<Vec<UserSummary>>;
    fn delete_user(&self, email: &str) -> Result<()>;
    fn export_csv(&self) -> Result<Vec<u8>>;
}
