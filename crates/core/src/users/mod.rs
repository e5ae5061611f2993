//! Users module - trainee accounts, password hashing and the CSV user database.

mod password;
mod users_model;
mod users_repository;
mod users_service;
mod users_traits;

pub use password::{hash_password, verify_password};
pub use users_model::{NewUser, User, UserSummary};
pub use users_repository::CsvUserRepository;
pub use users_service::UserService;
pub use users_traits::{UserRepositoryTrait, UserServiceTrait};
