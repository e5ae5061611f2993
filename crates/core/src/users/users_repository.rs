use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use log::debug;

use crate::constants::USER_CSV_HEADER;
use crate::errors::{Error, Result};
use crate::users::users_model::{normalize_email, User};
use crate::users::users_traits::UserRepositoryTrait;

/// User database kept in a single CSV file.
#[derive(Debug)]
pub struct CsvUserRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvUserRepository {
    /// Opens the database, writing a header-only file when none exists yet.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let repo = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        repo.ensure_file()?;
        Ok(repo)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(USER_CSV_HEADER)?;
        writer.flush()?;
        debug!("Created user database at {}", self.path.display());
        Ok(())
    }

    fn with_lock<T>(&self, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Storage("User database lock poisoned".into()))?;
        op()
    }

    fn read_all_locked(&self) -> Result<Vec<User>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut users = Vec::new();
        for row in reader.deserialize() {
            let user: User = row?;
            users.push(user);
        }
        Ok(users)
    }

    fn write_all_locked(&self, users: &[User]) -> Result<()> {
        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp_path)?;
            writer.write_record(USER_CSV_HEADER)?;
            for user in users {
                writer.serialize(user)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl UserRepositoryTrait for CsvUserRepository {
    fn list_users(&self) -> Result<Vec<User>> {
        self.with_lock(|| self.read_all_locked())
    }

    fn find_user(&self, email: &str) -> Result<Option<User>> {
        self.with_lock(|| {
            Ok(self
                .read_all_locked()?
                .into_iter()
                .find(|user| normalize_email(&user.email) == email))
        })
    }

    fn insert_user(&self, user: &User) -> Result<()> {
        self.with_lock(|| {
            self.ensure_file()?;
            let email = normalize_email(&user.email);
            if self
                .read_all_locked()?
                .iter()
                .any(|existing| normalize_email(&existing.email) == email)
            {
                return Err(Error::ConstraintViolation(
                    "Email already registered".to_string(),
                ));
            }
            let file = OpenOptions::new().append(true).open(&self.path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.serialize(user)?;
            writer.flush()?;
            Ok(())
        })
    }

    fn delete_user(&self, email: &str) -> Result<bool> {
        self.with_lock(|| {
            let users = self.read_all_locked()?;
            let before = users.len();
            let remaining: Vec<User> = users
                .into_iter()
                .filter(|u| normalize_email(&u.email) != email)
                .collect();
            if remaining.len() == before {
                return Ok(false);
            }
            self.write_all_locked(&remaining)?;
            Ok(true)
        })
    }

    fn export_raw(&self) -> Result<Vec<u8>> {
        self.with_lock(|| {
            if !self.path.exists() {
                return Err(Error::NotFound("User database not found".into()));
            }
            Ok(fs::read(&self.path)?)
        })
    }
}
