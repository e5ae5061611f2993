/// Lifetime of a login session.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

/// Random bytes behind a session token (hex encoded to twice this length).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Key prefix for login sessions kept in Redis.
pub const REDIS_SESSION_KEY_PREFIX: &str = "psyclinic:session:";

/// Header row of the user database file.
pub const USER_CSV_HEADER: [&str; 4] = ["email", "password_hash", "full_name", "created_at"];

/// Visible prefix of a password hash in admin listings.
pub const PASSWORD_HASH_PREVIEW_CHARS: usize = 10;
