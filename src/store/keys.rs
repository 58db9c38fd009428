/// Logical keys of the persisted keyspace

/// Ordered array of every registered account
pub const USERS: &str = "users";

/// One document per live session: `session_<id>`
pub const SESSION_PREFIX: &str = "session_";

/// Ordinary element galleries: `images_<element>`
pub const IMAGES_PREFIX: &str = "images_";

/// Forbidden-tier galleries: `forbidden_images_<id>`
pub const FORBIDDEN_IMAGES_PREFIX: &str = "forbidden_images_";

pub fn session(id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}
