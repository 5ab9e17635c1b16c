mod body;
mod error;
mod record;

pub use body::Body;
pub use error::ErrorKind;
pub use record::CacheRecord;

/// The quince `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
