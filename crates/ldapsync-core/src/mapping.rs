//! Attribute mapping between directory schema and store schema
//!
//! Values travel through two immutable lookup tables:
//! - [`AttributeMapping`]: intermediate key to an ordered list of directory
//!   attribute names, built from fixed defaults plus an override string
//! - [`Projection`]: intermediate key to store column name, fixed
//!
//! Keeping them apart lets override precedence be tested without any
//! knowledge of the store schema.

mod projection;
mod table;

pub use projection::Projection;
pub use table::{AttributeMapping, OverrideDirective};

/// Intermediate keys of the default vocabulary
pub mod keys {
    /// Unique identifier (the entry DN by default)
    pub const UID: &str = "uid";
    /// Display name
    pub const NAME: &str = "name";
    /// Given name
    pub const FIRST_NAME: &str = "first_name";
    /// Family name
    pub const LAST_NAME: &str = "last_name";
    /// Email address
    pub const EMAIL: &str = "email";
    /// Login or nickname
    pub const NICKNAME: &str = "nickname";
    /// Avatar
    pub const IMAGE: &str = "image";
}
