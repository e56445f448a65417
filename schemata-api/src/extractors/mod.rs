//! Custom extractors for record routes.

pub mod fields;
pub mod path;

pub use fields::FieldInput;
pub use path::ApiPath;
