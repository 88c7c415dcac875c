//! `ObligationSource` implementations.

pub mod json_file;
pub mod static_source;

pub use json_file::JsonFileObligationSource;
pub use static_source::StaticObligationSource;
