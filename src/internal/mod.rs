// Internal shared definitions

pub mod error;
