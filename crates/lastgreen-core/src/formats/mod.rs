//! # Formats Module
//!
//! On-disk encodings. Storage handles live in `storage`.

mod record;

pub use record::*;
