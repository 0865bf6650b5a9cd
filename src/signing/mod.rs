pub mod identity;

pub use identity::{Identity, PRIVATE_KEY_ENV};
