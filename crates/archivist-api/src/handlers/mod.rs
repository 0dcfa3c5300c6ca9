//! Route handler modules.

pub mod documents;
pub mod search;
pub mod settings;
pub mod system;
pub mod vault;
