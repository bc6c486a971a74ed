pub mod document;
pub mod embed;

pub use document::*;
pub use embed::*;
