pub mod entities;
pub mod geometry;
pub mod store;

pub use entities::*;
pub use geometry::*;
pub use store::*;
