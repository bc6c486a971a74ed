pub mod controller;
pub mod mapper;
pub mod session;

pub use controller::*;
pub use mapper::*;
pub use session::*;
