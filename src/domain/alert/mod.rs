//! Alert module - durable records of violations and their construction.

#[allow(clippy::module_inception)]
mod alert;
mod mapper;

pub use alert::Alert;
pub use mapper::AlertMapper;
