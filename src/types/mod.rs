pub mod data_store;
pub mod size;

pub use data_store::DataStoreName;
pub use size::Megabytes;
