//! External identity collaborators (branches, customers)

pub mod model;
pub mod repository;

pub use model::{Branch, Customer};
pub use repository::{BranchDirectory, CustomerDirectory};
