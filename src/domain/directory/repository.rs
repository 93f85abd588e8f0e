//! Read-only identity lookups for branches and customers

use async_trait::async_trait;

use super::model::{Branch, Customer};
use crate::domain::DomainResult;

#[async_trait]
pub trait BranchDirectory: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Branch>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>>;

    /// Customers whose mobile number matches the given digits
    /// (see [`crate::domain::scan::mobile_matches`]).
    async fn find_by_mobile(&self, mobile_digits: &str) -> DomainResult<Vec<Customer>>;
}
