//! Rate table lookup interface (external pricing service)

use async_trait::async_trait;

use super::model::{select_rate, RateRow};
use crate::domain::DomainResult;

#[async_trait]
pub trait RateTable: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<RateRow>>;

    /// Duration catalogue for a branch and customer type, shortest first
    async fn list(&self, branch_id: i32, customer_type_id: i32) -> DomainResult<Vec<RateRow>>;

    /// `getRate(branch, customerType, duration?)`
    async fn get_rate(
        &self,
        branch_id: i32,
        customer_type_id: i32,
        duration_minutes: Option<i32>,
    ) -> DomainResult<Option<RateRow>> {
        let rows = self.list(branch_id, customer_type_id).await?;
        Ok(select_rate(&rows, duration_minutes).cloned())
    }
}
