//! The `FillBackend` trait: one async method, one provider per variant,
//! dispatch by a small factory function rather than a registry.

use async_trait::async_trait;
use plashboard_merge::FillResponse;
use plashboard_utils::PlashboardError;

use crate::context::FillContext;

#[async_trait]
pub trait FillBackend: Send + Sync {
    async fn fill(&self, ctx: &FillContext) -> Result<FillResponse, PlashboardError>;

    fn name(&self) -> &'static str;
}
