//! Pipeline assembly for namespace/quota sync.

use fedlink_common::step::Pipeline;

use crate::context::SyncContext;
use crate::steps::{
    CheckParamsStep, GetNamespaceAndQuotaStep, ReconcileBackendsStep, UpdateNamespaceStatusStep,
};

/// Build the four-step sync pipeline.
///
/// Unlike installation, sync has no failure callback: a failed sync leaves
/// the host namespace's status annotations untouched and the next trigger
/// simply runs the pipeline again.
pub fn sync_pipeline(ctx: SyncContext) -> Pipeline {
    Pipeline::new("namespace-quota-sync")
        .step(Box::new(CheckParamsStep))
        .step(Box::new(GetNamespaceAndQuotaStep::new(ctx.clone())))
        .step(Box::new(ReconcileBackendsStep::new(ctx.clone())))
        .step(Box::new(UpdateNamespaceStatusStep::new(ctx)))
}
