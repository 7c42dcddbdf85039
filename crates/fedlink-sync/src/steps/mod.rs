//! The sync steps, in pipeline order.

mod check_params;
mod fetch_state;
mod reconcile;
mod update_status;

pub use check_params::CheckParamsStep;
pub use fetch_state::GetNamespaceAndQuotaStep;
pub use reconcile::ReconcileBackendsStep;
pub use update_status::UpdateNamespaceStatusStep;
