//! Step 1: validate the sync request.
//!
//! Malformed input fails the pipeline fatally; nothing downstream runs.

use async_trait::async_trait;

use fedlink_common::params::{
    TaskContext, PARAM_HOST_CLUSTER_ID, PARAM_NAMESPACE, PARAM_SYNC_REQUEST,
};
use fedlink_common::step::Step;
use fedlink_common::Result;

use crate::request::SyncRequest;

/// Parses the JSON request and publishes its fields as parameters.
pub struct CheckParamsStep;

#[async_trait]
impl Step for CheckParamsStep {
    fn name(&self) -> &str {
        "check parameters"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let raw = task.common_param(PARAM_SYNC_REQUEST)?.to_string();
        let request = SyncRequest::parse(&raw)?;

        task.set_common_param(PARAM_HOST_CLUSTER_ID, request.host_cluster_id);
        task.set_common_param(PARAM_NAMESPACE, request.namespace);
        Ok(())
    }
}
