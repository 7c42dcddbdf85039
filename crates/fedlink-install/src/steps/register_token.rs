//! Step 2: mint the sub-cluster registration token.
//!
//! Idempotent: a bootstrap secret already matching the recognized
//! naming/content pattern makes the step a no-op (re-using its token).

use async_trait::async_trait;
use tracing::info;

use fedlink_common::params::{TaskContext, PARAM_HOST_CLUSTER_ID, PARAM_REGISTER_TOKEN};
use fedlink_common::step::Step;
use fedlink_common::{Result, BOOTSTRAP_TOKEN_NAMESPACE};

use crate::context::InstallContext;
use crate::token;

/// Creates the bootstrap-token Secret in `kube-system` on the host.
pub struct CreateRegisterTokenStep {
    ctx: InstallContext,
}

impl CreateRegisterTokenStep {
    /// Create the step
    pub fn new(ctx: InstallContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for CreateRegisterTokenStep {
    fn name(&self) -> &str {
        "create register token"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();

        let secrets = self
            .ctx
            .host
            .list_secrets(&host_cluster_id, BOOTSTRAP_TOKEN_NAMESPACE)
            .await?;
        if let Some(existing) = secrets.iter().find(|s| token::is_bootstrap_secret(s)) {
            info!(
                host_cluster = %host_cluster_id,
                secret = existing.metadata.name.as_deref().unwrap_or(""),
                "bootstrap token already present, skipping"
            );
            if let Some(existing_token) = token::token_from_secret(existing) {
                task.set_common_param(PARAM_REGISTER_TOKEN, existing_token);
            }
            return Ok(());
        }

        let token_id = token::generate_random_str(token::TOKEN_ID_LENGTH);
        let token_secret = token::generate_random_str(token::TOKEN_SECRET_LENGTH);
        let secret = token::bootstrap_secret(&token_id, &token_secret);
        self.ctx.host.create_secret(&host_cluster_id, &secret).await?;
        info!(host_cluster = %host_cluster_id, token_id = %token_id, "created bootstrap token");

        task.set_common_param(
            PARAM_REGISTER_TOKEN,
            format!("{}.{}", token_id, token_secret),
        );
        Ok(())
    }
}
