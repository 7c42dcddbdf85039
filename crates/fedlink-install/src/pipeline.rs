//! Installation pipeline assembly.

use std::sync::Arc;

use fedlink_common::step::Pipeline;

use crate::callback::InstallFailureCallback;
use crate::component::FederationComponent;
use crate::context::InstallContext;
use crate::steps::{
    CheckFederationInstalledStep, CreateRegisterTokenStep, InstallComponentStep,
    InstallUnifiedApiserverStep, PreRegisterClusterStep, RegisterClusterStep,
};

/// Assemble the full installation pipeline over the given dependencies.
pub fn install_pipeline(ctx: InstallContext) -> Pipeline {
    Pipeline::new("federation-install")
        .step(Box::new(PreRegisterClusterStep::new(ctx.clone())))
        .step(Box::new(CreateRegisterTokenStep::new(ctx.clone())))
        .step(Box::new(CheckFederationInstalledStep::new(ctx.clone())))
        .step(Box::new(InstallComponentStep::new(
            ctx.clone(),
            FederationComponent::ClusternetHub,
        )))
        .step(Box::new(InstallComponentStep::new(
            ctx.clone(),
            FederationComponent::ClusternetController,
        )))
        .step(Box::new(InstallComponentStep::new(
            ctx.clone(),
            FederationComponent::ClusternetScheduler,
        )))
        .step(Box::new(InstallUnifiedApiserverStep::new(ctx.clone())))
        .step(Box::new(RegisterClusterStep::new(ctx.clone())))
        .on_failure(Arc::new(InstallFailureCallback::new(ctx)))
}
