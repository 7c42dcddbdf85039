//! The installation steps, in pipeline order.

mod check_installed;
mod install_component;
mod pre_register;
mod register;
mod register_token;
mod unified_apiserver;

pub use check_installed::CheckFederationInstalledStep;
pub use install_component::InstallComponentStep;
pub use pre_register::PreRegisterClusterStep;
pub use register::RegisterClusterStep;
pub use register_token::CreateRegisterTokenStep;
pub use unified_apiserver::InstallUnifiedApiserverStep;
