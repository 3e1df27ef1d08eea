//! Resource implementations

pub mod organization;
pub mod variable;
pub mod vcs;
pub mod workspace;

pub use organization::OrganizationResource;
pub use variable::VariableResource;
pub use vcs::VcsResource;
pub use workspace::WorkspaceResource;
