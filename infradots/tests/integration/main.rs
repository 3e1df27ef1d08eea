mod common;
mod data_sources;
mod organization;
mod vcs;
mod workspace;
