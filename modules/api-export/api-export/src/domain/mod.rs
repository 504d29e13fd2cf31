pub mod authz;
pub mod error;
pub mod filename;
pub mod params;
pub mod service;
pub mod transformers;
pub mod translator;
