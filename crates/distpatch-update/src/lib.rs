//! Update packaging for distpatch.
//!
//! This crate turns a [`Classification`] into a shippable update:
//!
//! - **Descriptor** - load, validate and save `update-descriptor.yaml`
//! - **Mutator** - fold the classification sets into the descriptor's
//!   file-change lists
//! - **Staging** - copy changed files and resources into a working
//!   directory and zip it as `<update_name>.zip`
//! - **Validation** - check a packaged update against the distribution it
//!   applies to
//!
//! ```rust,no_run
//! use distpatch_diff::Classification;
//! use distpatch_scan::ZipDistribution;
//! use distpatch_update::{PackagingConfig, StagingArea, UpdateDescriptor, apply};
//!
//! # fn run(classification: Classification) -> Result<(), distpatch_update::UpdateError> {
//! let config = PackagingConfig::default();
//! let mut descriptor = UpdateDescriptor::load("update")?;
//! descriptor.validate()?;
//! apply(&mut descriptor, &classification);
//!
//! let name = descriptor.update_name(&config.update_name_prefix);
//! let staging = StagingArea::create(&config.staging_root, &name)?;
//! let mut updated = ZipDistribution::open("product-1.0.1.zip")?;
//! staging.stage_changes(&mut updated, &classification)?;
//! staging.stage_resources("update", &config)?;
//! staging.write_descriptor(&descriptor)?;
//! let packaged = staging.package("update")?;
//! println!("Created {}", packaged.path.display());
//! # Ok(())
//! # }
//! ```

mod config;
mod descriptor;
mod error;
mod mutator;
mod staging;
mod validate;

pub use config::{DEFAULT_UPDATE_NAME_PREFIX, PackagingConfig, PackagingConfigBuilder};
pub use descriptor::{DESCRIPTOR_FILE, FileChanges, UpdateDescriptor};
pub use error::UpdateError;
pub use mutator::{MutationSummary, apply};
pub use staging::{CARBON_HOME, PackagedUpdate, StageSummary, StagingArea};
pub use validate::{ValidationReport, validate_update};

// Re-export classification types
pub use distpatch_diff::Classification;
