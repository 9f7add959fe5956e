pub mod barrier;
pub mod config;
pub mod error;
pub mod io;
pub mod package;
pub mod paths;
pub mod registry;

pub use barrier::{Barrier, Reach};
pub use error::{FetchError, LoadError, Result};
pub use package::{
    Asset, AssetKind, HostEnvironment, LoadMode, PackageDefaults, PackageDescriptor,
    ResolvedPackage,
};
pub use registry::ModuleRegistry;
