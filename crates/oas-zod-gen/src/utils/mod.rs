pub mod registry;
pub mod spec;

pub use registry::RegistryLoader;
pub use spec::SpecLoader;
