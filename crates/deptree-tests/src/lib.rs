pub mod fixtures;
pub mod test_env;

// Re-export key testing utilities
pub use fixtures::{REACT_PACKAGES, RegistryFixture};
pub use test_env::TestEnvironment;
