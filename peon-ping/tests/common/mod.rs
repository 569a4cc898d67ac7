pub mod assertions;
pub mod fixtures;
pub mod logging;

pub use assertions::{assert_contains, assert_path_exists, assert_path_missing};
pub use fixtures::{Checkout, TestHome, run_peon, run_peon_with_env, stderr_of, stdout_of};
pub use logging::init_test_logging;
