//! Integration tests: drive the compiled binary inside throwaway git repositories

mod helpers;
mod test_affected;
mod test_config;
