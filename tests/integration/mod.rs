//! Integration tests for the dApp Hub filesystem

mod catalog_loading;
mod cli_check;
mod concurrent_access;
mod filesystem_scenario;
mod test_utils;
