// This is a metapackage for tests
// Re-export crates as modules

// Test helpers and utilities
pub mod test_helpers {
}
