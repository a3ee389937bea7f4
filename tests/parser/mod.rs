pub mod tests_glr;
pub mod tests_incremental;
pub mod tests_scenarios;
