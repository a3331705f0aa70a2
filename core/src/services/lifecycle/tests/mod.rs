mod concurrency_tests;
pub(crate) mod mocks;
mod scenario_tests;
