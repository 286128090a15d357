// State store test module
#[cfg(test)]
mod store_tests;
