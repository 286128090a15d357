#[cfg(test)]
mod registry_tests;
#[cfg(test)]
mod status_tests;
