#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod scene_tests;
