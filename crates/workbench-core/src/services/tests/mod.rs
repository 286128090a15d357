#[cfg(test)]
mod gui_tests;
#[cfg(test)]
mod workbench_services_tests;
