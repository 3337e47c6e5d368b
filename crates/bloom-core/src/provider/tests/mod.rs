// Provider test module
#[cfg(test)]
mod registry_tests;
