#[cfg(test)]
mod kernel_tests;
