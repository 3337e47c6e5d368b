// Kernel test module
#[cfg(test)]
mod support;

#[cfg(test)]
mod runtime_tests;
