#[cfg(test)]
mod alias_tests;
