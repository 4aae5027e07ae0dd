pub mod fixtures;

#[cfg(test)]
mod auto_refresh_tests;
