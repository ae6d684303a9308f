mod provider;

pub use provider::HoverProvider;

#[cfg(test)]
#[path = "../../tests/src/hover/provider_tests.rs"]
mod tests;
