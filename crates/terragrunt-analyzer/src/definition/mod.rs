mod provider;

pub use provider::DefinitionProvider;

#[cfg(test)]
#[path = "../../tests/src/definition/provider_tests.rs"]
mod tests;
