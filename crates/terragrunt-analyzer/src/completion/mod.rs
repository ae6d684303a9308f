pub(crate) mod keywords;
mod provider;

pub use provider::CompletionProvider;

#[cfg(test)]
#[path = "../../tests/src/completion/provider_tests.rs"]
mod tests;
