//! Provider registry — the ordered list of translation backends.
//!
//! Order is fixed at startup and is the fallback priority: the local
//! self-hosted instance first, then the free public services by
//! reliability. Ids must be unique.

use anyhow::Result;
use std::sync::Arc;

use crate::adapters::TranslationProvider;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn TranslationProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `provider` at the lowest priority so far.
    pub fn register(&mut self, provider: Arc<dyn TranslationProvider>) -> Result<()> {
        if self.get(provider.id()).is_some() {
            anyhow::bail!("Provider '{}' registered twice", provider.id());
        }
        self.providers.push(provider);
        Ok(())
    }

    /// Builder-style `register` for fixed setups.
    pub fn with(mut self, provider: impl TranslationProvider + 'static) -> Result<Self> {
        self.register(Arc::new(provider))?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn TranslationProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Providers in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TranslationProvider>> {
        self.providers.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}
