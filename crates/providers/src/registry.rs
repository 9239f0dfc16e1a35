//! Closed implementation registry and dispatch
//!
//! Catalog entries name their probe by implementation key. The set of keys is
//! fixed at compile time; an entry naming anything else fails at startup.
//! Providers are built once and shared across requests.

use provider::{
    Credentials, Probe, Provider, ServiceProvider, Transport, ValidationObserver,
    ValidationResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::ai::{anthropic, bedrock, deepseek, exa, gemini, groq, mistral, openai, openrouter, perplexity, xai};
use crate::catalog::Catalog;
use crate::payment::{paypal, polar};

/// Every implementation key the registry can build.
pub const IMPLEMENTATIONS: &[&str] = &[
    "openai",
    "anthropic",
    "gemini",
    "groq",
    "mistral",
    "xai",
    "deepseek",
    "openrouter",
    "perplexity",
    "exa",
    "amazon-bedrock",
    "paypal",
    "polar",
];

/// Probe for an implementation key.
pub fn probe_for(implementation: &str) -> Option<Box<dyn Probe>> {
    let probe: Box<dyn Probe> = match implementation {
        "openai" => Box::new(openai::probe()),
        "anthropic" => Box::new(anthropic::AnthropicProbe),
        "gemini" => Box::new(gemini::GeminiProbe),
        "groq" => Box::new(groq::probe()),
        "mistral" => Box::new(mistral::probe()),
        "xai" => Box::new(xai::probe()),
        "deepseek" => Box::new(deepseek::probe()),
        "openrouter" => Box::new(openrouter::OpenRouterProbe),
        "perplexity" => Box::new(perplexity::PerplexityProbe),
        "exa" => Box::new(exa::ExaProbe),
        "amazon-bedrock" => Box::new(bedrock::BedrockProbe),
        "paypal" => Box::new(paypal::PayPalProbe),
        "polar" => Box::new(polar::PolarProbe),
        _ => return None,
    };
    Some(probe)
}

/// No catalog entry has this slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

/// Providers built from a catalog, addressable by slug.
pub struct Registry {
    catalog: Catalog,
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl Registry {
    /// Bind every catalog entry to its probe.
    ///
    /// Fails when an entry names an unknown implementation or declares field
    /// ids that differ from what the implementation reads.
    pub fn build(
        catalog: Catalog,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn ValidationObserver>,
        timeout: Duration,
    ) -> common::Result<Self> {
        let mut providers: HashMap<String, Arc<dyn Provider>> = HashMap::new();
        for descriptor in catalog.providers() {
            let probe = probe_for(&descriptor.implementation).ok_or_else(|| {
                common::Error::Config(format!(
                    "provider `{}` names unknown implementation `{}`",
                    descriptor.slug, descriptor.implementation
                ))
            })?;

            let declared: Vec<&str> = descriptor.required_fields.ids().collect();
            let expected = probe.required_fields();
            let expected: Vec<&str> = expected.ids().collect();
            if declared != expected {
                return Err(common::Error::Config(format!(
                    "provider `{}` declares fields {declared:?} but `{}` reads {expected:?}",
                    descriptor.slug, descriptor.implementation
                )));
            }

            debug!(
                provider = %descriptor.slug,
                implementation = %descriptor.implementation,
                "registered provider"
            );
            let provider = ServiceProvider::new(
                descriptor.clone(),
                probe,
                transport.clone(),
                observer.clone(),
            )
            .with_timeout(timeout);
            providers.insert(descriptor.slug.clone(), Arc::new(provider));
        }
        Ok(Self { catalog, providers })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn resolve(&self, slug: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(slug).cloned()
    }

    /// Resolve `slug` and validate. Unknown slugs are returned as an error so
    /// the caller decides how to surface them.
    pub async fn validate(
        &self,
        slug: &str,
        credentials: &Credentials,
    ) -> Result<ValidationResult, UnknownProvider> {
        let provider = self
            .resolve(slug)
            .ok_or_else(|| UnknownProvider(slug.to_string()))?;
        Ok(provider.validate(credentials).await)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
