//! Startup wiring: catalog load and the blocking price pre-warm

use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::bot::commands::{CommandRouter, FaqCommand};
use crate::cache::PriceCache;
use crate::catalog::CardCatalog;
use crate::common::errors::{BotError, Result};
use crate::common::traits::PriceProvider;
use crate::config::types::AppConfig;
use crate::faq::FaqRepository;
use crate::pricing::{IdentifierMap, TcgPlayerClient};
use crate::query::CardQueryService;

/// Outcome of the startup pre-warm
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrewarmReport {
    /// Snapshots stored in the cache
    pub loaded: usize,
    /// True when the bulk fetch failed and the bot starts with a cold cache
    pub degraded: bool,
    /// Failure message, if any
    pub error: Option<String>,
}

/// Fetch every price and load it into the cache
///
/// Must be awaited before queries are served. A failed fetch does not abort
/// startup: the bot comes up degraded, keeping whatever pages did arrive, and
/// the rest is fetched on demand.
#[instrument(skip(provider, cache))]
pub async fn prewarm(provider: &dyn PriceProvider, cache: &PriceCache) -> PrewarmReport {
    info!("Fetching {} price data", provider.source_name());

    match provider.fetch_all().await {
        Ok(prices) => {
            let loaded = cache.warm(prices);
            info!(count = loaded, "Loaded {} card prices from {}", loaded, provider.source_name());
            PrewarmReport {
                loaded,
                degraded: false,
                error: None,
            }
        }
        Err(BotError::PartialPriceFetch { message, prices }) => {
            let loaded = cache.warm(prices);
            warn!(
                loaded,
                "Price pre-warm incomplete, starting degraded with a partial cache: {}", message
            );
            PrewarmReport {
                loaded,
                degraded: true,
                error: Some(message),
            }
        }
        Err(e) => {
            let loaded = cache.len();
            warn!(
                cached = loaded,
                "Price pre-warm failed, starting degraded with on-demand pricing: {}", e
            );
            PrewarmReport {
                loaded,
                degraded: true,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Everything the command layer needs, constructed once at startup
pub struct BotCore {
    pub catalog: Arc<CardCatalog>,
    pub cache: Arc<PriceCache>,
    pub provider: Arc<dyn PriceProvider>,
    pub service: CardQueryService,
    pub faq: Arc<FaqRepository>,
    pub prewarm: Option<PrewarmReport>,
}

impl BotCore {
    /// Load the catalog and FAQ, build the TCGplayer client and run the pre-warm
    ///
    /// A catalog failure or a malformed FAQ file is fatal; a missing FAQ
    /// file only leaves `/faq` empty.
    pub async fn start(config: &AppConfig, run_prewarm: bool) -> Result<Self> {
        let catalog = Arc::new(CardCatalog::load(Path::new(&config.catalog.path))?);
        let faq = load_faq(Path::new(&config.faq.path))?;
        let ids = IdentifierMap::from_catalog(&catalog);
        let provider: Arc<dyn PriceProvider> = Arc::new(TcgPlayerClient::new(&config.tcgplayer, ids)?);
        Ok(Self::assemble(catalog, provider, config, run_prewarm)
            .await
            .with_faq(faq))
    }

    /// Wire the core from an already loaded catalog and any provider
    pub async fn assemble(
        catalog: Arc<CardCatalog>,
        provider: Arc<dyn PriceProvider>,
        config: &AppConfig,
        run_prewarm: bool,
    ) -> Self {
        let cache = Arc::new(PriceCache::for_catalog(&catalog, config.cache.freshness()));

        let prewarm = if run_prewarm {
            Some(prewarm(provider.as_ref(), &cache).await)
        } else {
            info!("Skipping price pre-warm; prices will be fetched on demand");
            None
        };

        let service = CardQueryService::new(
            catalog.clone(),
            cache.clone(),
            provider.clone(),
            config.query.max_results,
        );

        Self {
            catalog,
            cache,
            provider,
            service,
            faq: Arc::new(FaqRepository::empty()),
            prewarm,
        }
    }

    /// Replace the FAQ served by `/faq`
    pub fn with_faq(mut self, faq: FaqRepository) -> Self {
        self.faq = Arc::new(faq);
        self
    }

    /// Command table over this core: `/card`, `/price` and `/faq`
    pub fn router(&self) -> CommandRouter {
        let mut router = CommandRouter::with_defaults(self.service.clone());
        router.register(Arc::new(FaqCommand::new(self.faq.clone())));
        router
    }
}

fn load_faq(path: &Path) -> Result<FaqRepository> {
    if !path.exists() {
        warn!("FAQ file {} not found; /faq has no entries", path.display());
        return Ok(FaqRepository::empty());
    }
    FaqRepository::load(path)
}
