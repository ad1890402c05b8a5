//! Integration tests for the card query service, price cache and startup
//! pre-warm, with a mocked price provider

mod common;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use common::{fox_catalog, fox_price, sample_catalog, usd};
use mockall::mock;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sorcery_bot::{
    AppConfig, BotCore, BotError, CardCatalog, CardQueryService, CommandRouter, FaqRepository,
    MatchKind, PriceCache, PriceProvider, PriceSnapshot, PriceStatus, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Provider {}

    #[async_trait]
    impl PriceProvider for Provider {
        async fn fetch_all(&self) -> Result<HashMap<String, PriceSnapshot>>;
        async fn fetch_one(&self, card_id: &str) -> Result<PriceSnapshot>;
        fn source_name(&self) -> &'static str;
    }
}

fn provider() -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_source_name().return_const("mock");
    provider
}

fn build_service(
    catalog: CardCatalog,
    cache: Arc<PriceCache>,
    provider: MockProvider,
) -> CardQueryService {
    CardQueryService::new(Arc::new(catalog), cache, Arc::new(provider), 25)
}

/// Poll until the cached price for `card_id` matches `predicate`
async fn wait_for_cache<F>(cache: &PriceCache, card_id: &str, predicate: F)
where
    F: Fn(&PriceSnapshot) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if cache.get(card_id).as_ref().is_some_and(&predicate) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("cache never reached the expected state");
}

// ============================================================================
// Avatar of the Fox walkthrough
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_fresh_cached_price_is_served_without_fetch() {
    let catalog = fox_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));
    cache.put("C1", fox_price());

    let mut provider = provider();
    provider.expect_fetch_one().times(0);
    let service = build_service(catalog, cache, provider);

    let results = service.query("avatar of the fox").await;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.card.id, "C1");
    assert_eq!(result.card.set, "Alpha");
    assert_eq!(result.card.card_type, "Avatar");
    assert_eq!(result.match_kind, MatchKind::Exact);
    assert!(!result.stale);
    assert_eq!(result.price.snapshot().map(|s| s.value), Some(dec!(2.50)));
}

#[test_log::test(tokio::test)]
async fn test_stale_price_is_served_then_refreshed() {
    let catalog = fox_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));
    let old = PriceSnapshot::at("C1", dec!(2.50), "USD", "tcgplayer", Utc::now() - ChronoDuration::hours(25));
    cache.put("C1", old);

    let mut provider = provider();
    provider
        .expect_fetch_one()
        .times(1)
        .returning(|card_id| Ok(usd(card_id, dec!(2.75))));
    let service = build_service(catalog, cache.clone(), provider);

    // Messy input still lands on the exact name
    let results = service.query("  Avatar of the FOX! ").await;
    assert_eq!(results.len(), 1);
    assert!(results[0].stale);
    assert_eq!(results[0].price.snapshot().map(|s| s.value), Some(dec!(2.50)));

    wait_for_cache(&cache, "C1", |s| s.value == dec!(2.75)).await;
    assert!(!cache.is_stale(&cache.get("C1").unwrap()));

    let results = service.query("avatar of the fox").await;
    assert!(!results[0].stale);
    assert_eq!(results[0].price.snapshot().map(|s| s.value), Some(dec!(2.75)));
}

#[test_log::test(tokio::test)]
async fn test_failed_refresh_keeps_stale_price() {
    let catalog = fox_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));
    let old = PriceSnapshot::at("C1", dec!(2.50), "USD", "tcgplayer", Utc::now() - ChronoDuration::hours(30));
    cache.put("C1", old.clone());

    let mut provider = provider();
    provider
        .expect_fetch_one()
        .returning(|_| Err(BotError::ProviderUnavailable("maintenance".to_string())));
    let service = build_service(catalog, cache.clone(), provider);

    let results = service.query("avatar of the fox").await;
    assert!(results[0].stale);

    tokio::time::timeout(Duration::from_secs(5), async {
        while service.refreshes_in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("refresh never finished");

    assert_eq!(cache.get("C1"), Some(old));
}

// ============================================================================
// Query behavior
// ============================================================================

#[tokio::test]
async fn test_one_failing_price_does_not_fail_the_query() {
    let catalog = sample_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));

    let mut provider = provider();
    provider.expect_fetch_one().times(2).returning(|card_id| {
        if card_id.to_string() == "C2" {
            Err(BotError::ProviderUnavailable("upstream 503".to_string()))
        } else {
            Ok(usd(card_id, dec!(0.40)))
        }
    });
    let service = build_service(catalog, cache.clone(), provider);

    let results = service.query("Apprentice Wizard").await;

    let ids: Vec<&str> = results.iter().map(|r| r.card.id.as_str()).collect();
    assert_eq!(ids, vec!["C2", "C4"]);
    assert!(results.iter().all(|r| r.match_kind == MatchKind::Exact));
    assert_eq!(results[0].price, PriceStatus::Unavailable);
    assert_eq!(results[1].price.snapshot().map(|s| s.value), Some(dec!(0.40)));

    // Only the successful fetch is written back
    assert!(cache.get("C2").is_none());
    assert!(cache.get("C4").is_some());
}

#[tokio::test]
async fn test_match_classes() {
    let mut provider = provider();
    provider
        .expect_fetch_one()
        .returning(|card_id| Err(BotError::NotFound(card_id.to_string())));
    let catalog = sample_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));
    let service = build_service(catalog, cache, provider);

    let prefix = service.query("apprentice").await;
    assert_eq!(prefix.len(), 2);
    assert!(prefix.iter().all(|r| r.match_kind == MatchKind::Prefix));

    let fuzzy = service.query("vipers").await;
    assert_eq!(fuzzy.len(), 1);
    assert_eq!(fuzzy[0].card.id, "C3");
    assert_eq!(fuzzy[0].match_kind, MatchKind::Fuzzy);

    // All tokens present, any order
    let tokens = service.query("fox avatar").await;
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].card.id, "C1");
    assert_eq!(tokens[0].match_kind, MatchKind::Fuzzy);

    let apostrophe = service.query("philosophers stone").await;
    assert_eq!(apostrophe.len(), 1);
    assert_eq!(apostrophe[0].match_kind, MatchKind::Exact);

    assert!(service.query("dragon").await.is_empty());
    assert!(service.query("").await.is_empty());
}

#[tokio::test]
async fn test_result_cap() {
    let mut provider = provider();
    provider
        .expect_fetch_one()
        .returning(|card_id| Ok(usd(card_id, dec!(1))));
    let catalog = sample_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));
    let service = CardQueryService::new(Arc::new(catalog), cache, Arc::new(provider), 1);

    let results = service.query("apprentice wizard").await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].card.id, "C2");
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_share_the_cache() {
    let catalog = sample_catalog();
    let cache = Arc::new(PriceCache::for_catalog(&catalog, ChronoDuration::hours(24)));

    let mut provider = provider();
    provider
        .expect_fetch_one()
        .returning(|card_id| Ok(usd(card_id, dec!(0.40))));
    let service = build_service(catalog, cache.clone(), provider);

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let service = service.clone();
            let input = if i % 2 == 0 { "apprentice wizard" } else { "pit vipers" };
            tokio::spawn(async move { service.query(input).await })
        })
        .collect();

    for handle in handles {
        let results = handle.await.expect("query task panicked");
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.price.is_available()));
    }

    assert_eq!(cache.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_to_distinct_keys() {
    let cache = Arc::new(PriceCache::new(ChronoDuration::hours(24)));

    let handles: Vec<_> = (0..64u32)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let id = format!("C{}", i);
                cache.put(&id, usd(&id, Decimal::from(i)));
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.len(), 64);
    for i in 0..64u32 {
        let id = format!("C{}", i);
        let snapshot = cache.get(&id).expect("every key was written");
        assert_eq!(snapshot.card_id, id);
        assert_eq!(snapshot.value, Decimal::from(i));
    }
}

// ============================================================================
// Startup and commands
// ============================================================================

#[test_log::test(tokio::test)]
async fn test_prewarm_then_price_command() {
    let mut provider = provider();
    provider.expect_fetch_all().times(1).returning(|| {
        let mut prices = HashMap::new();
        prices.insert("C2".to_string(), usd("C2", dec!(0.40)));
        prices.insert("C4".to_string(), usd("C4", dec!(0.15)));
        // Provider knows a card the catalog does not
        prices.insert("X9".to_string(), usd("X9", dec!(8)));
        Ok(prices)
    });
    provider.expect_fetch_one().times(0);

    let core = BotCore::assemble(
        Arc::new(sample_catalog()),
        Arc::new(provider),
        &AppConfig::default(),
        true,
    )
    .await;

    let report = core.prewarm.clone().expect("pre-warm ran");
    assert_eq!(report.loaded, 2);
    assert!(!report.degraded);
    assert_eq!(core.cache.len(), 2);

    let router = CommandRouter::with_defaults(core.service.clone());
    let response = router
        .dispatch_line("/price apprentice wizard")
        .await
        .expect("price command is registered");

    assert_eq!(
        response.lines,
        vec![
            "Apprentice Wizard (Beta) - Minion: $0.15 USD".to_string(),
            "Apprentice Wizard (Alpha) - Minion: $0.40 USD".to_string(),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn test_degraded_start_falls_back_to_on_demand() {
    let mut provider = provider();
    provider
        .expect_fetch_all()
        .times(1)
        .returning(|| Err(BotError::PriceFetch("page 1 of 1 failed".to_string())));
    provider
        .expect_fetch_one()
        .times(1)
        .returning(|card_id| Ok(usd(card_id, dec!(2.50))));

    let core = BotCore::assemble(
        Arc::new(fox_catalog()),
        Arc::new(provider),
        &AppConfig::default(),
        true,
    )
    .await;

    let report = core.prewarm.clone().unwrap();
    assert!(report.degraded);
    assert_eq!(report.loaded, 0);
    assert!(report.error.unwrap().contains("page 1 of 1"));

    let router = CommandRouter::with_defaults(core.service.clone());
    let response = router.dispatch_line("avatar of the fox").await.unwrap();
    assert_eq!(response.render(), "Avatar of the Fox (Alpha) - Avatar: $2.50 USD");
    assert_eq!(core.cache.len(), 1);
}

#[tokio::test]
async fn test_unknown_card_reply() {
    let mut provider = provider();
    provider.expect_fetch_one().times(0);

    let core = BotCore::assemble(
        Arc::new(fox_catalog()),
        Arc::new(provider),
        &AppConfig::default(),
        false,
    )
    .await;
    assert!(core.prewarm.is_none());

    let router = CommandRouter::with_defaults(core.service.clone());
    let response = router.dispatch_line("/card dragon").await.unwrap();
    assert_eq!(response.render(), "No cards found for 'dragon'.");
}

#[tokio::test]
async fn test_faq_and_card_commands_share_one_router() {
    let mut provider = provider();
    provider.expect_fetch_one().times(0);

    let faq = FaqRepository::from_json(
        r#"{ "entries": [
            { "topic": "Tapping", "aliases": ["tapped"], "answer": "Tapped units cannot attack." },
            { "topic": "Mulligan", "answer": "Bottom up to three cards and redraw." }
        ] }"#,
    )
    .unwrap();

    let core = BotCore::assemble(
        Arc::new(fox_catalog()),
        Arc::new(provider),
        &AppConfig::default(),
        false,
    )
    .await
    .with_faq(faq);
    let router = core.router();

    let (response, log) = router.dispatch_logged("faq", "TAPPED").await.unwrap();
    assert_eq!(response.render(), "Tapping: Tapped units cannot attack.");
    assert_eq!(log.command, "faq");
    assert_eq!(log.results, 1);

    let topics = router.dispatch_line("/faq").await.unwrap();
    assert_eq!(topics.render(), "FAQ topics: Tapping, Mulligan");

    let (response, log) = router.dispatch_logged("card", "dragon").await.unwrap();
    assert_eq!(response.render(), "No cards found for 'dragon'.");
    assert_eq!(log.results, 0);
}
