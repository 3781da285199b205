/// Read-through caching around an async computation.
///
/// Returns the cached value when present. On a miss, or when the cache itself
/// fails, awaits `$block`, queues its result for a background write with `$ttl`
/// seconds to live, and returns it. Cache errors are logged and never propagated;
/// errors from `$block` are, via `?`.
///
/// # Example
/// ```rust,ignore
/// let ranking: Vec<TrendingEntry> = cached!(
///     self.cache,
///     CacheKey::Trending { period: period.to_string(), limit },
///     self.trending_ttl,
///     self.inner.trending(period, limit)
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, using source");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
