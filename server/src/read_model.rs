//! Assembling the latest status from the durable log and the cache.
//!
//! The cache may be ahead of the durable read path right after a write, and
//! it may be stale within its TTL. The rule is: the cache answer wins only
//! when its event timestamp is strictly newer than the durable one; on a tie
//! or anything older the durable store wins. A cache hit with no durable
//! counterpart wins by the same rule.

use sykmelding_status_core::{CachedStatus, SykmeldingStatusEvent};

/// Pick the freshest of the durable answer and a (already freshness-checked)
/// cache hit.
#[must_use]
pub fn freshest(
    durable: Option<SykmeldingStatusEvent>,
    cached: Option<CachedStatus>,
) -> Option<SykmeldingStatusEvent> {
    match (durable, cached) {
        (Some(durable), Some(cached)) => {
            if cached.event.timestamp > durable.timestamp {
                Some(cached.event)
            } else {
                Some(durable)
            }
        }
        (Some(durable), None) => Some(durable),
        (None, Some(cached)) => Some(cached.event),
        (None, None) => None,
    }
}
