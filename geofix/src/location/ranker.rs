//! Provider ranking - builds the ordered candidate list for a session.
//!
//! The list is built once per session start:
//!
//! 1. GPS first, whenever it is enabled
//! 2. The balanced provider chosen from the tier's criteria, if not already listed
//! 3. NETWORK last, whenever it is enabled
//!
//! Order encodes preference: index 0 is tried first.

use std::ops::Index;
use std::sync::Arc;

use tracing::debug;

use super::accuracy::{AccuracyTier, ProviderCriteria};
use super::platform::ProviderCatalog;
use super::reading::ProviderId;

/// Immutable, duplicate-free, ordered list of providers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderList(Arc<[ProviderId]>);

impl ProviderList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProviderId> {
        self.0.get(index)
    }

    /// Index of the provider in the list, if present.
    pub fn position(&self, provider: &ProviderId) -> Option<usize> {
        self.0.iter().position(|p| p == provider)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderId> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ProviderId] {
        &self.0
    }
}

impl Index<usize> for ProviderList {
    type Output = ProviderId;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl FromIterator<ProviderId> for ProviderList {
    /// Collect providers, keeping the first occurrence of each.
    fn from_iter<I: IntoIterator<Item = ProviderId>>(iter: I) -> Self {
        let mut providers: Vec<ProviderId> = Vec::new();
        for provider in iter {
            if !providers.contains(&provider) {
                providers.push(provider);
            }
        }
        Self(providers.into())
    }
}

/// Produce the ordered provider list for a tier.
pub fn rank(tier: AccuracyTier, catalog: &dyn ProviderCatalog) -> ProviderList {
    let mut ranked: Vec<ProviderId> = Vec::new();

    if catalog.is_provider_enabled(&ProviderId::GPS) {
        ranked.push(ProviderId::GPS);
    }

    if let Some(balanced) = balanced_provider(tier, catalog, &ranked) {
        if !ranked.contains(&balanced) {
            ranked.push(balanced);
        }
    }

    if catalog.is_provider_enabled(&ProviderId::NETWORK) && !ranked.contains(&ProviderId::NETWORK)
    {
        ranked.push(ProviderId::NETWORK);
    }

    let list: ProviderList = ranked.into_iter().collect();
    debug!(
        tier = %tier,
        providers = ?list.as_slice(),
        "Ranked location providers"
    );
    list
}

/// Choose the provider that best fits the tier's criteria.
///
/// Falls back to the first enabled provider when nothing matches, even if that
/// provider is already ranked.
fn balanced_provider(
    tier: AccuracyTier,
    catalog: &dyn ProviderCatalog,
    already_ranked: &[ProviderId],
) -> Option<ProviderId> {
    let enabled = catalog.available_providers(false);
    let remaining: Vec<&ProviderId> = enabled
        .iter()
        .filter(|p| !already_ranked.contains(p))
        .collect();

    let criteria = tier.criteria();
    select_matching(&remaining, catalog, criteria)
        .or_else(|| select_matching(&remaining, catalog, criteria.without_power()))
        .or_else(|| enabled.first().cloned())
}

/// Lowest power wins, then finer accuracy, then enumeration order.
fn select_matching(
    candidates: &[&ProviderId],
    catalog: &dyn ProviderCatalog,
    criteria: ProviderCriteria,
) -> Option<ProviderId> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(order, provider)| {
            let capabilities = catalog.capabilities(provider)?;
            criteria
                .matches(&capabilities)
                .then_some((capabilities.power, capabilities.accuracy, order, *provider))
        })
        .min_by_key(|(power, accuracy, order, _)| (*power, *accuracy, *order))
        .map(|(_, _, _, provider)| provider.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::accuracy::{AccuracyClass, PowerUsage, ProviderCapabilities};
    use crate::location::simulator::SimulatedPlatform;
    use proptest::prelude::*;

    fn gps_caps() -> ProviderCapabilities {
        ProviderCapabilities::new(AccuracyClass::Fine, PowerUsage::High)
    }

    fn network_caps() -> ProviderCapabilities {
        ProviderCapabilities::new(AccuracyClass::Coarse, PowerUsage::Low)
    }

    fn standard_platform() -> SimulatedPlatform {
        let platform = SimulatedPlatform::new();
        platform.add_provider(ProviderId::GPS, true, Some(gps_caps()));
        platform.add_provider(ProviderId::NETWORK, true, Some(network_caps()));
        platform.add_provider(ProviderId::PASSIVE, true, None);
        platform
    }

    #[test]
    fn test_fallback_may_pick_unranked_first_provider() {
        let platform = SimulatedPlatform::new();
        platform.add_provider(ProviderId::PASSIVE, true, None);
        platform.add_provider(ProviderId::GPS, true, Some(gps_caps()));
        platform.add_provider(ProviderId::NETWORK, true, Some(network_caps()));

        let list = rank(AccuracyTier::Best, &platform);

        assert_eq!(
            list.as_slice(),
            &[ProviderId::GPS, ProviderId::PASSIVE, ProviderId::NETWORK]
        );
    }

    #[test]
    fn test_gps_always_first() {
        let platform = standard_platform();

        for tier in [
            AccuracyTier::Lowest,
            AccuracyTier::Low,
            AccuracyTier::Medium,
            AccuracyTier::Best,
            AccuracyTier::BestForNavigation,
        ] {
            let list = rank(tier, &platform);
            assert_eq!(list.get(0), Some(&ProviderId::GPS), "tier {}", tier);
        }
    }

    #[test]
    fn test_best_tier_lists_gps_then_network() {
        let platform = standard_platform();

        let list = rank(AccuracyTier::Best, &platform);

        assert_eq!(list.as_slice(), &[ProviderId::GPS, ProviderId::NETWORK]);
    }

    #[test]
    fn test_balanced_provider_inserted_before_network() {
        let platform = standard_platform();
        let fused = ProviderId::FUSED;
        platform.add_provider(
            fused.clone(),
            true,
            Some(ProviderCapabilities::new(AccuracyClass::Fine, PowerUsage::Medium)),
        );

        let list = rank(AccuracyTier::Best, &platform);

        assert_eq!(
            list.as_slice(),
            &[ProviderId::GPS, fused, ProviderId::NETWORK]
        );
    }

    #[test]
    fn test_no_duplicates_when_balanced_is_network() {
        let platform = standard_platform();

        let list = rank(AccuracyTier::Low, &platform);

        assert_eq!(list.as_slice(), &[ProviderId::GPS, ProviderId::NETWORK]);
    }

    #[test]
    fn test_disabled_gps_is_not_ranked() {
        let platform = standard_platform();
        platform.set_provider_enabled(&ProviderId::GPS, false);

        let list = rank(AccuracyTier::Best, &platform);

        assert_eq!(list.get(0), Some(&ProviderId::NETWORK));
        assert!(list.position(&ProviderId::GPS).is_none());
    }

    #[test]
    fn test_fallback_to_first_enabled_provider() {
        let platform = SimulatedPlatform::new();
        let custom = ProviderId::new("beacon");
        platform.add_provider(custom.clone(), true, None);

        let list = rank(AccuracyTier::Best, &platform);

        assert_eq!(list.as_slice(), &[custom]);
    }

    #[test]
    fn test_power_requirement_relaxed_before_fallback() {
        let platform = SimulatedPlatform::new();
        let hungry = ProviderId::new("rtk");
        platform.add_provider(ProviderId::PASSIVE, true, None);
        platform.add_provider(
            hungry.clone(),
            true,
            Some(ProviderCapabilities::new(AccuracyClass::Fine, PowerUsage::High)),
        );

        let list = rank(AccuracyTier::Medium, &platform);

        assert_eq!(list.as_slice(), &[hungry]);
    }

    #[test]
    fn test_empty_when_nothing_available() {
        let platform = SimulatedPlatform::new();
        platform.add_provider(ProviderId::GPS, false, Some(gps_caps()));

        let list = rank(AccuracyTier::Best, &platform);

        assert!(list.is_empty());
    }

    #[test]
    fn test_provider_list_keeps_first_occurrence() {
        let list: ProviderList = vec![
            ProviderId::GPS,
            ProviderId::NETWORK,
            ProviderId::GPS,
            ProviderId::NETWORK,
        ]
        .into_iter()
        .collect();

        assert_eq!(list.len(), 2);
        assert_eq!(list[1], ProviderId::NETWORK);
        assert_eq!(list.position(&ProviderId::NETWORK), Some(1));
    }

    type CatalogEntry = (ProviderId, bool, Option<ProviderCapabilities>);

    fn any_tier() -> impl Strategy<Value = AccuracyTier> {
        prop::sample::select(vec![
            AccuracyTier::Lowest,
            AccuracyTier::Low,
            AccuracyTier::Medium,
            AccuracyTier::Best,
            AccuracyTier::BestForNavigation,
        ])
    }

    fn any_capabilities() -> impl Strategy<Value = Option<ProviderCapabilities>> {
        prop::option::of(
            (
                prop::sample::select(vec![AccuracyClass::Fine, AccuracyClass::Coarse]),
                prop::sample::select(vec![PowerUsage::Low, PowerUsage::Medium, PowerUsage::High]),
            )
                .prop_map(|(accuracy, power)| ProviderCapabilities::new(accuracy, power)),
        )
    }

    /// Well-known plus custom providers in random enumeration order, each with
    /// a random enabled flag and capabilities.
    fn any_catalog() -> impl Strategy<Value = Vec<CatalogEntry>> {
        let ids = vec![
            ProviderId::GPS,
            ProviderId::NETWORK,
            ProviderId::PASSIVE,
            ProviderId::FUSED,
            ProviderId::new("vendor"),
        ];
        let count = ids.len();
        (
            Just(ids).prop_shuffle(),
            prop::collection::vec((any::<bool>(), any_capabilities()), count),
        )
            .prop_map(|(ids, settings)| {
                ids.into_iter()
                    .zip(settings)
                    .map(|(id, (enabled, capabilities))| (id, enabled, capabilities))
                    .collect()
            })
    }

    fn platform_from(catalog: &[CatalogEntry]) -> SimulatedPlatform {
        let platform = SimulatedPlatform::new();
        for (id, enabled, capabilities) in catalog {
            platform.add_provider(id.clone(), *enabled, *capabilities);
        }
        platform
    }

    proptest! {
        /// Property: ranking never lists a provider twice and only lists enabled ones.
        #[test]
        fn prop_rank_is_unique_and_enabled(tier in any_tier(), catalog in any_catalog()) {
            let list = rank(tier, &platform_from(&catalog));

            for (i, provider) in list.iter().enumerate() {
                prop_assert_eq!(list.position(provider), Some(i));
                prop_assert!(catalog
                    .iter()
                    .any(|(id, enabled, _)| id == provider && *enabled));
            }
        }

        /// Property: an enabled GPS is always first and an enabled NETWORK always last.
        #[test]
        fn prop_gps_first_network_last(tier in any_tier(), catalog in any_catalog()) {
            let list = rank(tier, &platform_from(&catalog));
            let enabled = |target: &ProviderId| {
                catalog.iter().any(|(id, enabled, _)| id == target && *enabled)
            };

            if enabled(&ProviderId::GPS) {
                prop_assert_eq!(list.get(0), Some(&ProviderId::GPS));
            }
            if enabled(&ProviderId::NETWORK) {
                prop_assert_eq!(list.as_slice().last(), Some(&ProviderId::NETWORK));
            }
        }

        /// Property: the list is empty only when no provider is enabled.
        #[test]
        fn prop_rank_empty_only_without_enabled_providers(
            tier in any_tier(),
            catalog in any_catalog(),
        ) {
            let list = rank(tier, &platform_from(&catalog));
            let any_enabled = catalog.iter().any(|(_, enabled, _)| *enabled);

            prop_assert_eq!(list.is_empty(), !any_enabled);
        }
    }
}
