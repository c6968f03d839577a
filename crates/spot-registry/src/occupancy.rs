//! Occupancy batches and the staleness sweep.
//!
//! These operations change only live telemetry, so they never call the
//! store. Batches are best-effort: an out-of-range position is recorded and
//! skipped, the rest of the batch is still applied, and the call then fails
//! with every rejected position listed. Valid entries are never rolled back.

use chrono::{DateTime, Utc};
use spot_types::GarageId;
use tracing::{debug, info, warn};

use crate::error::{InvalidPositions, RegistryError, RegistryResult};
use crate::model::Section;
use crate::registry::GarageRegistry;

/// One sensor report in an update batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpotUpdate {
    /// 1-based position. Anything outside the section's range is rejected.
    pub number: i64,
    /// Replaces the spot's label when non-empty.
    pub label: String,
    pub taken: bool,
}

impl SpotUpdate {
    pub fn new(number: i64, taken: bool) -> Self {
        Self {
            number,
            label: String::new(),
            taken,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Outcome of a batch in which every entry was valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Entries applied.
    pub applied: usize,
    /// Entries that left their spot as it was (disconnecting an offline spot).
    pub unchanged: usize,
}

impl GarageRegistry {
    /// Apply sensor reports to one section.
    ///
    /// Each in-range entry puts its spot online with the reported occupancy
    /// and a fresh timestamp.
    pub async fn apply_update(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        updates: &[SpotUpdate],
    ) -> RegistryResult<BatchSummary> {
        self.apply_update_at(garage_id, section_name, updates, Utc::now())
            .await
    }

    /// Apply a batch as if it were reported at `now`.
    pub async fn apply_update_at(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        updates: &[SpotUpdate],
        now: DateTime<Utc>,
    ) -> RegistryResult<BatchSummary> {
        self.with_section(garage_id, section_name, |section, rejected| {
            let mut summary = BatchSummary::default();
            for update in updates {
                let Some(index) = section.index_of(update.number) else {
                    rejected.push(update.number);
                    continue;
                };
                section.report(index, &update.label, update.taken, now);
                summary.applied += 1;
                debug!(
                    garage_id = %garage_id,
                    section = %section_name,
                    position = update.number,
                    label = %section.spots()[index].label,
                    taken = update.taken,
                    "spot updated"
                );
            }
            summary
        })
        .await
    }

    /// Take spots of one section offline.
    ///
    /// Positions that are already offline are skipped silently.
    pub async fn apply_disconnect(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        positions: &[i64],
    ) -> RegistryResult<BatchSummary> {
        self.with_section(garage_id, section_name, |section, rejected| {
            let mut summary = BatchSummary::default();
            for &number in positions {
                let Some(index) = section.index_of(number) else {
                    rejected.push(number);
                    continue;
                };
                summary.applied += 1;
                if section.disconnect(index) {
                    debug!(
                        garage_id = %garage_id,
                        section = %section_name,
                        position = number,
                        "spot disconnected"
                    );
                } else {
                    summary.unchanged += 1;
                }
            }
            summary
        })
        .await
    }

    /// Clear every online spot whose last report is older than the
    /// configured threshold. Returns the number of spots cleared.
    pub async fn invalidate_stale_spots(&self) -> usize {
        self.invalidate_stale_spots_at(Utc::now()).await
    }

    /// Sweep as if the current time were `now`.
    pub async fn invalidate_stale_spots_at(&self, now: DateTime<Utc>) -> usize {
        let stale_after = self.config.stale_after;
        let mut garages = self.garages.write().await;
        let mut cleared = 0;

        for garage in garages.values_mut() {
            for section in &mut garage.sections {
                for index in 0..section.spots().len() {
                    let spot = &section.spots()[index];
                    if !spot.online {
                        continue;
                    }
                    let stale = match spot.last_update {
                        Some(at) => matches!((now - at).to_std(), Ok(age) if age > stale_after),
                        None => true,
                    };
                    if stale && section.disconnect(index) {
                        cleared += 1;
                    }
                }
                debug_assert_eq!(section.free_spots(), section.counted_free());
            }
        }

        if cleared > 0 {
            info!(cleared, "stale spots invalidated");
        }
        cleared
    }

    /// Run `apply` on one section under the exclusive lock and turn any
    /// positions it rejected into an error after the fact.
    async fn with_section<F>(
        &self,
        garage_id: &GarageId,
        section_name: &str,
        apply: F,
    ) -> RegistryResult<BatchSummary>
    where
        F: FnOnce(&mut Section, &mut Vec<i64>) -> BatchSummary,
    {
        let mut garages = self.garages.write().await;
        let garage = garages
            .get_mut(garage_id)
            .ok_or_else(|| RegistryError::GarageNotFound(garage_id.clone()))?;
        let garage_name = garage.name.clone();
        let index = garage
            .section_index(section_name)
            .ok_or_else(|| RegistryError::SectionNotFound {
                garage_id: garage_id.clone(),
                section: section_name.to_string(),
            })?;
        let section = &mut garage.sections[index];

        let mut rejected = Vec::new();
        let summary = apply(section, &mut rejected);
        debug_assert_eq!(section.free_spots(), section.counted_free());

        if rejected.is_empty() {
            return Ok(summary);
        }
        warn!(
            garage_id = %garage_id,
            section = %section_name,
            rejected = rejected.len(),
            applied = summary.applied,
            "batch contained invalid spot numbers"
        );
        Err(RegistryError::InvalidPositions(InvalidPositions {
            garage_id: garage_id.clone(),
            garage_name,
            section: section_name.to_string(),
            total_spots: section.total_spots(),
            positions: rejected,
            applied: summary.applied,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use spot_store::InMemoryGarageStore;
    use spot_types::{NewGarage, SectionPatch, SectionRecord};
    use std::sync::Arc;

    async fn setup(total: u32) -> (GarageRegistry, GarageId) {
        let store = Arc::new(InMemoryGarageStore::new());
        let reg = GarageRegistry::new(store, RegistryConfig::default());
        let g = reg
            .create_garage(NewGarage {
                name: "G".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        reg.create_section(
            &g.id,
            SectionRecord {
                name: "A1".into(),
                total_spots: total,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (reg, g.id)
    }

    async fn free(reg: &GarageRegistry, id: &GarageId) -> u32 {
        reg.section(id, "A1").await.unwrap().free_spots
    }

    async fn assert_counter_matches(reg: &GarageRegistry, id: &GarageId) {
        let spots = reg.spots(id, "A1").await.unwrap();
        let counted = spots.iter().filter(|s| s.is_free()).count() as u32;
        assert_eq!(free(reg, id).await, counted);
    }

    #[tokio::test]
    async fn update_puts_spots_online() {
        let (reg, id) = setup(10).await;
        let summary = reg
            .apply_update(
                &id,
                "A1",
                &[SpotUpdate::new(1, false).with_label("EV"), SpotUpdate::new(2, true)],
            )
            .await
            .unwrap();
        assert_eq!(summary.applied, 2);
        assert_eq!(free(&reg, &id).await, 1);

        let spots = reg.spots(&id, "A1").await.unwrap();
        assert!(spots[0].online && !spots[0].taken);
        assert_eq!(spots[0].label, "EV");
        assert!(spots[0].last_update.is_some());
        assert!(spots[1].online && spots[1].taken);
        assert!(!spots[2].online);
        assert_eq!(reg.garage(&id).await.unwrap().free_spots, 1);
    }

    #[tokio::test]
    async fn batch_is_best_effort() {
        let (reg, id) = setup(10).await;
        let err = reg
            .apply_update(&id, "A1", &[SpotUpdate::new(3, false), SpotUpdate::new(999, false)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let RegistryError::InvalidPositions(invalid) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(invalid.positions, vec![999]);
        assert_eq!(invalid.applied, 1);
        assert!(err.to_string().contains("999"));
        assert_eq!(err.to_string().lines().count(), 1);

        let spots = reg.spots(&id, "A1").await.unwrap();
        assert!(spots[2].online);
        assert_eq!(free(&reg, &id).await, 1);
    }

    #[tokio::test]
    async fn every_invalid_position_is_reported() {
        let (reg, id) = setup(5).await;
        let err = reg
            .apply_disconnect(&id, "A1", &[0, 2, -4, 6])
            .await
            .unwrap_err();
        let RegistryError::InvalidPositions(invalid) = err else {
            panic!("expected invalid positions");
        };
        assert_eq!(invalid.positions, vec![0, -4, 6]);
        assert_eq!(invalid.total_spots, 5);
    }

    #[tokio::test]
    async fn repeated_free_reports_count_once() {
        let (reg, id) = setup(3).await;
        for _ in 0..3 {
            reg.apply_update(&id, "A1", &[SpotUpdate::new(1, false)])
                .await
                .unwrap();
        }
        assert_eq!(free(&reg, &id).await, 1);
    }

    #[tokio::test]
    async fn offline_to_taken_does_not_decrement() {
        let (reg, id) = setup(3).await;
        reg.apply_update(&id, "A1", &[SpotUpdate::new(1, false)])
            .await
            .unwrap();
        reg.apply_update(&id, "A1", &[SpotUpdate::new(2, true)])
            .await
            .unwrap();
        assert_eq!(free(&reg, &id).await, 1);
        assert_counter_matches(&reg, &id).await;
    }

    #[tokio::test]
    async fn disconnect_offline_spot_is_noop() {
        let (reg, id) = setup(3).await;
        let summary = reg.apply_disconnect(&id, "A1", &[1, 2]).await.unwrap();
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(free(&reg, &id).await, 0);
    }

    #[tokio::test]
    async fn unknown_section_is_not_found() {
        let (reg, id) = setup(3).await;
        let err = reg
            .apply_update(&id, "B1", &[SpotUpdate::new(1, false)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let missing = GarageId::parse("ffffffff").unwrap();
        let err = reg.apply_disconnect(&missing, "A1", &[1]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn sweep_clears_only_stale_spots() {
        let (reg, id) = setup(4).await;
        reg.apply_update(
            &id,
            "A1",
            &[SpotUpdate::new(1, false).with_label("L"), SpotUpdate::new(2, true)],
        )
        .await
        .unwrap();

        // reported just now
        assert_eq!(reg.invalidate_stale_spots().await, 0);
        assert_eq!(free(&reg, &id).await, 1);

        let later = Utc::now() + chrono::Duration::minutes(21);
        assert_eq!(reg.invalidate_stale_spots_at(later).await, 2);
        let spots = reg.spots(&id, "A1").await.unwrap();
        for spot in &spots[..2] {
            assert!(!spot.online);
            assert!(!spot.taken);
            assert!(spot.label.is_empty());
            assert!(spot.last_update.is_none());
        }
        assert_eq!(free(&reg, &id).await, 0);
    }

    #[tokio::test]
    async fn sweep_respects_threshold_boundary() {
        let (reg, id) = setup(2).await;
        reg.apply_update(&id, "A1", &[SpotUpdate::new(1, false)])
            .await
            .unwrap();
        let at = reg.spots(&id, "A1").await.unwrap()[0].last_update.unwrap();

        let threshold = chrono::Duration::minutes(20);
        assert_eq!(reg.invalidate_stale_spots_at(at + threshold).await, 0);
        assert_eq!(
            reg.invalidate_stale_spots_at(at + threshold + chrono::Duration::seconds(1))
                .await,
            1
        );
    }

    #[tokio::test]
    async fn resize_resets_occupancy() {
        let (reg, id) = setup(10).await;
        let all: Vec<_> = (1..=10).map(|n| SpotUpdate::new(n, false)).collect();
        reg.apply_update(&id, "A1", &all).await.unwrap();
        assert_eq!(free(&reg, &id).await, 10);

        let view = reg
            .update_section(
                &id,
                "A1",
                &SectionPatch {
                    total_spots: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(view.free_spots, 0);
        assert_eq!(view.total_spots, 5);
        let spots = reg.spots(&id, "A1").await.unwrap();
        assert_eq!(spots.len(), 5);
        assert!(spots.iter().all(|s| !s.online));
    }

    #[tokio::test]
    async fn failed_resize_keeps_occupancy() {
        let store = Arc::new(InMemoryGarageStore::new());
        let reg = GarageRegistry::new(store.clone(), RegistryConfig::default());
        let g = reg.create_garage(NewGarage::default()).await.unwrap();
        reg.create_section(
            &g.id,
            SectionRecord {
                name: "A1".into(),
                total_spots: 4,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        reg.apply_update(&g.id, "A1", &[SpotUpdate::new(1, false)])
            .await
            .unwrap();

        store.set_failing(true);
        let patch = SectionPatch {
            total_spots: Some(2),
            ..Default::default()
        };
        assert!(reg.update_section(&g.id, "A1", &patch).await.is_err());
        let view = reg.section(&g.id, "A1").await.unwrap();
        assert_eq!(view.total_spots, 4);
        assert_eq!(view.free_spots, 1);
    }

    #[tokio::test]
    async fn end_to_end_fill_and_drain() {
        let store = Arc::new(InMemoryGarageStore::new());
        let reg = GarageRegistry::new(store, RegistryConfig::default());
        let g = reg
            .create_garage(NewGarage {
                name: "G".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        reg.create_section(
            &g.id,
            SectionRecord {
                name: "A1".into(),
                total_spots: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updates: Vec<_> = (1..=10).map(|n| SpotUpdate::new(n, false)).collect();
        reg.apply_update(&g.id, "A1", &updates).await.unwrap();
        assert_eq!(reg.section(&g.id, "A1").await.unwrap().free_spots, 10);

        let positions: Vec<i64> = (1..=10).collect();
        reg.apply_disconnect(&g.id, "A1", &positions).await.unwrap();
        assert_eq!(reg.section(&g.id, "A1").await.unwrap().free_spots, 0);
        assert!(reg
            .spots(&g.id, "A1")
            .await
            .unwrap()
            .iter()
            .all(|s| !s.online));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Update(Vec<(i64, bool)>),
        Disconnect(Vec<i64>),
        Sweep { minutes: i64 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop::collection::vec((-1i64..12, any::<bool>()), 0..8).prop_map(Op::Update),
            prop::collection::vec(-1i64..12, 0..8).prop_map(Op::Disconnect),
            (0i64..40).prop_map(|minutes| Op::Sweep { minutes }),
        ]
    }

    proptest! {
        #[test]
        fn free_counter_tracks_spot_states(ops in prop::collection::vec(op(), 1..40)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let (reg, id) = setup(10).await;
                for op in ops {
                    match op {
                        Op::Update(entries) => {
                            let updates: Vec<_> = entries
                                .into_iter()
                                .map(|(n, taken)| SpotUpdate::new(n, taken))
                                .collect();
                            let _ = reg.apply_update(&id, "A1", &updates).await;
                        }
                        Op::Disconnect(positions) => {
                            let _ = reg.apply_disconnect(&id, "A1", &positions).await;
                        }
                        Op::Sweep { minutes } => {
                            let at = Utc::now() + chrono::Duration::minutes(minutes);
                            reg.invalidate_stale_spots_at(at).await;
                        }
                    }
                    assert_counter_matches(&reg, &id).await;
                }
            });
        }
    }
}
