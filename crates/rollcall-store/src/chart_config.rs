//! Chart configuration store: named chart slots, each owning a filter
//! specification and the chart and table output derived from it.
//!
//! Exactly one slot is active at a time. Changing the active slot's
//! specification re-derives that slot only. Other slots keep their last
//! output and are re-derived lazily when activated if the record snapshot
//! has moved on since.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use rollcall_core::defaults::{FIRST_SLOT_ID, SLOT_ID_PREFIX};
use rollcall_core::{Error, FilterPatch, FilterSpecification, Result, WorkshopRecord};
use rollcall_filter::{apply, filter_for_table, ChartDataset, TableView};

use crate::persistence::{ChartBlob, PersistedChart};

/// Output derived for one slot from one record snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    /// Record snapshot generation this view was computed from.
    pub generation: u64,
    pub dataset: ChartDataset,
    pub table: TableView,
}

/// One chart view.
#[derive(Debug, Clone)]
pub struct ChartSlot {
    id: String,
    spec: FilterSpecification,
    derived: Option<DerivedView>,
}

impl ChartSlot {
    fn new(id: String, spec: FilterSpecification) -> Self {
        Self {
            id,
            spec,
            derived: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spec(&self) -> &FilterSpecification {
        &self.spec
    }

    /// Last derived output, possibly from an older snapshot.
    pub fn view(&self) -> Option<&DerivedView> {
        self.derived.as_ref()
    }

    pub fn is_stale(&self, generation: u64) -> bool {
        self.derived
            .as_ref()
            .map_or(true, |view| view.generation != generation)
    }

    /// Re-derive when stale, then return the current view.
    fn refresh(&mut self, records: &[WorkshopRecord], generation: u64) -> &DerivedView {
        let view = match self.derived.take() {
            Some(view) if view.generation == generation => view,
            _ => derive_view(records, generation, &self.id, &self.spec),
        };
        self.derived.insert(view)
    }

    /// Re-derive unconditionally.
    fn rederive(&mut self, records: &[WorkshopRecord], generation: u64) -> &DerivedView {
        self.derived = None;
        self.refresh(records, generation)
    }
}

fn derive_view(
    records: &[WorkshopRecord],
    generation: u64,
    slot_id: &str,
    spec: &FilterSpecification,
) -> DerivedView {
    let rows = apply(records, spec);
    let dataset = ChartDataset::from_rows(&rows, spec);
    let table = if spec.categorize {
        TableView::build(records, &filter_for_table(records, spec))
    } else {
        TableView::build(records, &rows)
    };

    debug!(
        slot_id,
        generation,
        record_count = records.len(),
        result_count = dataset.len(),
        "Chart slot derived"
    );

    DerivedView {
        generation,
        dataset,
        table,
    }
}

/// All chart slots plus the record snapshot they derive from.
#[derive(Debug, Clone)]
pub struct ChartConfigurationStore {
    slots: Vec<ChartSlot>,
    active: usize,
    records: Arc<Vec<WorkshopRecord>>,
    generation: u64,
}

impl ChartConfigurationStore {
    /// Store with a single active slot holding an empty specification.
    pub fn new(records: Arc<Vec<WorkshopRecord>>, generation: u64) -> Self {
        let mut store = Self {
            slots: vec![ChartSlot::new(
                FIRST_SLOT_ID.to_string(),
                FilterSpecification::new(),
            )],
            active: 0,
            records,
            generation,
        };
        store.slots[0].refresh(&store.records, generation);
        store
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn slots(&self) -> &[ChartSlot] {
        &self.slots
    }

    pub fn slot(&self, id: &str) -> Option<&ChartSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.slots[self.active].id
    }

    pub fn active_spec(&self) -> &FilterSpecification {
        &self.slots[self.active].spec
    }

    /// Current output of the active slot.
    pub fn active_view(&mut self) -> &DerivedView {
        self.slots[self.active].refresh(&self.records, self.generation)
    }

    pub fn records(&self) -> &Arc<Vec<WorkshopRecord>> {
        &self.records
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Add a slot seeded with `initial` and make it active.
    pub fn create_slot(&mut self, initial: FilterSpecification) -> String {
        let id = self.next_slot_id();
        self.slots.push(ChartSlot::new(id.clone(), initial.normalized()));
        self.active = self.slots.len() - 1;
        self.active_view();

        info!(
            slot_id = %id,
            slot_count = self.slots.len(),
            "Chart slot created"
        );
        id
    }

    /// Switch the active slot, re-deriving it if its output is stale.
    pub fn set_active(&mut self, id: &str) -> Result<&DerivedView> {
        let index = self
            .slots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("chart slot '{}'", id)))?;

        self.active = index;
        debug!(slot_id = id, "Chart slot activated");
        Ok(self.active_view())
    }

    /// Apply a field-level change to the active specification and re-derive.
    pub fn update_active_spec(&mut self, patch: &FilterPatch) -> &DerivedView {
        self.update_active_with(|spec| patch.apply(spec))
    }

    /// Mutate the active specification in place and re-derive.
    pub fn update_active_with<F>(&mut self, mutator: F) -> &DerivedView
    where
        F: FnOnce(&mut FilterSpecification),
    {
        let slot = &mut self.slots[self.active];
        mutator(&mut slot.spec);
        debug!(slot_id = %slot.id, "Active chart filters updated");
        slot.rederive(&self.records, self.generation)
    }

    /// Install a new record snapshot. Only the active slot is re-derived.
    pub fn replace_records(&mut self, records: Arc<Vec<WorkshopRecord>>, generation: u64) {
        self.records = records;
        self.generation = generation;
        self.slots[self.active].rederive(&self.records, generation);
    }

    /// Snapshot every slot's specification, in slot order.
    pub fn serialize(&self) -> ChartBlob {
        ChartBlob::new(
            self.slots
                .iter()
                .map(|slot| PersistedChart {
                    id: slot.id.clone(),
                    filters: slot.spec.clone(),
                })
                .collect(),
        )
    }

    /// Replace all slots with those in `blob` and activate the first one.
    ///
    /// An absent or undecodable blob leaves the store untouched; the failure
    /// is logged and `false` returned.
    pub fn restore(&mut self, blob: Option<&str>) -> bool {
        let Some(text) = blob else {
            info!("No saved chart configuration to restore");
            return false;
        };

        let decoded = match ChartBlob::decode(text) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, "Saved chart configuration rejected, keeping current slots");
                return false;
            }
        };

        let records = Arc::clone(&self.records);
        let generation = self.generation;
        self.slots = decoded
            .blob
            .charts
            .into_iter()
            .map(|chart| {
                let mut slot = ChartSlot::new(chart.id, chart.filters.normalized());
                slot.refresh(&records, generation);
                slot
            })
            .collect();
        self.active = 0;

        info!(
            slot_count = self.slots.len(),
            slot_id = %self.active_id(),
            source_version = decoded.source_version,
            "Chart configuration restored"
        );
        true
    }

    /// `chart` for the first slot, then `chart-N` with N the slot count,
    /// bumped until unused.
    fn next_slot_id(&self) -> String {
        if self.slot(FIRST_SLOT_ID).is_none() {
            return FIRST_SLOT_ID.to_string();
        }
        let mut n = self.slots.len();
        loop {
            let candidate = format!("{}-{}", SLOT_ID_PREFIX, n);
            if self.slot(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}
