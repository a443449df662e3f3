//! Product generator
//!
//! Groups events into segments, picks each segment's PIL, runs the legacy
//! formatter and keeps product text in step with forecaster edits and
//! issuances.

use crate::error::{Error, Result};
use crate::formatter::{FormattedProduct, LegacyFormatter, PriorText, ProductInfo, Segment, SegmentEntry};
use crate::part::{KeyInfo, ProductPart};
use crate::pil::{select_pil, Pil, ProductCategory, VtecRecord, FLOOD_SEVERITY};
use crate::text_store::{ProductTextRow, ProductTextStore, CURRENT_TEXT, PREVIOUS_TEXT};
use hazard_core::time::Instant;
use hazard_core::{
    EventId, HazardEvent, HazardEventStore, HazardEventView, HazardMode, HazardStatus, HazardType, SiteId, Value,
    ValueMap, PREVIOUS_FLOOD_SEVERITY,
};
use hazard_script::VtecTable;
use indexmap::IndexMap;

/// What to generate
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRequest {
    pub category: ProductCategory,
    pub site_id: SiteId,
    pub issue_time: Instant,
    pub mode: HazardMode,
}

/// One generated product
#[derive(Debug, Clone)]
pub struct GeneratedProduct {
    pub info: ProductInfo,
    pub segments: Vec<Segment>,
    pub text: String,
    pub editable_parts: Vec<ProductPart>,
    /// The PIL awaits confirmation against sibling forecast points
    pub pil_deferred: bool,
}

impl GeneratedProduct {
    pub fn event_ids(&self) -> Vec<EventId> {
        self.segments.iter().flat_map(Segment::event_ids).collect()
    }
}

/// Generates products for one product category at a time
pub struct ProductGenerator<S: ProductTextStore> {
    formatter: LegacyFormatter,
    store: S,
}

impl<S: ProductTextStore> ProductGenerator<S> {
    /// Generator with the standard formatter, headlined from `vtec`
    pub fn new(vtec: VtecTable, store: S) -> Self {
        Self::with_formatter(LegacyFormatter::standard(vtec), store)
    }

    pub fn with_formatter(formatter: LegacyFormatter, store: S) -> Self {
        Self { formatter, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Generate every product the events call for
    ///
    /// Events outside the requested category, or with no applicable PIL, are
    /// skipped. `history` supplies each event's last issuance.
    pub fn generate(
        &self,
        events: &[HazardEvent],
        history: &HazardEventStore,
        request: &ProductRequest,
    ) -> Result<Vec<GeneratedProduct>> {
        let mut products: IndexMap<Pil, (bool, Vec<Segment>)> = IndexMap::new();
        let mut segments: IndexMap<(Pil, HazardType), (bool, Segment)> = IndexMap::new();

        for event in events {
            let Some(hazard_type) = event.hazard_type().cloned() else {
                continue;
            };
            if ProductCategory::for_hazard_type(&hazard_type) != Some(request.category) {
                continue;
            }
            let last_issued = event.event_id().and_then(|id| history.history(id).last());
            let Some(vtec) = VtecRecord::for_event(event, last_issued) else {
                continue;
            };
            let Some(selection) = select_pil(request.category, &vtec, event) else {
                log::debug!("No PIL for {} {}; skipping", vtec.act, vtec.phensig);
                continue;
            };
            let (deferred, segment) = segments
                .entry((selection.pil, hazard_type.clone()))
                .or_insert_with(|| {
                    (
                        false,
                        Segment {
                            label: hazard_type.to_string(),
                            entries: Vec::new(),
                        },
                    )
                });
            *deferred |= selection.deferred;
            segment.entries.push(SegmentEntry {
                event: event.to_read_only(),
                vtec,
            });
        }

        for ((pil, _), (deferred, segment)) in segments {
            let (product_deferred, product_segments) = products.entry(pil).or_insert((true, Vec::new()));
            *product_deferred &= deferred;
            product_segments.push(segment);
        }

        let mut generated = Vec::with_capacity(products.len());
        for (pil, (pil_deferred, segments)) in products {
            let info = ProductInfo {
                category: request.category,
                pil,
                site_id: request.site_id.clone(),
                issue_time: request.issue_time,
                mode: request.mode,
            };
            let FormattedProduct { text, editable_parts } = self
                .formatter
                .format(&info, &segments, |key| self.prior_text(key, info.mode, &info.site_id))?;
            log::info!(
                "Generated {} with {} segment(s) for {}",
                pil,
                segments.len(),
                info.site_id
            );
            generated.push(GeneratedProduct {
                info,
                segments,
                text,
                editable_parts,
                pil_deferred,
            });
        }
        Ok(generated)
    }

    /// Stored edit and previous issuance of a part
    pub fn prior_text(&self, key: &KeyInfo, mode: HazardMode, office: &SiteId) -> Result<PriorText> {
        let row = self.store.get(&key.text_key(mode, office))?;
        Ok(PriorText {
            current_text: row.as_ref().and_then(|r| r.text_field(CURRENT_TEXT)).map(str::to_string),
            previous_text: row.as_ref().and_then(|r| r.text_field(PREVIOUS_TEXT)).map(str::to_string),
        })
    }

    /// Record a forecaster edit of an editable part
    pub fn save_edit(&mut self, product: &GeneratedProduct, part: &ProductPart, text: &str) -> Result<()> {
        if !part.editable {
            return Err(Error::MissingData {
                part: part.name().to_string(),
                what: "editable flag".to_string(),
            });
        }
        let key = part.key_info.text_key(product.info.mode, &product.info.site_id);
        let mut fields = self
            .store
            .get(&key)?
            .and_then(|row| row.value.as_map().cloned())
            .unwrap_or_default();
        fields.insert(CURRENT_TEXT.to_string(), Value::from(text));
        self.store.create_or_update(ProductTextRow::new(key, fields))
    }

    /// Record an issued product
    ///
    /// Each editable part's emitted text becomes its previous text and any
    /// edit is cleared. Each event takes its post-issuance status, remembers
    /// the flood severity it was issued with, and gets a history entry.
    ///
    /// Every event is looked up and moved to its next status on a copy
    /// first. A missing event or a refused transition fails the issuance
    /// before any text row or event is written.
    pub fn issue(&mut self, product: &GeneratedProduct, events: &mut HazardEventStore) -> Result<()> {
        let ids = product.event_ids();
        let mut issued = Vec::with_capacity(ids.len());
        for id in &ids {
            let mut event = events
                .get(id)
                .cloned()
                .ok_or_else(|| hazard_core::Error::EventNotFound(id.to_string()))?;
            let next = match event.status() {
                HazardStatus::Potential | HazardStatus::Pending | HazardStatus::Proposed => HazardStatus::Issued,
                HazardStatus::Ending => HazardStatus::Ended,
                other => other,
            };
            event.set_status(next)?;
            if let Some(severity) = event.get(FLOOD_SEVERITY).cloned() {
                event.set(PREVIOUS_FLOOD_SEVERITY, severity);
            }
            issued.push(event);
        }

        for part in &product.editable_parts {
            let key = part.key_info.text_key(product.info.mode, &product.info.site_id);
            let mut fields = ValueMap::new();
            fields.insert(PREVIOUS_TEXT.to_string(), Value::from(part.resolve()));
            self.store.create_or_update(ProductTextRow::new(key, fields))?;
        }

        for (id, event) in ids.iter().zip(issued) {
            events.replace(event)?;
            events.save_to_history(id)?;
        }
        log::info!("Issued {} for {} event(s)", product.info.pil, ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_store::InMemoryProductTextStore;
    use chrono::{Duration, TimeZone, Utc};
    use hazard_core::HazardType;
    use hazard_script::ConfigLoader;

    fn t0() -> Instant {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn site() -> SiteId {
        SiteId::new("OAX").unwrap()
    }

    fn generator() -> ProductGenerator<InMemoryProductTextStore> {
        let vtec = ConfigLoader::with_defaults().unwrap().finish().vtec;
        ProductGenerator::new(vtec, InMemoryProductTextStore::new())
    }

    fn request() -> ProductRequest {
        ProductRequest {
            category: ProductCategory::FlwFls,
            site_id: site(),
            issue_time: t0(),
            mode: HazardMode::Operational,
        }
    }

    fn flood_warning(store: &mut HazardEventStore, severity: &str) -> EventId {
        let event = HazardEvent::new(site(), t0())
            .with_hazard_type(HazardType::new("FL", "W"))
            .with_time_range(t0(), t0() + Duration::hours(12))
            .unwrap()
            .with_attribute("ugcs", vec!["NEC055"])
            .with_attribute(FLOOD_SEVERITY, severity);
        store.insert(event).unwrap()
    }

    fn current(store: &HazardEventStore) -> Vec<HazardEvent> {
        store.iter().cloned().collect()
    }

    #[test]
    fn test_segments_by_pil_and_category() {
        let mut store = HazardEventStore::new(site());
        flood_warning(&mut store, "1");
        store
            .insert(HazardEvent::new(site(), t0()).with_hazard_type(HazardType::new("FA", "Y")))
            .unwrap();
        store
            .insert(HazardEvent::new(site(), t0()).with_hazard_type(HazardType::new("FF", "A")))
            .unwrap();

        let generator = generator();
        let products = generator.generate(&current(&store), &store, &request()).unwrap();
        let pils: Vec<Pil> = products.iter().map(|p| p.info.pil).collect();
        assert_eq!(pils, vec![Pil::FLW, Pil::FLS]);
        assert!(products.iter().all(|p| !p.pil_deferred));
        assert_eq!(products[0].segments[0].label, "FL.W");
    }

    #[test]
    fn test_edit_recovered_on_regeneration() {
        let mut store = HazardEventStore::new(site());
        flood_warning(&mut store, "1");
        let mut generator = generator();

        let first = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        let basis = first
            .editable_parts
            .iter()
            .find(|p| p.name() == "basisBullet")
            .unwrap()
            .clone();
        generator.save_edit(&first, &basis, "* FORECASTER EDITED BASIS.").unwrap();

        let second = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        assert!(second.text.contains("* FORECASTER EDITED BASIS."));
    }

    #[test]
    fn test_issue_then_follow_up() {
        let mut store = HazardEventStore::new(site());
        let id = flood_warning(&mut store, "1");
        let mut generator = generator();

        let product = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        assert!(product.text.contains("/O.NEW."));
        generator.issue(&product, &mut store).unwrap();

        let issued = store.get(&id).unwrap();
        assert_eq!(issued.status(), HazardStatus::Issued);
        assert_eq!(issued.get(PREVIOUS_FLOOD_SEVERITY), Some(&Value::from("1")));
        assert_eq!(store.history(&id).len(), 1);

        // Same severity: continuation goes out as a statement
        let follow_up = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        assert_eq!(follow_up.info.pil, Pil::FLS);
        assert!(follow_up.text.contains("/O.CON."));
        let basis = follow_up.editable_parts.iter().find(|p| p.name() == "basisBullet").unwrap();
        assert!(basis.use_previous_text);

        // Rising severity: back to a warning
        store.get_mut(&id).unwrap().set(FLOOD_SEVERITY, "2");
        let rising = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        assert_eq!(rising.info.pil, Pil::FLW);
    }

    #[test]
    fn test_issue_with_missing_event_writes_nothing() {
        let mut store = HazardEventStore::new(site());
        let kept = flood_warning(&mut store, "1");
        let gone = flood_warning(&mut store, "1");
        let mut generator = generator();
        let product = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        assert_eq!(product.event_ids().len(), 2);

        store.remove(&gone);
        let result = generator.issue(&product, &mut store);
        assert!(matches!(result, Err(Error::Core(hazard_core::Error::EventNotFound(_)))));

        assert!(generator.store().is_empty());
        let untouched = store.get(&kept).unwrap();
        assert_eq!(untouched.status(), HazardStatus::Potential);
        assert!(untouched.get(PREVIOUS_FLOOD_SEVERITY).is_none());
        assert!(store.history(&kept).is_empty());
    }

    #[test]
    fn test_hydrologic_statement_deferred() {
        let mut store = HazardEventStore::new(site());
        store
            .insert(HazardEvent::new(site(), t0()).with_hazard_type(HazardType::new("HY", "S")))
            .unwrap();
        let generator = generator();
        let products = generator.generate(&current(&store), &store, &request()).unwrap();
        assert_eq!(products.len(), 1);
        assert!(products[0].pil_deferred);
    }

    #[test]
    fn test_save_edit_requires_editable_part() {
        let mut store = HazardEventStore::new(site());
        flood_warning(&mut store, "1");
        let mut generator = generator();
        let product = generator.generate(&current(&store), &store, &request()).unwrap().remove(0);
        let mut fixed = product.editable_parts[0].clone();
        fixed.editable = false;
        assert!(generator.save_edit(&product, &fixed, "text").is_err());
    }
}
