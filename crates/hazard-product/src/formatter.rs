//! Legacy-text formatter
//!
//! A product is rendered by walking an ordered list of part names. Each name
//! dispatches to a renderer in the [`FormatterRegistry`]; the renderer's text
//! becomes the part's generated text, which is then resolved against any
//! stored edit or previous issuance (see [`ProductPart::resolve`]).

use crate::error::{Error, Result};
use crate::part::{KeyInfo, ProductPart};
use crate::pil::{Pil, ProductCategory, VtecAction, VtecRecord};
use hazard_core::time::{is_until_further_notice, Instant};
use hazard_core::{EventId, HazardEventView, HazardMode, ReadOnlyHazardEvent, SiteId, Value};
use hazard_script::VtecTable;
use indexmap::IndexMap;

/// Terminates every segment
pub const SEGMENT_DELIMITER: &str = "\n$$\n\n";
/// Follows the segment delimiter in test mode
pub const TEST_MESSAGE: &str = "THIS IS A TEST MESSAGE. DO NOT TAKE ACTION BASED ON THIS.";

/// Attribute listing the UGC codes an event covers
pub const UGCS: &str = "ugcs";

/// Product-wide facts every renderer may read
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfo {
    pub category: ProductCategory,
    pub pil: Pil,
    pub site_id: SiteId,
    pub issue_time: Instant,
    pub mode: HazardMode,
}

impl ProductInfo {
    /// Four-letter issuing office, e.g. `KOAX`
    pub fn office(&self) -> String {
        let site = self.site_id.as_str();
        if site.len() == 3 {
            format!("K{}", site)
        } else {
            site.to_string()
        }
    }
}

/// One hazard within a segment
#[derive(Debug, Clone)]
pub struct SegmentEntry {
    pub event: ReadOnlyHazardEvent,
    pub vtec: VtecRecord,
}

/// Events sharing one segment of a product
#[derive(Debug, Clone, Default)]
pub struct Segment {
    /// Label used in product-text keys
    pub label: String,
    pub entries: Vec<SegmentEntry>,
}

impl Segment {
    pub fn event_ids(&self) -> Vec<EventId> {
        self.entries
            .iter()
            .filter_map(|e| e.event.event_id().cloned())
            .collect()
    }

    /// UGC codes of every event, first occurrence order
    pub fn ugcs(&self) -> Vec<String> {
        let mut ugcs: Vec<String> = Vec::new();
        for entry in &self.entries {
            for ugc in entry.event.get(UGCS).map(Value::as_string_list).unwrap_or_default() {
                if !ugcs.contains(&ugc) {
                    ugcs.push(ugc);
                }
            }
        }
        ugcs
    }

    /// Latest end time that is not until-further-notice
    pub fn latest_end(&self) -> Option<Instant> {
        self.entries
            .iter()
            .map(|e| e.event.end_time())
            .filter(|t| !is_until_further_notice(*t))
            .max()
    }

    /// The entry renderers take single-valued facts from
    pub fn lead(&self) -> Option<&SegmentEntry> {
        self.entries.first()
    }
}

/// State threaded through every part renderer
pub struct FormatterContext<'a> {
    pub product: &'a ProductInfo,
    /// Headlines and change rules by phensig
    pub vtec: &'a VtecTable,
    pub segment: Option<&'a Segment>,
    pub segment_index: usize,
    editable_parts: Vec<ProductPart>,
}

impl<'a> FormatterContext<'a> {
    pub fn new(product: &'a ProductInfo, vtec: &'a VtecTable) -> Self {
        Self {
            product,
            vtec,
            segment: None,
            segment_index: 0,
            editable_parts: Vec::new(),
        }
    }

    /// The current segment; product-level parts have none
    pub fn require_segment(&self, part: &str) -> Result<&'a Segment> {
        self.segment.ok_or_else(|| Error::MissingData {
            part: part.to_string(),
            what: "segment".to_string(),
        })
    }

    /// Configured headline for a phensig, or the phensig when none is set
    pub fn headline<'s>(&'s self, phensig: &'s str) -> &'s str {
        self.vtec.headline(phensig).unwrap_or_else(|| {
            log::warn!("No headline configured for {}", phensig);
            phensig
        })
    }

    pub fn editable_parts(&self) -> &[ProductPart] {
        &self.editable_parts
    }

    fn key_info(&self, name: &str) -> KeyInfo {
        let key = KeyInfo::new(name, self.product.category.as_str(), self.product.pil.as_str());
        match self.segment {
            Some(segment) => key.with_segment(
                segment.label.clone(),
                segment.event_ids().iter().map(|id| id.to_string()).collect(),
            ),
            None => key,
        }
    }
}

/// Renders one product part's generated text
pub type PartRenderer = fn(&FormatterContext<'_>) -> Result<String>;

/// Flags a part carries into every product it appears in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartFlags {
    pub editable: bool,
    pub required: bool,
    pub segment_divider: bool,
    pub num_lines: Option<u32>,
}

impl PartFlags {
    pub const FIXED: PartFlags = PartFlags {
        editable: false,
        required: true,
        segment_divider: false,
        num_lines: None,
    };

    pub const EDITABLE: PartFlags = PartFlags {
        editable: true,
        required: false,
        segment_divider: false,
        num_lines: None,
    };
}

#[derive(Clone)]
struct RegisteredPart {
    flags: PartFlags,
    render: PartRenderer,
}

/// Dispatch table from part name to renderer
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    parts: IndexMap<String, RegisteredPart>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard hydrologic parts
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("wmoHeader", PartFlags::FIXED, render_wmo_header);
        registry.register("ugcHeader", PartFlags::FIXED, render_ugc_header);
        registry.register("headlineStatement", PartFlags::FIXED, render_headline_statement);
        registry.register(
            "narrativeForecastInformation",
            PartFlags {
                num_lines: Some(6),
                ..PartFlags::EDITABLE
            },
            render_narrative,
        );
        registry.register("timeBullet", PartFlags::FIXED, render_time_bullet);
        registry.register("basisBullet", PartFlags::EDITABLE, render_basis_bullet);
        registry.register("impactsBullet", PartFlags::EDITABLE, render_impacts_bullet);
        registry.register("callsToAction_sectionLevel", PartFlags::EDITABLE, render_calls_to_action);
        registry.register(
            "endSegment",
            PartFlags {
                segment_divider: true,
                ..PartFlags::FIXED
            },
            render_end_segment,
        );
        registry
    }

    /// Register or replace a renderer
    pub fn register(&mut self, name: impl Into<String>, flags: PartFlags, render: PartRenderer) {
        self.parts.insert(name.into(), RegisteredPart { flags, render });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn flags(&self, name: &str) -> Option<PartFlags> {
        self.parts.get(name).map(|p| p.flags)
    }

    pub fn render(&self, name: &str, ctx: &FormatterContext<'_>) -> Result<String> {
        let part = self
            .parts
            .get(name)
            .ok_or_else(|| Error::UnknownPart(name.to_string()))?;
        (part.render)(ctx)
    }
}

/// Stored text for one part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorText {
    pub current_text: Option<String>,
    pub previous_text: Option<String>,
}

/// Output of one formatter run
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedProduct {
    pub text: String,
    pub editable_parts: Vec<ProductPart>,
}

/// Formatter for legacy text products
#[derive(Clone)]
pub struct LegacyFormatter {
    registry: FormatterRegistry,
    product_parts: Vec<String>,
    segment_parts: Vec<String>,
    vtec: VtecTable,
}

impl LegacyFormatter {
    /// Create a formatter; every part name must be registered
    pub fn new(
        registry: FormatterRegistry,
        product_parts: Vec<String>,
        segment_parts: Vec<String>,
        vtec: VtecTable,
    ) -> Result<Self> {
        if let Some(unknown) = product_parts
            .iter()
            .chain(&segment_parts)
            .find(|name| !registry.contains(name))
        {
            return Err(Error::UnknownPart(unknown.clone()));
        }
        Ok(Self {
            registry,
            product_parts,
            segment_parts,
            vtec,
        })
    }

    /// The standard segmented hydrologic product, headlined from `vtec`
    pub fn standard(vtec: VtecTable) -> Self {
        Self {
            registry: FormatterRegistry::standard(),
            product_parts: vec!["wmoHeader".to_string()],
            segment_parts: [
                "ugcHeader",
                "headlineStatement",
                "narrativeForecastInformation",
                "timeBullet",
                "basisBullet",
                "impactsBullet",
                "callsToAction_sectionLevel",
                "endSegment",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            vtec,
        }
    }

    /// Part names in emission order: product level, then per segment
    pub fn product_part_mapping(&self) -> impl Iterator<Item = &str> {
        self.product_parts
            .iter()
            .chain(&self.segment_parts)
            .map(String::as_str)
    }

    /// Render a product
    ///
    /// `prior` supplies the stored edit and previous issuance of each part.
    pub fn format<F>(&self, product: &ProductInfo, segments: &[Segment], mut prior: F) -> Result<FormattedProduct>
    where
        F: FnMut(&KeyInfo) -> Result<PriorText>,
    {
        let mut ctx = FormatterContext::new(product, &self.vtec);

        let mut header = Vec::new();
        for name in &self.product_parts {
            let text = self.render_part(&mut ctx, name, &mut prior)?;
            if !text.is_empty() {
                header.push(text);
            }
        }
        let mut text = header.join("\n");
        text.push_str("\n\n");

        for (index, segment) in segments.iter().enumerate() {
            ctx.segment = Some(segment);
            ctx.segment_index = index;
            let mut lines = Vec::new();
            let mut dividers = String::new();
            for name in &self.segment_parts {
                let rendered = self.render_part(&mut ctx, name, &mut prior)?;
                if self.registry.flags(name).is_some_and(|s| s.segment_divider) {
                    dividers.push_str(&rendered);
                } else if !rendered.is_empty() {
                    lines.push(rendered);
                }
            }
            text.push_str(&lines.join("\n"));
            text.push_str(&dividers);
        }

        Ok(FormattedProduct {
            text,
            editable_parts: ctx.editable_parts,
        })
    }

    fn render_part<F>(&self, ctx: &mut FormatterContext<'_>, name: &str, prior: &mut F) -> Result<String>
    where
        F: FnMut(&KeyInfo) -> Result<PriorText>,
    {
        let flags = self.registry.flags(name).unwrap_or_default();
        let generated = self.registry.render(name, ctx)?;
        let key_info = ctx.key_info(name);

        let mut part = ProductPart::new(key_info, generated);
        part.editable = flags.editable;
        part.required = flags.required;
        part.segment_divider = flags.segment_divider;
        part.num_lines = flags.num_lines;
        if flags.editable {
            let stored = prior(&part.key_info)?;
            part.use_previous_text = stored.previous_text.is_some();
            part.current_text = stored.current_text;
            part.previous_text = stored.previous_text;
        }

        let text = part.resolve().to_string();
        if part.editable {
            ctx.editable_parts.push(part);
        }
        Ok(text)
    }
}

// === Standard part renderers ===

fn ddhhmm(t: Instant) -> String {
    t.format("%d%H%M").to_string()
}

fn vtec_time(t: Instant) -> String {
    if is_until_further_notice(t) {
        "000000T0000Z".to_string()
    } else {
        t.format("%y%m%dT%H%MZ").to_string()
    }
}

fn until_phrase(t: Instant) -> String {
    if is_until_further_notice(t) {
        "UNTIL FURTHER NOTICE".to_string()
    } else {
        format!("UNTIL {}", t.format("%H%M UTC %A").to_string().to_uppercase())
    }
}

fn action_phrase(act: VtecAction) -> &'static str {
    match act {
        VtecAction::New => "IN EFFECT",
        VtecAction::Con => "REMAINS IN EFFECT",
        VtecAction::Ext => "EXTENDED",
        VtecAction::Exa | VtecAction::Exb => "EXPANDED",
        VtecAction::Can => "IS CANCELLED",
        VtecAction::Exp => "HAS EXPIRED",
        VtecAction::Upg => "UPGRADED",
    }
}

fn mode_char(mode: HazardMode) -> char {
    match mode {
        HazardMode::Operational => 'O',
        HazardMode::Practice => 'X',
        HazardMode::Test => 'T',
    }
}

fn string_attribute(entry: &SegmentEntry, name: &str) -> Option<String> {
    entry
        .event
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn render_wmo_header(ctx: &FormatterContext<'_>) -> Result<String> {
    let product = ctx.product;
    Ok(format!(
        "{} {} {}\n{}{}",
        product.pil.wmo_id(),
        product.office(),
        ddhhmm(product.issue_time),
        product.pil,
        product.site_id
    ))
}

fn render_ugc_header(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("ugcHeader")?;
    let product = ctx.product;
    let mut lines = Vec::new();

    let ugcs = segment.ugcs();
    if !ugcs.is_empty() {
        let purge = segment
            .latest_end()
            .unwrap_or(product.issue_time + chrono::Duration::hours(8));
        lines.push(format!("{}-{}-", ugcs.join("-"), ddhhmm(purge)));
    }

    for entry in &segment.entries {
        let etn = entry
            .event
            .event_id()
            .and_then(|id| id.components())
            .map(|(_, _, serial)| serial % 10_000)
            .unwrap_or(0);
        lines.push(format!(
            "/{}.{}.{}.{}.{}.{:04}.{}-{}/",
            mode_char(product.mode),
            entry.vtec.act,
            product.office(),
            entry.vtec.phen,
            entry.vtec.sig,
            etn,
            vtec_time(entry.event.start_time()),
            vtec_time(entry.event.end_time())
        ));
    }
    Ok(lines.join("\n"))
}

fn render_headline_statement(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("headlineStatement")?;
    let lines: Vec<String> = segment
        .entries
        .iter()
        .map(|entry| {
            let headline = ctx.headline(&entry.vtec.phensig);
            match entry.vtec.act {
                VtecAction::Can | VtecAction::Exp => {
                    format!("...{} {}...", headline, action_phrase(entry.vtec.act))
                }
                act => format!(
                    "...{} {} {}...",
                    headline,
                    action_phrase(act),
                    until_phrase(entry.event.end_time())
                ),
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

fn render_narrative(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("narrativeForecastInformation")?;
    Ok(segment
        .lead()
        .and_then(|e| string_attribute(e, "narrativeForecastInformation"))
        .unwrap_or_default())
}

fn render_time_bullet(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("timeBullet")?;
    let Some(lead) = segment.lead() else {
        return Ok(String::new());
    };
    if matches!(lead.vtec.act, VtecAction::Can | VtecAction::Exp) {
        return Ok(String::new());
    }
    Ok(format!("* {}.", until_phrase(lead.event.end_time())))
}

fn render_basis_bullet(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("basisBullet")?;
    let basis = segment
        .lead()
        .and_then(|e| string_attribute(e, "basisStatement"))
        .unwrap_or_else(|| "FORECASTERS INDICATED FLOODING".to_string());
    Ok(format!(
        "* AT {}, {}.",
        ctx.product.issue_time.format("%H%M UTC"),
        basis.trim_end_matches('.')
    ))
}

fn render_impacts_bullet(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("impactsBullet")?;
    let impacts = segment
        .lead()
        .and_then(|e| string_attribute(e, "impacts"))
        .unwrap_or_else(|| "FLOODING OF LOW-LYING AREAS IS EXPECTED.".to_string());
    Ok(format!("* IMPACTS...{}", impacts))
}

fn render_calls_to_action(ctx: &FormatterContext<'_>) -> Result<String> {
    let segment = ctx.require_segment("callsToAction_sectionLevel")?;
    let mut ctas: Vec<String> = segment
        .lead()
        .and_then(|e| e.event.get("cta"))
        .map(Value::as_string_list)
        .unwrap_or_default();
    if ctas.is_empty() {
        ctas.push("TURN AROUND, DON'T DROWN WHEN ENCOUNTERING FLOODED ROADS.".to_string());
    }
    Ok(format!("PRECAUTIONARY/PREPAREDNESS ACTIONS...\n\n{}", ctas.join("\n\n")))
}

fn render_end_segment(ctx: &FormatterContext<'_>) -> Result<String> {
    let mut text = SEGMENT_DELIMITER.to_string();
    if ctx.product.mode.is_test() {
        text.push_str(TEST_MESSAGE);
        text.push_str("\n\n");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hazard_core::{HazardEvent, HazardType};
    use hazard_script::ConfigLoader;

    fn issue_time() -> Instant {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn product(mode: HazardMode) -> ProductInfo {
        ProductInfo {
            category: ProductCategory::FlwFls,
            pil: Pil::FLW,
            site_id: SiteId::new("OAX").unwrap(),
            issue_time: issue_time(),
            mode,
        }
    }

    fn segment() -> Segment {
        let t = issue_time();
        let mut event = HazardEvent::new(SiteId::new("OAX").unwrap(), t)
            .with_hazard_type(HazardType::new("FL", "W"))
            .with_time_range(t, t + Duration::hours(6))
            .unwrap()
            .with_attribute(UGCS, vec!["NEC055", "NEC177"])
            .with_attribute("basisStatement", "the river was at 18.5 feet.");
        event.set_event_id(EventId::new("OAX-2024-000012")).unwrap();
        Segment {
            label: "1".to_string(),
            entries: vec![SegmentEntry {
                event: event.to_read_only(),
                vtec: VtecRecord::new(VtecAction::New, "FL", "W"),
            }],
        }
    }

    fn vtec() -> VtecTable {
        ConfigLoader::with_defaults().unwrap().finish().vtec
    }

    fn no_prior(_: &KeyInfo) -> Result<PriorText> {
        Ok(PriorText::default())
    }

    #[test]
    fn test_standard_product() {
        let formatter = LegacyFormatter::standard(vtec());
        let out = formatter
            .format(&product(HazardMode::Operational), &[segment()], no_prior)
            .unwrap();

        assert!(out.text.starts_with("WGUS43 KOAX 011200\nFLWOAX\n\n"));
        assert!(out.text.contains("NEC055-NEC177-011800-"));
        assert!(out.text.contains("/O.NEW.KOAX.FL.W.0012.240501T1200Z-240501T1800Z/"));
        assert!(out.text.contains("...FLOOD WARNING IN EFFECT UNTIL 1800 UTC WEDNESDAY..."));
        assert!(out.text.contains("* AT 1200 UTC, the river was at 18.5 feet."));
        assert!(out.text.ends_with(SEGMENT_DELIMITER));
        assert!(!out.text.contains(TEST_MESSAGE));

        let editable: Vec<&str> = out.editable_parts.iter().map(|p| p.name()).collect();
        assert_eq!(
            editable,
            vec![
                "narrativeForecastInformation",
                "basisBullet",
                "impactsBullet",
                "callsToAction_sectionLevel"
            ]
        );
        assert_eq!(out.editable_parts[1].key_info.event_ids, vec!["OAX-2024-000012".to_string()]);
    }

    #[test]
    fn test_test_mode_message_follows_delimiter() {
        let formatter = LegacyFormatter::standard(vtec());
        let out = formatter.format(&product(HazardMode::Test), &[segment()], no_prior).unwrap();
        let expected = format!("{}{}\n\n", SEGMENT_DELIMITER, TEST_MESSAGE);
        assert!(out.text.ends_with(&expected));
        assert!(out.text.contains("/T.NEW."));
    }

    #[test]
    fn test_prior_text_resolution() {
        let formatter = LegacyFormatter::standard(vtec());
        let out = formatter
            .format(&product(HazardMode::Operational), &[segment()], |key| {
                Ok(match key.name.as_str() {
                    "basisBullet" => PriorText {
                        current_text: Some("* EDITED BASIS.".to_string()),
                        previous_text: None,
                    },
                    "impactsBullet" => PriorText {
                        current_text: None,
                        previous_text: Some("* IMPACTS...AS BEFORE.".to_string()),
                    },
                    _ => PriorText::default(),
                })
            })
            .unwrap();
        assert!(out.text.contains("* EDITED BASIS."));
        assert!(out.text.contains("* IMPACTS...AS BEFORE."));
        assert!(!out.text.contains("18.5 feet"));
    }

    #[test]
    fn test_unknown_part_rejected() {
        let result = LegacyFormatter::new(
            FormatterRegistry::standard(),
            vec!["wmoHeader".to_string()],
            vec!["riverStageTable".to_string()],
            VtecTable::default(),
        );
        assert!(matches!(result, Err(Error::UnknownPart(name)) if name == "riverStageTable"));
    }

    #[test]
    fn test_segment_part_without_segment() {
        let registry = FormatterRegistry::standard();
        let info = product(HazardMode::Operational);
        let vtec = VtecTable::default();
        let ctx = FormatterContext::new(&info, &vtec);
        assert!(matches!(
            registry.render("timeBullet", &ctx),
            Err(Error::MissingData { .. })
        ));
    }

    #[test]
    fn test_headline_from_configured_table() {
        let info = product(HazardMode::Operational);
        let vtec = vtec();
        let ctx = FormatterContext::new(&info, &vtec);
        assert_eq!(ctx.headline("FA.W"), "AREAL FLOOD WARNING");
        assert_eq!(ctx.headline("FL.W"), "FLOOD WARNING");
        assert_eq!(ctx.headline("ZZ.Q"), "ZZ.Q");

        let mut areal = segment();
        areal.entries[0].vtec = VtecRecord::new(VtecAction::New, "FA", "W");
        let out = LegacyFormatter::standard(vtec)
            .format(&info, &[areal], no_prior)
            .unwrap();
        assert!(out.text.contains("...AREAL FLOOD WARNING IN EFFECT"));
    }

    #[test]
    fn test_until_further_notice_phrase() {
        let t = hazard_core::time::until_further_notice();
        assert_eq!(until_phrase(t), "UNTIL FURTHER NOTICE");
        assert_eq!(vtec_time(t), "000000T0000Z");
    }
}
