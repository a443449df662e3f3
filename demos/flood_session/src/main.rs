//! Flood Session Demo
//!
//! Walks one river flood warning through a forecaster session: metadata,
//! the until-further-notice toggle, a script-side edit, a recommender run,
//! product generation and issuance, then expiry on a timer.

use chrono::{Duration, TimeZone, Utc};
use hazard_bridge::{ConverterRegistry, HostObject, HostSession, ScriptObject};
use hazard_core::{
    HazardEvent, HazardEventStore, HazardEventView, HazardMode, HazardType, LockTable, SiteId, Value, ValueMap,
    WorkstationId,
};
use hazard_db::ProductTextDb;
use hazard_product::{ProductCategory, ProductGenerator, ProductRequest, FLOOD_SEVERITY};
use hazard_recommender::recommenders::EXTEND_HOURS;
use hazard_recommender::{EventDrivenScheduler, RecommenderInput, RecommenderRuntime, DISMISS_CHOICE_KEY};
use hazard_script::sources::{FALL_BELOW, FALL_BELOW_UFN, TIME_SCALE};
use hazard_script::{ConfigLoader, MetadataContext, MutableProperties};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    println!("=== Flood Session Demo ===\n");

    let tables = ConfigLoader::with_defaults()?.finish();
    let metadata = tables.hazard_metadata();
    let site = SiteId::new("OAX")?;
    let start = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .ok_or("invalid start time")?;

    let mut store = HazardEventStore::new(site.clone());
    let lock_table = LockTable::new();
    let locks = lock_table.for_workstation(WorkstationId::new("ws1"));

    // Create a river flood warning and build its metadata
    let flood_warning = HazardType::new("FL", "W");
    let event = HazardEvent::new(site.clone(), start)
        .with_hazard_type(flood_warning.clone())
        .with_time_range(start, start + Duration::hours(12))?
        .with_attribute(FLOOD_SEVERITY, "1");
    let context = MetadataContext::new(start, site.clone());
    let result = metadata.metadata_for(&event, &context);
    let event = result.modified_event.clone().unwrap_or(event);
    let id = store.insert(event)?;

    let display_type = tables
        .startup
        .as_ref()
        .map(|s| s.event_id_display_type)
        .unwrap_or_default();
    println!(
        "Created {} ({}) with {} top-level widgets",
        id.display(display_type, &site, 2024),
        tables.headline(&flood_warning).unwrap_or("no headline"),
        result.metadata.len()
    );

    // Check "until further notice" and let the interdependencies settle
    let mut properties = MutableProperties::from_tree(&result.metadata);
    if let Some(checkbox) = properties.get_mut(FALL_BELOW_UFN) {
        checkbox.values = Some(Value::Bool(true));
    }
    let triggers = vec![FALL_BELOW_UFN.to_string()];
    let outcome = metadata.apply_interdependencies(&flood_warning, Some(&triggers), &properties)?;
    let fall_below = outcome
        .properties
        .get(TIME_SCALE)
        .and_then(|p| p.state_value(FALL_BELOW))
        .cloned()
        .unwrap_or_default();
    println!(
        "Until further notice: fallBelow = {:?} after {} round(s)\n",
        fall_below, outcome.rounds
    );

    // A script edits the event through the bridge
    let mut session = HostSession::new();
    let converters = ConverterRegistry::standard();
    let working_copy = store.get(&id).cloned().ok_or("event missing from store")?;
    let handle = session.pin(working_copy);
    if let ScriptObject::Event(script_event) = converters.to_script(&session, HostObject::Event(handle))? {
        script_event.set(&mut session, "immediateCause", serde_json::json!("ER"))?;
    }
    let edited: HazardEvent = session.release(handle)?;
    store.replace(edited)?;
    println!(
        "Script set immediateCause = {:?}",
        store.get(&id).and_then(|e| e.get("immediateCause").cloned())
    );

    // Extend the warning with a recommender
    let runtime = RecommenderRuntime::with_builtin();
    let input = RecommenderInput::new(start).with_selected(vec![id.clone()]);
    let events = runtime.input_events("ExtendEvents", &input, &store)?;
    if let Some(dialog) = runtime.dialog_for("ExtendEvents", &events)? {
        println!("Dialog '{}' offers {} buttons", dialog.title, dialog.buttons.len());
    }
    let mut dialog_input = ValueMap::new();
    dialog_input.insert(DISMISS_CHOICE_KEY.to_string(), Value::from("yes"));
    dialog_input.insert(EXTEND_HOURS.to_string(), Value::from(3));
    let outcome = runtime.run("ExtendEvents", input.with_dialog_input(dialog_input), &mut store, &locks)?;
    println!(
        "ExtendEvents modified {} event(s); new end {:?}\n",
        outcome.modified.len(),
        store.get(&id).map(|e| e.end_time())
    );

    // Generate and issue the product
    let mut generator = ProductGenerator::new(tables.vtec.clone(), ProductTextDb::in_memory()?);
    let request = ProductRequest {
        category: ProductCategory::FlwFls,
        site_id: site.clone(),
        issue_time: start,
        mode: HazardMode::Operational,
    };
    let events: Vec<HazardEvent> = store.iter().cloned().collect();
    let products = generator.generate(&events, &store, &request)?;
    for product in &products {
        println!("--- {} ---\n{}", product.info.pil, product.text);
    }
    if let Some(product) = products.first() {
        generator.issue(product, &mut store)?;
    }
    println!(
        "Status after issuance: {:?}\n",
        store.get(&id).map(|e| e.status())
    );

    // Let the timer-driven tools run once the warning has ended
    let mut scheduler = EventDrivenScheduler::new(tables.event_driven.clone());
    let later = start + Duration::hours(16);
    for run in scheduler.due_on_tick(later) {
        for tool in &run.tool_identifiers {
            if !runtime.contains(tool) {
                log::warn!("No recommender registered as {}", tool);
                continue;
            }
            let input = RecommenderInput::new(later).with_trigger(run.trigger, Vec::new());
            let outcome = runtime.run(tool, input, &mut store, &locks)?;
            println!("{} changed {} event(s)", tool, outcome.modified.len());
        }
    }
    println!(
        "Final status: {:?}, history entries: {}",
        store.get(&id).map(|e| e.status()),
        store.history(&id).len()
    );

    println!("\n=== Session Complete ===");
    Ok(())
}
