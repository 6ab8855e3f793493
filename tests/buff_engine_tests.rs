use std::path::PathBuf;

use buffsheet::buffs::{
    compute_buff_damage, incoming_buffs, interpolate_buff_value, outgoing_buffs, resolve_buffs,
    BuffDefinition, CombatUnit, LevelMap, MatchRule, OmitMode, ResolvedBuff, RosterBuffIndex,
};
use buffsheet::data::{find_unit, load_roster, validate_roster_file, ValidationSeverity};
use buffsheet::parallel::WorkerPool;
use serde_json::json;

const BUFF_LEVEL: i64 = 37;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/units.json")
}

fn roster() -> Vec<CombatUnit> {
    load_roster(fixture_path()).expect("fixture roster should load")
}

fn unit<'a>(roster: &'a [CombatUnit], name: &str) -> &'a CombatUnit {
    find_unit(roster, name).unwrap_or_else(|| panic!("unit '{name}' missing from fixture"))
}

fn buff<'a>(
    unit: &'a CombatUnit,
    name: &str,
    predicate: impl Fn(&BuffDefinition) -> bool,
) -> &'a BuffDefinition {
    unit.buffs
        .iter()
        .find(|b| b.name == name && predicate(b))
        .unwrap_or_else(|| panic!("buff '{name}' missing on '{}'", unit.name))
}

fn value_at(definition: &BuffDefinition, bonus: bool, level: i64) -> i64 {
    let effect = definition.effect.as_ref().expect("effect");
    let map = if bonus { effect.damage_bonus.as_ref() } else { effect.damage.as_ref() };
    interpolate_buff_value(map, level).expect("value at level")
}

fn names(links: &[buffsheet::buffs::BuffLink<'_>]) -> Vec<String> {
    links.iter().map(|l| l.unit.name.clone()).collect()
}

#[test]
fn level_map_reads_from_roster_json_match_reference_values() {
    let roster = roster();
    let thaddeus = unit(&roster, "Thaddeus Noble");
    let universal = buff(thaddeus, "Spotter", |b| {
        b.affects.grand_alliance.iter().any(|g| g == "*")
    });

    assert_eq!(value_at(universal, false, 17), 22);
    assert_eq!(value_at(universal, false, 12), 15);
    assert_eq!(value_at(universal, false, 5), 10);
    assert_eq!(value_at(universal, false, BUFF_LEVEL), 114);

    let makhotep = unit(&roster, "Makhotep");
    let transfer = buff(makhotep, "Energy Transfer", |_| true);
    assert_eq!(value_at(transfer, false, BUFF_LEVEL), 84);
}

#[test]
fn scenario_single_value_map_clamps_above_and_multiplies_melee_hits() {
    let target: CombatUnit = serde_json::from_value(json!({
        "name": "Target",
        "stats": { "melee": 4 }
    }))
    .unwrap();
    let definition: BuffDefinition = serde_json::from_value(json!({
        "name": "Scenario",
        "effect": { "damage": { "35": "114" }, "single_hit": false }
    }))
    .unwrap();
    let source = CombatUnit {
        name: "Source".to_string(),
        ..CombatUnit::default()
    };

    let result = compute_buff_damage(
        &target,
        &[ResolvedBuff::from_definition(&source, &definition)],
        BUFF_LEVEL,
    );
    assert_eq!(result.buff_rows.len(), 1);
    assert_eq!(result.buff_rows[0].value, 114);
    assert_eq!(result.buff_rows[0].buffed_melee, 456);
    assert_eq!(result.totals.damage, 114);
    assert_eq!(result.totals.buffed_melee, 456);
}

#[test]
fn specificity_prefers_trait_variant_for_heavy_weapon_units() {
    let roster = roster();
    let thaddeus = unit(&roster, "Thaddeus Noble");
    let sygex = unit(&roster, "Sy-gex");
    let bellator = unit(&roster, "Bellator");

    let to_sygex = resolve_buffs(thaddeus, sygex);
    assert_eq!(to_sygex.len(), 1);
    assert_eq!(to_sygex[0].source_name, "Thaddeus Noble");
    assert_eq!(to_sygex[0].omit, Some(OmitMode::Normal));
    let value = interpolate_buff_value(
        to_sygex[0].effect.as_ref().and_then(|e| e.damage.as_ref()),
        BUFF_LEVEL,
    );
    assert_eq!(value, Some(228));

    let to_bellator = resolve_buffs(thaddeus, bellator);
    assert_eq!(to_bellator.len(), 1);
    assert_eq!(to_bellator[0].omit, None);

    let heavy = buff(thaddeus, "Spotter", |b| !b.affects.traits.is_empty());
    assert_eq!(heavy.affects.evaluate(sygex), Some(MatchRule::Trait));
}

#[test]
fn ranged_spotter_on_melee_only_unit_yields_nothing() {
    let roster = roster();
    let thaddeus = unit(&roster, "Thaddeus Noble");
    let bellator = unit(&roster, "Bellator");

    let resolved = resolve_buffs(thaddeus, bellator);
    let result = compute_buff_damage(bellator, &resolved, BUFF_LEVEL);
    assert!(result.has_melee);
    assert!(!result.has_range);
    assert!(result.buff_rows.is_empty());
    assert_eq!(result.totals.damage, 0);
    assert_eq!(result.totals.combined(), 0);
}

#[test]
fn first_among_traitors_on_haarken_fills_both_channels() {
    let roster = roster();
    let abaddon = unit(&roster, "Abaddon the Despoiler");
    let haarken = unit(&roster, "Haarken Worldclaimer");
    let definition = buff(abaddon, "First Among Traitors", |_| true);
    let damage = value_at(definition, false, BUFF_LEVEL);
    let bonus = value_at(definition, true, BUFF_LEVEL);
    let hits = i64::from(haarken.stats.melee.unwrap());

    let result = compute_buff_damage(haarken, &resolve_buffs(abaddon, haarken), BUFF_LEVEL);
    assert_eq!(result.buff_rows.len(), 2);

    let damage_row = result.buff_rows.iter().find(|r| !r.is_bonus).unwrap();
    assert_eq!(damage_row.name, "First Among Traitors");
    assert_eq!(damage_row.buffed_melee, hits * damage);

    let bonus_row = result.buff_rows.iter().find(|r| r.is_bonus).unwrap();
    assert_eq!(bonus_row.name, "First Among Traitors+");
    assert_eq!(bonus_row.buffed_melee, hits * bonus);

    assert_eq!(result.totals.damage, damage);
    assert_eq!(result.totals.bonus, bonus);
    assert_eq!(result.totals.buffed_melee, hits * damage);
    assert_eq!(result.totals.buffed_bonus_melee, hits * bonus);
    assert_eq!(result.totals.buffed_range, 0);
}

#[test]
fn stacked_buffs_on_sygex_sum_per_channel() {
    let roster = roster();
    let abaddon = unit(&roster, "Abaddon the Despoiler");
    let thaddeus = unit(&roster, "Thaddeus Noble");
    let sygex = unit(&roster, "Sy-gex");

    // Abaddon's buff is Chaos-only; passed in directly the aggregator still computes it.
    let mut buffs: Vec<ResolvedBuff> = abaddon
        .buffs
        .iter()
        .map(|b| ResolvedBuff::from_definition(abaddon, b))
        .collect();
    buffs.extend(resolve_buffs(thaddeus, sygex));

    let result = compute_buff_damage(sygex, &buffs, BUFF_LEVEL);
    assert_eq!(result.buff_rows.len(), 3);
    assert_eq!(result.totals.damage, 130 + 228);
    assert_eq!(result.totals.bonus, 35);
    assert_eq!(result.totals.buffed_melee, 3 * 130);
    assert_eq!(result.totals.buffed_range, 2 * 130 + 2 * 228);
    assert_eq!(result.totals.buffed_bonus_melee, 3 * 35);
    assert_eq!(result.totals.buffed_bonus_range, 2 * 35);
}

#[test]
fn incoming_listings_rank_by_combined_total() {
    let roster = roster();

    let haarken = unit(&roster, "Haarken Worldclaimer");
    let incoming = incoming_buffs(haarken, &roster, BUFF_LEVEL);
    assert_eq!(names(&incoming), vec!["Abaddon the Despoiler", "Thaddeus Noble"]);
    assert_eq!(incoming[0].combined_total(), 825);
    assert_eq!(incoming[1].combined_total(), 0);

    let makhotep = unit(&roster, "Makhotep");
    let incoming = incoming_buffs(makhotep, &roster, BUFF_LEVEL);
    assert_eq!(names(&incoming), vec!["Thaddeus Noble", "Sy-gex"]);
    assert_eq!(incoming[1].combined_total(), 120);

    let thaddeus = unit(&roster, "Thaddeus Noble");
    assert!(incoming_buffs(thaddeus, &roster, BUFF_LEVEL).is_empty());
}

#[test]
fn outgoing_listing_keeps_roster_order_on_ties() {
    let roster = roster();
    let thaddeus = unit(&roster, "Thaddeus Noble");
    let outgoing = outgoing_buffs(thaddeus, &roster, BUFF_LEVEL);
    assert_eq!(
        names(&outgoing),
        vec!["Sy-gex", "Abaddon the Despoiler", "Makhotep", "Bellator", "Haarken Worldclaimer"]
    );
    let totals: Vec<i64> = outgoing.iter().map(|l| l.combined_total()).collect();
    assert_eq!(totals, vec![456, 228, 228, 0, 0]);
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn focal_unit_never_buffs_itself() {
    let mut roster = roster();
    // Give Sy-gex a buff that would match its own faction.
    let sygex_index = roster.iter().position(|u| u.name == "Sy-gex").unwrap();
    let own = roster[sygex_index].clone();
    assert!(own.buffs[0].affects.evaluate(&own).is_some());

    for focal in &roster {
        let incoming = incoming_buffs(focal, &roster, BUFF_LEVEL);
        let outgoing = outgoing_buffs(focal, &roster, BUFF_LEVEL);
        assert!(incoming.iter().all(|l| l.unit.name != focal.name));
        assert!(outgoing.iter().all(|l| l.unit.name != focal.name));
    }

    roster.truncate(sygex_index + 1);
    let index = RosterBuffIndex::new(&roster, BUFF_LEVEL);
    let outgoing = index.outgoing("Sy-gex").unwrap();
    assert!(outgoing.is_empty());
}

#[test]
fn parallel_matrix_agrees_with_single_queries() {
    let roster = roster();
    let index = RosterBuffIndex::new(&roster, BUFF_LEVEL);
    let matrix = index.incoming_matrix(&WorkerPool::with_workers(3));
    assert_eq!(matrix.len(), roster.len());
    for (target, links) in &matrix {
        let single = incoming_buffs(target, &roster, BUFF_LEVEL);
        assert_eq!(names(links), names(&single));
    }
}

#[test]
fn level_maps_built_in_code_behave_like_parsed_ones() {
    let parsed: LevelMap = serde_json::from_value(json!({ "8": "10", "17": "22" })).unwrap();
    let built = LevelMap::from_pairs([(8, 10), (17, 22)]).unwrap();
    assert_eq!(parsed, built);
    assert_eq!(interpolate_buff_value(None, BUFF_LEVEL), None);
}

#[test]
fn fixture_roster_validates_cleanly() {
    let report = validate_roster_file(fixture_path()).unwrap();
    assert_eq!(report.unit_count, 6);
    assert!(!report.has_errors(), "{:?}", report.diagnostics);
    assert_eq!(report.count(ValidationSeverity::Warning), 0, "{:?}", report.diagnostics);
}
