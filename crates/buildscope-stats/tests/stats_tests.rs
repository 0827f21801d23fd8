use std::collections::HashMap;
use std::sync::Arc;

use buildscope_core::filter::ItemCategory;
use buildscope_core::types::{Dictionary, DictionaryRef, Dimension, DimensionCount, SearchResult};
use buildscope_stats::dimension::{classify, display_name, true_total, DimensionKind};
use buildscope_stats::taxonomy::{self, parse_group_key, Attribute};
use buildscope_stats::{
    merge_calls, process, process_dimension, reconstruct_groups, resolve, BasetypeAggregate, ResolvedResult, Row,
};

const CONTROL: &str = "secondascendancy";

fn dim(id: &str, dict: &str, counts: &[(u64, u64)]) -> Dimension {
    Dimension {
        id: id.to_string(),
        dictionary_id: dict.to_string(),
        counts: counts.iter().map(|&(key, count)| DimensionCount { key, count }).collect(),
    }
}

fn resolved(total: u64, dims: Vec<Dimension>, dicts: &[(&str, &[&str])]) -> ResolvedResult {
    let dictionaries: HashMap<String, Arc<Dictionary>> = dicts
        .iter()
        .map(|(id, values)| (id.to_string(), Arc::new(Dictionary::new(id, values.iter().copied()))))
        .collect();
    let result = SearchResult {
        total,
        dimensions: dims,
        dictionary_refs: dicts.iter().map(|(id, _)| DictionaryRef { id: id.to_string(), hash: format!("h-{id}") }).collect(),
        ..SearchResult::default()
    };
    ResolvedResult::new(result, dictionaries, CONTROL)
}

#[test]
fn resolve_hits_and_placeholders() {
    let dict = Dictionary::new("d", ["Leather Cap", "Chestplate"]);
    let hit = resolve(1, Some(&dict));
    assert_eq!(hit.name, "Chestplate");
    assert!(hit.resolved);
    let miss = resolve(9, Some(&dict));
    assert_eq!(miss.name, "Key_9");
    assert!(!miss.resolved);
    assert_eq!(resolve(0, None).name, "Key_0");
}

#[test]
fn percentages_against_true_total() {
    let dict = Dictionary::new("d", ["Leather Cap", "Chestplate"]);
    let entries = process(&dim("x", "d", &[(0, 30), (1, 70)]), Some(&dict), 100);
    assert_eq!(entries[0].name, "Chestplate");
    assert_eq!(entries[0].display_percentage(), "70.0");
    assert_eq!(entries[1].name, "Leather Cap");
    assert_eq!(entries[1].display_percentage(), "30.0");
}

#[test]
fn zero_true_total_yields_zero_percent() {
    let entries = process(&dim("x", "d", &[(0, 5)]), None, 0);
    assert!(entries[0].percentage.abs() < f64::EPSILON);
}

#[test]
fn ties_order_by_name() {
    let dict = Dictionary::new("d", ["b", "a", "c"]);
    let entries = process(&dim("x", "d", &[(0, 5), (1, 5), (2, 9)]), Some(&dict), 10);
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["c", "a", "b"]);
}

#[test]
fn true_total_prefers_control_dimension() {
    let with_control = SearchResult { total: 500, dimensions: vec![dim(CONTROL, "a", &[(0, 40), (1, 60)])], ..SearchResult::default() };
    assert_eq!(true_total(&with_control, CONTROL), 100);
    let without = SearchResult { total: 500, ..SearchResult::default() };
    assert_eq!(true_total(&without, CONTROL), 500);
}

#[test]
fn classification_and_titles() {
    assert_eq!(classify("itembasetypes-Helmet", CONTROL), DimensionKind::Basetypes(Some(ItemCategory::Helmet)));
    assert_eq!(classify("itembasetypes-Amulet", CONTROL), DimensionKind::Basetypes(None));
    assert_eq!(classify("itemmods-Helmet", CONTROL), DimensionKind::Modifiers);
    assert_eq!(classify("skills", CONTROL), DimensionKind::Skills);
    assert_eq!(classify(CONTROL, CONTROL), DimensionKind::Control);
    assert_eq!(classify("keystones", CONTROL), DimensionKind::Other);
    assert_eq!(display_name("itembasetypes-BodyArmour"), "Item Types: Body Armour");
    assert_eq!(display_name("itemmods-Boots"), "Mods: Boots");
    assert_eq!(display_name("secondascendancy"), "Secondascendancy");
}

#[test]
fn basetypes_group_by_attribute() {
    let dict = Dictionary::new("bt", ["Leather Cap", "Iron Hat", "Lion Pelt", "Mystery Hat", "Vine Circlet"]);
    let d = dim("itembasetypes-Helmet", "bt", &[(0, 10), (1, 25), (2, 15), (3, 40), (4, 10)]);
    let processed = process_dimension(&d, Some(&dict), 100);

    let groups: Vec<_> = processed.groups().collect();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].group_key, "group_dex_helmet");
    assert_eq!(groups[0].name, "Dex Helmet (2 types)");
    assert_eq!(groups[0].count, 25);
    // taxonomy order inside the group
    assert_eq!(groups[0].member_names(), ["Lion Pelt", "Leather Cap"]);
    assert_eq!(groups[1].attribute, Attribute::Int);
    assert_eq!(groups[2].attribute, Attribute::Str);

    for g in &groups {
        assert_eq!(g.count, g.members.iter().map(|m| m.count).sum::<u64>());
    }
    match processed.rows.last() {
        Some(Row::Entry(e)) => assert_eq!(e.name, "Mystery Hat"),
        other => panic!("expected leftover entry, got {other:?}"),
    }
    assert_eq!(processed.entries().len(), 5);
}

#[test]
fn non_basetype_dimensions_are_not_grouped() {
    let dict = Dictionary::new("m", ["Leather Cap"]);
    let processed = process_dimension(&dim("itemmods-Helmet", "m", &[(0, 3)]), Some(&dict), 10);
    assert!(processed.groups().next().is_none());
}

#[test]
fn unresolved_counted() {
    let processed = process_dimension(&dim("skills", "missing", &[(0, 3), (1, 2)]), None, 10);
    assert_eq!(processed.unresolved, 2);
    assert_eq!(processed.rows[0].name(), "Key_0");
}

#[test]
fn missing_dictionaries_listed_once() {
    let res = resolved(
        50,
        vec![dim("skills", "s", &[(0, 5)]), dim("keystones", "k", &[(0, 1)]), dim("masteries", "k", &[(0, 2)])],
        &[("s", &["Cyclone"][..])],
    );
    assert_eq!(res.missing_dictionaries(), ["k"]);
    assert_eq!(res.label(&res.result.dimensions[1], 0).name, "Key_0");
}

#[test]
fn merge_calls_sums_then_normalizes() {
    let a = resolved(100, vec![dim("skills", "s", &[(0, 30), (1, 10)])], &[("s", &["Cyclone", "Spark"][..])]);
    let b = resolved(300, vec![dim("skills", "s2", &[(0, 50)]), dim("keystones", "k", &[(0, 7)])], &[("s2", &["Spark"][..]), ("k", &["Iron Reflexes"][..])]);
    let merged = merge_calls(&[a, b]);
    assert_eq!(merged.true_total, 400);
    let ids: Vec<&str> = merged.dimensions.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["skills", "keystones"]);
    let skills = merged.dimension("skills").expect("skills");
    assert_eq!(skills.rows[0].name(), "Spark");
    assert_eq!(skills.rows[0].count(), 60);
    assert!((skills.rows[0].percentage() - 15.0).abs() < 1e-9);
    assert!((skills.rows[1].percentage() - 7.5).abs() < 1e-9);
}

fn basetype_result(total: u64, mods_a: &[(u64, u64)], mods_b: &[(u64, u64)], skills: &[(u64, u64)]) -> ResolvedResult {
    resolved(
        total,
        vec![
            dim(CONTROL, "asc", &[(0, total)]),
            dim("itemmods-Helmet", "mods", mods_a),
            dim("itemmods-Helmet-implicit", "mods", mods_b),
            dim("skills", "skills", skills),
        ],
        &[("asc", &["Juggernaut"][..]), ("mods", &["+# to maximum Life", "+#% to Fire Resistance"][..]), ("skills", &["Cyclone", "Spark"][..])],
    )
}

#[test]
fn modifiers_dedup_keeps_max_within_result() {
    let r = basetype_result(100, &[(0, 5)], &[(0, 12)], &[]);
    let report = BasetypeAggregate::from_result("Leather Cap", &r).finish();
    assert_eq!(report.modifiers.len(), 1);
    assert_eq!(report.modifiers[0].count, 12);
    assert!((report.modifiers[0].percentage - 12.0).abs() < 1e-9);
}

#[test]
fn aggregation_pools_over_sum_of_true_totals() {
    let a = basetype_result(100, &[(0, 50)], &[], &[(0, 20)]);
    let b = basetype_result(300, &[(0, 30), (1, 90)], &[], &[(0, 60), (1, 30)]);
    let mut agg = BasetypeAggregate::new();
    agg.add("Lion Pelt", &a);
    agg.add("Leather Cap", &b);
    let report = agg.finish();

    assert_eq!(report.total_builds, 400);
    assert_eq!(report.distribution[0].name, "Leather Cap");
    assert!((report.distribution[0].percentage - 75.0).abs() < 1e-9);

    let life = report.modifiers.iter().find(|m| m.name == "+# to maximum Life").expect("life");
    assert_eq!(life.count, 80);
    assert!((life.percentage - 20.0).abs() < 1e-9);
    let shares: Vec<String> = life.breakdown.iter().map(ToString::to_string).collect();
    assert_eq!(shares, ["Leather Cap: 10.0%", "Lion Pelt: 50.0%"]);

    let cyclone = report.skills.iter().find(|s| s.name == "Cyclone").expect("cyclone");
    assert_eq!(cyclone.count, 80);
}

#[test]
fn aggregation_is_order_independent() {
    let a = basetype_result(100, &[(0, 50)], &[(1, 3)], &[(0, 20)]);
    let b = basetype_result(300, &[(0, 30), (1, 90)], &[], &[(1, 30)]);
    let c = basetype_result(50, &[(1, 10)], &[(1, 11)], &[(0, 5)]);

    let mut ab = BasetypeAggregate::from_result("A", &a);
    ab.merge(BasetypeAggregate::from_result("B", &b));
    ab.merge(BasetypeAggregate::from_result("C", &c));

    let mut cb = BasetypeAggregate::from_result("C", &c);
    cb.add("B", &b);
    cb.add("A", &a);

    assert_eq!(ab, cb);
    assert_eq!(ab.finish(), cb.finish());
}

#[test]
fn re_adding_a_basetype_replaces_its_contribution() {
    let a = basetype_result(100, &[(0, 50)], &[], &[]);
    let mut agg = BasetypeAggregate::from_result("A", &a);
    agg.add("A", &a);
    assert_eq!(agg.pool_total(), 100);
    assert_eq!(agg.finish().modifiers[0].count, 50);
}

#[test]
fn reconstructed_groups_flag_selected_attributes() {
    let groups = reconstruct_groups(ItemCategory::Helmet, ["Lion Pelt", "Leather Cap"]);
    assert_eq!(groups.len(), 6);
    let dex = &groups[0];
    assert_eq!(dex.attribute, Attribute::Dex);
    assert_eq!(dex.count, 100);
    assert!((dex.percentage - 100.0).abs() < f64::EPSILON);
    assert!(dex.reconstructed);
    assert!(dex.members.is_empty());
    assert!(groups[1..].iter().all(|g| g.count == 0));
}

#[test]
fn taxonomy_lookups() {
    assert_eq!(taxonomy::attribute_of(ItemCategory::Gloves, "Spiked Gloves"), Some(Attribute::Str));
    assert_eq!(taxonomy::attribute_of(ItemCategory::Gloves, "Lion Pelt"), None);
    assert_eq!(taxonomy::members(ItemCategory::BodyArmour, Attribute::Str)[0], "Royal Plate");
    let key = taxonomy::group_key(Attribute::StrDex, ItemCategory::BodyArmour);
    assert_eq!(key, "group_strdex_bodyarmour");
    assert_eq!(parse_group_key(&key), Some((Attribute::StrDex, ItemCategory::BodyArmour)));
}
