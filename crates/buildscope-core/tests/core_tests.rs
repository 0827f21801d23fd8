use std::fs;
use tempfile::TempDir;

use buildscope_core::config::{Config, EngineSettings};
use buildscope_core::filter::{rare_item_selector, FetchIntent, FilterState, ItemCategory};
use buildscope_core::types::Dictionary;

#[test]
fn signature_ignores_selection_order() {
    let mut a = FilterState::new("3.25").with_item("Rare Helmet");
    a.set_basetypes(["Lion Pelt", "Leather Cap"]).expect("basetypes");
    let mut b = FilterState::new("3.25").with_item("Rare Helmet");
    b.set_basetypes(["Leather Cap", "Lion Pelt"]).expect("basetypes");
    assert_eq!(a.signature(), b.signature());
    assert_eq!(a.signature(), "3.25|items=Rare Helmet|basetypes=Leather Cap;Lion Pelt|modifiers=|skills=");
}

#[test]
fn selecting_another_item_clears_basetypes_and_modifiers() {
    let mut state = FilterState::new("s").with_item("Rare Boots").with_skill("Cyclone");
    state.set_basetypes(["Slink Boots"]).expect("basetypes");
    state.set_modifiers(["+# to maximum Life"]).expect("modifiers");

    state.select_item("Rare Boots");
    assert_eq!(state.basetypes.len(), 1, "reselecting the same item keeps filters");

    state.select_item("Rare Gloves");
    assert!(state.basetypes.is_empty());
    assert!(state.modifiers.is_empty());
    assert!(state.skills.contains("Cyclone"), "skills survive an item switch");
    assert_eq!(state.category(), Some(ItemCategory::Gloves));
}

#[test]
fn basetypes_need_a_single_item() {
    let mut state = FilterState::new("s");
    assert!(state.set_basetypes(["Slink Boots"]).is_err());
    state.set_basetypes(Vec::<String>::new()).expect("clearing is always allowed");
}

#[test]
fn combo_key_ignores_basetypes() {
    let mut a = FilterState::new("s").with_item("Rare Shield");
    a.set_basetypes(["Pine Buckler"]).expect("basetypes");
    let b = FilterState::new("s").with_item("Rare Shield");
    let c = FilterState::new("s").with_item("Rare Shield").with_skill("Spark");
    assert_eq!(a.combo_key(), b.combo_key());
    assert_ne!(a.combo_key(), c.combo_key());
}

#[test]
fn item_only_detection() {
    let item_only = FilterState::new("s").with_item("Rare Gloves");
    assert!(item_only.is_item_only());
    assert!(!item_only.clone().with_skill("Spark").is_item_only());
    assert!(!FilterState::new("s").is_item_only());
    assert!(!item_only.for_basetype("Rawhide Gloves").is_item_only());
}

#[test]
fn fetch_intent_params_in_fixed_order() {
    let state = FilterState::new("3.25").with_skill("Cyclone").with_item("Rare Body Armour").for_basetype("Astral Plate");
    let FetchIntent::Search { snapshot_id, params } = state.fetch_intent() else { panic!("expected search intent") };
    assert_eq!(snapshot_id, "3.25");
    let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["items", "itembasetypes-BodyArmour", "skills", "overview", "type"]);
    assert_eq!(params[4].1, "exp");
    let path = state.fetch_intent().path();
    assert_eq!(
        path,
        "/poe1/api/builds/3.25/search?items=Rare%20Body%20Armour&itembasetypes-BodyArmour=Astral%20Plate&skills=Cyclone&overview=keepers&type=exp"
    );
}

#[test]
fn dictionary_intent_uses_hash() {
    let intent = FetchIntent::Dictionary { hash: "abc123".to_string() };
    assert_eq!(intent.path(), "/poe1/api/builds/dictionary/abc123");
    assert_eq!(intent.digest(), "abc123");
}

#[test]
fn rare_item_selector_falls_back() {
    assert_eq!(rare_item_selector("Helmet"), "Rare Helmet");
    assert_eq!(rare_item_selector("Amulet"), "Rare Amulet");
    assert_eq!(ItemCategory::Helmet.display_name(), "Helmets");
}

#[test]
fn dictionary_label_treats_empty_as_missing() {
    let dict = Dictionary::new("d", ["Leather Cap", ""]);
    assert_eq!(dict.label(0), Some("Leather Cap"));
    assert_eq!(dict.label(1), None);
    assert_eq!(dict.label(7), None);
}

#[test]
fn config_defaults_without_engine_table() {
    let tmp = TempDir::new().expect("tempdir");
    let config = Config::load_from(tmp.path()).expect("load");
    assert_eq!(config.engine().expect("engine"), EngineSettings::default());
    assert_eq!(config.fixtures_dir(), tmp.path().join("./fixtures"));
}

#[test]
fn config_reads_engine_table() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(
        tmp.path().join("config.toml"),
        "[engine]\nmax_basetypes = 3\nblacklisted_basetypes = []\n\n[data]\nfixtures_dir = \"/srv/fixtures\"\n",
    )
    .expect("write config");
    let config = Config::load_from(tmp.path()).expect("load");
    let engine = config.engine().expect("engine");
    assert_eq!(engine.max_basetypes, 3);
    assert!(!engine.is_blacklisted("Spiked Gloves"));
    assert_eq!(engine.top_level_capacity, 100, "unset keys keep defaults");
    assert_eq!(config.fixtures_dir(), std::path::PathBuf::from("/srv/fixtures"));
}

#[test]
fn config_rejects_zero_capacity() {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(tmp.path().join("config.toml"), "[engine]\ntop_level_capacity = 0\n").expect("write config");
    assert!(Config::load_from(tmp.path()).is_err());
}
