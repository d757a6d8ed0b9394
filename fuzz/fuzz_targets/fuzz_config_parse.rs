//! Fuzz target: rig configuration parsing
//!
//! Feeds arbitrary text to `RigConfig::from_json` and checks:
//! - No panics on malformed or hostile documents
//! - Anything accepted also passes `validate` and yields one recipe
//!   entry per configured step
//!
//! cargo fuzz run fuzz_config_parse

#![no_main]

use brewrig::app::ports::PropertyStore;
use brewrig::config::RigConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = RigConfig::from_json(text) else {
        return;
    };

    assert!(config.validate().is_ok());
    let outline = config.recipe_outline();
    assert_eq!(outline.len(), config.recipe.len());
    for position in 0..outline.len() {
        assert!(config.step_properties(position).is_ok());
    }
    assert!(config.step_properties(outline.len()).is_err());
});
