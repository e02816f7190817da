use super::*;
use crate::grid::LightColor;
use crate::preset::{PresetCategory, PresetLight};

fn draft(name: &str, cells: &[u32]) -> PresetDraft {
    PresetDraft {
        name: name.into(),
        description: String::new(),
        category: PresetCategory::Custom,
        lights: cells.iter().map(|&id| PresetLight { id, color: LightColor::Green }).collect(),
    }
}

#[test]
fn clamp_limit_defaults_and_caps() {
    assert_eq!(clamp_limit(None), DEFAULT_PUBLIC_LIMIT);
    assert_eq!(clamp_limit(Some(10)), 10);
    assert_eq!(clamp_limit(Some(500)), DEFAULT_PUBLIC_LIMIT);
    assert_eq!(clamp_limit(Some(0)), 0);
}

#[test]
fn is_publishable_accepts_valid_draft() {
    assert!(is_publishable(&draft("Vessel", &[0, 95])));
}

#[test]
fn is_publishable_rejects_blank_name() {
    assert!(!is_publishable(&draft("  ", &[0])));
}

#[test]
fn is_publishable_rejects_bad_lights() {
    assert!(!is_publishable(&draft("Empty", &[])));
    assert!(!is_publishable(&draft("Off grid", &[96])));
    assert!(!is_publishable(&draft("Twice", &[4, 4])));
}
