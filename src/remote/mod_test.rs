use super::*;
use crate::grid::LightColor;

#[test]
fn document_serializes_camel_case_fields() {
    let draft = PresetDraft {
        name: "Anchored".into(),
        description: "all-round white".into(),
        category: PresetCategory::Custom,
        lights: vec![PresetLight { id: 6, color: LightColor::White }],
    };
    let doc = PresetDocument::from_draft("r1".into(), draft, 1234);
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["createdAt"], 1234);
    assert_eq!(value["isPublic"], true);
    assert_eq!(value["category"], "custom");
    assert_eq!(value["lights"][0]["color"], "white");
}

#[test]
fn draft_from_preset_drops_local_id() {
    let preset = Preset::new("custom_9".into(), "NUC", "", vec![PresetLight { id: 1, color: LightColor::Red }]).unwrap();
    let draft = PresetDraft::from(&preset);
    let value = serde_json::to_value(&draft).unwrap();
    assert!(value.get("id").is_none());
    assert_eq!(value["name"], "NUC");
    assert_eq!(value["description"], crate::preset::DEFAULT_DESCRIPTION);
}

#[test]
fn into_preset_uses_document_id() {
    let draft = PresetDraft {
        name: "Tow".into(),
        description: String::new(),
        category: PresetCategory::Custom,
        lights: vec![PresetLight { id: 2, color: LightColor::Yellow }],
    };
    let preset = PresetDocument::from_draft("remote-7".into(), draft, 1).into_preset();
    assert_eq!(preset.id, "remote-7");
    assert_eq!(preset.lights.len(), 1);
}

#[test]
fn remote_error_messages() {
    assert_eq!(RemoteError::NotConfigured.to_string(), "online sharing is not configured");
    let err = RemoteError::Response { status: 503, body: "down".into() };
    assert_eq!(err.to_string(), "remote response error: status 503");
}
