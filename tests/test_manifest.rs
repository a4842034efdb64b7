
use fixtures::*;

use innorebuild::manifest::ManifestError;
use innorebuild::{Category, Manifest, MetadataKey, RebuildSettings, VariantToken};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn test_parses_sample_metadata() {
    ensure_env_logger_initialized();
    let manifest = Manifest::from_path(sample_manifest(), &RebuildSettings::new()).unwrap();
    let metadata = &manifest.metadata;

    assert_eq!(metadata.get(MetadataKey::AppName), Some("Sample Tool"));
    assert_eq!(metadata.get(MetadataKey::AppVersion), Some("2.4.1"));
    assert_eq!(metadata.get(MetadataKey::AppVerName), Some("Sample Tool 2.4.1"));
    assert_eq!(metadata.get(MetadataKey::AppPublisher), Some("Example Corp"));
    assert_eq!(
        metadata.get(MetadataKey::AppPublisherUrl),
        Some("https://example.com/")
    );
    assert_eq!(
        metadata.get(MetadataKey::AppSupportUrl),
        Some("https://example.com/support")
    );
    assert_eq!(
        metadata.get(MetadataKey::AppId),
        Some("{{3A1C2B44-0000-4E1A-9C55-7D2A1B0F0001}")
    );
    assert_eq!(
        metadata.get(MetadataKey::ArchitecturesAllowed),
        Some("x64compatible arm64")
    );

    // Absent keys are absent, not empty.
    assert_eq!(metadata.get(MetadataKey::AppComments), None);
    assert_eq!(metadata.display(MetadataKey::AppComments), "N/A");
    assert!(metadata.iter().all(|(_, v)| !v.is_empty()));
}

#[test]
fn test_parses_sample_file_entries() {
    let manifest = Manifest::parse(&sample_manifest_text());

    assert_eq!(manifest.entries.len(), 7);

    let first = &manifest.entries[0];
    assert_eq!(first.source, r"{app}\tool,1.exe");
    assert_eq!(first.dest_dir, "{app}");
    assert_eq!(first.dest_name, "tool.exe");
    assert_eq!(first.check.as_deref(), Some("InstallX64"));
    assert_eq!(first.line, 17);

    let readme = &manifest.entries[5];
    assert_eq!(readme.source, r"{app}\readme.txt");
    assert_eq!(readme.check, None);

    // Entries keep manifest order.
    let lines: Vec<usize> = manifest.entries.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![17, 18, 19, 20, 21, 22, 23]);
}

#[test]
fn test_infers_variant_categories_from_check() {
    let manifest = Manifest::parse(&sample_manifest_text());
    let variants = &manifest.variants;

    assert_eq!(variants.len(), 3);
    assert_eq!(
        variants.get(&VariantToken::new("1")),
        Some(&Category::named("x64"))
    );
    assert_eq!(
        variants.get(&VariantToken::new("2")),
        Some(&Category::named("ARM64"))
    );
    assert_eq!(variants.get(&VariantToken::new("3")), Some(&Category::Other));
    assert_eq!(variants.resolve(&VariantToken::new("7")), Category::Unknown);
    assert!(variants.conflicts().is_empty());
}

#[test]
fn test_custom_check_rule_names_category() {
    let text = r#"[Files]
Source: "driver,2.dll"; DestDir: "{app}"; DestName: "driver.dll"; Check: "InstallBeta";
"#;
    let settings = RebuildSettings::new().check_rule("InstallBeta", "Beta");
    let manifest = Manifest::parse_with_settings(text, &settings);

    assert_eq!(
        manifest.variants.resolve(&VariantToken::new("2")),
        Category::named("Beta")
    );
}

#[test]
fn test_conflicting_mappings_are_reported() {
    let text = r#"[Files]
Source: "a,1.dll"; DestDir: "{app}"; DestName: "a.dll"; Check: "InstallX64";
Source: "b,1.dll"; DestDir: "{app}"; DestName: "b.dll"; Check: "InstallARM64";
"#;
    ensure_env_logger_initialized();
    let manifest = Manifest::parse(text);

    assert_eq!(
        manifest.variants.resolve(&VariantToken::new("1")),
        Category::named("ARM64")
    );
    let conflicts = manifest.variants.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].previous, Category::named("x64"));
    assert_eq!(conflicts[0].current, Category::named("ARM64"));
    assert_eq!(conflicts[0].line, 3);
}

#[test]
fn test_section_without_trailing_blank_line() {
    let text = "[Files]\r\nSource: \"a,1.dll\"; DestDir: \"{app}\"; DestName: \"a.dll\"; Check: \"InstallX64\"";
    let manifest = Manifest::parse(text);
    assert_eq!(manifest.entries.len(), 1);
    assert_eq!(manifest.variants.len(), 1);
}

#[test]
fn test_zero_entries_yields_no_variants() {
    let manifest = Manifest::parse("[Setup]\nAppName=Nothing\n\n[Files]\n\n");
    assert!(manifest.entries.is_empty());
    assert!(manifest.variants.is_empty());
    assert_eq!(manifest.metadata.get(MetadataKey::AppName), Some("Nothing"));
}

#[test]
fn test_undecodable_bytes_are_dropped() {
    let mut bytes = b"AppName=Bro".to_vec();
    bytes.push(0xFF);
    bytes.extend_from_slice(b"ken\n");
    let manifest = Manifest::from_bytes(&bytes, &RebuildSettings::new()).unwrap();
    assert_eq!(manifest.metadata.get(MetadataKey::AppName), Some("Broken"));
}

#[test]
fn test_missing_manifest_degrades_to_empty() {
    ensure_env_logger_initialized();
    let d = tempdir().unwrap();
    let path = d.path().join("install_script.iss");

    let err = Manifest::from_path(&path, &RebuildSettings::new()).unwrap_err();
    assert!(matches!(err, ManifestError::NotFound { .. }));

    let manifest = Manifest::load_or_empty(&path, &RebuildSettings::new());
    assert!(manifest.is_empty());
}

#[test]
fn test_manifest_serializes_for_inspection() {
    let manifest = Manifest::parse(&sample_manifest_text());
    let value = serde_json::to_value(&manifest).unwrap();

    assert_eq!(value["metadata"]["AppPublisherURL"], "https://example.com/");
    assert_eq!(value["entries"][0]["check"], "InstallX64");
    assert_eq!(value["variants"]["mapping"]["2"], "ARM64");
    assert_eq!(value["variants"]["mapping"]["3"], "Other");
}
