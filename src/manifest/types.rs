use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// `[Setup]` directives collected into [`Metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MetadataKey {
    AppName,
    AppVerName,
    AppId,
    AppVersion,
    AppPublisher,
    #[serde(rename = "AppPublisherURL")]
    AppPublisherUrl,
    #[serde(rename = "AppSupportURL")]
    AppSupportUrl,
    #[serde(rename = "AppUpdatesURL")]
    AppUpdatesUrl,
    AppComments,
    AppCopyright,
    DefaultDirName,
    ArchitecturesAllowed,
    ArchitecturesInstallIn64BitMode,
}

impl MetadataKey {
    pub const ALL: [MetadataKey; 13] = [
        MetadataKey::AppName,
        MetadataKey::AppVerName,
        MetadataKey::AppId,
        MetadataKey::AppVersion,
        MetadataKey::AppPublisher,
        MetadataKey::AppPublisherUrl,
        MetadataKey::AppSupportUrl,
        MetadataKey::AppUpdatesUrl,
        MetadataKey::AppComments,
        MetadataKey::AppCopyright,
        MetadataKey::DefaultDirName,
        MetadataKey::ArchitecturesAllowed,
        MetadataKey::ArchitecturesInstallIn64BitMode,
    ];

    /// The directive name as written in the script.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::AppName => "AppName",
            MetadataKey::AppVerName => "AppVerName",
            MetadataKey::AppId => "AppId",
            MetadataKey::AppVersion => "AppVersion",
            MetadataKey::AppPublisher => "AppPublisher",
            MetadataKey::AppPublisherUrl => "AppPublisherURL",
            MetadataKey::AppSupportUrl => "AppSupportURL",
            MetadataKey::AppUpdatesUrl => "AppUpdatesURL",
            MetadataKey::AppComments => "AppComments",
            MetadataKey::AppCopyright => "AppCopyright",
            MetadataKey::DefaultDirName => "DefaultDirName",
            MetadataKey::ArchitecturesAllowed => "ArchitecturesAllowed",
            MetadataKey::ArchitecturesInstallIn64BitMode => "ArchitecturesInstallIn64BitMode",
        }
    }

    /// Case-insensitive lookup, matching how Inno Setup reads directive names.
    pub fn from_name(name: &str) -> Option<Self> {
        MetadataKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product metadata. Only directives present in the script appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<MetadataKey, String>);

impl Metadata {
    pub(crate) fn from_map(map: BTreeMap<MetadataKey, String>) -> Self {
        Metadata(map)
    }

    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Value for display, `N/A` when absent.
    pub fn display(&self, key: MetadataKey) -> &str {
        self.get(key).unwrap_or("N/A")
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One line of the `[Files]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the extraction root, as written in the script (`{app}\a,1.dll`).
    pub source: String,
    pub dest_dir: String,
    pub dest_name: String,
    /// Name of the `Check:` function, if any.
    pub check: Option<String>,
    /// 1-based line number in the script.
    pub line: usize,
}
