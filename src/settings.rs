use std::fmt;

use encoding::EncodingRef;

use crate::variant::CheckRules;

pub const DEFAULT_MANIFEST_NAME: &str = "install_script.iss";
pub const DEFAULT_OUTPUT_PREFIX: &str = "Output_";

#[derive(Clone)]
pub struct RebuildSettings {
    /// `Check:` function -> category.
    check_rules: CheckRules,
    /// File name of the script inside the extraction root.
    manifest_name: String,
    /// Prefix of every per-category output directory.
    output_prefix: String,
    /// Code page for scripts that are not valid UTF-8 and carry no BOM.
    ansi_codec: Option<EncodingRef>,
}

impl fmt::Debug for RebuildSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildSettings")
            .field("check_rules", &self.check_rules)
            .field("manifest_name", &self.manifest_name)
            .field("output_prefix", &self.output_prefix)
            .field("ansi_codec", &self.ansi_codec.map(|c| c.name()))
            .finish()
    }
}

impl PartialEq for RebuildSettings {
    fn eq(&self, other: &Self) -> bool {
        self.check_rules == other.check_rules
            && self.manifest_name == other.manifest_name
            && self.output_prefix == other.output_prefix
            && self.ansi_codec.map(|c| c.name()) == other.ansi_codec.map(|c| c.name())
    }
}

impl Default for RebuildSettings {
    fn default() -> Self {
        RebuildSettings {
            check_rules: CheckRules::default(),
            manifest_name: DEFAULT_MANIFEST_NAME.to_owned(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_owned(),
            ansi_codec: None,
        }
    }
}

impl RebuildSettings {
    pub fn new() -> Self {
        RebuildSettings::default()
    }

    /// Replaces the `Check:` rules.
    pub fn check_rules(mut self, rules: CheckRules) -> Self {
        self.check_rules = rules;
        self
    }

    /// Adds a single `Check:` rule on top of the current ones.
    pub fn check_rule(mut self, check: impl Into<String>, category: impl Into<String>) -> Self {
        self.check_rules = self.check_rules.with_rule(check, category);
        self
    }

    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    pub fn ansi_codec(mut self, codec: Option<EncodingRef>) -> Self {
        self.ansi_codec = codec;
        self
    }

    pub fn get_check_rules(&self) -> &CheckRules {
        &self.check_rules
    }

    pub fn get_manifest_name(&self) -> &str {
        &self.manifest_name
    }

    pub fn get_output_prefix(&self) -> &str {
        &self.output_prefix
    }

    pub fn get_ansi_codec(&self) -> Option<EncodingRef> {
        self.ansi_codec
    }
}
