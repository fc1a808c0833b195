use modelref_types::AuditPreset;
use url::Url;

/// Query parameters of the category audit endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AuditQuery {
    /// Ask the server to fold text model variations into one entry.
    pub group_text_models: bool,
    pub preset: AuditPreset,
    pub offset: u32,
}

impl AuditQuery {
    pub fn new(preset: AuditPreset) -> Self {
        Self {
            preset,
            ..Default::default()
        }
    }

    pub fn grouped(mut self, group_text_models: bool) -> Self {
        self.group_text_models = group_text_models;
        self
    }

    pub fn at_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub(crate) fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(
            "group_text_models",
            if self.group_text_models { "true" } else { "false" },
        );
        if let Some(preset) = self.preset.query_value() {
            pairs.append_pair("preset", preset);
        }
        pairs.append_pair("offset", &self.offset.to_string());
    }
}
