use validator::Validate;

use crate::forms::{FieldKind, FieldSpec, FormData, FormErrors};

/// Input for entities that only carry a name (statuses and labels).
#[derive(Debug, Clone, Validate)]
pub struct NameInput {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
}

impl NameInput {
    pub const FIELDS: &'static [FieldSpec] = &[FieldSpec::new("name", FieldKind::Text, true)];

    pub fn bind(form: &FormData) -> Self {
        Self {
            name: form.text("name"),
        }
    }

    pub fn clean(&self) -> Result<(), FormErrors> {
        FormErrors::from_result(self.validate()).into_result()
    }
}
