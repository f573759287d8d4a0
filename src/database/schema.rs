//! Field declarations per collection.
//!
//! Consumed by the write pipeline for defaults and required checks, and
//! mirrored by the DDL in [`crate::migration`]. Tenancy fields become required
//! only once the rollout reaches the contract phase.

use serde_json::{json, Value};

use crate::config::RolloutPhase;
use crate::database::store::Record;
use crate::types::Collection;

/// When a field must be present on a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    Always,
    /// Optional during the expand phase, required after contract
    AfterContract,
    Never,
}

/// Interceptor attached to a field and run before every write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldHook {
    /// Owner stamping, see [`crate::tenancy::resolve_website`]
    WebsiteAssignment,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: Required,
    pub unique: bool,
    pub index: bool,
    pub default: Option<fn() -> Value>,
    pub hook: Option<FieldHook>,
}

impl FieldSpec {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            required: Required::Never,
            unique: false,
            index: false,
            default: None,
            hook: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = Required::Always;
        self
    }

    fn required_after_contract(mut self) -> Self {
        self.required = Required::AfterContract;
        self
    }

    fn unique(mut self) -> Self {
        self.unique = true;
        self.index = true;
        self
    }

    fn index(mut self) -> Self {
        self.index = true;
        self
    }

    fn default(mut self, default: fn() -> Value) -> Self {
        self.default = Some(default);
        self
    }

    fn hook(mut self, hook: FieldHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn is_required(&self, phase: RolloutPhase) -> bool {
        match self.required {
            Required::Always => true,
            Required::AfterContract => !phase.is_transitional(),
            Required::Never => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub collection: Collection,
    pub fields: Vec<FieldSpec>,
}

/// Fields owned by the system and never accepted from API input
pub const SYSTEM_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

impl CollectionSchema {
    pub fn for_collection(collection: Collection) -> Self {
        let fields = match collection {
            Collection::Websites => vec![
                FieldSpec::new("name").required(),
                FieldSpec::new("domain").required().unique(),
                FieldSpec::new("slug").required().unique(),
                FieldSpec::new("status").required().default(|| json!("active")),
                FieldSpec::new("settings").default(|| json!({})),
            ],
            Collection::Users => vec![
                FieldSpec::new("email").required().unique(),
                FieldSpec::new("name"),
                FieldSpec::new("role").required_after_contract().default(|| json!("viewer")),
                FieldSpec::new("websites").required_after_contract().default(|| json!([])),
                FieldSpec::new("default_website").required_after_contract().index(),
            ],
            Collection::Pages => vec![
                FieldSpec::new("title").required(),
                FieldSpec::new("slug").required().index(),
                FieldSpec::new("website")
                    .required_after_contract()
                    .index()
                    .hook(FieldHook::WebsiteAssignment),
                FieldSpec::new("layout").default(|| json!([])),
                FieldSpec::new("meta_description"),
                FieldSpec::new("published_date"),
                FieldSpec::new("status").required().default(|| json!("draft")),
            ],
            Collection::Media => vec![
                FieldSpec::new("alt").required(),
                FieldSpec::new("filename"),
                FieldSpec::new("mime_type"),
                FieldSpec::new("filesize"),
                FieldSpec::new("url"),
                FieldSpec::new("website")
                    .required_after_contract()
                    .index()
                    .hook(FieldHook::WebsiteAssignment),
            ],
        };
        Self { collection, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_with_hook(&self, hook: FieldHook) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.hook == Some(hook))
    }

    /// Fill declared defaults for fields absent from `record`
    pub fn apply_defaults(&self, record: &mut Record) {
        for field in &self.fields {
            if let Some(default) = field.default {
                if record.get(field.name).map_or(true, Value::is_null) {
                    record.insert(field.name.to_string(), default());
                }
            }
        }
    }

    /// Required fields missing from `record` under `phase`.
    ///
    /// Empty strings and empty lists count as missing.
    pub fn missing_required(&self, record: &Record, phase: RolloutPhase) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_required(phase))
            .filter(|f| match record.get(f.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Array(a)) => a.is_empty(),
                Some(_) => false,
            })
            .map(|f| f.name)
            .collect()
    }

    pub fn is_known_field(&self, name: &str) -> bool {
        SYSTEM_FIELDS.contains(&name) || self.field(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn declared_unique_fields_match_collection_constraints() {
        for collection in Collection::ALL {
            let schema = CollectionSchema::for_collection(collection);
            let unique: Vec<_> = schema.fields.iter().filter(|f| f.unique).map(|f| f.name).collect();
            assert_eq!(unique, collection.unique_fields());
        }
    }

    #[test]
    fn tenancy_fields_are_required_only_after_contract() {
        let schema = CollectionSchema::for_collection(Collection::Pages);
        let page = record(json!({ "title": "Home", "slug": "home", "status": "draft" }));
        assert!(schema.missing_required(&page, RolloutPhase::Expand).is_empty());
        assert_eq!(schema.missing_required(&page, RolloutPhase::Contract), vec!["website"]);
    }

    #[test]
    fn empty_membership_counts_as_missing() {
        let schema = CollectionSchema::for_collection(Collection::Users);
        let user = record(json!({ "email": "a@example.com", "role": "viewer", "websites": [], "default_website": null }));
        assert_eq!(
            schema.missing_required(&user, RolloutPhase::Contract),
            vec!["websites", "default_website"]
        );
    }

    #[test]
    fn defaults_fill_absent_fields_only() {
        let schema = CollectionSchema::for_collection(Collection::Users);
        let mut user = record(json!({ "email": "a@example.com", "role": "editor" }));
        schema.apply_defaults(&mut user);
        assert_eq!(user["role"], "editor");
        assert_eq!(user["websites"], json!([]));
    }

    #[test]
    fn website_hook_is_attached_to_content_only() {
        for collection in Collection::ALL {
            let schema = CollectionSchema::for_collection(collection);
            let hooked: Vec<_> = schema.fields_with_hook(FieldHook::WebsiteAssignment).map(|f| f.name).collect();
            if collection.is_tenant_scoped() {
                assert_eq!(hooked, vec!["website"]);
            } else {
                assert!(hooked.is_empty());
            }
        }
    }
}
