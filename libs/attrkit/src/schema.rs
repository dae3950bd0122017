//! Resource schemas and the set of schemas a service exposes.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::ConfigurationError;
use crate::spec::AttributeSpec;

/// Attribute name to spec, in name order.
pub type AttributeMap = BTreeMap<String, AttributeSpec>;

/// Attribute names that carry resource ownership.
pub const TENANT_ID: &str = "tenant_id";
pub const PROJECT_ID: &str = "project_id";

/// The attribute map of one resource.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    resource: String,
    attributes: AttributeMap,
}

impl Schema {
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attributes: AttributeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attributes(resource: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            resource: resource.into(),
            attributes,
        }
    }

    /// Add or replace an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: AttributeSpec) {
        self.attributes.insert(name.into(), spec);
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeSpec)> {
        self.attributes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// True if the resource is owned by a project.
    #[must_use]
    pub fn is_project_scoped(&self) -> bool {
        self.contains(TENANT_ID) || self.contains(PROJECT_ID)
    }

    fn merge(&mut self, extension: AttributeMap) {
        for (name, spec) in extension {
            if self.attributes.insert(name.clone(), spec).is_some() {
                tracing::debug!(
                    resource = %self.resource,
                    attribute = %name,
                    "extension replaced attribute"
                );
            }
        }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a AttributeSpec);
    type IntoIter = btree_map::Iter<'a, String, AttributeSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

/// Where a sub-resource hangs off its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub collection_name: String,
    pub member_name: String,
}

impl ParentRef {
    #[must_use]
    pub fn new(collection_name: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            member_name: member_name.into(),
        }
    }

    /// Name of the attribute carrying the parent id, e.g. `policy_id`.
    #[must_use]
    pub fn id_attribute(&self) -> String {
        format!("{}_id", self.member_name)
    }
}

/// A resource nested under a parent collection.
#[derive(Debug, Clone)]
pub struct SubResource {
    pub parent: ParentRef,
    pub schema: Schema,
}

/// All resource and sub-resource schemas of a service.
///
/// Built at startup (including extension merging) and then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    resources: BTreeMap<String, Schema>,
    sub_resources: BTreeMap<String, SubResource>,
}

impl SchemaSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level resource, replacing one of the same name.
    pub fn insert_resource(&mut self, schema: Schema) {
        self.resources.insert(schema.resource().to_owned(), schema);
    }

    pub fn insert_sub_resource(&mut self, parent: ParentRef, schema: Schema) {
        self.sub_resources
            .insert(schema.resource().to_owned(), SubResource { parent, schema });
    }

    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&Schema> {
        self.resources.get(name)
    }

    #[must_use]
    pub fn sub_resource(&self, name: &str) -> Option<&SubResource> {
        self.sub_resources.get(name)
    }

    /// Schema of a resource or sub-resource.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownResource`] if neither exists.
    pub fn schema(&self, name: &str) -> Result<&Schema, ConfigurationError> {
        self.resources
            .get(name)
            .or_else(|| self.sub_resources.get(name).map(|s| &s.schema))
            .ok_or_else(|| ConfigurationError::UnknownResource {
                resource: name.to_owned(),
            })
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn sub_resource_names(&self) -> impl Iterator<Item = &str> {
        self.sub_resources.keys().map(String::as_str)
    }

    /// Merge extension attributes into an existing resource or sub-resource.
    ///
    /// New attributes are added; an attribute that already exists is
    /// replaced by the extension's spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownResource`] if the target does not
    /// exist.
    pub fn extend(
        &mut self,
        resource: &str,
        attributes: AttributeMap,
    ) -> Result<(), ConfigurationError> {
        let schema = if let Some(schema) = self.resources.get_mut(resource) {
            schema
        } else if let Some(sub) = self.sub_resources.get_mut(resource) {
            &mut sub.schema
        } else {
            tracing::warn!(resource, "extension targets unknown resource");
            return Err(ConfigurationError::UnknownResource {
                resource: resource.to_owned(),
            });
        };
        tracing::debug!(resource, count = attributes.len(), "extending resource");
        schema.merge(attributes);
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.sub_resources.is_empty()
    }
}
