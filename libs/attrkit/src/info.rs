//! Per-request façade over a resource [`Schema`].
//!
//! Each operation is one independent stage of request preparation. Stages
//! mutate the caller's [`RequestBody`] in place and fail with an
//! [`AttributeError`] whose kind tells the caller how to surface it.

use serde_json::{Map, Value};

use crate::context::ProjectContext;
use crate::error::{AttributeError, ConvertError};
use crate::populate::{fill_default, populate_nested_defaults};
use crate::schema::{PROJECT_ID, Schema, TENANT_ID};
use crate::spec::AttributeSpec;
use crate::validators::{NestedSpecs, dispatch};
use crate::value::{AttrValue, RequestBody};

/// True unless the value is `null` or "not specified".
#[must_use]
pub fn is_attr_set(value: &AttrValue) -> bool {
    value.is_set()
}

/// Borrowing view over one resource's schema.
#[derive(Debug, Clone, Copy)]
pub struct AttributeInfo<'a> {
    schema: &'a Schema,
}

impl<'a> AttributeInfo<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    #[must_use]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Fill defaults for a creation request.
    ///
    /// Every attribute allowed in POST gets its own default filled, and its
    /// nested defaults populated when it sets `dict_populate_defaults`.
    /// Attributes without a default must be present. When `check_allow_post`
    /// is set, attributes not allowed in POST must be absent. All attributes
    /// are processed; the first failure in attribute order is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidInput`] for a missing required
    /// attribute or a forbidden one.
    pub fn fill_post_defaults(
        &self,
        body: &mut RequestBody,
        check_allow_post: bool,
    ) -> Result<(), AttributeError> {
        let mut first_error = None;
        for (name, spec) in self.schema {
            let failure = if spec.allow_post {
                Self::fill_one(name, spec, body)
            } else if check_allow_post && body.is_supplied(name) {
                Some(format!("Attribute '{name}' not allowed in POST"))
            } else {
                None
            };
            if let Some(message) = failure {
                tracing::debug!(
                    resource = %self.schema.resource(),
                    attribute = %name,
                    %message,
                    "POST defaults rejected"
                );
                first_error.get_or_insert_with(|| AttributeError::invalid_input(message));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn fill_one(name: &str, spec: &AttributeSpec, body: &mut RequestBody) -> Option<String> {
        if spec.dict_populate_defaults
            && spec.is_structured()
            && let AttrValue::Specified(populated) = populate_nested_defaults(body.get(name), spec)
        {
            body.insert(name, populated);
        }
        if !spec.has_default() && !body.is_supplied(name) {
            return Some(format!("Required attribute '{name}' not specified"));
        }
        fill_default(body, name, spec);
        None
    }

    /// Convert every supplied attribute and run its validators.
    ///
    /// Converted values are written back into `body`. Members of structured
    /// values are converted with their nested specs' converters before the
    /// attribute's rules run.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidInput`] with the converter's message
    /// when conversion fails, or `"Invalid input for <attr>. Reason: <msg>."`
    /// for the first failing rule.
    pub fn convert_values(&self, body: &mut RequestBody) -> Result<(), AttributeError> {
        for (name, spec) in self.schema {
            let Some(raw) = body.get(name).into_json() else {
                continue;
            };
            let value = convert_value(raw, spec).map_err(|e| {
                tracing::debug!(attribute = %name, error = %e, "conversion failed");
                AttributeError::from(e)
            })?;
            let verdict = dispatch(&spec.validate, &value);
            body.insert(name.as_str(), value);
            if let Err(reason) = verdict {
                tracing::debug!(attribute = %name, %reason, "validation failed");
                return Err(AttributeError::invalid_input(format!(
                    "Invalid input for {name}. Reason: {reason}."
                )));
            }
        }
        Ok(())
    }

    /// Reconcile `tenant_id`/`project_id` with the caller's identity.
    ///
    /// The two keys mirror each other. A project other than the caller's own
    /// requires admin or service privileges. On creation without an explicit
    /// project the caller's project is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::BadRequest`] when the keys disagree, when an
    /// unprivileged caller names a foreign project, or when a project-scoped
    /// resource is created without any project identity.
    pub fn populate_project_id<C: ProjectContext + ?Sized>(
        &self,
        context: &C,
        body: &mut RequestBody,
        is_create: bool,
    ) -> Result<(), AttributeError> {
        self.mirror_project_info(body)?;

        let own = context
            .project_id()
            .map_or(Value::Null, |id| Value::String(id.to_owned()));
        for key in [TENANT_ID, PROJECT_ID] {
            if let Some(requested) = body.get(key).into_json()
                && requested != own
                && !context.may_act_for_other_projects()
            {
                tracing::debug!(
                    resource = %self.schema.resource(),
                    "foreign project requested without privileges"
                );
                return Err(AttributeError::bad_request(
                    "Specifying 'project_id' or 'tenant_id' other than the authenticated \
                     project in request requires admin or service privileges",
                ));
            }
        }

        if is_create && !body.is_supplied(TENANT_ID) && !body.is_supplied(PROJECT_ID) {
            if let Some(project) = context.project_id() {
                for key in [TENANT_ID, PROJECT_ID] {
                    if self.schema.contains(key) {
                        body.insert(key, Value::String(project.to_owned()));
                    }
                }
            } else if self.schema.is_project_scoped() {
                return Err(AttributeError::bad_request(
                    "Running without authentication requires that tenant_id is specified",
                ));
            }
        }
        Ok(())
    }

    /// Reject keys the schema does not declare.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::BadRequest`] naming every unknown key.
    pub fn verify_attributes(&self, body: &RequestBody) -> Result<(), AttributeError> {
        let unknown: Vec<&str> = body.keys().filter(|k| !self.schema.contains(k)).collect();
        if unknown.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            resource = %self.schema.resource(),
            unknown = %unknown.join(", "),
            "unrecognized attributes"
        );
        Err(AttributeError::bad_request(format!(
            "Unrecognized attribute(s) '{}'",
            unknown.join(", ")
        )))
    }

    /// Reject read-only attributes in an update request.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::InvalidInput`] for the first supplied
    /// attribute whose spec forbids PUT.
    pub fn check_put_allowed(&self, body: &RequestBody) -> Result<(), AttributeError> {
        match self
            .schema
            .iter()
            .find(|(name, spec)| !spec.allow_put && body.is_supplied(name))
        {
            Some((name, _)) => Err(AttributeError::invalid_input(format!(
                "Cannot update read-only attribute '{name}'"
            ))),
            None => Ok(()),
        }
    }

    /// Copy whichever of `tenant_id`/`project_id` was supplied onto the other.
    ///
    /// The two keys are aliases: when the schema declares only one of them,
    /// the undeclared spelling is dropped after its value has been carried
    /// over.
    fn mirror_project_info(self, body: &mut RequestBody) -> Result<(), AttributeError> {
        let tenant = body.get(TENANT_ID);
        let project = body.get(PROJECT_ID);
        if !tenant.is_not_specified() && !project.is_not_specified() && tenant != project {
            return Err(AttributeError::bad_request(
                "'project_id' and 'tenant_id' do not match",
            ));
        }
        if !self.schema.is_project_scoped() {
            return Ok(());
        }
        match (tenant.is_not_specified(), project.is_not_specified()) {
            (false, true) => body.insert(PROJECT_ID, tenant),
            (true, false) => body.insert(TENANT_ID, project),
            _ => {}
        }
        for key in [TENANT_ID, PROJECT_ID] {
            if !self.schema.contains(key) && body.remove(key).is_some() {
                tracing::trace!(
                    resource = %self.schema.resource(),
                    key,
                    "dropped undeclared project alias"
                );
            }
        }
        Ok(())
    }

    fn names_where(self, pred: impl Fn(&AttributeSpec) -> bool) -> Vec<&'a str> {
        self.schema
            .attributes()
            .iter()
            .filter(|(_, spec)| pred(spec))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    #[must_use]
    pub fn visible_attributes(&self) -> Vec<&'a str> {
        self.names_where(|s| s.is_visible)
    }

    #[must_use]
    pub fn filter_keys(&self) -> Vec<&'a str> {
        self.names_where(|s| s.is_filter)
    }

    #[must_use]
    pub fn sort_keys(&self) -> Vec<&'a str> {
        self.names_where(|s| s.is_sort_key)
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&'a str> {
        self.names_where(|s| s.primary_key).into_iter().next()
    }

    /// Attributes an external policy engine must check.
    #[must_use]
    pub fn policy_enforced_attributes(&self) -> Vec<&'a str> {
        self.names_where(|s| s.enforce_policy || s.required_by_policy)
    }
}

/// Apply an attribute's converters, then its nested specs' converters.
fn convert_value(value: Value, spec: &AttributeSpec) -> Result<Value, ConvertError> {
    let mut value = if let Some(pipeline) = &spec.convert_to {
        pipeline.apply(&value)?
    } else if let Some(list) = &spec.convert_list_to {
        list.apply(&value)?
    } else {
        value
    };
    for (_, specs) in spec.structured_rules() {
        match &mut value {
            Value::Object(map) => convert_members(map, specs)?,
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(map) = item {
                        convert_members(map, specs)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(value)
}

fn convert_members(map: &mut Map<String, Value>, specs: &NestedSpecs) -> Result<(), ConvertError> {
    for (key, key_spec) in specs {
        if let Some(member) = map.get_mut(key) {
            *member = convert_value(member.take(), key_spec)?;
        }
    }
    Ok(())
}
