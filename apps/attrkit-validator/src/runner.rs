//! Load a schema, read a request body, run the pipeline.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use attrkit::{
    Action, AttributeError, ConverterRegistry, EngineConfig, RequestBody, RequestPipeline,
    SchemaLoader, ValidatorRegistry,
};
use attrkit_security::SecurityContext;
use serde_json::{Map, Value};

/// Where the request body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    Stdin,
    File(PathBuf),
}

impl From<&str> for BodySource {
    fn from(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

/// One validation run.
#[derive(Debug, Clone)]
pub struct Request {
    pub schema: PathBuf,
    pub resource: String,
    pub body: BodySource,
    pub action: Action,
    pub project_id: Option<String>,
    pub admin: bool,
    pub roles: Vec<String>,
}

/// Result of a run that got as far as the pipeline.
#[derive(Debug)]
pub enum Outcome {
    /// The prepared body, with "not specified" entries omitted.
    Prepared(Map<String, Value>),
    /// The request was rejected.
    Rejected(AttributeError),
}

impl Request {
    fn context(&self, config: &EngineConfig) -> SecurityContext {
        let mut builder = SecurityContext::builder()
            .roles(self.roles.clone())
            .admin(self.admin)
            .service_roles(config.service_roles.clone());
        if let Some(project) = &self.project_id {
            builder = builder.project_id(project);
        }
        builder.build()
    }
}

/// Run `request` under `config`.
///
/// Request errors are reported as [`Outcome::Rejected`]; anything that stops
/// the pipeline from running at all is an error.
///
/// # Errors
///
/// Fails for unreadable inputs, malformed schema documents, unknown
/// resources, and bodies that are not JSON objects.
pub fn run(request: &Request, config: &EngineConfig) -> anyhow::Result<Outcome> {
    let converters = ConverterRegistry::new();
    let mut validators = ValidatorRegistry::new();
    attrkit::extensions::register_all(&mut validators)?;

    let schemas = SchemaLoader::new(&converters, &validators)
        .load_path(&request.schema)
        .with_context(|| format!("failed to load schema {}", request.schema.display()))?;
    let schema = schemas.schema(&request.resource)?;

    let mut body = RequestBody::from_json_map(read_body(&request.body)?);
    let context = request.context(config);
    tracing::info!(
        resource = %request.resource,
        action = %request.action,
        attributes = body.len(),
        "preparing request"
    );

    match RequestPipeline::new(schema, config).prepare(&context, &mut body, request.action) {
        Ok(()) => Ok(Outcome::Prepared(body.to_json_map())),
        Err(err) if err.is_client_error() => Ok(Outcome::Rejected(err)),
        Err(err) => Err(err.into()),
    }
}

fn read_body(source: &BodySource) -> anyhow::Result<Map<String, Value>> {
    let text = match source {
        BodySource::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read request body from stdin")?;
            text
        }
        BodySource::File(path) => read_file(path)?,
    };
    match serde_json::from_str(&text).context("request body is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("request body must be a JSON object, got {other}"),
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
