//! Template rendering
//!
//! Expands a stored template against a JSON context with Tera. Rendering is
//! pure: the same identifier and context always yield the same document.

use crate::error::{Result, TemplateError};
use crate::store::TemplateStore;
use std::fmt;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::debug;

/// Markers that must never survive expansion
const UNEXPANDED_MARKERS: &[&str] = &["{{", "{%", "{#"];

/// CloudFormation dynamic reference, kept verbatim through `{% raw %}`
const DYNAMIC_REFERENCE: &str = "{{resolve:";

/// Fully expanded template output
///
/// An empty document means "nothing to deploy". Whitespace-only output is
/// normalized to empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedDocument {
    body: String,
}

impl RenderedDocument {
    pub fn new(body: impl Into<String>) -> Self {
        let body = body.into();
        if body.trim().is_empty() {
            Self::empty()
        } else {
            Self { body }
        }
    }

    pub fn empty() -> Self {
        Self {
            body: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    pub fn into_string(self) -> String {
        self.body
    }
}

impl fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

/// Renders templates resolved from a store
#[derive(Clone)]
pub struct TemplateRenderer {
    store: Arc<dyn TemplateStore>,
}

impl TemplateRenderer {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    /// Resolve `id` and expand it against `context`
    ///
    /// `context` must be a JSON object; `None` renders with template defaults only.
    #[tracing::instrument(skip(self, context))]
    pub fn render(&self, id: &str, context: Option<&serde_json::Value>) -> Result<RenderedDocument> {
        let template = self.store.resolve(id)?;
        let context = build_context(id, context)?;
        let document = render_str(id, &template, &context)?;

        debug!(
            id = %id,
            bytes = document.as_str().len(),
            empty = document.is_empty(),
            "Rendered template"
        );
        Ok(document)
    }
}

/// Expand a raw template string
pub fn render_str(id: &str, template: &str, context: &Context) -> Result<RenderedDocument> {
    let rendered = Tera::one_off(template, context, false).map_err(|e| TemplateError::Render {
        id: id.to_string(),
        message: extract_tera_error_detail(&e),
    })?;

    let scanned = rendered.replace(DYNAMIC_REFERENCE, "");
    if let Some(marker) = UNEXPANDED_MARKERS.iter().find(|m| scanned.contains(**m)) {
        return Err(TemplateError::Render {
            id: id.to_string(),
            message: format!("output still contains unexpanded marker `{marker}`"),
        });
    }

    Ok(RenderedDocument::new(rendered))
}

fn build_context(id: &str, value: Option<&serde_json::Value>) -> Result<Context> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(Context::new()),
        Some(value @ serde_json::Value::Object(_)) => {
            Context::from_value(value.clone()).map_err(|e| TemplateError::Render {
                id: id.to_string(),
                message: extract_tera_error_detail(&e),
            })
        }
        Some(_) => Err(TemplateError::Render {
            id: id.to_string(),
            message: "render context must be an object".to_string(),
        }),
    }
}

/// Collapse a Tera error chain into one message
///
/// Undefined variables are reported by name.
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    if full_error.contains("not found in context")
        && let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!("undefined variable `{var_name}`");
    }

    if full_error.contains("Filter") && full_error.contains("not found") {
        return format!("undefined filter: {full_error}");
    }

    full_error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EmbeddedTemplateStore, LayeredTemplateStore, ids};
    use serde_json::json;

    /// Store holding a fixed set of templates
    struct FixedStore(Vec<(&'static str, &'static str)>);

    impl TemplateStore for FixedStore {
        fn resolve(&self, id: &str) -> Result<String> {
            self.0
                .iter()
                .find(|(name, _)| *name == id)
                .map(|(_, body)| body.to_string())
                .ok_or_else(|| TemplateError::NotFound(id.to_string()))
        }

        fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
            Ok(self
                .0
                .iter()
                .filter(|(name, _)| name.starts_with(prefix))
                .map(|(name, _)| name.to_string())
                .collect())
        }
    }

    fn renderer(templates: Vec<(&'static str, &'static str)>) -> TemplateRenderer {
        TemplateRenderer::new(Arc::new(FixedStore(templates)))
    }

    #[test]
    fn test_simple_variable_expansion() {
        let renderer = renderer(vec![("t/hello", "Hello {{ name }}!")]);
        let doc = renderer
            .render("t/hello", Some(&json!({ "name": "world" })))
            .unwrap();
        assert_eq!(doc.as_str(), "Hello world!");
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = TemplateRenderer::new(Arc::new(EmbeddedTemplateStore::new()));
        let context = json!({
            "namespace": "acme",
            "environment_name": "dev",
            "service_name": "orders",
        });

        let first = renderer.render(ids::SERVICE_ECS, Some(&context)).unwrap();
        let second = renderer.render(ids::SERVICE_ECS, Some(&context)).unwrap();
        assert_eq!(first, second);
        assert!(first.as_str().contains("acme-environment-dev"));
    }

    #[test]
    fn test_empty_template_renders_empty_document() {
        let renderer = renderer(vec![("t/empty", ""), ("t/blank", "  \n{% if false %}x{% endif %}\n")]);

        assert!(renderer.render("t/empty", None).unwrap().is_empty());
        assert!(renderer.render("t/blank", None).unwrap().is_empty());
    }

    #[test]
    fn test_vpc_target_is_empty_without_target() {
        let renderer = TemplateRenderer::new(Arc::new(EmbeddedTemplateStore::new()));
        assert!(renderer.render(ids::VPC_TARGET, None).unwrap().is_empty());

        let doc = renderer
            .render(
                ids::VPC_TARGET,
                Some(&json!({
                    "vpc_target": {
                        "vpc_id": "vpc-123",
                        "elb_subnet_ids": ["subnet-a", "subnet-b"],
                        "instance_subnet_ids": ["subnet-c"],
                    }
                })),
            )
            .unwrap();
        assert!(doc.as_str().contains("Value: vpc-123"));
        assert!(doc.as_str().contains("Value: subnet-a,subnet-b"));
    }

    #[test]
    fn test_undefined_variable_error() {
        let renderer = renderer(vec![("t/strict", "Hello {{ undefined_var }}!")]);
        let err = renderer.render("t/strict", None).unwrap_err();

        assert!(matches!(err, TemplateError::Render { .. }));
        let err_msg = err.to_string();
        assert!(
            err_msg.contains("undefined_var"),
            "error message should name the variable: {}",
            err_msg
        );
    }

    #[test]
    fn test_default_filter_covers_missing_context() {
        let renderer = renderer(vec![(
            "t/defaults",
            "{{ namespace | default(value=\"stackflow\") }}",
        )]);
        assert_eq!(renderer.render("t/defaults", None).unwrap().as_str(), "stackflow");
    }

    #[test]
    fn test_unknown_template_is_not_found() {
        let renderer = renderer(vec![]);
        let err = renderer.render("t/missing", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_non_object_context_is_rejected() {
        let renderer = renderer(vec![("t/hello", "Hello")]);
        let err = renderer.render("t/hello", Some(&json!(["a"]))).unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }

    #[test]
    fn test_leftover_markers_are_rejected() {
        let renderer = renderer(vec![(
            "t/raw",
            "{% raw %}Value: {{ name }}{% endraw %}",
        )]);
        let err = renderer.render("t/raw", None).unwrap_err();
        assert!(err.to_string().contains("unexpanded marker"));
    }

    #[test]
    fn test_dynamic_references_survive_raw_blocks() {
        let renderer = renderer(vec![(
            "t/ssm",
            "Password: {% raw %}'{{resolve:ssm-secure:/orders/db:1}}'{% endraw %}",
        )]);
        let document = renderer.render("t/ssm", None).unwrap();
        assert_eq!(
            document.as_str(),
            "Password: '{{resolve:ssm-secure:/orders/db:1}}'"
        );
    }

    #[test]
    fn test_encryption_key_block_is_optional() {
        let renderer = TemplateRenderer::new(Arc::new(EmbeddedTemplateStore::new()));

        let plain = renderer.render(ids::DATABASE, None).unwrap();
        assert!(!plain.as_str().contains("KmsKeyId"));

        let encrypted = renderer
            .render(
                ids::DATABASE,
                Some(&json!({ "encryption_key_arn": "arn:aws:kms:us-east-1:1:key/abc" })),
            )
            .unwrap();
        assert!(encrypted.as_str().contains("KmsKeyId: arn:aws:kms:us-east-1:1:key/abc"));
    }

    #[test]
    fn test_all_stack_templates_render_with_empty_context() {
        let store: Arc<dyn TemplateStore> =
            Arc::new(LayeredTemplateStore::new().with_layer(Arc::new(EmbeddedTemplateStore::new())));
        let renderer = TemplateRenderer::new(store.clone());

        for id in store.list_all(ids::CLOUDFORMATION_PREFIX).unwrap() {
            let doc = renderer.render(&id, None);
            assert!(doc.is_ok(), "{id}: {:?}", doc.err());
        }
    }
}
