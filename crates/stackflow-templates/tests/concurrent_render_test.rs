use serde_json::json;
use stackflow_templates::{EmbeddedTemplateStore, TemplateRenderer, TemplateStore, ids};
use std::sync::Arc;

/// A shared renderer is safe to use from several threads at once and every
/// thread sees the same output.
#[test]
fn test_shared_renderer_across_threads() {
    let store: Arc<dyn TemplateStore> = Arc::new(EmbeddedTemplateStore::new());
    let renderer = TemplateRenderer::new(store.clone());
    let context = json!({ "namespace": "acme", "environment_name": "dev" });

    let expected = renderer.render(ids::ENV_ECS, Some(&context)).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| renderer.render(ids::ENV_ECS, Some(&context)).unwrap()))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

/// Every bundled template resolves to content, whatever its namespace
#[test]
fn test_every_listed_template_resolves() {
    let store = EmbeddedTemplateStore::new();
    let all = store.list_all("").unwrap();
    assert!(!all.is_empty());

    for id in all {
        let content = store.resolve(&id).unwrap();
        assert!(!content.trim().is_empty(), "{id}");
    }
}

#[test]
fn test_policies_render_as_json() {
    let renderer = TemplateRenderer::new(Arc::new(EmbeddedTemplateStore::new()));

    for id in [ids::POLICY_DEFAULT, ids::POLICY_ALLOW_ALL] {
        let doc = renderer.render(id, None).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(doc.as_str()).unwrap();
        assert!(parsed["Statement"].is_array(), "{id}");
    }
}
