//! # Schema Extraction
//!
//! Builds a [`ModuleIndex`] from one module's specification file: every
//! request-body and response schema of every operation, fully resolved
//! and keyed for lookup at test time.
//!
//! ## Keys
//!
//! - Response: `"<METHOD> <PATH> <STATUS>"`, path as written in the spec
//!   (`"GET /problems/{id} 200"`).
//! - Request: `"<operationId>_request"`, with `"<method>_<path>"` standing in
//!   for a missing `operationId`.
//!
//! ## Partial Resolution
//!
//! A schema whose references cannot all be resolved is stored with the
//! dangling `$ref` nodes in place. Validation then checks whatever did
//! resolve. The number of such nodes is kept in
//! [`ModuleIndex::unresolved_refs`] and logged when the index is built.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use apicheck_core::{
    load_document, request_key, status_candidates, HttpMethod, PathTemplate, ResponseKey,
};
use serde_json::{Map, Value};

use crate::cache::DocumentCache;
use crate::resolve::{reference_of, Resolver};

/// An indexed response schema's method, path template and status.
#[derive(Debug, Clone)]
pub struct ResponseRoute {
    pub method: HttpMethod,
    pub template: PathTemplate,
    pub status: String,
}

impl ResponseRoute {
    fn key(&self) -> String {
        ResponseKey::new(self.method, self.template.as_str(), self.status.as_str()).to_string()
    }
}

/// Resolved schemas of one module, by key.
#[derive(Debug, Clone)]
pub struct ModuleIndex {
    module: String,
    spec_path: PathBuf,
    schemas: BTreeMap<String, Value>,
    routes: Vec<ResponseRoute>,
    unresolved_refs: usize,
}

impl ModuleIndex {
    /// An empty index for `module`.
    pub fn new(module: impl Into<String>, spec_path: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            spec_path: spec_path.into(),
            schemas: BTreeMap::new(),
            routes: Vec::new(),
            unresolved_refs: 0,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn spec_path(&self) -> &Path {
        &self.spec_path
    }

    /// Schema stored under an exact key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.schemas.get(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Reference nodes that could not be resolved while building.
    pub fn unresolved_refs(&self) -> usize {
        self.unresolved_refs
    }

    pub fn routes(&self) -> &[ResponseRoute] {
        &self.routes
    }

    pub fn insert_response(&mut self, key: ResponseKey, schema: Value) {
        let route = ResponseRoute {
            method: key.method,
            template: PathTemplate::parse(&key.path),
            status: key.status.clone(),
        };
        if self.schemas.insert(key.to_string(), schema).is_none() {
            self.routes.push(route);
        }
    }

    pub fn insert_request(&mut self, operation_id: &str, schema: Value) {
        self.schemas.insert(request_key(operation_id), schema);
    }

    /// Find the response schema for a concrete call.
    ///
    /// `endpoint` must already be normalized (no API prefix, no query).
    /// For each status candidate (the code, its `NXX` range, `default`) an
    /// exact path key is tried first, then the spec path templates that
    /// match `endpoint`, preferring the template with fewest placeholders.
    /// Returns the matched key with the schema.
    pub fn response_schema(
        &self,
        method: HttpMethod,
        endpoint: &str,
        status: u16,
    ) -> Option<(String, &Value)> {
        for candidate in status_candidates(status) {
            let exact = ResponseKey::new(method, endpoint, candidate.as_str()).to_string();
            if let Some(schema) = self.schemas.get(&exact) {
                return Some((exact, schema));
            }

            let templated = self
                .routes
                .iter()
                .filter(|r| r.method == method && r.status == candidate)
                .filter(|r| r.template.matches(endpoint))
                .min_by_key(|r| r.template.param_count());
            if let Some(route) = templated {
                let key = route.key();
                if let Some(schema) = self.schemas.get(&key) {
                    return Some((key, schema));
                }
            }
        }
        None
    }

    /// Request-body schema of an operation, with its key.
    pub fn request_schema(&self, operation_id: &str) -> Option<(String, &Value)> {
        let key = request_key(operation_id);
        let schema = self.schemas.get(&key)?;
        Some((key, schema))
    }
}

/// Load `spec_path` and index it. `None` if the spec fails to load.
///
/// `models_dir` names the shared-model directory next to the spec file;
/// every document in it is loaded up front.
pub fn build_index(module: &str, spec_path: &Path, models_dir: &str) -> Option<ModuleIndex> {
    let spec = load_document(spec_path)?;
    Some(index_document(module, spec_path, spec, models_dir))
}

/// Index an already-loaded specification document.
pub fn index_document(
    module: &str,
    spec_path: &Path,
    spec: Value,
    models_dir: &str,
) -> ModuleIndex {
    let spec_path = DocumentCache::canonical(spec_path).unwrap_or_else(|| spec_path.to_path_buf());
    let mut index = ModuleIndex::new(module, spec_path.clone());

    let mut cache = DocumentCache::new();
    if let Some(parent) = spec_path.parent() {
        let preloaded = cache.preload_dir(&parent.join(models_dir));
        tracing::debug!(module, preloaded, "preloaded model documents");
    }
    let document = cache.insert(&spec_path, spec);

    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        tracing::warn!(module, spec = %spec_path.display(), "specification has no paths");
        return index;
    };

    let mut resolver = Resolver::new(&mut cache);
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (method_name, operation) in item {
            let Ok(method) = method_name.parse::<HttpMethod>() else {
                continue;
            };
            index_operation(
                &mut index,
                &mut resolver,
                &spec_path,
                method,
                method_name,
                path,
                operation,
            );
        }
    }

    index.unresolved_refs = resolver.unresolved();
    if index.unresolved_refs > 0 {
        tracing::warn!(
            module,
            unresolved = index.unresolved_refs,
            "unresolved schema references; affected schemas are only partially checked"
        );
    }
    tracing::info!(module, schemas = index.len(), "indexed specification");
    index
}

fn index_operation(
    index: &mut ModuleIndex,
    resolver: &mut Resolver<'_>,
    spec_path: &Path,
    method: HttpMethod,
    method_name: &str,
    path: &str,
    operation: &Value,
) {
    let operation_id = operation
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{method_name}_{path}"));

    if let Some(body) = operation.get("requestBody") {
        if let Some(schema) = json_content_schema(resolver, body, spec_path) {
            index.insert_request(&operation_id, schema);
        }
    }

    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return;
    };
    for (status, response) in responses {
        if let Some(schema) = json_content_schema(resolver, response, spec_path) {
            index.insert_response(ResponseKey::new(method, path, status.as_str()), schema);
        }
    }
}

/// Fully resolved JSON schema of a request body or response object.
///
/// The object itself may be a reference (`#/components/responses/…`).
fn json_content_schema(resolver: &mut Resolver<'_>, node: &Value, file: &Path) -> Option<Value> {
    let (object, object_file): (Cow<'_, Value>, Cow<'_, Path>) = match reference_of(node) {
        Some(reference) => {
            let Some(resolved) = resolver.resolve(reference, file, None) else {
                tracing::debug!(reference, "request body or response reference not found");
                return None;
            };
            (Cow::Owned(resolved.value), Cow::Owned(resolved.file))
        }
        None => (Cow::Borrowed(node), Cow::Borrowed(file)),
    };

    let content = object.get("content")?.as_object()?;
    let schema = json_media_type(content)?.get("schema")?;
    Some(resolver.resolve_tree(schema, &object_file))
}

/// `application/json`, else the first JSON-flavoured media type.
fn json_media_type(content: &Map<String, Value>) -> Option<&Value> {
    content.get("application/json").or_else(|| {
        content
            .iter()
            .find(|(media, _)| media.starts_with("application/json") || media.ends_with("+json"))
            .map(|(_, v)| v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index_of(spec: Value) -> ModuleIndex {
        index_document("test", Path::new("/in-memory/test.yaml"), spec, "models")
    }

    fn json_body(schema: Value) -> Value {
        json!({"content": {"application/json": {"schema": schema}}})
    }

    #[test]
    fn indexes_requests_and_responses() {
        let index = index_of(json!({
            "paths": {
                "/users/register": {
                    "post": {
                        "operationId": "registerUser",
                        "requestBody": json_body(json!({"type": "object"})),
                        "responses": {
                            "201": json_body(json!({"type": "object", "required": ["user"]})),
                            "400": json_body(json!({"type": "object", "required": ["error"]}))
                        }
                    }
                }
            }
        }));
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(
            keys,
            [
                "POST /users/register 201",
                "POST /users/register 400",
                "registerUser_request"
            ]
        );
        assert_eq!(index.routes().len(), 2);
    }

    #[test]
    fn non_operation_entries_are_ignored() {
        let index = index_of(json!({
            "paths": {
                "/news": {
                    "summary": "News",
                    "parameters": [{"name": "page", "in": "query"}],
                    "head": {"responses": {"200": json_body(json!({}))}},
                    "GET": {"responses": {"200": json_body(json!({"type": "array"}))}}
                }
            }
        }));
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(keys, ["GET /news 200"]);
    }

    #[test]
    fn missing_operation_id_is_synthesized_from_method_and_path() {
        let index = index_of(json!({
            "paths": {
                "/forum/posts": {
                    "post": {"requestBody": json_body(json!({"type": "object"}))}
                }
            }
        }));
        assert!(index.get("post_/forum/posts_request").is_some());
        assert!(index.request_schema("post_/forum/posts").is_some());
    }

    #[test]
    fn responses_without_json_content_are_skipped() {
        let index = index_of(json!({
            "paths": {
                "/users/logout": {
                    "post": {
                        "responses": {
                            "204": {"description": "no content"},
                            "200": {"content": {"text/plain": {"schema": {"type": "string"}}}}
                        }
                    }
                }
            }
        }));
        assert!(index.is_empty());
    }

    #[test]
    fn json_flavoured_media_types_are_accepted() {
        let index = index_of(json!({
            "paths": {
                "/problems": {
                    "get": {
                        "responses": {
                            "200": {"content": {"application/json; charset=utf-8": {"schema": {"type": "array"}}}},
                            "500": {"content": {"application/problem+json": {"schema": {"type": "object"}}}}
                        }
                    }
                }
            }
        }));
        assert_eq!(index.get("GET /problems 200"), Some(&json!({"type": "array"})));
        assert_eq!(index.get("GET /problems 500"), Some(&json!({"type": "object"})));
    }

    #[test]
    fn referenced_responses_and_request_bodies_are_followed() {
        let index = index_of(json!({
            "paths": {
                "/problems/{id}": {
                    "put": {
                        "operationId": "updateProblem",
                        "requestBody": {"$ref": "#/components/requestBodies/Problem"},
                        "responses": {"404": {"$ref": "#/components/responses/NotFound"}}
                    }
                }
            },
            "components": {
                "requestBodies": {
                    "Problem": json_body(json!({"$ref": "#/components/schemas/Problem"}))
                },
                "responses": {"NotFound": json_body(json!({"$ref": "#/components/schemas/Error"}))},
                "schemas": {
                    "Problem": {"type": "object", "required": ["title"]},
                    "Error": {"type": "object", "required": ["error"]}
                }
            }
        }));
        assert_eq!(
            index.get("updateProblem_request"),
            Some(&json!({"type": "object", "required": ["title"]}))
        );
        assert_eq!(
            index.get("PUT /problems/{id} 404"),
            Some(&json!({"type": "object", "required": ["error"]}))
        );
        assert_eq!(index.unresolved_refs(), 0);
    }

    #[test]
    fn unresolved_schemas_are_kept_and_counted() {
        let index = index_of(json!({
            "paths": {
                "/forum/posts": {
                    "get": {
                        "responses": {
                            "200": json_body(json!({
                                "type": "object",
                                "properties": {"posts": {
                                    "$ref": "./models/forum.yaml#/components/schemas/PostList"
                                }}
                            }))
                        }
                    }
                }
            }
        }));
        let schema = index.get("GET /forum/posts 200").unwrap();
        assert_eq!(
            schema["properties"]["posts"],
            json!({"$ref": "./models/forum.yaml#/components/schemas/PostList"})
        );
        assert_eq!(index.unresolved_refs(), 1);
    }

    #[test]
    fn spec_without_paths_gives_empty_index() {
        let index = index_of(json!({"components": {}}));
        assert!(index.is_empty());
        assert_eq!(index.module(), "test");
    }

    fn lookup_index() -> ModuleIndex {
        let mut index = ModuleIndex::new("problem", "/in-memory/problem.yaml");
        for (path, status, tag) in [
            ("/problems", "200", "list"),
            ("/problems/{id}", "200", "detail"),
            ("/problems/{id}", "4XX", "detail-error"),
            ("/problems/stats", "200", "stats"),
            ("/problems/{id}/submissions", "default", "submissions-any"),
        ] {
            index.insert_response(
                ResponseKey::new(HttpMethod::Get, path, status),
                json!({"title": tag}),
            );
        }
        index
    }

    fn matched_title(index: &ModuleIndex, endpoint: &str, status: u16) -> Option<String> {
        index
            .response_schema(HttpMethod::Get, endpoint, status)
            .map(|(_, schema)| schema["title"].as_str().unwrap_or_default().to_string())
    }

    #[test]
    fn response_lookup_exact_and_templated() {
        let index = lookup_index();
        assert_eq!(matched_title(&index, "/problems", 200).as_deref(), Some("list"));
        assert_eq!(matched_title(&index, "/problems/{id}", 200).as_deref(), Some("detail"));
        assert_eq!(matched_title(&index, "/problems/42", 200).as_deref(), Some("detail"));
        // A literal path beats a placeholder.
        assert_eq!(matched_title(&index, "/problems/stats", 200).as_deref(), Some("stats"));
    }

    #[test]
    fn response_lookup_falls_back_to_range_and_default() {
        let index = lookup_index();
        assert_eq!(matched_title(&index, "/problems/42", 404).as_deref(), Some("detail-error"));
        assert_eq!(
            matched_title(&index, "/problems/42/submissions", 500).as_deref(),
            Some("submissions-any")
        );
        assert_eq!(matched_title(&index, "/problems", 404), None);
        assert_eq!(matched_title(&index, "/unknown", 200), None);
    }

    #[test]
    fn response_lookup_reports_matched_key() {
        let index = lookup_index();
        let (key, _) = index.response_schema(HttpMethod::Get, "/problems/7", 403).unwrap();
        assert_eq!(key, "GET /problems/{id} 4XX");
        assert!(index.response_schema(HttpMethod::Post, "/problems", 200).is_none());
    }
}
