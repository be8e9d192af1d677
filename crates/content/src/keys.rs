use crate::types::State;

/// Maps addressing tuples to backend keys.
///
/// Layout under the root prefix:
///
/// ```text
/// <root>/
///   schemas/<name>.json
///   tenants/<tenant>/
///     schemas/<name>.json
///     webhooks/<id>.json
///     content/<type>/
///       <id>.<ext>                            # live
///       _draft/<id>.<ext>
///       _draft/_comments/<id>/<commentID>.json
///       _pending/<id>.<ext>
///       _pending/_comments/<id>/<commentID>.json
///       _history/<id>/<version>.json
/// ```
///
/// Pure and deterministic; identifiers must not contain `/`.
#[derive(Debug, Clone)]
pub struct KeyNamer {
    root: String,
}

impl KeyNamer {
    /// `root` is stored with leading and trailing slashes trimmed; empty
    /// means the backend root.
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn join(&self, parts: &[&str]) -> String {
        let mut segments: Vec<&str> = Vec::with_capacity(parts.len() + 1);
        if !self.root.is_empty() {
            segments.push(&self.root);
        }
        segments.extend(parts.iter().filter(|p| !p.is_empty()));
        segments.join("/")
    }

    fn type_dir(&self, tenant: &str, type_name: &str) -> String {
        self.join(&["tenants", tenant, "content", type_name])
    }

    pub fn content_key(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext: &str,
        state: State,
    ) -> String {
        let file = format!("{id}.{ext}");
        match state {
            State::Live => format!("{}/{}", self.type_dir(tenant, type_name), file),
            other => format!("{}/_{}/{}", self.type_dir(tenant, type_name), other, file),
        }
    }

    /// Prefix for listing content of a type in a state; always ends in `/`.
    pub fn content_prefix(&self, tenant: &str, type_name: &str, state: State) -> String {
        match state {
            State::Live => format!("{}/", self.type_dir(tenant, type_name)),
            other => format!("{}/_{}/", self.type_dir(tenant, type_name), other),
        }
    }

    pub fn history_key(&self, tenant: &str, type_name: &str, id: &str, version: &str) -> String {
        format!(
            "{}/_history/{}/{}.json",
            self.type_dir(tenant, type_name),
            id,
            version
        )
    }

    pub fn history_prefix(&self, tenant: &str, type_name: &str, id: &str) -> String {
        format!("{}/_history/{}/", self.type_dir(tenant, type_name), id)
    }

    pub fn comment_key(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
        comment_id: &str,
    ) -> String {
        format!(
            "{}/_{}/_comments/{}/{}.json",
            self.type_dir(tenant, type_name),
            state,
            content_id,
            comment_id
        )
    }

    pub fn comment_prefix(
        &self,
        tenant: &str,
        type_name: &str,
        content_id: &str,
        state: State,
    ) -> String {
        format!(
            "{}/_{}/_comments/{}/",
            self.type_dir(tenant, type_name),
            state,
            content_id
        )
    }

    pub fn global_schema_key(&self, name: &str) -> String {
        self.join(&["schemas", &format!("{name}.json")])
    }

    pub fn global_schemas_prefix(&self) -> String {
        format!("{}/", self.join(&["schemas"]))
    }

    pub fn tenant_schema_key(&self, tenant: &str, name: &str) -> String {
        self.join(&["tenants", tenant, "schemas", &format!("{name}.json")])
    }

    pub fn tenant_schemas_prefix(&self, tenant: &str) -> String {
        format!("{}/", self.join(&["tenants", tenant, "schemas"]))
    }

    pub fn webhook_key(&self, tenant: &str, id: &str) -> String {
        self.join(&["tenants", tenant, "webhooks", &format!("{id}.json")])
    }

    pub fn webhooks_prefix(&self, tenant: &str) -> String {
        format!("{}/", self.join(&["tenants", tenant, "webhooks"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_and_state_keys() {
        let keys = KeyNamer::new("development");
        assert_eq!(
            keys.content_key("acme", "articles", "hello", "json", State::Live),
            "development/tenants/acme/content/articles/hello.json"
        );
        assert_eq!(
            keys.content_key("acme", "articles", "hello", "json", State::Draft),
            "development/tenants/acme/content/articles/_draft/hello.json"
        );
        assert_eq!(
            keys.content_key("acme", "articles", "hello", "json", State::Pending),
            "development/tenants/acme/content/articles/_pending/hello.json"
        );
    }

    #[test]
    fn prefixes_end_with_slash() {
        let keys = KeyNamer::new("production");
        assert_eq!(
            keys.content_prefix("acme", "images", State::Live),
            "production/tenants/acme/content/images/"
        );
        assert_eq!(
            keys.content_prefix("acme", "images", State::Pending),
            "production/tenants/acme/content/images/_pending/"
        );
        assert_eq!(keys.global_schemas_prefix(), "production/schemas/");
        assert_eq!(
            keys.webhooks_prefix("acme"),
            "production/tenants/acme/webhooks/"
        );
    }

    #[test]
    fn root_is_trimmed() {
        let keys = KeyNamer::new("/staging/");
        assert_eq!(keys.root(), "staging");
        assert_eq!(
            keys.global_schema_key("article"),
            "staging/schemas/article.json"
        );
    }

    #[test]
    fn empty_root_means_backend_root() {
        let keys = KeyNamer::new("");
        assert_eq!(
            keys.content_key("t", "docs", "a", "html", State::Live),
            "tenants/t/content/docs/a.html"
        );
        assert_eq!(keys.global_schema_key("page"), "schemas/page.json");
    }

    #[test]
    fn history_and_comment_keys() {
        let keys = KeyNamer::new("development");
        assert_eq!(
            keys.history_key("acme", "articles", "hello", "v123"),
            "development/tenants/acme/content/articles/_history/hello/v123.json"
        );
        assert_eq!(
            keys.comment_key("acme", "articles", "hello", State::Draft, "c1"),
            "development/tenants/acme/content/articles/_draft/_comments/hello/c1.json"
        );
        assert_eq!(
            keys.comment_prefix("acme", "articles", "hello", State::Pending),
            "development/tenants/acme/content/articles/_pending/_comments/hello/"
        );
    }
}
