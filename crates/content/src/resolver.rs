use tracing::debug;

use storage::{Result, StorageError};

use crate::store::{fetch_item, fetch_stream, ContentStore};
use crate::types::{ContentItem, ContentStream, State};

/// Hint treated as "no hint": `bin` is what generic binary uploads carry.
const GENERIC_EXT: &str = "bin";

/// Listing cap for the extension search; one id rarely has more than a
/// couple of stored representations.
const SEARCH_LIMIT: usize = 10;

fn split_ext(id: &str) -> Option<(&str, &str)> {
    let idx = id.rfind('.')?;
    let ext = &id[idx + 1..];
    if ext.is_empty() {
        return None;
    }
    Some((&id[..idx], ext))
}

impl ContentStore {
    /// Locate content by bare id when the caller does not know the
    /// stored extension, returning it fully buffered.
    ///
    /// Resolution order:
    /// 1. an extension embedded in the id (`logo.png`) is used directly;
    /// 2. a non-generic `ext_hint` is tried as a candidate key;
    /// 3. the state prefix is searched for `<id>.*`, preferring the
    ///    first key that does not end in `.json`; a `.json` sibling is
    ///    usually legacy metadata living next to the real binary, so it
    ///    loses ties.
    pub async fn find(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext_hint: &str,
        state: State,
    ) -> Result<ContentItem> {
        if let Some((base, ext)) = split_ext(id) {
            return self.get(tenant, type_name, base, ext, state).await;
        }

        if !ext_hint.is_empty() && ext_hint != GENERIC_EXT {
            match self.get(tenant, type_name, id, ext_hint, state).await {
                Ok(item) => return Ok(item),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        let key = self.search_key(tenant, type_name, id, state).await?;
        fetch_item(self.backend().as_ref(), &key, None).await
    }

    /// Streaming variant of [`find`](Self::find), with the same
    /// resolution order.
    pub async fn find_stream(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        ext_hint: &str,
        state: State,
    ) -> Result<ContentStream> {
        if let Some((base, ext)) = split_ext(id) {
            return self.get_stream(tenant, type_name, base, ext, state).await;
        }

        if !ext_hint.is_empty() && ext_hint != GENERIC_EXT {
            match self.get_stream(tenant, type_name, id, ext_hint, state).await {
                Ok(stream) => return Ok(stream),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        let key = self.search_key(tenant, type_name, id, state).await?;
        fetch_stream(self.backend().as_ref(), &key, None).await
    }

    /// Step 3 of the resolution: list `<prefix>/<id>.` and apply the
    /// prefer-non-`.json` tie-break.
    async fn search_key(
        &self,
        tenant: &str,
        type_name: &str,
        id: &str,
        state: State,
    ) -> Result<String> {
        let prefix = format!("{}{}.", self.keys().content_prefix(tenant, type_name, state), id);
        let entries = self.backend().list(&prefix, Some(SEARCH_LIMIT)).await?;

        let chosen = entries
            .iter()
            .find(|e| !e.key.ends_with(".json"))
            .or_else(|| entries.first());

        match chosen {
            Some(entry) => {
                debug!("resolved id '{}' to {}", id, entry.key);
                Ok(entry.key.clone())
            }
            None => Err(StorageError::NotFound(format!(
                "no content found for id '{id}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_extension_split() {
        assert_eq!(split_ext("logo.png"), Some(("logo", "png")));
        assert_eq!(split_ext("archive.tar.gz"), Some(("archive.tar", "gz")));
        assert_eq!(split_ext("logo"), None);
        assert_eq!(split_ext("logo."), None);
    }
}
