use std::{fmt, sync::Arc};

/// Full text of the source document at one point in time.
///
/// Payloads are replaced wholesale on every load or save; cloning shares the
/// underlying text.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct DocumentPayload(Arc<str>);

impl DocumentPayload {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for DocumentPayload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for DocumentPayload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

// Documents can be large; keep log lines short.
impl fmt::Debug for DocumentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentPayload")
            .field("bytes", &self.0.len())
            .finish()
    }
}
