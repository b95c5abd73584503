/// Failure text accumulated over one run, kept as a run of sentences.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorBuffer {
    bytes: Vec<u8>,
}

impl ErrorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, error: &[u8]) {
        if self.bytes.is_empty() {
            self.bytes = error.to_vec();
            return;
        }
        // Bytes, not text: fetch output may not be valid UTF-8.
        let kept = self.bytes.trim_ascii();
        let kept = kept.strip_suffix(b".").unwrap_or(kept);
        let mut bytes = Vec::with_capacity(kept.len() + 2 + error.len());
        bytes.extend_from_slice(kept);
        bytes.extend_from_slice(b". ");
        bytes.extend_from_slice(error);
        self.bytes = bytes;
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
