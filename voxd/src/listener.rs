/// Assembles newline-delimited utterances from raw FIFO reads.
///
/// Bytes arrive in arbitrary splits; a trailing partial line stays buffered
/// until its newline shows up. Whatever is buffered when the assembler is
/// dropped is discarded.
#[derive(Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read's worth of bytes, returning every complete utterance:
    /// trimmed, non-empty, in arrival order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1])
                .trim()
                .to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }
}
