use super::FrameKind;

/// A fixed capacity frame buffer.
///
/// Frames longer than `CAP` are truncated when filled in, never overflowed.
#[derive(Debug, Clone)]
pub struct CaptureBuffer<const CAP: usize> {
    kind: FrameKind,
    len: usize,
    payload: [u8; CAP],
}

impl<const CAP: usize> Default for CaptureBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> CaptureBuffer<CAP> {
    pub const fn new() -> Self {
        Self {
            kind: FrameKind::Data,
            len: 0,
            payload: [0u8; CAP],
        }
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// The captured bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// Tag the buffer and copy as much of `bytes` as fits. Returns the number
    /// of bytes copied.
    pub(super) fn fill(&mut self, kind: FrameKind, bytes: &[u8]) -> usize {
        let len = bytes.len().min(CAP);
        self.payload[..len].copy_from_slice(&bytes[..len]);
        self.kind = kind;
        self.len = len;
        len
    }

    pub(super) fn clear(&mut self) {
        self.payload[..self.len].fill(0);
        self.kind = FrameKind::Data;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_copies_and_tags() {
        let mut buffer = CaptureBuffer::<8>::new();
        assert!(buffer.is_empty());

        assert_eq!(buffer.fill(FrameKind::Header, &[1, 2, 3]), 3);
        assert_eq!(buffer.kind(), FrameKind::Header);
        assert_eq!(buffer.payload(), &[1, 2, 3]);
        assert_eq!(buffer.capacity(), 8);
    }

    #[test]
    fn fill_truncates_to_capacity() {
        let mut buffer = CaptureBuffer::<4>::new();
        assert_eq!(buffer.fill(FrameKind::Data, &[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(buffer.payload(), &[1, 2, 3, 4]);
    }

    #[test]
    fn clear_wipes_contents() {
        let mut buffer = CaptureBuffer::<4>::new();
        buffer.fill(FrameKind::Header, &[0xaa, 0xbb]);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.payload, [0; 4]);

        // A shorter frame never exposes old bytes.
        buffer.fill(FrameKind::Data, &[0xcc]);
        assert_eq!(buffer.payload(), &[0xcc]);
    }

    #[test]
    fn markers_are_empty() {
        let mut buffer = CaptureBuffer::<4>::new();
        buffer.fill(FrameKind::Flush, &[]);
        assert!(buffer.is_empty());
        assert!(buffer.kind().is_marker());
    }
}
