/// Every substring of a fixed length, left to right
///
/// Used to enumerate all fragments a nick-translated probe can produce.
pub struct SeqWindowSlider<'a> {
    seq: &'a str,
    window_size: usize,
    offset: usize,
}

impl<'a> SeqWindowSlider<'a> {
    pub fn new(seq: &'a str, window_size: usize) -> Self {
        Self {
            seq,
            window_size,
            offset: 0,
        }
    }

    /// Number of windows the slider yields in total
    pub fn window_count(&self) -> usize {
        if self.window_size == 0 || self.window_size > self.seq.len() {
            0
        } else {
            self.seq.len() - self.window_size + 1
        }
    }
}

impl<'a> Iterator for SeqWindowSlider<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.window_count() {
            return None;
        }
        let window = &self.seq[self.offset..self.offset + self.window_size];
        self.offset += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window_count().saturating_sub(self.offset);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SeqWindowSlider<'_> {}
