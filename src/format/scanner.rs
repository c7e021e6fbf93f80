/// A maximal run of `?` characters in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct MarkerRun {
    pub(super) start: usize,
    pub(super) end: usize,
}

impl MarkerRun {
    pub(super) fn len(self) -> usize {
        self.end - self.start
    }
}

/// Find the next marker run at or after `from`.
pub(super) fn next_marker_run(bytes: &[u8], from: usize) -> Option<MarkerRun> {
    let start = from + bytes.get(from..)?.iter().position(|&b| b == b'?')?;
    let mut end = start;
    while end < bytes.len() && bytes[end] == b'?' {
        end += 1;
    }
    Some(MarkerRun { start, end })
}
