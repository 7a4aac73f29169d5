/*!
 * Length-bounded segmentation of document lines.
 *
 * Backends have different batching limits, so each carries its own
 * segmentor instance. Segmentation never splits a line: a single line
 * longer than the limit becomes its own oversized segment.
 */

/// Splits an ordered sequence of lines into batches bounded by a target
/// cumulative character count.
#[derive(Debug, Clone)]
pub struct LengthSegmentor {
    /// Target cumulative character count per segment
    max_length: usize,
}

impl LengthSegmentor {
    /// Create a segmentor with the given target length
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Target cumulative character count per segment
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Partition `lines` into segments.
    ///
    /// Deterministic and lossless: concatenating the segments yields the
    /// input sequence unchanged. Each segment stays within the target
    /// length unless it consists of exactly one oversized line.
    pub fn segment(&self, lines: &[String]) -> Vec<Vec<String>> {
        let mut segments = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_length = 0usize;

        for line in lines {
            let line_length = line.chars().count();
            if !current.is_empty() && current_length + line_length > self.max_length {
                segments.push(std::mem::take(&mut current));
                current_length = 0;
            }
            current.push(line.clone());
            current_length += line_length;
        }

        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}
