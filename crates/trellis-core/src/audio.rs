//! Audio buffers handed to the processor for one block.
//!
//! [`AudioBlock`] borrows the host's channel slices for the duration of a
//! process call. Rendering always targets a sub-range of the block (the span
//! between two event timestamps), so the accessors take a frame range.

use std::ops::Range;

/// Result of processing a block, reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessStatus {
    /// Processing failed; the host should discard the output.
    Error,
    /// Keep calling `process`.
    #[default]
    Continue,
    /// Keep calling `process` while the input is not silent.
    ContinueIfNotQuiet,
    /// The plugin is rendering a tail and will report when done.
    Tail,
    /// Output is silent until new events arrive.
    Sleep,
}

/// Input and output channels for one process call.
pub struct AudioBlock<'a, 'b> {
    inputs: &'a [&'b [f32]],
    outputs: &'a mut [&'b mut [f32]],
    frames: usize,
}

impl<'a, 'b> AudioBlock<'a, 'b> {
    /// Wrap the host's channels. The frame count is the shortest channel.
    pub fn new(inputs: &'a [&'b [f32]], outputs: &'a mut [&'b mut [f32]]) -> Self {
        let frames = inputs
            .iter()
            .map(|ch| ch.len())
            .chain(outputs.iter().map(|ch| ch.len()))
            .min()
            .unwrap_or(0);
        Self {
            inputs,
            outputs,
            frames,
        }
    }

    /// Wrap output channels only (instruments).
    pub fn outputs_only(outputs: &'a mut [&'b mut [f32]]) -> Self {
        Self::new(&[], outputs)
    }

    /// Number of frames in the block.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Input channel `channel` over `range`.
    pub fn input(&self, channel: usize, range: Range<usize>) -> Option<&[f32]> {
        self.inputs.get(channel).and_then(|ch| ch.get(range))
    }

    /// Output channel `channel` over `range`.
    pub fn output(&mut self, channel: usize, range: Range<usize>) -> Option<&mut [f32]> {
        self.outputs.get_mut(channel).and_then(|ch| ch.get_mut(range))
    }

    /// First two output channels over `range`, or `None` if the block is
    /// not at least stereo.
    pub fn stereo_out(&mut self, range: Range<usize>) -> Option<(&mut [f32], &mut [f32])> {
        match &mut self.outputs[..] {
            [left, right, ..] => Some((left.get_mut(range.clone())?, right.get_mut(range)?)),
            _ => None,
        }
    }

    /// Zero every output channel over `range`.
    pub fn clear_outputs(&mut self, range: Range<usize>) {
        for channel in self.outputs.iter_mut() {
            if let Some(samples) = channel.get_mut(range.clone()) {
                samples.fill(0.0);
            }
        }
    }

    /// Copy inputs to outputs over `range`, channel by channel.
    pub fn pass_through(&mut self, range: Range<usize>) {
        for (input, output) in self.inputs.iter().zip(self.outputs.iter_mut()) {
            if let (Some(src), Some(dst)) = (input.get(range.clone()), output.get_mut(range.clone())) {
                dst.copy_from_slice(src);
            }
        }
    }
}
