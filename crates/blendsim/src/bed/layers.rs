//! Append-only deposit history for detailed mode.
//!
//! Layer records of all cells share one arena and one parameter buffer;
//! each cell links its own records bottom to top.

const NIL: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct LayerRecord {
    height: f64,
    event: u64,
    next: u32,
}

/// One deposit layer of a cell, as seen from outside the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer<'a> {
    /// Thickness of the layer.
    pub height: f64,
    /// Stacking event that laid it down.
    pub event: u64,
    pub parameters: &'a [f64],
}

#[derive(Clone, Debug)]
pub struct LayerArena {
    stride: usize,
    records: Vec<LayerRecord>,
    parameters: Vec<f64>,
    head: Vec<u32>,
    tail: Vec<u32>,
}

impl LayerArena {
    pub fn new(cell_count: usize, stride: usize) -> Self {
        Self {
            stride,
            records: Vec::new(),
            parameters: Vec::new(),
            head: vec![NIL; cell_count],
            tail: vec![NIL; cell_count],
        }
    }

    /// Change the parameter stride. Only valid while the arena is empty.
    pub(crate) fn set_stride(&mut self, stride: usize) {
        debug_assert!(self.records.is_empty());
        self.stride = stride;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record `height` of material from `event` on top of `cell`.
    /// Consecutive deposits of the same event merge into one layer.
    pub fn push(&mut self, cell: usize, height: f64, parameters: &[f64], event: u64) {
        let tail = self.tail[cell];
        if tail != NIL && self.records[tail as usize].event == event {
            self.records[tail as usize].height += height;
            return;
        }

        let id = self.records.len() as u32;
        self.records.push(LayerRecord {
            height,
            event,
            next: NIL,
        });
        self.parameters.extend_from_slice(&parameters[..self.stride]);

        if tail == NIL {
            self.head[cell] = id;
        } else {
            self.records[tail as usize].next = id;
        }
        self.tail[cell] = id;
    }

    /// Layers of `cell`, bottom first.
    pub fn iter(&self, cell: usize) -> LayerIter<'_> {
        LayerIter {
            arena: self,
            current: self.head[cell],
        }
    }
}

pub struct LayerIter<'a> {
    arena: &'a LayerArena,
    current: u32,
}

impl<'a> Iterator for LayerIter<'a> {
    type Item = Layer<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NIL {
            return None;
        }
        let id = self.current as usize;
        let record = self.arena.records[id];
        self.current = record.next;
        let start = id * self.arena.stride;
        Some(Layer {
            height: record.height,
            event: record.event,
            parameters: &self.arena.parameters[start..start + self.arena.stride],
        })
    }
}
