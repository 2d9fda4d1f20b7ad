//! Ownership of built graphs behind generation-tagged handles
//!
//! A [`GraphRegistry`] owns every built [`FrameGraphs`]. Callers hold a
//! [`GraphHandle`], a slot index plus the generation the slot had when the
//! graphs were inserted. Releasing a slot bumps its generation, so an old
//! handle is detected as expired on its next use instead of reaching freed or
//! reused graphs.
//!
//! Rebuilds swap the slot's `Arc` in one write; readers that already cloned
//! the previous `Arc` finish on the old snapshot and the next read sees the
//! new one.

use crate::error::{Error, ErrorCode};
use crate::resolver::FrameGraphs;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Lifetime-checked reference to graphs held by a [`GraphRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphHandle {
    index: u32,
    generation: u32,
}

impl GraphHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    graphs: Option<Arc<FrameGraphs>>,
}

#[derive(Debug, Default)]
struct Inner {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Inner {
    fn slot(&self, handle: GraphHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index())
            .filter(|s| s.generation == handle.generation && s.graphs.is_some())
    }

    fn slot_mut(&mut self, handle: GraphHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.generation == handle.generation && s.graphs.is_some())
    }
}

/// Thread-safe owner of built graphs
#[derive(Debug, Default)]
pub struct GraphRegistry {
    inner: RwLock<Inner>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `graphs` and return a handle to them
    pub fn insert(&self, graphs: FrameGraphs) -> GraphHandle {
        let mut inner = self.inner.write();
        let graphs = Some(Arc::new(graphs));

        if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.graphs = graphs;
            return GraphHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = inner.slots.len() as u32;
        inner.slots.push(Slot {
            generation: 0,
            graphs,
        });
        GraphHandle {
            index,
            generation: 0,
        }
    }

    /// Snapshot of the graphs behind `handle`
    pub fn get(&self, handle: GraphHandle) -> Result<Arc<FrameGraphs>, Error> {
        self.inner
            .read()
            .slot(handle)
            .and_then(|s| s.graphs.clone())
            .ok_or_else(|| expired(handle))
    }

    /// Swap in rebuilt graphs; the handle stays valid
    pub fn replace(&self, handle: GraphHandle, graphs: FrameGraphs) -> Result<(), Error> {
        let mut inner = self.inner.write();
        let slot = inner.slot_mut(handle).ok_or_else(|| expired(handle))?;
        slot.graphs = Some(Arc::new(graphs));
        Ok(())
    }

    /// Drop the graphs behind `handle`; every copy of the handle expires
    pub fn release(&self, handle: GraphHandle) -> bool {
        let mut inner = self.inner.write();
        let Some(slot) = inner.slot_mut(handle) else {
            return false;
        };
        slot.graphs = None;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(handle.index);
        debug!(index = handle.index, "released frame graphs");
        true
    }

    pub fn is_live(&self, handle: GraphHandle) -> bool {
        self.inner.read().slot(handle).is_some()
    }

    /// Number of live graph sets
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.slots.len() - inner.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn expired(handle: GraphHandle) -> Error {
    Error::new(
        ErrorCode::InvalidGraphReference,
        format!(
            "graph handle {}:{} refers to graphs that no longer exist",
            handle.index, handle.generation
        ),
    )
}

/// Exclusive owner of one registry entry, released on drop
///
/// This is what a model or world holds; everything else copies the
/// [`GraphHandle`] and checks it on use.
#[derive(Debug)]
pub struct GraphOwner {
    registry: Arc<GraphRegistry>,
    handle: GraphHandle,
}

impl GraphOwner {
    pub(crate) fn new(registry: Arc<GraphRegistry>, handle: GraphHandle) -> Self {
        Self { registry, handle }
    }

    pub fn handle(&self) -> GraphHandle {
        self.handle
    }

    pub fn graphs(&self) -> Result<Arc<FrameGraphs>, Error> {
        self.registry.get(self.handle)
    }
}

impl Drop for GraphOwner {
    fn drop(&mut self) {
        self.registry.release(self.handle);
    }
}
