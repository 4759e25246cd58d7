use crate::core::StepKey;
use std::fmt;
use tracing::debug;

/// Temporary resource created to show a file (an object URL in a browser).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait PreviewReleaser {
    fn release(&mut self, handle: &PreviewHandle);
}

impl<F> PreviewReleaser for F
where
    F: FnMut(&PreviewHandle),
{
    fn release(&mut self, handle: &PreviewHandle) {
        self(handle)
    }
}

struct NoopReleaser;

impl PreviewReleaser for NoopReleaser {
    fn release(&mut self, _handle: &PreviewHandle) {}
}

/// Previews grouped by the step that created them. Everything still held is
/// released on drop.
pub struct PreviewRegistry {
    entries: Vec<(StepKey, PreviewHandle)>,
    releaser: Box<dyn PreviewReleaser>,
}

impl PreviewRegistry {
    pub fn new(releaser: impl PreviewReleaser + 'static) -> Self {
        Self {
            entries: Vec::new(),
            releaser: Box::new(releaser),
        }
    }

    pub fn register(&mut self, step: StepKey, handle: PreviewHandle) {
        self.entries.push((step, handle));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handles_for(&self, step: &str) -> impl Iterator<Item = &PreviewHandle> {
        self.entries
            .iter()
            .filter(move |(owner, _)| owner.as_str() == step)
            .map(|(_, handle)| handle)
    }

    pub fn release_step(&mut self, step: &str) {
        let mut kept = Vec::with_capacity(self.entries.len());
        for (owner, handle) in self.entries.drain(..) {
            if owner.as_str() == step {
                debug!(step = %owner, preview = %handle, "preview released");
                self.releaser.release(&handle);
            } else {
                kept.push((owner, handle));
            }
        }
        self.entries = kept;
    }

    pub fn release_all(&mut self) {
        for (owner, handle) in self.entries.drain(..) {
            debug!(step = %owner, preview = %handle, "preview released");
            self.releaser.release(&handle);
        }
    }
}

impl Default for PreviewRegistry {
    fn default() -> Self {
        Self::new(NoopReleaser)
    }
}

impl Drop for PreviewRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::{PreviewHandle, PreviewRegistry};
    use crate::core::StepKey;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (PreviewRegistry, Rc<RefCell<Vec<String>>>) {
        let released = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&released);
        let registry = PreviewRegistry::new(move |handle: &PreviewHandle| {
            sink.borrow_mut().push(handle.as_str().to_string())
        });
        (registry, released)
    }

    #[test]
    fn release_step_keeps_other_steps() {
        let (mut registry, released) = recording();
        registry.register(StepKey::from("upload"), PreviewHandle::new("blob:1"));
        registry.register(StepKey::from("other"), PreviewHandle::new("blob:2"));

        registry.release_step("upload");
        assert_eq!(*released.borrow(), vec!["blob:1".to_string()]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.handles_for("other").count(), 1);
    }

    #[test]
    fn drop_releases_everything_left() {
        let (mut registry, released) = recording();
        registry.register(StepKey::from("a"), PreviewHandle::new("blob:a"));
        registry.register(StepKey::from("b"), PreviewHandle::new("blob:b"));
        drop(registry);
        assert_eq!(released.borrow().len(), 2);
    }
}
