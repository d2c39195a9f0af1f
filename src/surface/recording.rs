//! Display-list surface
//!
//! Records every draw call of the current frame. Clones share the list, so
//! the viewer (or a test) can keep one handle while the renderer owns the
//! other. `clear()` starts a new list.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Glow, RadialGradient, Surface};
use crate::core::{Rgba, Size, SurfaceError};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear,
    Fill(Rgba),
    Radial(RadialGradient),
    Glow(Glow),
    Line {
        from: [f64; 2],
        to: [f64; 2],
        width: f64,
        color: Rgba,
    },
}

#[derive(Debug, Default)]
struct Inner {
    size: Option<Size>,
    commands: Vec<DrawCommand>,
    resizes: usize,
}

#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                size: Some(size),
                ..Default::default()
            })),
        }
    }

    /// Mark the surface unavailable (`None`) or give it a size again
    pub fn set_available(&self, size: Option<Size>) {
        self.inner.borrow_mut().size = size;
    }

    /// Commands recorded since the last `clear()`
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.inner.borrow().commands.clone()
    }

    /// Visit the recorded commands without cloning them
    pub fn with_commands<R>(&self, f: impl FnOnce(&[DrawCommand]) -> R) -> R {
        f(&self.inner.borrow().commands)
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.inner.borrow().commands.iter().filter(|c| pred(c)).count()
    }

    /// Number of `resize()` calls seen
    pub fn resize_count(&self) -> usize {
        self.inner.borrow().resizes
    }

    fn record(&self, command: DrawCommand) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.size.is_none() {
            return Err(SurfaceError::Unavailable);
        }
        inner.commands.push(command);
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Option<Size> {
        self.inner.borrow().size
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        inner.size = Some(size);
        inner.resizes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        if inner.size.is_none() {
            return Err(SurfaceError::Unavailable);
        }
        inner.commands.clear();
        inner.commands.push(DrawCommand::Clear);
        Ok(())
    }

    fn fill(&mut self, color: Rgba) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Fill(color))
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Radial(*gradient))
    }

    fn glow(&mut self, glow: &Glow) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Glow(*glow))
    }

    fn line(&mut self, from: [f64; 2], to: [f64; 2], width: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Line {
            from,
            to,
            width,
            color,
        })
    }
}
