use std::io::Write;
use std::sync::Arc;

use super::Engine;
use crate::core::Result;
use crate::templating::{Binding, SlotFunction};

impl Engine {
    /// Render the template `name` into `out`.
    ///
    /// Loads first when the engine is not loaded yet, and on every call when
    /// [`EngineOptions::reload`](crate::EngineOptions::reload) is set.
    ///
    /// `binding` accepts `()`, maps with string keys, JSON objects and Tera
    /// contexts; see [`Binding`].
    ///
    /// With a non-empty `layout`, the layout template is rendered instead and the
    /// content template is made available to it as a zero-argument function named
    /// after [`EngineOptions::layout`](crate::EngineOptions::layout):
    ///
    /// ```text
    /// <main>{{ slot() }}</main>
    /// ```
    ///
    /// A content failure inside the slot is handled according to
    /// [`EngineOptions::slot_errors`](crate::EngineOptions::slot_errors).
    ///
    /// # Errors
    ///
    /// Load errors, [`EngineError::TemplateNotFound`](crate::EngineError::TemplateNotFound)
    /// for `name` or `layout`, compile errors, and execution errors of the
    /// template that is rendered.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        name: &str,
        binding: impl Into<Binding>,
        layout: Option<&str>,
    ) -> Result<()> {
        let inner = &self.inner;
        self.load_with(inner.options.reload)?;
        let context = binding.into().into_context()?;

        let state = inner.read_state();
        let content = state.templates.compile(&*state.store, &inner.normalizer, name)?;

        let Some(layout) = layout.filter(|l| !l.is_empty()) else {
            drop(state);
            tracing::trace!(template = %content.name(), "rendering");
            return content.render_to(&context, out);
        };

        let mut compiled = state.templates.compile(&*state.store, &inner.normalizer, layout)?;
        drop(state);

        tracing::trace!(template = %content.name(), layout = %compiled.name(), "rendering with layout");
        let slot = SlotFunction::new(
            inner.options.layout.clone(),
            content,
            context.clone(),
            inner.options.slot_errors,
            Arc::clone(&inner.observer),
        );
        compiled.register_function(&inner.options.layout, slot);
        compiled.render_to(&context, out)
    }

    /// Render into a `String`.
    pub fn render_to_string(
        &self,
        name: &str,
        binding: impl Into<Binding>,
        layout: Option<&str>,
    ) -> Result<String> {
        let mut out = Vec::new();
        self.render(&mut out, name, binding, layout)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
