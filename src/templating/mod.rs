//! Compilation of stored template sources into executable Tera templates.
//!
//! Templates are compiled on demand, once per render, straight from the
//! [`SourceStore`]. A [`TemplateSet`] is the compilation context: the configured
//! delimiters and the function registry. Compiling a name produces a
//! [`CompiledTemplate`], a fresh `Tera` instance holding the requested template and
//! everything it pulls in.
//!
//! # Template References
//!
//! `{% include %}`, `{% extends %}` and `{% import %}` name other templates. Before
//! handing sources to Tera the compiler scans each one for such references and
//! loads the named templates from the same store, transitively. A reference is
//! registered under the exact string the template used, so `"partials/nav"`,
//! `"/partials/nav"` and `"partials/nav.html"` all resolve to the stored key
//! `partials/nav`. References that cannot be found are left to Tera, which
//! reports them at parse time (`extends`) or render time (`include` without
//! `ignore missing`).
//!
//! # Autoescaping
//!
//! Autoescaping is off for every template. Sources are emitted exactly as the
//! template writes them; use Tera's `escape` filter where HTML escaping is needed.

mod binding;
pub mod functions;
mod slot;
pub mod syntax;

pub use binding::Binding;
pub use functions::{FunctionError, FunctionRegistry, Signature, TemplateFunction};
pub(crate) use slot::SlotFunction;

use std::collections::HashSet;
use std::io::Write;

use strsim::levenshtein;
use tera::{Context, Tera};

use crate::config::Delimiters;
use crate::core::{EngineError, Result};
use crate::normalize::PathNormalizer;
use crate::store::SourceStore;

/// Maximum distance, as a percentage of the name length, for a key to be suggested.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Number of "did you mean" suggestions attached to a not-found error.
const MAX_SUGGESTIONS: usize = 3;

/// A template compiled together with every template it references.
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    tera: Tera,
}

impl CompiledTemplate {
    /// Storage key of the entry template.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of all templates in this compilation, entry template included.
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Expose an additional function to this compilation only.
    pub(crate) fn register_function<F: tera::Function + 'static>(&mut self, name: &str, function: F) {
        self.tera.register_function(name, function);
    }

    /// Execute the template, writing output to `out`.
    pub fn render_to<W: Write>(&self, context: &Context, out: W) -> Result<()> {
        self.tera.render_to(&self.name, context, out).map_err(|source| EngineError::Render {
            name: self.name.clone(),
            source,
        })
    }

    /// Execute the template into a string.
    pub fn render(&self, context: &Context) -> Result<String> {
        self.tera.render(&self.name, context).map_err(|source| EngineError::Render {
            name: self.name.clone(),
            source,
        })
    }
}

/// Compilation context shared by every template an engine compiles.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    delimiters: Delimiters,
    functions: FunctionRegistry,
}

impl TemplateSet {
    pub fn new(delimiters: Delimiters, functions: FunctionRegistry) -> Self {
        Self {
            delimiters,
            functions,
        }
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Compile `name` and its references from `store`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::TemplateNotFound`] if `name` itself is not stored
    /// - [`EngineError::Syntax`] if a source has an unclosed custom delimiter
    /// - [`EngineError::Parse`] if Tera rejects any of the sources
    /// - [`EngineError::Read`] if the store fails to read a source
    pub fn compile(
        &self,
        store: &dyn SourceStore,
        normalizer: &PathNormalizer,
        name: &str,
    ) -> Result<CompiledTemplate> {
        let key = normalizer.lookup_key(name);
        let Some(source) = store.get(&key)? else {
            return Err(EngineError::TemplateNotFound {
                name: name.to_string(),
                suggestions: suggest(store, &key),
            });
        };

        let mut seen = HashSet::from([key.clone()]);
        let mut pending = vec![(key.clone(), source)];
        let mut sources = Vec::new();

        while let Some((template_name, source)) = pending.pop() {
            let translated = syntax::translate(&source, &self.delimiters)
                .map_err(|e| EngineError::Syntax {
                    name: template_name.clone(),
                    message: e.to_string(),
                })?
                .into_owned();

            for reference in syntax::references(&translated) {
                if !seen.insert(reference.clone()) {
                    continue;
                }
                match store.get(&normalizer.lookup_key(&reference))? {
                    Some(source) => pending.push((reference, source)),
                    None => tracing::debug!(
                        template = %template_name,
                        reference = %reference,
                        "referenced template not in store"
                    ),
                }
            }

            sources.push((template_name, translated));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        self.functions.register_into(&mut tera);
        tera.add_raw_templates(sources).map_err(|source| EngineError::Parse {
            name: key.clone(),
            source,
        })?;

        tracing::trace!(template = %key, templates = tera.get_template_names().count(), "compiled");
        Ok(CompiledTemplate {
            name: key,
            tera,
        })
    }
}

/// Stored keys closest to `key` by edit distance, closest first.
fn suggest(store: &dyn SourceStore, key: &str) -> Vec<String> {
    let Some(keys) = store.keys() else {
        return Vec::new();
    };

    let mut scored: Vec<_> = keys.into_iter().map(|k| (levenshtein(key, &k), k)).collect();
    scored.sort();

    scored
        .into_iter()
        .filter(|(distance, _)| *distance <= key.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(MAX_SUGGESTIONS)
        .map(|(_, k)| k)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store(entries: &[(&str, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (key, source) in entries {
            store.set(key, (*source).to_string()).unwrap();
        }
        store
    }

    fn normalizer() -> PathNormalizer {
        PathNormalizer::new("/views", [".html"])
    }

    fn render(set: &TemplateSet, store: &MemoryStore, name: &str, context: &Context) -> Result<String> {
        set.compile(store, &normalizer(), name)?.render(context)
    }

    #[test]
    fn test_compile_and_render() {
        let store = store(&[("index", "<h1>{{ Title }}</h1>")]);
        let mut context = Context::new();
        context.insert("Title", "Hello, World!");

        let out = render(&TemplateSet::default(), &store, "index", &context).unwrap();
        assert_eq!(out, "<h1>Hello, World!</h1>");
    }

    #[test]
    fn test_name_variants_resolve_to_key() {
        let store = store(&[("pages/home", "home")]);
        let set = TemplateSet::default();
        for name in ["pages/home", "/pages/home", "pages/home.html", "./pages/home"] {
            let compiled = set.compile(&store, &normalizer(), name).unwrap();
            assert_eq!(compiled.name(), "pages/home");
        }
    }

    #[test]
    fn test_references_compiled_transitively() {
        let store = store(&[
            ("page", r#"{% extends "/layouts/base.html" %}{% block body %}page{% endblock %}"#),
            ("layouts/base", r#"<body>{% block body %}{% endblock %}{% include "partials/footer" %}</body>"#),
            ("partials/footer", "<footer>{{ year }}</footer>"),
        ]);
        let mut context = Context::new();
        context.insert("year", &2024);

        let set = TemplateSet::default();
        let compiled = set.compile(&store, &normalizer(), "page").unwrap();
        assert_eq!(compiled.template_names(), vec!["/layouts/base.html", "page", "partials/footer"]);
        assert_eq!(compiled.render(&context).unwrap(), "<body>page<footer>2024</footer></body>");
    }

    #[test]
    fn test_self_include_does_not_loop() {
        let store = store(&[("tree", r#"{% if depth > 0 %}{% include "tree" %}{% endif %}x"#)]);
        let set = TemplateSet::default();
        assert!(set.compile(&store, &normalizer(), "tree").is_ok());
    }

    #[test]
    fn test_missing_template_suggests_similar_keys() {
        let store = store(&[("index", ""), ("indexes", ""), ("about", "")]);
        let err = TemplateSet::default().compile(&store, &normalizer(), "indx").unwrap_err();

        match err {
            EngineError::TemplateNotFound { name, suggestions } => {
                assert_eq!(name, "indx");
                assert_eq!(suggestions, vec!["index"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_extends_is_parse_error() {
        let store = store(&[("page", r#"{% extends "nowhere" %}"#)]);
        let err = TemplateSet::default().compile(&store, &normalizer(), "page").unwrap_err();
        assert!(matches!(err, EngineError::Parse { name, .. } if name == "page"));
    }

    #[test]
    fn test_parse_error() {
        let store = store(&[("broken", "{% if %}")]);
        let err = TemplateSet::default().compile(&store, &normalizer(), "broken").unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn test_custom_delimiters() {
        let store = store(&[("index", "<p>[[ name ]]</p>{{ raw }}")]);
        let set = TemplateSet::new(Delimiters::new("[[", "]]"), FunctionRegistry::new());
        let mut context = Context::new();
        context.insert("name", "jet");

        assert_eq!(render(&set, &store, "index", &context).unwrap(), "<p>jet</p>{{ raw }}");
    }

    #[test]
    fn test_unclosed_custom_delimiter() {
        let store = store(&[("index", "<p>[[ name</p>")]);
        let set = TemplateSet::new(Delimiters::new("[[", "]]"), FunctionRegistry::new());
        let err = set.compile(&store, &normalizer(), "index").unwrap_err();
        assert!(matches!(err, EngineError::Syntax { .. }));
    }

    #[test]
    fn test_autoescape_disabled() {
        let store = store(&[("index", "{{ markup }}")]);
        let mut context = Context::new();
        context.insert("markup", "<b>&</b>");
        assert_eq!(render(&TemplateSet::default(), &store, "index", &context).unwrap(), "<b>&</b>");
    }

    #[test]
    fn test_builtins_available() {
        let store = store(&[("index", r#"{{ toInt(value="4") * 2 }}"#)]);
        let set = TemplateSet::new(Delimiters::default(), FunctionRegistry::with_builtins());
        assert_eq!(render(&set, &store, "index", &Context::new()).unwrap(), "8");
    }

    #[test]
    fn test_render_error_names_template() {
        let store = store(&[("index", "{{ missing_var }}")]);
        let err = render(&TemplateSet::default(), &store, "index", &Context::new()).unwrap_err();
        assert!(matches!(err, EngineError::Render { name, .. } if name == "index"));
    }
}
