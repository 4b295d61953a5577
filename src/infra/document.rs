//! Streaming application of a config snapshot to an HTML document.
//!
//! Elements carrying `data-ui-key` are display targets. `data-ui-mode`
//! picks the application mode and defaults to `text`.

use std::{cell::RefCell, rc::Rc};

use ammonia::Builder as AmmoniaBuilder;
use lol_html::{
    RewriteStrSettings, element,
    errors::RewritingError,
    html_content::{ContentType, Element},
    rewrite_str,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::applier::{
    ApplicationMode, ApplySummary, DisplaySink, SinkError, dispatch,
};
use crate::domain::ConfigSnapshot;

pub const KEY_ATTRIBUTE: &str = "data-ui-key";
pub const MODE_ATTRIBUTE: &str = "data-ui-mode";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to rewrite document: {0}")]
    Rewrite(#[from] RewritingError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentOptions {
    /// Pass `raw_html` values through the HTML sanitizer first.
    pub sanitize_markup: bool,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub html: String,
    pub summary: ApplySummary,
}

struct ElementSink<'a, 'r, 't> {
    element: &'a mut Element<'r, 't>,
    sanitizer: Option<&'a AmmoniaBuilder<'static>>,
}

impl DisplaySink for ElementSink<'_, '_, '_> {
    fn set_text(&mut self, text: &str) -> Result<(), SinkError> {
        self.element.set_inner_content(text, ContentType::Text);
        Ok(())
    }

    fn set_placeholder(&mut self, text: &str) -> Result<(), SinkError> {
        self.element
            .set_attribute("placeholder", text)
            .map_err(|err| SinkError::write(err.to_string()))
    }

    fn set_image_source(&mut self, src: &str) -> Result<(), SinkError> {
        self.element
            .set_attribute("src", src)
            .map_err(|err| SinkError::write(err.to_string()))
    }

    fn set_markup(&mut self, markup: &str) -> Result<(), SinkError> {
        match self.sanitizer {
            Some(sanitizer) => {
                let cleaned = sanitizer.clean(markup).to_string();
                self.element.set_inner_content(&cleaned, ContentType::Html);
            }
            None => self.element.set_inner_content(markup, ContentType::Html),
        }
        Ok(())
    }
}

fn markup_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();
    builder.add_generic_attribute_prefixes(&["data-"]);
    builder
}

/// Rewrite `html`, writing snapshot values into every keyed element.
pub fn render_document(
    html: &str,
    snapshot: &ConfigSnapshot,
    options: DocumentOptions,
) -> Result<RenderedDocument, DocumentError> {
    let summary = Rc::new(RefCell::new(ApplySummary::default()));
    let sanitizer = options.sanitize_markup.then(markup_sanitizer);

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("[data-ui-key]", {
                let summary = Rc::clone(&summary);
                let sanitizer = sanitizer.as_ref();
                move |el| {
                    let Some(key) = el.get_attribute(KEY_ATTRIBUTE) else {
                        return Ok(());
                    };
                    let mode = match el.get_attribute(MODE_ATTRIBUTE) {
                        None => ApplicationMode::Text,
                        Some(raw) => match ApplicationMode::parse(&raw) {
                            Some(mode) => mode,
                            None => {
                                warn!(key = %key, mode = %raw, "Unknown data-ui-mode; element left as is");
                                summary.borrow_mut().skipped += 1;
                                return Ok(());
                            }
                        },
                    };

                    let Some(value) = snapshot.value(&key) else {
                        summary.borrow_mut().skipped += 1;
                        return Ok(());
                    };

                    let mut sink = ElementSink {
                        element: el,
                        sanitizer,
                    };
                    let result = dispatch(mode, value, &mut sink);
                    summary.borrow_mut().record(&key, mode, result);
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )?;

    let summary = *summary.borrow();
    debug!(
        applied = summary.applied,
        skipped = summary.skipped,
        failed = summary.failed,
        "Rendered document"
    );
    Ok(RenderedDocument {
        html: rewritten,
        summary,
    })
}
