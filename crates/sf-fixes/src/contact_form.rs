use crate::Handler;
use crate::Install;
use crate::config::ContactFormConfig;
use crate::markup;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::DomEvent;
use sf_dom::EventKind;
use sf_dom::Listeners;
use sf_dom::NodeId;

const FALLBACK_HEADING: &str = "<h3>Thank you for getting in touch</h3>";

/// The intercepted contact form and what replaced it.
#[derive(Debug, Clone)]
pub struct ContactForm {
    form: NodeId,
    notice: NodeId,
    email: String,
    fallback: Option<NodeId>,
}

impl ContactForm {
    pub fn form(&self) -> NodeId {
        self.form
    }

    pub fn notice(&self) -> NodeId {
        self.notice
    }

    /// The thank-you panel, once the form has been submitted.
    pub fn fallback(&self) -> Option<NodeId> {
        self.fallback
    }

    /// Submit handler: the default action is always prevented, and the form
    /// is swapped for the fallback panel the first time.
    pub(crate) fn on_submit(&mut self, doc: &mut Document, event: &mut DomEvent) -> FixResult<()> {
        event.prevent_default();
        if self.fallback.is_some() {
            return Ok(());
        }
        let Some(parent) = doc.parent(self.form) else {
            return Ok(());
        };

        let fallback = markup::element(doc, "div", "sf-contact-fallback")?;
        markup::append_fragment(doc, fallback, FALLBACK_HEADING)?;
        let body = markup::append_element(doc, fallback, "p", "")?;
        markup::append_text(
            doc,
            body,
            "Our contact form is temporarily unavailable. Please email us directly at ",
        )?;
        markup::append_mailto(doc, body, &self.email)?;
        markup::append_text(doc, body, " and a member of our team will respond shortly.")?;

        doc.replace_child(parent, fallback, self.form)?;
        self.fallback = Some(fallback);
        tracing::info!(form = %self.form, "contact form replaced with fallback notice");
        Ok(())
    }
}

pub(crate) fn install(
    doc: &mut Document,
    config: &ContactFormConfig,
    listeners: &mut Listeners<Handler>,
) -> FixResult<Install<ContactForm>> {
    let Some(form) = doc.query_selector(doc.root(), "form[novalidate]")? else {
        return Ok(Install::Skipped("no form[novalidate]"));
    };
    let Some(parent) = doc.parent(form) else {
        return Ok(Install::Skipped("form is detached"));
    };

    let notice = markup::element(doc, "div", "sf-form-notice")?;
    markup::append_text(doc, notice, "You can also reach us directly at ")?;
    markup::append_mailto(doc, notice, &config.email)?;
    markup::append_text(doc, notice, ". Our team will get back to you promptly.")?;
    doc.insert_before(parent, notice, Some(form))?;

    listeners.add(form, EventKind::Submit, Handler::ContactSubmit);
    Ok(Install::Applied {
        state: ContactForm {
            form,
            notice,
            email: config.email.clone(),
            fallback: None,
        },
        summary: format!("notice before {form}"),
    })
}
