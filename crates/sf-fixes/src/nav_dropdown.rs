//! Click-to-open fallback for the top navigation's submenus.

use crate::Handler;
use crate::Install;
use sf_core::FixResult;
use sf_css::Query;
use sf_dom::Document;
use sf_dom::DomEvent;
use sf_dom::EventKind;
use sf_dom::Listeners;
use sf_dom::NodeId;
use std::collections::BTreeSet;

pub const OPEN_CLASS: &str = "sf-open";

/// Open submenus, by menu index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropdownRegistry {
    open: BTreeSet<usize>,
}

/// Result of toggling one menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toggle {
    pub closed: Vec<usize>,
    pub opened: Option<usize>,
}

impl DropdownRegistry {
    pub fn is_open(&self, menu: usize) -> bool {
        self.open.contains(&menu)
    }

    pub fn open_menus(&self) -> impl Iterator<Item = usize> + '_ {
        self.open.iter().copied()
    }

    /// Closes everything; opens `menu` only if it was not already open.
    pub fn toggle(&mut self, menu: usize) -> Toggle {
        let was_open = self.is_open(menu);
        let closed = self.close_all();
        let opened = (!was_open).then(|| {
            self.open.insert(menu);
            menu
        });
        Toggle { closed, opened }
    }

    pub fn close_all(&mut self) -> Vec<usize> {
        core::mem::take(&mut self.open).into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavMenu {
    pub item: NodeId,
    pub wrapper: NodeId,
    pub submenu: NodeId,
}

#[derive(Debug, Clone)]
pub struct NavDropdowns {
    menus: Vec<NavMenu>,
    registry: DropdownRegistry,
}

impl NavDropdowns {
    pub fn menus(&self) -> &[NavMenu] {
        &self.menus
    }

    pub fn registry(&self) -> &DropdownRegistry {
        &self.registry
    }

    /// Click on a menu's link wrapper.
    pub(crate) fn on_toggle(
        &mut self,
        doc: &mut Document,
        menu: usize,
        event: &mut DomEvent,
    ) -> FixResult<()> {
        let toggle = self.registry.toggle(menu);
        for closed in toggle.closed {
            self.set_open(doc, closed, false)?;
        }
        if let Some(opened) = toggle.opened {
            self.set_open(doc, opened, true)?;
            event.stop_propagation();
        }
        Ok(())
    }

    /// Click anywhere in the document.
    pub(crate) fn on_document_click(&mut self, doc: &mut Document) -> FixResult<()> {
        for closed in self.registry.close_all() {
            self.set_open(doc, closed, false)?;
        }
        Ok(())
    }

    fn set_open(&self, doc: &mut Document, menu: usize, open: bool) -> FixResult<()> {
        let Some(menu) = self.menus.get(menu) else {
            return Ok(());
        };
        doc.toggle_class(menu.submenu, OPEN_CLASS, open)?;
        doc.set_style_property(menu.submenu, "display", if open { "block" } else { "" })
    }
}

pub(crate) fn install(
    doc: &mut Document,
    listeners: &mut Listeners<Handler>,
) -> FixResult<Install<NavDropdowns>> {
    let root = doc.root();
    let mut menus = Vec::new();
    for item in doc.query_selector_all(root, ".nav-item")? {
        let wrapper = doc.query_selector(item, ".nav-link-wrapper")?;
        let submenu = doc.query_selector(item, ".navbar-nav-items")?;
        let (Some(wrapper), Some(submenu)) = (wrapper, submenu) else {
            continue;
        };

        doc.set_style_property(wrapper, "cursor", "pointer")?;
        listeners.add(wrapper, EventKind::Click, Handler::NavToggle(menus.len()));
        menus.push(NavMenu {
            item,
            wrapper,
            submenu,
        });
    }

    if menus.is_empty() {
        return Ok(Install::Skipped("no .nav-item with a submenu"));
    }
    listeners.add(root, EventKind::Click, Handler::NavCloseAll);

    let summary = format!("{} submenu(s)", menus.len());
    Ok(Install::Applied {
        state: NavDropdowns {
            menus,
            registry: DropdownRegistry::default(),
        },
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::DropdownRegistry;
    use super::Toggle;

    #[test]
    fn opening_one_menu_closes_the_other() {
        let mut registry = DropdownRegistry::default();
        assert_eq!(
            registry.toggle(0),
            Toggle {
                closed: vec![],
                opened: Some(0)
            }
        );
        assert_eq!(
            registry.toggle(2),
            Toggle {
                closed: vec![0],
                opened: Some(2)
            }
        );
        assert_eq!(registry.open_menus().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn toggling_an_open_menu_closes_it() {
        let mut registry = DropdownRegistry::default();
        registry.toggle(1);
        assert_eq!(
            registry.toggle(1),
            Toggle {
                closed: vec![1],
                opened: None
            }
        );
        assert!(!registry.is_open(1));
    }

    #[test]
    fn close_all_empties_the_registry() {
        let mut registry = DropdownRegistry::default();
        registry.toggle(3);
        assert_eq!(registry.close_all(), vec![3]);
        assert!(registry.close_all().is_empty());
    }
}
