use crate::document::{Document, NodeId};
use crate::xml::DocumentLoadError;
use gleaner_core::{LiveTree, Locator, NodeHandle, TreeError, TreeErrorKind};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

struct Page {
    document: Document,
    generation: u64,
}

/// Snapshot of one node for display purposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeDescription {
    pub handle: NodeHandle,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

/// [`LiveTree`] over an in-memory [`Document`].
///
/// [`DocumentTree::update`] changes the current page in place and keeps
/// handles valid. [`DocumentTree::navigate`] replaces the page; handles taken
/// before report [`TreeErrorKind::StaleHandle`] afterwards.
pub struct DocumentTree {
    page: RwLock<Page>,
}

impl DocumentTree {
    pub fn new(document: Document) -> Self {
        Self { page: RwLock::new(Page { document, generation: 0 }) }
    }

    pub fn from_xml(xml: &str) -> Result<Self, DocumentLoadError> {
        Ok(Self::new(Document::from_xml(xml)?))
    }

    fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Mutates the current page.
    pub fn update<R>(&self, change: impl FnOnce(&mut Document) -> R) -> R {
        let mut page = self.write();
        change(&mut page.document)
    }

    /// Replaces the current page, invalidating every handle handed out so far.
    pub fn navigate(&self, document: Document) {
        let mut page = self.write();
        page.document = document;
        page.generation += 1;
        debug!(generation = page.generation, "document navigated");
    }

    /// Clone of the current page.
    pub fn snapshot(&self) -> Document {
        self.read().document.clone()
    }

    /// Every node matching `locator`, in document order.
    pub fn locate_all(&self, locator: &Locator) -> Result<Vec<NodeHandle>, TreeError> {
        let page = self.read();
        let nodes = page.document.select(locator)?;
        Ok(nodes.into_iter().map(|node| handle_for(node, page.generation)).collect())
    }

    pub fn describe(&self, handle: &NodeHandle) -> Result<NodeDescription, TreeError> {
        let page = self.read();
        let node = resolve(&page, handle)?;
        let element = page.document.element(node).ok_or_else(|| TreeError::stale(handle))?;
        Ok(NodeDescription {
            handle: *handle,
            name: element.name().to_owned(),
            attributes: element.attributes().map(|(key, value)| (key.to_owned(), value.to_owned())).collect(),
            text: page.document.text_content(node),
        })
    }

    /// Node behind `handle`, if it belongs to the current page.
    pub fn node_id(&self, handle: &NodeHandle) -> Option<NodeId> {
        resolve(&self.read(), handle).ok()
    }
}

fn handle_for(node: NodeId, generation: u64) -> NodeHandle {
    NodeHandle::new(node.index() as u64, generation)
}

/// Maps a handle back to an attached node of the current page.
fn resolve(page: &Page, handle: &NodeHandle) -> Result<NodeId, TreeError> {
    let index = usize::try_from(handle.key()).map_err(|_| TreeError::stale(handle))?;
    let node = NodeId::from_index(index);
    if handle.generation() != page.generation
        || !page.document.contains(node)
        || !page.document.is_attached(node)
    {
        return Err(TreeError::stale(handle));
    }
    Ok(node)
}

impl LiveTree for DocumentTree {
    fn locate(&self, locator: &Locator) -> Result<Option<NodeHandle>, TreeError> {
        let page = self.read();
        let first = page.document.select(locator)?.into_iter().next();
        trace!(%locator, found = first.is_some(), "locate");
        Ok(first.map(|node| handle_for(node, page.generation)))
    }

    fn is_ready(&self, node: &NodeHandle) -> Result<bool, TreeError> {
        let page = self.read();
        match resolve(&page, node) {
            Ok(id) => Ok(page.document.is_interactable(id)),
            Err(err) if err.kind == TreeErrorKind::StaleHandle => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read_text(&self, node: &NodeHandle) -> Result<String, TreeError> {
        let page = self.read();
        let id = resolve(&page, node)?;
        Ok(page.document.text_content(id))
    }

    fn read_attribute(&self, node: &NodeHandle, name: &str) -> Result<Option<String>, TreeError> {
        let page = self.read();
        let id = resolve(&page, node)?;
        Ok(page.document.element(id).and_then(|element| element.attribute(name)).map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ElementSpec;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tree() -> DocumentTree {
        DocumentTree::new(Document::from_spec(
            &ElementSpec::new("ul")
                .with_child(ElementSpec::new("li").with_attribute("data-id", "1").with_text(" first "))
                .with_child(ElementSpec::new("li").with_attribute("disabled", "").with_text("second")),
        ))
    }

    #[rstest]
    fn locate_returns_first_match(tree: DocumentTree) {
        let handle = tree.locate(&Locator::new("/ul/li")).unwrap().unwrap();
        assert_eq!(tree.read_text(&handle).unwrap(), "first");
        assert_eq!(tree.read_attribute(&handle, "data-id").unwrap().as_deref(), Some("1"));
        assert_eq!(tree.read_attribute(&handle, "title").unwrap(), None);
        assert!(tree.locate(&Locator::new("/ul/li[3]")).unwrap().is_none());
        assert_eq!(tree.locate_all(&Locator::new("ul > li")).unwrap().len(), 2);
    }

    #[rstest]
    fn readiness_reflects_disabled_state(tree: DocumentTree) {
        let second = tree.locate(&Locator::new("/ul/li[2]")).unwrap().unwrap();
        assert!(!tree.is_ready(&second).unwrap());
        tree.update(|doc| {
            let node = doc.select(&Locator::new("/ul/li[2]")).unwrap()[0];
            doc.remove_attribute(node, "disabled");
        });
        assert!(tree.is_ready(&second).unwrap());
    }

    #[rstest]
    fn navigation_invalidates_handles(tree: DocumentTree) {
        let first = tree.locate(&Locator::new("/ul/li[1]")).unwrap().unwrap();
        tree.navigate(tree.snapshot());
        assert_eq!(tree.generation(), 1);
        assert!(!tree.is_ready(&first).unwrap());
        assert_eq!(tree.read_text(&first).unwrap_err().kind, TreeErrorKind::StaleHandle);

        let fresh = tree.locate(&Locator::new("/ul/li[1]")).unwrap().unwrap();
        assert_eq!(fresh.key(), first.key());
        assert_ne!(fresh, first);
        assert_eq!(tree.read_text(&fresh).unwrap(), "first");
    }

    #[rstest]
    fn detached_nodes_read_as_stale(tree: DocumentTree) {
        let first = tree.locate(&Locator::new("/ul/li[1]")).unwrap().unwrap();
        tree.update(|doc| {
            let node = doc.select(&Locator::new("/ul/li[1]")).unwrap()[0];
            doc.detach(node);
        });
        assert!(!tree.is_ready(&first).unwrap());
        assert!(tree.read_attribute(&first, "data-id").is_err());
    }

    #[rstest]
    fn invalid_locators_are_reported(tree: DocumentTree) {
        let err = tree.locate(&Locator::new("/ul/li[")).unwrap_err();
        assert_eq!(err.kind, TreeErrorKind::InvalidLocator);
    }

    #[rstest]
    fn describe_lists_attributes(tree: DocumentTree) {
        let first = tree.locate(&Locator::new("li[data-id]")).unwrap().unwrap();
        let description = tree.describe(&first).unwrap();
        assert_eq!(description.name, "li");
        assert_eq!(description.attributes, vec![("data-id".to_owned(), "1".to_owned())]);
        assert_eq!(description.text, "first");
    }
}
