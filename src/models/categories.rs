use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    category::{CategoryBlueprint, CategoryTree},
    errors::{CategoryError, PersistenceError},
    storage::{FileSlot, Format, FormatRegistry, Vid},
};

pub const CATEGORY_FORMAT_ID: &str = "bankviz-category";
pub const CATEGORY_FORMAT_VERSION: Vid = Vid::new(0, 1, 0);

/// Editable blueprint collection plus the subset currently used for analysis.
#[derive(Debug)]
pub struct CategorySet {
    slot: FileSlot<Vec<CategoryBlueprint>>,
    used: Vec<CategoryBlueprint>,
    tree: CategoryTree,
    revision: u64,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new("unsaved.json")
    }
}

impl CategorySet {
    /// The `bankviz-category` envelope format.
    pub fn format() -> Format {
        Format::serde::<Vec<CategoryBlueprint>>(CATEGORY_FORMAT_ID, CATEGORY_FORMAT_VERSION)
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_slot(FileSlot::new(path, Some(CATEGORY_FORMAT_ID), Vec::new()))
    }

    pub fn open(registry: &FormatRegistry, path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        FileSlot::try_open(registry, path, Some(CATEGORY_FORMAT_ID)).map(Self::from_slot)
    }

    fn from_slot(slot: FileSlot<Vec<CategoryBlueprint>>) -> Self {
        Self {
            slot,
            used: Vec::new(),
            tree: CategoryTree::default(),
            revision: 0,
        }
    }

    pub fn path(&self) -> &Path {
        self.slot.path()
    }

    pub fn blueprints(&self) -> &[CategoryBlueprint] {
        self.slot.content()
    }

    /// Mutable access to the blueprints; the set is marked dirty.
    pub fn blueprints_mut(&mut self) -> &mut Vec<CategoryBlueprint> {
        self.slot.content_mut()
    }

    pub fn is_dirty(&self) -> bool {
        self.slot.is_dirty()
    }

    pub fn used(&self) -> &[CategoryBlueprint] {
        &self.used
    }

    /// Tree compiled from the used blueprints.
    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    /// Bumped whenever the used set changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_blueprint(&mut self, blueprint: CategoryBlueprint) -> usize {
        let blueprints = self.slot.content_mut();
        blueprints.push(blueprint);
        blueprints.len() - 1
    }

    pub fn remove_blueprint(&mut self, index: usize) -> Option<CategoryBlueprint> {
        if index >= self.blueprints().len() {
            return None;
        }
        Some(self.slot.content_mut().remove(index))
    }

    /// Adds the top-level blueprint at `index` to the used set.
    pub fn use_blueprint(&mut self, index: usize) -> Result<bool, CategoryError> {
        self.use_blueprint_at(&[index])
    }

    /// Adds the blueprint reached by following `path` through `sub` lists to the used set.
    ///
    /// Returns `Ok(false)` for a path that leads nowhere; a blueprint that would make the
    /// tree invalid (e.g. a duplicate name) is rejected and the used set is unchanged.
    pub fn use_blueprint_at(&mut self, path: &[usize]) -> Result<bool, CategoryError> {
        let Some(blueprint) = self.blueprint_at(path).cloned() else {
            return Ok(false);
        };
        let mut used = self.used.clone();
        used.push(blueprint);
        self.set_used(used)?;
        Ok(true)
    }

    /// Drops the used category at `index`, returning it.
    pub fn unuse(&mut self, index: usize) -> Result<Option<CategoryBlueprint>, CategoryError> {
        if index >= self.used.len() {
            return Ok(None);
        }
        let mut used = self.used.clone();
        let removed = used.remove(index);
        self.set_used(used)?;
        Ok(Some(removed))
    }

    /// Blueprint reached by following `path`; the empty path reaches nothing.
    pub fn blueprint_at(&self, path: &[usize]) -> Option<&CategoryBlueprint> {
        let (first, rest) = path.split_first()?;
        let root = self.blueprints().get(*first)?;
        rest.iter().try_fold(root, |node, index| node.sub.get(*index))
    }

    /// Replaces the used set with every blueprint.
    pub fn use_all(&mut self) -> Result<(), CategoryError> {
        self.set_used(self.blueprints().to_vec())
    }

    pub fn reset_used(&mut self) {
        self.used.clear();
        self.tree = CategoryTree::default();
        self.revision += 1;
    }

    /// Appends the blueprints stored in another category file, returning how many were added.
    pub fn append_from_file(
        &mut self,
        registry: &FormatRegistry,
        path: &Path,
    ) -> Result<usize, PersistenceError> {
        Ok(self.append_from_file_into(registry, &[], path)?.unwrap_or_default())
    }

    /// Appends the blueprints stored in another category file under the `sub` list of the
    /// blueprint at `target`, or at the top level for an empty `target`.
    ///
    /// Returns `Ok(None)` without reading the file when `target` leads nowhere.
    pub fn append_from_file_into(
        &mut self,
        registry: &FormatRegistry,
        target: &[usize],
        path: &Path,
    ) -> Result<Option<usize>, PersistenceError> {
        if !target.is_empty() && self.blueprint_at(target).is_none() {
            return Ok(None);
        }
        let loaded = registry.try_load::<Vec<CategoryBlueprint>>(path, Some(CATEGORY_FORMAT_ID))?;
        let added = loaded.content.len();
        let Some(list) = sub_list_mut(self.slot.content_mut(), target) else {
            return Ok(None);
        };
        list.extend(loaded.content);
        self.revision += 1;
        info!(path = %path.display(), ?target, added, "appended categories");
        Ok(Some(added))
    }

    pub fn save(&mut self, registry: &FormatRegistry) -> Result<(), PersistenceError> {
        self.slot.try_save(registry)
    }

    pub fn save_as(&mut self, registry: &FormatRegistry, path: &Path) -> Result<(), PersistenceError> {
        self.slot.try_save_as(registry, Some(path), None)
    }

    fn set_used(&mut self, used: Vec<CategoryBlueprint>) -> Result<(), CategoryError> {
        self.tree = CategoryTree::build(&used)?;
        self.used = used;
        self.revision += 1;
        Ok(())
    }
}

fn sub_list_mut<'a>(
    list: &'a mut Vec<CategoryBlueprint>,
    path: &[usize],
) -> Option<&'a mut Vec<CategoryBlueprint>> {
    match path.split_first() {
        None => Some(list),
        Some((first, rest)) => sub_list_mut(&mut list.get_mut(*first)?.sub, rest),
    }
}
