use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::LeaseError;
use crate::models::Building;

use super::helpers::expand_home;

/// One visible line of the property table, addressed by position in the
/// building list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TreeRow {
    Building(usize),
    Apartment(usize, usize),
}

impl TreeRow {
    pub(crate) fn building_index(self) -> usize {
        match self {
            TreeRow::Building(idx) | TreeRow::Apartment(idx, _) => idx,
        }
    }
}

/// Selection and collapse state for the building/apartment table. The rows
/// themselves are always derived from the building list.
#[derive(Default)]
pub(crate) struct TreeView {
    pub(crate) selected: usize,
    collapsed: HashSet<i64>,
}

impl TreeView {
    pub(crate) fn rows(&self, buildings: &[Building]) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for (b_idx, building) in buildings.iter().enumerate() {
            rows.push(TreeRow::Building(b_idx));
            if !self.collapsed.contains(&building.id) {
                rows.extend(
                    (0..building.apartments.len()).map(|a_idx| TreeRow::Apartment(b_idx, a_idx)),
                );
            }
        }
        rows
    }

    pub(crate) fn current(&self, buildings: &[Building]) -> Option<TreeRow> {
        self.rows(buildings).get(self.selected).copied()
    }

    pub(crate) fn is_collapsed(&self, building: &Building) -> bool {
        self.collapsed.contains(&building.id)
    }

    pub(crate) fn move_selection(&mut self, buildings: &[Building], offset: isize) {
        let len = self.rows(buildings).len() as isize;
        if len == 0 {
            return;
        }
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, buildings: &[Building]) {
        self.selected = self.rows(buildings).len().saturating_sub(1);
    }

    pub(crate) fn ensure_in_bounds(&mut self, buildings: &[Building]) {
        let len = self.rows(buildings).len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Select `row`, expanding its building first when it is an apartment.
    pub(crate) fn focus(&mut self, buildings: &[Building], row: TreeRow) {
        if let TreeRow::Apartment(b_idx, _) = row {
            if let Some(building) = buildings.get(b_idx) {
                self.collapsed.remove(&building.id);
            }
        }
        if let Some(pos) = self.rows(buildings).iter().position(|candidate| *candidate == row) {
            self.selected = pos;
        }
    }

    /// Collapse or expand the building under the cursor. On an apartment row
    /// the parent collapses and the cursor moves up to it. Returns the new
    /// collapsed state.
    pub(crate) fn toggle_collapsed(&mut self, buildings: &[Building]) -> Option<bool> {
        let row = self.current(buildings)?;
        let b_idx = row.building_index();
        let id = buildings.get(b_idx)?.id;
        let collapsed = if self.collapsed.remove(&id) {
            false
        } else {
            self.collapsed.insert(id);
            true
        };
        self.focus(buildings, TreeRow::Building(b_idx));
        Some(collapsed)
    }

    /// Keep buildings collapsed across a save, which hands out new ids but
    /// preserves order.
    pub(crate) fn carry_over(&mut self, before: &[Building], after: &[Building]) {
        self.collapsed = before
            .iter()
            .zip(after)
            .filter(|(old, _)| self.collapsed.contains(&old.id))
            .map(|(_, new)| new.id)
            .collect();
        self.ensure_in_bounds(after);
    }
}

/// Files queued for the next reminder, plus the highlighted entry on the
/// reminder screen.
#[derive(Default)]
pub(crate) struct AttachmentList {
    files: Vec<PathBuf>,
    pub(crate) selected: usize,
}

impl AttachmentList {
    pub(crate) fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Queue a file typed by the user. The path must point at an existing
    /// file; `~/` expands to the home directory and duplicates are ignored.
    pub(crate) fn add(&mut self, raw: &str) -> Result<PathBuf, LeaseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LeaseError::MissingField("File path"));
        }
        let path = expand_home(trimmed);
        if !path.is_file() {
            return Err(LeaseError::AttachmentNotFound(path));
        }
        if let Some(pos) = self.files.iter().position(|existing| existing == &path) {
            self.selected = pos;
        } else {
            self.files.push(path.clone());
            self.selected = self.files.len() - 1;
        }
        Ok(path)
    }

    pub(crate) fn current(&self) -> Option<&Path> {
        self.files.get(self.selected).map(PathBuf::as_path)
    }

    pub(crate) fn remove_current(&mut self) -> Option<PathBuf> {
        if self.selected >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(self.selected);
        if self.selected >= self.files.len() {
            self.selected = self.files.len().saturating_sub(1);
        }
        Some(removed)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.files.is_empty() {
            return;
        }
        let len = self.files.len() as isize;
        self.selected = (self.selected as isize + offset).clamp(0, len - 1) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Apartment;

    fn apartment(id: i64) -> Apartment {
        Apartment {
            id,
            number: id.to_string(),
            tenant: "T".into(),
            email: "t@x.com".into(),
            lease_start: "01/01/2024".into(),
            lease_end: "12/31/2024".into(),
        }
    }

    fn buildings() -> Vec<Building> {
        let mut oak = Building::new(1, "Oak Hall");
        oak.apartments = vec![apartment(1), apartment(2)];
        let mut elm = Building::new(2, "Elm Court");
        elm.apartments = vec![apartment(3)];
        vec![oak, elm]
    }

    #[test]
    fn rows_nest_apartments_under_buildings() {
        let tree = TreeView::default();
        assert_eq!(
            tree.rows(&buildings()),
            vec![
                TreeRow::Building(0),
                TreeRow::Apartment(0, 0),
                TreeRow::Apartment(0, 1),
                TreeRow::Building(1),
                TreeRow::Apartment(1, 0),
            ]
        );
    }

    #[test]
    fn collapsing_from_an_apartment_selects_its_building() {
        let buildings = buildings();
        let mut tree = TreeView::default();
        tree.move_selection(&buildings, 2);
        assert_eq!(tree.toggle_collapsed(&buildings), Some(true));
        assert_eq!(tree.current(&buildings), Some(TreeRow::Building(0)));
        assert_eq!(tree.rows(&buildings).len(), 3);

        tree.focus(&buildings, TreeRow::Apartment(0, 1));
        assert_eq!(tree.current(&buildings), Some(TreeRow::Apartment(0, 1)));
        assert_eq!(tree.rows(&buildings).len(), 5);
    }

    #[test]
    fn selection_is_clamped() {
        let buildings = buildings();
        let mut tree = TreeView::default();
        tree.move_selection(&buildings, 50);
        assert_eq!(tree.selected, 4);
        tree.move_selection(&buildings, -50);
        assert_eq!(tree.selected, 0);
        tree.select_last(&buildings);
        tree.ensure_in_bounds(&buildings[..1]);
        assert_eq!(tree.selected, 2);
    }

    #[test]
    fn collapse_state_survives_new_ids() {
        let before = buildings();
        let mut tree = TreeView::default();
        tree.focus(&before, TreeRow::Building(1));
        tree.toggle_collapsed(&before);

        let mut after = before.clone();
        after[0].id = 10;
        after[1].id = 11;
        tree.carry_over(&before, &after);
        assert!(!tree.is_collapsed(&after[0]));
        assert!(tree.is_collapsed(&after[1]));
    }

    #[test]
    fn attachments_require_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lease.pdf");
        std::fs::write(&file, b"pdf").unwrap();

        let mut list = AttachmentList::default();
        assert!(matches!(
            list.add(dir.path().join("missing.pdf").to_str().unwrap()),
            Err(LeaseError::AttachmentNotFound(_))
        ));
        assert_eq!(list.add("  "), Err(LeaseError::MissingField("File path")));

        list.add(file.to_str().unwrap()).unwrap();
        list.add(file.to_str().unwrap()).unwrap();
        assert_eq!(list.files(), &[file.clone()]);

        assert_eq!(list.remove_current(), Some(file));
        assert!(list.is_empty());
        assert_eq!(list.remove_current(), None);
    }
}
