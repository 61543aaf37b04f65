use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(pub u32);

/// Traversal data of one terrain category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathData {
    pub cost: f64,
    pub blocking: bool,
}

#[derive(Debug, Clone)]
struct CategoryEntry {
    name: String,
    data: PathData,
}

/// Path data by terrain category. Ids follow the sorted category names, so the
/// same declarations always produce the same ids.
#[derive(Debug, Default, Clone)]
pub struct PathDataTable {
    categories: Vec<CategoryEntry>,
    ids_by_name: HashMap<String, CategoryId>,
}

impl PathDataTable {
    pub fn from_categories(categories: BTreeMap<String, PathData>) -> Self {
        let mut ids_by_name = HashMap::with_capacity(categories.len());
        let categories = categories
            .into_iter()
            .enumerate()
            .map(|(idx, (name, data))| {
                ids_by_name.insert(name.clone(), CategoryId(idx as u32));
                CategoryEntry { name, data }
            })
            .collect::<Vec<_>>();
        Self {
            categories,
            ids_by_name,
        }
    }

    pub fn category_id_by_name(&self, name: &str) -> Option<CategoryId> {
        self.ids_by_name.get(name).copied()
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .get(id.0 as usize)
            .map(|entry| entry.name.as_str())
    }

    pub fn path_data(&self, id: CategoryId) -> Option<PathData> {
        self.categories.get(id.0 as usize).map(|entry| entry.data)
    }

    pub fn path_data_by_name(&self, name: &str) -> Option<PathData> {
        self.category_id_by_name(name)
            .and_then(|id| self.path_data(id))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &str, PathData)> + '_ {
        self.categories
            .iter()
            .enumerate()
            .map(|(idx, entry)| (CategoryId(idx as u32), entry.name.as_str(), entry.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> PathDataTable {
        let mut categories = BTreeMap::new();
        categories.insert(
            "water".to_string(),
            PathData {
                cost: 0.0,
                blocking: true,
            },
        );
        categories.insert(
            "ground".to_string(),
            PathData {
                cost: 1.0,
                blocking: false,
            },
        );
        PathDataTable::from_categories(categories)
    }

    #[test]
    fn ids_follow_sorted_names() {
        let table = sample_table();
        let ground = table.category_id_by_name("ground").expect("ground");
        let water = table.category_id_by_name("water").expect("water");
        assert!(ground < water);
        assert_eq!(table.category_name(ground), Some("ground"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lookup_by_name_returns_data() {
        let table = sample_table();
        let water = table.path_data_by_name("water").expect("water");
        assert!(water.blocking);
        assert!(table.path_data_by_name("lava").is_none());
        assert!(table.path_data(CategoryId(9)).is_none());
    }

    #[test]
    fn empty_table_reports_empty() {
        let table = PathDataTable::default();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }
}
