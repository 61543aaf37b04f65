use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, info};

use super::table::{PathData, PathDataTable};

const ROOT_ELEMENT: &str = "Pathfinding";
const PATHFINDABLE_ELEMENT: &str = "pathfindable";
const CATEGORY_ATTR: &str = "category";
const COST_ATTR: &str = "cost";
const BLOCK_ATTR: &str = "block";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDataErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    MissingAttribute,
    InvalidValue,
    DuplicateCategory,
}

#[derive(Debug, Clone)]
pub struct PathDataError {
    pub code: PathDataErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for PathDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for PathDataError {}

pub fn load_path_data(file_path: &Path) -> Result<PathDataTable, PathDataError> {
    let raw = fs::read_to_string(file_path).map_err(|source| PathDataError {
        code: PathDataErrorCode::ReadFile,
        message: format!("failed to read path data file: {source}"),
        file_path: file_path.to_path_buf(),
        location: None,
    })?;
    let table = parse_path_data(file_path, &raw)?;
    info!(
        file = %file_path.display(),
        category_count = table.len(),
        "path_data_loaded"
    );
    for (id, category, data) in table.iter() {
        debug!(
            id = id.0,
            category,
            cost = data.cost,
            blocking = data.blocking,
            "path_data_category"
        );
    }
    Ok(table)
}

/// Parses a `<Pathfinding>` document. `file_path` is only used for error reports.
pub fn parse_path_data(file_path: &Path, raw: &str) -> Result<PathDataTable, PathDataError> {
    let doc = Document::parse(raw).map_err(|error| PathDataError {
        code: PathDataErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(error_at_node(
            PathDataErrorCode::InvalidRoot,
            format!("root element must be <{ROOT_ELEMENT}>"),
            file_path,
            &doc,
            root,
        ));
    }

    let mut categories = BTreeMap::<String, PathData>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != PATHFINDABLE_ELEMENT {
            return Err(error_at_node(
                PathDataErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}>; expected <{PATHFINDABLE_ELEMENT}>",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }
        let (category, data) = parse_pathfindable(file_path, &doc, child)?;
        if categories.contains_key(&category) {
            return Err(error_at_node(
                PathDataErrorCode::DuplicateCategory,
                format!("category '{category}' is declared more than once"),
                file_path,
                &doc,
                child,
            ));
        }
        categories.insert(category, data);
    }

    Ok(PathDataTable::from_categories(categories))
}

fn parse_pathfindable(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<(String, PathData), PathDataError> {
    for attribute in node.attributes() {
        if ![CATEGORY_ATTR, COST_ATTR, BLOCK_ATTR].contains(&attribute.name()) {
            return Err(error_at_node(
                PathDataErrorCode::UnknownAttribute,
                format!(
                    "unknown attribute '{}' on <{PATHFINDABLE_ELEMENT}>",
                    attribute.name()
                ),
                file_path,
                doc,
                node,
            ));
        }
    }

    let category = required_attribute(file_path, doc, node, CATEGORY_ATTR)?;

    let raw_cost = required_attribute(file_path, doc, node, COST_ATTR)?;
    let cost = raw_cost.parse::<f64>().map_err(|_| {
        error_at_node(
            PathDataErrorCode::InvalidValue,
            format!("cost '{raw_cost}' is not a valid number"),
            file_path,
            doc,
            node,
        )
    })?;
    if !cost.is_finite() || cost < 0.0 {
        return Err(error_at_node(
            PathDataErrorCode::InvalidValue,
            "cost must be finite and >= 0".to_string(),
            file_path,
            doc,
            node,
        ));
    }

    let raw_block = required_attribute(file_path, doc, node, BLOCK_ATTR)?;
    let blocking = match raw_block.as_str() {
        "true" => true,
        "false" => false,
        _ => {
            return Err(error_at_node(
                PathDataErrorCode::InvalidValue,
                format!("block '{raw_block}' must be 'true' or 'false'"),
                file_path,
                doc,
                node,
            ))
        }
    };

    Ok((category, PathData { cost, blocking }))
}

fn required_attribute(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    attribute: &str,
) -> Result<String, PathDataError> {
    let value = node
        .attribute(attribute)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if value.is_empty() {
        return Err(error_at_node(
            PathDataErrorCode::MissingAttribute,
            format!("missing required attribute '{attribute}' on <{PATHFINDABLE_ELEMENT}>"),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn error_at_node(
    code: PathDataErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> PathDataError {
    let pos = doc.text_pos_at(node.range().start);
    PathDataError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}
