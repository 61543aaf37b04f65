mod compiler;
mod table;

pub use compiler::{
    load_path_data, parse_path_data, PathDataError, PathDataErrorCode, SourceLocation,
};
pub use table::{CategoryId, PathData, PathDataTable};
