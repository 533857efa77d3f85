mod ids;
mod milestone;
mod path;
mod path_set;

pub use ids::{IdError, OwnerKey, PathId};
pub use milestone::{Milestone, MilestoneRecord, MilestoneTemplate};
pub use path::{PathError, PathProgress, PathTemplate, UserPath, UserPathRecord, UserPathView};
pub use path_set::{PathSet, overall_progress};
