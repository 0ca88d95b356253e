use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("unknown org '{0}'")]
    UnknownOrg(String),
    #[error("unknown metric '{name}'. Known ones:\n{}", .known.join("\n"))]
    UnknownMetric { name: String, known: Vec<String> },
    #[error("History query failed: {0}")]
    Query(String),
    #[error("Malformed history record: {0:?}")]
    MalformedRecord(String),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

// gix errors are large; keep them boxed so Result stays small
impl From<gix::object::find::existing::Error> for StatsError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        StatsError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for StatsError {
    fn from(err: gix::object::commit::Error) -> Self {
        StatsError::Commit(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for StatsError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        StatsError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for StatsError {
    fn from(err: gix::objs::decode::Error) -> Self {
        StatsError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for StatsError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        StatsError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::discover::Error> for StatsError {
    fn from(err: gix::discover::Error) -> Self {
        StatsError::GitDiscover(Box::new(err))
    }
}
