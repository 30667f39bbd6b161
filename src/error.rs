use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("config missing: {0}")]
    ConfigMissing(String),
    #[error("read source {label}: {source}")]
    SourceRead {
        label: String,
        #[source]
        source: io::Error,
    },
    #[error("write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}
