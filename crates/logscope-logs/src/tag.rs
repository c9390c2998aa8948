use thiserror::Error;

use logscope_types::Workload;

/// Marker that precedes `<pod>_<namespace>_<container>-<id>.log` in a fluent tag
pub const CONTAINER_LOG_MARKER: &str = "kube.var.log.containers.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("missing 'kube.var.log.containers.' marker")]
    MissingMarker,

    #[error("expected 3 underscore-separated fields, found {0}")]
    FieldCount(usize),

    #[error("container field '{0}' has no container id suffix")]
    MissingContainerId(String),
}

/// Parse a fluent-bit tail tag into the workload it names.
///
/// `<prefix>kube.var.log.containers.<pod>_<namespace>_<container>-<id>.log`;
/// the container id (everything after the last hyphen) is dropped.
pub fn parse_fluent_tag(tag: &str) -> Result<Workload, TagError> {
    let (_, file) = tag
        .split_once(CONTAINER_LOG_MARKER)
        .ok_or(TagError::MissingMarker)?;

    let fields: Vec<&str> = file.split('_').collect();
    let [pod, namespace, container_with_id] = fields.as_slice() else {
        return Err(TagError::FieldCount(fields.len()));
    };

    let (container, _id) = container_with_id
        .rsplit_once('-')
        .ok_or_else(|| TagError::MissingContainerId(container_with_id.to_string()))?;

    Ok(Workload::new(namespace, pod, container))
}
